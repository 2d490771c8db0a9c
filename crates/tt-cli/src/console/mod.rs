//! Console-backed implementations of the client's collaborators

mod prompt;
mod surface;

pub use prompt::{FormDefaults, PromptShell};
pub use surface::ConsoleSurface;
