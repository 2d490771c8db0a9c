//! Peer directory
//!
//! Holds the one-shot `peers` snapshot received on the control channel.
//! The snapshot is sorted once on arrival and never mutated afterwards, so
//! switching between address kinds never needs a new fetch.

use tt_protocol::PeerInfo;

use crate::types::AddressKind;

/// Sorted, immutable snapshot of reachable peers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerDirectory {
    peers: Vec<PeerInfo>,
}

impl PeerDirectory {
    /// Build a directory from a snapshot, ordered by short name
    ///
    /// Ordering is case-insensitive and stable, so peers whose names differ
    /// only in case keep their snapshot order.
    pub fn from_snapshot(mut peers: Vec<PeerInfo>) -> Self {
        peers.sort_by_cached_key(|p| p.short_domain.to_lowercase());
        Self { peers }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PeerInfo> {
        self.peers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerInfo> {
        self.peers.iter()
    }

    /// Short names in display order
    pub fn short_names(&self) -> Vec<&str> {
        self.peers.iter().map(|p| p.short_domain.as_str()).collect()
    }

    /// Address of the peer at `index` in the requested form
    ///
    /// A peer without any IP falls back to its short name for
    /// [`AddressKind::Ip`].
    pub fn address(&self, index: usize, kind: AddressKind) -> Option<&str> {
        let peer = self.peers.get(index)?;

        let address = match kind {
            AddressKind::Short => peer.short_domain.as_str(),
            AddressKind::Full => peer.domain.as_str(),
            AddressKind::Ip => peer
                .ips
                .first()
                .map(String::as_str)
                .unwrap_or(peer.short_domain.as_str()),
        };

        Some(address)
    }

    /// Find a peer by short name, full domain or IP
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.peers.iter().position(|p| {
            p.short_domain.eq_ignore_ascii_case(needle)
                || p.domain.trim_end_matches('.').eq_ignore_ascii_case(needle)
                || p.ips.iter().any(|ip| ip == needle)
        })
    }
}
