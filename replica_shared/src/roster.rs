//! Session membership.
//!
//! The roster answers the questions the replication core asks of the
//! surrounding session layer: who is here, who am I, and who is the
//! authority. Exactly one participant is host at any time; when the host
//! leaves, ownership passes to the oldest remaining member.
//!
//! Lobby discovery and matchmaking live outside this core; the roster only
//! mirrors membership changes it is told about.

use crate::identity::PeerId;

/// Membership errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    AlreadyMember,
    NotMember,
    InvalidPeer,
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyMember => write!(f, "peer is already a session member"),
            Self::NotMember => write!(f, "peer is not a session member"),
            Self::InvalidPeer => write!(f, "nil peer id"),
        }
    }
}

impl std::error::Error for RosterError {}

/// Current session membership, in join order.
#[derive(Debug, Clone)]
pub struct Roster {
    local: PeerId,
    host: PeerId,
    members: Vec<PeerId>,
}

impl Roster {
    /// Creates a roster for a session founded by `host`, as seen by `local`.
    ///
    /// `local` may equal `host` (we founded the session) or not (we joined
    /// one); either way both start as members.
    pub fn new(local: PeerId, host: PeerId) -> Self {
        let mut members = vec![host];
        if local != host {
            members.push(local);
        }
        Self {
            local,
            host,
            members,
        }
    }

    pub fn local_id(&self) -> PeerId {
        self.local
    }

    pub fn host(&self) -> PeerId {
        self.host
    }

    /// Whether the local participant is the session authority.
    pub fn is_host(&self) -> bool {
        self.local == self.host
    }

    pub fn members(&self) -> &[PeerId] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, peer: PeerId) -> bool {
        self.members.contains(&peer)
    }

    /// Records a newly joined participant.
    pub fn join(&mut self, peer: PeerId) -> Result<(), RosterError> {
        if !peer.is_valid() {
            return Err(RosterError::InvalidPeer);
        }
        if self.is_member(peer) {
            return Err(RosterError::AlreadyMember);
        }
        self.members.push(peer);
        Ok(())
    }

    /// Records a departure. If the host left, the oldest remaining member
    /// becomes the new host.
    pub fn leave(&mut self, peer: PeerId) -> Result<(), RosterError> {
        let before = self.members.len();
        self.members.retain(|m| *m != peer);
        if self.members.len() == before {
            return Err(RosterError::NotMember);
        }

        if self.host == peer {
            self.host = self.members.first().copied().unwrap_or(PeerId::NIL);
        }
        Ok(())
    }

    /// Every member except the local participant.
    pub fn others(&self) -> impl Iterator<Item = PeerId> + '_ {
        let local = self.local;
        self.members.iter().copied().filter(move |m| *m != local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(n: u64) -> PeerId {
        PeerId::from_u64(n)
    }

    #[test]
    fn founder_is_host_and_member() {
        let roster = Roster::new(peer(1), peer(1));
        assert!(roster.is_host());
        assert_eq!(roster.member_count(), 1);
        assert!(roster.is_member(peer(1)));
    }

    #[test]
    fn joiner_is_not_host() {
        let roster = Roster::new(peer(2), peer(1));
        assert!(!roster.is_host());
        assert_eq!(roster.host(), peer(1));
        assert_eq!(roster.member_count(), 2);
    }

    #[test]
    fn join_and_leave() {
        let mut roster = Roster::new(peer(1), peer(1));
        roster.join(peer(2)).unwrap();
        roster.join(peer(3)).unwrap();
        assert_eq!(roster.join(peer(2)), Err(RosterError::AlreadyMember));

        roster.leave(peer(2)).unwrap();
        assert!(!roster.is_member(peer(2)));
        assert_eq!(roster.leave(peer(2)), Err(RosterError::NotMember));
    }

    #[test]
    fn host_handover_to_oldest_member() {
        let mut roster = Roster::new(peer(2), peer(1));
        roster.join(peer(3)).unwrap();

        roster.leave(peer(1)).unwrap();
        assert_eq!(roster.host(), peer(2));
        assert!(roster.is_host());
    }

    #[test]
    fn others_excludes_local() {
        let mut roster = Roster::new(peer(1), peer(1));
        roster.join(peer(2)).unwrap();
        roster.join(peer(3)).unwrap();

        let others: Vec<_> = roster.others().collect();
        assert_eq!(others, vec![peer(2), peer(3)]);
    }

    #[test]
    fn nil_peer_rejected() {
        let mut roster = Roster::new(peer(1), peer(1));
        assert_eq!(roster.join(PeerId::NIL), Err(RosterError::InvalidPeer));
    }
}
