//! Integration test support.
//!
//! The tests live in `tests/`; this crate exists to link the workspace
//! members together under one test package.

use std::sync::Arc;

use replica_session::ReplicationSession;
use replica_shared::{
    config::SessionConfig, identity::PeerId, roster::Roster, transport::LoopbackHub,
};

/// Spins up `count` loopback peers; peer 1 founds the session and is host.
pub async fn loopback_session(count: u64) -> Vec<ReplicationSession> {
    let hub = LoopbackHub::new();
    let host_id = PeerId::from_u64(1);

    let mut sessions = Vec::new();
    for n in 1..=count {
        let id = PeerId::from_u64(n);
        let (transport, rx) = hub.register(id).await;
        let mut roster = Roster::new(id, host_id);
        for other in 1..=count {
            let other = PeerId::from_u64(other);
            if other != id && !roster.is_member(other) {
                roster.join(other).expect("distinct peers");
            }
        }
        sessions.push(ReplicationSession::new(
            SessionConfig::default(),
            roster,
            Arc::new(transport),
            rx,
        ));
    }
    sessions
}

/// Installs the test tracing subscriber once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}
