//! `replica_session`
//!
//! The replication session every participant runs: it owns the mapping from
//! peer identity to replicated entity, decides who is the authority, routes
//! inbound snapshot/event buffers, and broadcasts the local entity's state
//! each tick. Remote state is reconstructed through per-field interpolation
//! so low-rate updates still present as continuous motion.

pub mod entities;
pub mod interp;
pub mod session;
pub mod world;

pub use session::ReplicationSession;
