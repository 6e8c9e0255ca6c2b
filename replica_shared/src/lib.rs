//! `replica_shared`
//!
//! Shared libraries used by every session participant.
//!
//! Design goals:
//! - A fixed-layout binary wire format, identical on all peers.
//! - Clear separation of concerns (codec, identity, roster, wire, transport).
//! - Traits for abstraction and dependency injection.
//! - No `unsafe`.

pub mod codec;
pub mod config;
pub mod entity;
pub mod identity;
pub mod math;
pub mod roster;
pub mod transport;
pub mod wire;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::codec::*;
    pub use crate::config::*;
    pub use crate::entity::*;
    pub use crate::identity::*;
    pub use crate::math::*;
    pub use crate::roster::*;
    pub use crate::wire::*;
}
