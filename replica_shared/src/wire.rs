//! Wire message classes.
//!
//! Every datagram starts with a one-byte [`MessageKind`]; the sender
//! identity is implicit from the transport. Three classes exist:
//!
//! - `Snapshot`: periodic fixed-layout entity state, broadcast by the
//!   entity's owner.
//! - `Damage`: one-shot event addressed to a target entity.
//! - `DoorOpen`: shared world-object transition, originated by the
//!   authority only.

use bytes::Bytes;

use crate::{
    codec::{CodecResult, Reader, WireEnum, Writer},
    entity::{DamageEvent, Entity, PlayerState},
    identity::PeerId,
};

/// Leading byte of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Snapshot = 0,
    Damage = 1,
    DoorOpen = 2,
}

impl WireEnum for MessageKind {
    const NAME: &'static str = "MessageKind";

    fn ordinal(&self) -> u8 {
        *self as u8
    }

    fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Snapshot),
            1 => Some(Self::Damage),
            2 => Some(Self::DoorOpen),
            _ => None,
        }
    }
}

/// Stable identifier of a shared world object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoorId(pub u64);

impl std::fmt::Display for DoorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "door:{}", self.0)
    }
}

/// Message-kind byte plus the entity-kind tag preceding a snapshot payload.
const SNAPSHOT_HEADER_LEN: usize = 2;

/// Builds a snapshot datagram for an owned entity.
pub fn snapshot_message(entity: &dyn Entity) -> CodecResult<Bytes> {
    Writer::message(SNAPSHOT_HEADER_LEN + PlayerState::WIRE_LEN, |w| {
        w.enum_of(&MessageKind::Snapshot)?;
        w.enum_of(&entity.kind())?;
        entity.write_snapshot(w)
    })
}

/// Builds a damage datagram addressed to `target`.
pub fn damage_message(target: PeerId, event: &DamageEvent) -> CodecResult<Bytes> {
    Writer::message(1 + 8 + DamageEvent::WIRE_LEN, |w| {
        w.enum_of(&MessageKind::Damage)?;
        w.id(target)?;
        event.encode(w)
    })
}

/// Builds a door-open datagram. Authority-only by policy; the session gates
/// this before construction.
pub fn door_open_message(door: DoorId) -> CodecResult<Bytes> {
    Writer::message(1 + 8, |w| {
        w.enum_of(&MessageKind::DoorOpen)?;
        w.u64(door.0)
    })
}

/// Reads the leading message-kind byte.
pub fn read_kind(r: &mut Reader<'_>) -> CodecResult<MessageKind> {
    r.enum_of()
}
