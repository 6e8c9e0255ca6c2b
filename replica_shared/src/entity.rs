//! Entity contract and the player snapshot layout.
//!
//! Every replicated entity variant implements [`Entity`]: it can identify
//! itself, serialize a snapshot, deserialize one (stamping the local receipt
//! time), and apply a one-shot damage event. Write order must match read
//! order exactly per kind; the layout is the wire contract and is never
//! versioned or negotiated.
//!
//! The set of kinds is closed: the wire tag resolves to a concrete variant
//! once, at creation, and never changes afterwards.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{
    codec::{CodecResult, Reader, WireEnum, Writer},
    identity::PeerId,
    math::Vec3,
};

/// Wire tag naming the concrete entity variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityKind {
    Player = 0,
}

impl WireEnum for EntityKind {
    const NAME: &'static str = "EntityKind";

    fn ordinal(&self) -> u8 {
        *self as u8
    }

    fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Player),
            _ => None,
        }
    }
}

/// Player team, used for PvP and visual tinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Team {
    #[default]
    Yellow = 0,
    Red = 1,
    Green = 2,
    Blue = 3,
    Pink = 4,
}

impl WireEnum for Team {
    const NAME: &'static str = "Team";

    fn ordinal(&self) -> u8 {
        *self as u8
    }

    fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Yellow),
            1 => Some(Self::Red),
            2 => Some(Self::Green),
            3 => Some(Self::Blue),
            4 => Some(Self::Pink),
            _ => None,
        }
    }
}

bitflags! {
    /// Animator-driving pose flags, packed into one wire byte (bit i holds
    /// flag i, matching the codec's packed-boolean layout).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PoseFlags: u8 {
        const WALKING = 1 << 0;
        const SLIDING = 1 << 1;
        const IN_AIR  = 1 << 2;
        const TYPING  = 1 << 3;
    }
}

/// Sentinel for "no weapon equipped".
pub const NO_WEAPON: u8 = 0xFF;

/// The replicated player fields, in wire order.
///
/// Keeping encode and decode side by side in one type is what guarantees the
/// sender and receiver agree on the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub health: f32,
    pub position: Vec3,
    pub body_yaw: f32,
    pub head_pitch: f32,
    pub team: Team,
    pub weapon: u8,
    pub flags: PoseFlags,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            health: 100.0,
            position: Vec3::ZERO,
            body_yaw: 0.0,
            head_pitch: 0.0,
            team: Team::default(),
            weapon: NO_WEAPON,
            flags: PoseFlags::empty(),
        }
    }
}

impl PlayerState {
    /// Encoded size in bytes: health + position + two angles + team +
    /// weapon + flag byte.
    pub const WIRE_LEN: usize = 4 + 12 + 4 + 4 + 1 + 1 + 1;

    pub fn encode(&self, w: &mut Writer) -> CodecResult<()> {
        w.f32(self.health)?;
        w.vector(self.position)?;
        w.f32(self.body_yaw)?;
        w.f32(self.head_pitch)?;

        w.enum_of(&self.team)?;
        w.byte(self.weapon)?;

        w.byte(self.flags.bits())
    }

    pub fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            health: r.f32()?,
            position: r.vector()?,
            body_yaw: r.f32()?,
            head_pitch: r.f32()?,
            team: r.enum_of()?,
            weapon: r.byte()?,
            flags: PoseFlags::from_bits_truncate(r.byte()?),
        })
    }
}

/// A replicated entity owned by the session.
///
/// The session is the single point of creation and destruction; entities own
/// their field state exclusively and are only mutated inside the tick.
pub trait Entity: Send {
    fn kind(&self) -> EntityKind;

    /// The participant whose simulation is canonical for this entity.
    fn owner(&self) -> PeerId;

    /// Local receipt time of the newest applied snapshot, in seconds.
    fn last_update(&self) -> f32;

    /// Serializes the current snapshot. Field order is the wire contract.
    fn write_snapshot(&self, w: &mut Writer) -> CodecResult<()>;

    /// Applies an inbound snapshot, stamping `now` as its receipt time.
    fn read_snapshot(&mut self, r: &mut Reader<'_>, now: f32) -> CodecResult<()>;

    /// Applies a one-shot damage event, outside the snapshot path.
    fn apply_damage(&mut self, r: &mut Reader<'_>) -> CodecResult<()>;
}

/// Damage event payload: who dealt it and how much.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub instigator: PeerId,
    pub amount: f32,
}

impl DamageEvent {
    pub const WIRE_LEN: usize = 8 + 4;

    pub fn encode(&self, w: &mut Writer) -> CodecResult<()> {
        w.id(self.instigator)?;
        w.f32(self.amount)
    }

    pub fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            instigator: r.id()?,
            amount: r.f32()?,
        })
    }
}
