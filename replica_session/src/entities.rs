//! Concrete entity variants.
//!
//! Two variants exist: the locally-controlled player, created once at
//! session join and serialized each tick, and the remotely-controlled
//! player, created lazily when the first snapshot for an unknown identity
//! arrives and reconstructed through per-field interpolation.

use replica_shared::{
    codec::{CodecResult, Reader, Writer},
    entity::{DamageEvent, Entity, EntityKind, PlayerState, PoseFlags, Team},
    identity::PeerId,
    math::Vec3,
};

use crate::interp::{AngleLerp, FloatLerp};

/// The participant's own avatar; its simulation state is canonical here.
#[derive(Debug)]
pub struct LocalPlayer {
    owner: PeerId,
    /// Live simulation state, written by the game each tick.
    pub state: PlayerState,
    last_update: f32,
}

impl LocalPlayer {
    pub fn new(owner: PeerId) -> Self {
        Self {
            owner,
            state: PlayerState::default(),
            last_update: 0.0,
        }
    }
}

impl Entity for LocalPlayer {
    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }

    fn owner(&self) -> PeerId {
        self.owner
    }

    fn last_update(&self) -> f32 {
        self.last_update
    }

    fn write_snapshot(&self, w: &mut Writer) -> CodecResult<()> {
        self.state.encode(w)
    }

    fn read_snapshot(&mut self, r: &mut Reader<'_>, now: f32) -> CodecResult<()> {
        // Nobody else is authoritative over the local player; consume the
        // payload but keep local state.
        let _ = PlayerState::decode(r)?;
        self.last_update = now;
        Ok(())
    }

    fn apply_damage(&mut self, r: &mut Reader<'_>) -> CodecResult<()> {
        let event = DamageEvent::decode(r)?;
        self.state.health = (self.state.health - event.amount).max(0.0);
        Ok(())
    }
}

/// Continuous presentation state sampled from a remote player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPose {
    pub health: f32,
    pub position: Vec3,
    pub body_yaw: f32,
    pub head_pitch: f32,
    pub team: Team,
    pub weapon: u8,
    pub flags: PoseFlags,
}

/// A player simulated elsewhere, rebuilt from interpolated snapshots.
#[derive(Debug)]
pub struct RemotePlayer {
    owner: PeerId,

    health: FloatLerp,
    x: FloatLerp,
    y: FloatLerp,
    z: FloatLerp,
    body_yaw: AngleLerp,
    head_pitch: AngleLerp,

    team: Team,
    weapon: u8,
    flags: PoseFlags,

    last_update: f32,
}

impl RemotePlayer {
    pub fn new(owner: PeerId) -> Self {
        Self {
            owner,
            health: FloatLerp::new(),
            x: FloatLerp::new(),
            y: FloatLerp::new(),
            z: FloatLerp::new(),
            body_yaw: AngleLerp::new(),
            head_pitch: AngleLerp::new(),
            team: Team::default(),
            weapon: replica_shared::entity::NO_WEAPON,
            flags: PoseFlags::empty(),
            last_update: 0.0,
        }
    }

    /// The presentation read: smooth state at render time `at`.
    pub fn sample(&self, at: f32) -> PlayerPose {
        PlayerPose {
            health: self.health.get(at),
            position: Vec3::new(self.x.get(at), self.y.get(at), self.z.get(at)),
            body_yaw: self.body_yaw.get(at),
            head_pitch: self.head_pitch.get(at),
            team: self.team,
            weapon: self.weapon,
            flags: self.flags,
        }
    }
}

impl Entity for RemotePlayer {
    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }

    fn owner(&self) -> PeerId {
        self.owner
    }

    fn last_update(&self) -> f32 {
        self.last_update
    }

    fn write_snapshot(&self, w: &mut Writer) -> CodecResult<()> {
        self.sample(self.last_update).into_state().encode(w)
    }

    fn read_snapshot(&mut self, r: &mut Reader<'_>, now: f32) -> CodecResult<()> {
        let state = PlayerState::decode(r)?;
        self.last_update = now;

        self.health.feed(state.health, now);
        self.x.feed(state.position.x, now);
        self.y.feed(state.position.y, now);
        self.z.feed(state.position.z, now);
        self.body_yaw.feed(state.body_yaw, now);
        self.head_pitch.feed(state.head_pitch, now);

        self.team = state.team;
        self.weapon = state.weapon;
        self.flags = state.flags;
        Ok(())
    }

    fn apply_damage(&mut self, r: &mut Reader<'_>) -> CodecResult<()> {
        let event = DamageEvent::decode(r)?;
        // Snapshots from the owner will correct this shortly; applying it
        // now keeps the presentation responsive.
        let current = self.health.get(self.last_update);
        self.health
            .feed((current - event.amount).max(0.0), self.last_update);
        Ok(())
    }
}

impl PlayerPose {
    fn into_state(self) -> PlayerState {
        PlayerState {
            health: self.health,
            position: self.position,
            body_yaw: self.body_yaw,
            head_pitch: self.head_pitch,
            team: self.team,
            weapon: self.weapon,
            flags: self.flags,
        }
    }
}

/// Closed set of remotely-controlled variants, resolved once from the wire
/// entity tag at creation.
#[derive(Debug)]
pub enum RemoteEntity {
    Player(RemotePlayer),
}

impl RemoteEntity {
    pub fn spawn(kind: EntityKind, owner: PeerId) -> Self {
        match kind {
            EntityKind::Player => Self::Player(RemotePlayer::new(owner)),
        }
    }

    pub fn as_player(&self) -> Option<&RemotePlayer> {
        match self {
            Self::Player(p) => Some(p),
        }
    }
}

impl Entity for RemoteEntity {
    fn kind(&self) -> EntityKind {
        match self {
            Self::Player(p) => p.kind(),
        }
    }

    fn owner(&self) -> PeerId {
        match self {
            Self::Player(p) => p.owner(),
        }
    }

    fn last_update(&self) -> f32 {
        match self {
            Self::Player(p) => p.last_update(),
        }
    }

    fn write_snapshot(&self, w: &mut Writer) -> CodecResult<()> {
        match self {
            Self::Player(p) => p.write_snapshot(w),
        }
    }

    fn read_snapshot(&mut self, r: &mut Reader<'_>, now: f32) -> CodecResult<()> {
        match self {
            Self::Player(p) => p.read_snapshot(r, now),
        }
    }

    fn apply_damage(&mut self, r: &mut Reader<'_>) -> CodecResult<()> {
        match self {
            Self::Player(p) => p.apply_damage(r),
        }
    }
}
