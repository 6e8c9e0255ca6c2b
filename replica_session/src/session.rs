//! The replication session.
//!
//! One of these runs on every participant. It owns the identity → entity
//! mapping (the single point of entity creation and destruction), routes
//! inbound snapshot and event buffers, broadcasts the local entity's state
//! each tick, and enforces the authority policy for shared world objects.
//!
//! Scheduling: a single logical simulation loop. Inbound buffers arrive
//! asynchronously on a channel but are drained and applied synchronously at
//! the start of each step, so entity state is never mutated concurrently.
//! Decode and unknown-target errors are contained at the dispatch boundary;
//! they are logged and never reach the tick loop.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Instant,
};

use anyhow::Context;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use replica_shared::{
    codec::{CodecResult, Reader},
    config::SessionConfig,
    entity::{DamageEvent, Entity, EntityKind},
    identity::PeerId,
    roster::Roster,
    transport::{Inbound, Transport},
    wire::{self, DoorId, MessageKind},
};

use crate::{
    entities::{LocalPlayer, RemoteEntity, RemotePlayer},
    world::World,
};

/// Per-participant replication state.
pub struct ReplicationSession {
    cfg: SessionConfig,
    roster: Roster,

    local: LocalPlayer,
    remotes: HashMap<PeerId, RemoteEntity>,
    /// Identities whose entities were destroyed; terminal, never revived.
    removed: HashSet<PeerId>,

    world: World,

    transport: Arc<dyn Transport>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    /// Client-originated events the host still owes the rest of the session.
    relay: Vec<(PeerId, Bytes)>,

    epoch: Instant,
    tick: u32,
}

impl ReplicationSession {
    pub fn new(
        cfg: SessionConfig,
        roster: Roster,
        transport: Arc<dyn Transport>,
        inbound: mpsc::UnboundedReceiver<Inbound>,
    ) -> Self {
        let local = LocalPlayer::new(roster.local_id());
        Self {
            cfg,
            roster,
            local,
            remotes: HashMap::new(),
            removed: HashSet::new(),
            world: World::new(),
            transport,
            inbound,
            relay: Vec::new(),
            epoch: Instant::now(),
            tick: 0,
        }
    }

    /// Seconds since session start; the receipt-time reference for
    /// interpolation.
    pub fn now(&self) -> f32 {
        self.epoch.elapsed().as_secs_f32()
    }

    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    pub fn config(&self) -> &SessionConfig {
        &self.cfg
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn local(&self) -> &LocalPlayer {
        &self.local
    }

    /// The game writes the local avatar's simulation state through this.
    pub fn local_mut(&mut self) -> &mut LocalPlayer {
        &mut self.local
    }

    /// Presentation access to a replicated remote player.
    pub fn remote_player(&self, peer: PeerId) -> Option<&RemotePlayer> {
        self.remotes.get(&peer).and_then(RemoteEntity::as_player)
    }

    pub fn entity_count(&self) -> usize {
        self.remotes.len()
    }

    /// Whether the session considers a shared door open.
    pub fn door_is_open(&self, door: DoorId) -> bool {
        self.world.is_open(door)
    }

    /// Executes one fixed simulation step: apply everything received since
    /// the last step, then broadcast the local snapshot.
    pub async fn step(&mut self) -> anyhow::Result<()> {
        self.drain_inbound().await?;

        let snapshot = wire::snapshot_message(&self.local).context("serialize local snapshot")?;
        self.transport
            .send_to_all(snapshot)
            .await
            .context("broadcast snapshot")?;

        self.tick += 1;
        Ok(())
    }

    /// Applies all queued inbound buffers, then forwards any events the
    /// host owes the session. Malformed messages are logged and dropped;
    /// they never interrupt the step.
    pub async fn drain_inbound(&mut self) -> anyhow::Result<()> {
        while let Ok((sender, bytes)) = self.inbound.try_recv() {
            if let Err(error) = self.handle_message(sender, &bytes) {
                warn!(%sender, %error, len = bytes.len(), "Dropping malformed message");
            }
        }
        for (origin, msg) in std::mem::take(&mut self.relay) {
            debug!(%origin, "Relaying event to the session");
            self.transport
                .send_to_all(msg)
                .await
                .context("relay event")?;
        }
        Ok(())
    }

    fn handle_message(&mut self, sender: PeerId, bytes: &[u8]) -> CodecResult<()> {
        let mut r = Reader::new(bytes);
        match wire::read_kind(&mut r)? {
            MessageKind::Snapshot => self.on_snapshot(sender, &mut r),
            MessageKind::Damage => {
                let target = r.id()?;
                self.on_event(target, &mut r)?;
                // A client addresses its events to the host; the host owns
                // fanning them out to everyone else.
                if self.roster.is_host() && sender != self.roster.local_id() {
                    self.relay.push((sender, Bytes::copy_from_slice(bytes)));
                }
                Ok(())
            }
            MessageKind::DoorOpen => {
                let door = DoorId(r.u64()?);
                self.on_door_open(door);
                Ok(())
            }
        }
    }

    /// Routes a snapshot to its entity, creating it on first sight.
    fn on_snapshot(&mut self, sender: PeerId, r: &mut Reader<'_>) -> CodecResult<()> {
        let kind: EntityKind = r.enum_of()?;

        if sender == self.roster.local_id() {
            return Ok(());
        }
        if self.removed.contains(&sender) {
            debug!(%sender, "Snapshot for removed identity dropped");
            return Ok(());
        }

        let now = self.now();
        let entity = self.remotes.entry(sender).or_insert_with(|| {
            info!(%sender, ?kind, "First snapshot from peer, creating entity");
            RemoteEntity::spawn(kind, sender)
        });
        entity.read_snapshot(r, now)
    }

    /// Routes a one-shot event to an existing entity. Events for unknown
    /// identities are dropped; that is policy, not an error.
    fn on_event(&mut self, target: PeerId, r: &mut Reader<'_>) -> CodecResult<()> {
        if target == self.roster.local_id() {
            return self.local.apply_damage(r);
        }
        match self.remotes.get_mut(&target) {
            Some(entity) => entity.apply_damage(r),
            None => {
                debug!(%target, "Event for unknown identity dropped");
                Ok(())
            }
        }
    }

    fn on_door_open(&mut self, door: DoorId) {
        if self.world.mark_open(door) {
            info!(%door, "Shared door opened by authority");
        }
    }

    /// Reports a locally observed door trigger.
    ///
    /// Only the authority turns this into a session-wide event, and only
    /// once per door; everyone else suppresses the action and waits for the
    /// authority's event. Returns whether an event was emitted.
    pub async fn notify_door_unlocked(&mut self, door: DoorId) -> anyhow::Result<bool> {
        if !self.roster.is_host() {
            debug!(%door, "Door trigger observed, deferring to authority");
            return Ok(false);
        }
        if !self.world.mark_open(door) {
            return Ok(false);
        }

        info!(%door, "Announcing door open");
        let msg = wire::door_open_message(door).context("serialize door event")?;
        self.transport
            .send_to_all(msg)
            .await
            .context("broadcast door event")?;
        Ok(true)
    }

    /// Emits a damage event against `target`. The host broadcasts to the
    /// whole session; everyone else hands the event to the host.
    pub async fn send_damage(&mut self, target: PeerId, amount: f32) -> anyhow::Result<()> {
        let event = DamageEvent {
            instigator: self.roster.local_id(),
            amount,
        };
        let msg = wire::damage_message(target, &event).context("serialize damage event")?;

        if self.roster.is_host() {
            self.transport.send_to_all(msg).await
        } else {
            self.transport.send_to(self.roster.host(), msg).await
        }
        .context("send damage event")
    }

    /// Records a newly joined participant. Joins past the configured
    /// membership cap are refused.
    pub fn on_member_joined(&mut self, peer: PeerId) {
        if self.roster.member_count() >= self.cfg.max_peers as usize {
            warn!(%peer, limit = self.cfg.max_peers, "Refusing join, session is full");
            return;
        }
        match self.roster.join(peer) {
            Ok(()) => info!(%peer, members = self.roster.member_count(), "Peer joined"),
            Err(error) => warn!(%peer, %error, "Ignoring join notification"),
        }
    }

    /// Records a departure: the entity is destroyed and the identity enters
    /// its terminal state. Buffers still queued for it will be dropped.
    pub fn on_member_left(&mut self, peer: PeerId) {
        if let Err(error) = self.roster.leave(peer) {
            warn!(%peer, %error, "Ignoring leave notification");
            return;
        }
        if self.remotes.remove(&peer).is_some() {
            info!(%peer, "Destroyed entity for departed peer");
        }
        self.removed.insert(peer);
        debug!(host = %self.roster.host(), members = self.roster.member_count(), "Membership after departure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_shared::{
        math::Vec3,
        transport::LoopbackHub,
        wire::{damage_message, snapshot_message},
    };

    fn peer(n: u64) -> PeerId {
        PeerId::from_u64(n)
    }

    async fn session_pair() -> (ReplicationSession, ReplicationSession) {
        let hub = LoopbackHub::new();
        let (t1, rx1) = hub.register(peer(1)).await;
        let (t2, rx2) = hub.register(peer(2)).await;

        let host = ReplicationSession::new(
            SessionConfig::default(),
            Roster::new(peer(1), peer(1)),
            Arc::new(t1),
            rx1,
        );
        let client = ReplicationSession::new(
            SessionConfig::default(),
            Roster::new(peer(2), peer(1)),
            Arc::new(t2),
            rx2,
        );
        (host, client)
    }

    #[tokio::test]
    async fn first_snapshot_creates_exactly_one_entity() {
        let (mut host, mut client) = session_pair().await;

        client.local_mut().state.position = Vec3::new(1.0, 2.0, 3.0);
        client.step().await.unwrap();
        client.step().await.unwrap();

        assert_eq!(host.entity_count(), 0);
        host.drain_inbound().await.unwrap();
        assert_eq!(host.entity_count(), 1);
        assert!(host.remote_player(peer(2)).is_some());
    }

    #[tokio::test]
    async fn departure_removes_entity_and_later_traffic_is_dropped() {
        let (mut host, mut client) = session_pair().await;

        client.step().await.unwrap();
        host.drain_inbound().await.unwrap();
        assert_eq!(host.entity_count(), 1);

        host.on_member_left(peer(2));
        assert_eq!(host.entity_count(), 0);

        // Snapshots sent after departure are silently dropped.
        client.step().await.unwrap();
        host.drain_inbound().await.unwrap();
        assert_eq!(host.entity_count(), 0);

        // So are events addressed to the departed identity.
        let event = DamageEvent {
            instigator: peer(1),
            amount: 10.0,
        };
        let msg = damage_message(peer(2), &event).unwrap();
        host.handle_message(peer(1), &msg).unwrap();
    }

    #[tokio::test]
    async fn malformed_buffers_never_escape_dispatch() {
        let (mut host, _client) = session_pair().await;

        // Unknown message kind.
        assert!(host.handle_message(peer(2), &[0x99]).is_err());
        // Truncated snapshot.
        let good = snapshot_message(host.local()).unwrap();
        assert!(host.handle_message(peer(2), &good[..good.len() - 3]).is_err());
        // Dispatch reported the errors, but the session is still usable.
        host.drain_inbound().await.unwrap();
        assert_eq!(host.entity_count(), 0);
    }

    #[tokio::test]
    async fn own_echo_is_ignored() {
        let (mut host, _client) = session_pair().await;
        let msg = snapshot_message(host.local()).unwrap();
        host.handle_message(peer(1), &msg).unwrap();
        assert_eq!(host.entity_count(), 0);
    }

    #[tokio::test]
    async fn damage_event_reaches_local_entity() {
        let (mut host, mut client) = session_pair().await;
        host.local_mut().state.health = 100.0;

        // Client reports damage against the host; host applies it locally.
        client.send_damage(peer(1), 25.0).await.unwrap();
        host.drain_inbound().await.unwrap();
        assert_eq!(host.local().state.health, 75.0);
    }

    #[tokio::test]
    async fn only_authority_announces_doors() {
        let (mut host, mut client) = session_pair().await;

        // Both observe the same trigger; only the host emits.
        assert!(!client.notify_door_unlocked(DoorId(7)).await.unwrap());
        assert!(host.notify_door_unlocked(DoorId(7)).await.unwrap());
        // Re-trigger on the host is suppressed by world state.
        assert!(!host.notify_door_unlocked(DoorId(7)).await.unwrap());

        client.drain_inbound().await.unwrap();
        assert!(client.door_is_open(DoorId(7)));
    }

    #[tokio::test]
    async fn join_past_the_membership_cap_is_refused() {
        let hub = LoopbackHub::new();
        let (t1, rx1) = hub.register(peer(1)).await;
        let cfg = SessionConfig {
            max_peers: 2,
            ..SessionConfig::default()
        };
        let mut host = ReplicationSession::new(cfg, Roster::new(peer(1), peer(1)), Arc::new(t1), rx1);

        host.on_member_joined(peer(2));
        assert_eq!(host.roster().member_count(), 2);

        host.on_member_joined(peer(3));
        assert_eq!(host.roster().member_count(), 2);
        assert!(!host.roster().is_member(peer(3)));
    }

    #[tokio::test]
    async fn host_relays_client_events_it_did_not_originate() {
        let (mut host, mut client) = session_pair().await;

        // A client-addressed event is queued for the session after dispatch.
        client.send_damage(peer(1), 10.0).await.unwrap();
        host.drain_inbound().await.unwrap();

        // The client hears its own event back through the host.
        let (sender, bytes) = client.inbound.try_recv().unwrap();
        assert_eq!(sender, peer(1));
        let mut r = Reader::new(&bytes);
        assert_eq!(wire::read_kind(&mut r).unwrap(), MessageKind::Damage);
        assert_eq!(r.id().unwrap(), peer(1));

        // The host never re-relays its own broadcasts.
        host.send_damage(peer(2), 10.0).await.unwrap();
        host.drain_inbound().await.unwrap();
        assert!(host.relay.is_empty());
    }
}
