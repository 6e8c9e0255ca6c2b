//! Two-peer loopback demo.
//!
//! Usage:
//!   cargo run -p replica_session -- [--ticks 64] [--tick-hz 16]
//!
//! Runs a host and a client peer over the in-process loopback transport:
//! the client walks in a circle, the host samples the interpolated remote
//! pose each tick, and halfway through the run both peers observe the same
//! door trigger — only the host announces it.

use std::{env, sync::Arc};

use anyhow::Context;
use tracing::info;

use replica_session::ReplicationSession;
use replica_shared::{
    config::SessionConfig,
    entity::PoseFlags,
    identity::PeerId,
    math::Vec3,
    roster::Roster,
    transport::LoopbackHub,
    wire::DoorId,
};

struct DemoArgs {
    ticks: u32,
    cfg: SessionConfig,
}

fn parse_args() -> DemoArgs {
    let mut out = DemoArgs {
        ticks: 64,
        cfg: SessionConfig::default(),
    };
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--ticks" if i + 1 < args.len() => {
                out.ticks = args[i + 1].parse().unwrap_or(64);
                i += 2;
            }
            "--tick-hz" if i + 1 < args.len() => {
                out.cfg.tick_hz = args[i + 1].parse().unwrap_or(16);
                i += 2;
            }
            _ => i += 1,
        }
    }
    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args();
    let host_id = PeerId::from_u64(1);
    let client_id = PeerId::from_u64(2);
    info!(ticks = args.ticks, tick_hz = args.cfg.tick_hz, "Starting loopback demo");

    let hub = LoopbackHub::new();
    let (host_tp, host_rx) = hub.register(host_id).await;
    let (client_tp, client_rx) = hub.register(client_id).await;

    let mut host = ReplicationSession::new(
        args.cfg.clone(),
        Roster::new(host_id, host_id),
        Arc::new(host_tp),
        host_rx,
    );
    host.on_member_joined(client_id);

    let mut client = ReplicationSession::new(
        args.cfg.clone(),
        Roster::new(client_id, host_id),
        Arc::new(client_tp),
        client_rx,
    );

    let tick_interval = std::time::Duration::from_secs_f32(1.0 / args.cfg.tick_hz as f32);
    let mut next_tick = tokio::time::Instant::now();
    let door = DoorId(0x5151);

    for tick in 0..args.ticks {
        // Client-side simulation: walk a circle.
        let angle = tick as f32 * 0.1;
        {
            let state = &mut client.local_mut().state;
            state.position = Vec3::new(angle.cos() * 5.0, 0.0, angle.sin() * 5.0);
            state.body_yaw = angle.to_degrees();
            state.flags = PoseFlags::WALKING;
        }

        client.step().await.context("client step")?;
        host.step().await.context("host step")?;

        // Both peers hit the same trigger; only the authority announces.
        if tick == args.ticks / 2 {
            let emitted = host.notify_door_unlocked(door).await?;
            let suppressed = !client.notify_door_unlocked(door).await?;
            info!(emitted, suppressed, "Door trigger observed by both peers");
        }

        if tick % 8 == 0 {
            if let Some(remote) = host.remote_player(client_id) {
                let pose = remote.sample(host.now());
                info!(
                    tick,
                    x = pose.position.x,
                    z = pose.position.z,
                    yaw = pose.body_yaw,
                    "Host view of client"
                );
            }
        }

        next_tick += tick_interval;
        tokio::time::sleep_until(next_tick).await;
    }

    // Let the door event settle on the client.
    client.drain_inbound().await?;
    info!(
        entities_on_host = host.entity_count(),
        door_open_on_client = client.door_is_open(door),
        "Demo finished"
    );
    Ok(())
}
