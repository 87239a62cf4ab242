//! Runtime bridge: the tokio transport lives on its own thread, the panel talks to it through
//! a non-blocking command sender and a crossbeam event queue.

use std::thread;

use anyhow::Context;
use crossbeam_channel::{Sender, TrySendError};
use teleop_core::{ChannelEvent, CommandSender, Settings, TeleopChannel};
use tokio::sync::broadcast;
use tracing::{info, warn};

pub enum BridgeEvent {
    Channel(ChannelEvent),
    Stopped(String),
}

pub fn launch(settings: &Settings, ui_tx: Sender<BridgeEvent>) -> anyhow::Result<CommandSender> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("teleop-backend")
        .enable_all()
        .build()
        .context("failed to build backend runtime")?;

    let (channel, events) = {
        let _guard = runtime.enter();
        TeleopChannel::spawn(settings)?
    };
    let commands = channel.sender();

    thread::Builder::new()
        .name("teleop-bridge".into())
        .spawn(move || runtime.block_on(forward_events(channel, events, ui_tx)))
        .context("failed to start backend bridge thread")?;

    Ok(commands)
}

async fn forward_events(
    channel: TeleopChannel,
    mut events: broadcast::Receiver<ChannelEvent>,
    ui_tx: Sender<BridgeEvent>,
) {
    info!(url = %channel.url(), "backend bridge running");
    loop {
        let event = match events.recv().await {
            Ok(event) => BridgeEvent::Channel(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "bridge fell behind channel events");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => {
                BridgeEvent::Stopped("channel task ended".to_string())
            }
        };
        let stopped = matches!(event, BridgeEvent::Stopped(_));
        match ui_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("ui event queue is full; dropping channel event"),
            Err(TrySendError::Disconnected(_)) => break,
        }
        if stopped {
            break;
        }
    }
    channel.abort();
}
