//! Websocket channel to the vehicle: JSON text frames with an `event`/`data` envelope.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use shared::protocol::{ClientCommand, ServerEvent};
use tokio::{
    net::TcpStream,
    sync::{
        broadcast,
        mpsc::{self, error::TryRecvError},
    },
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{Result, TeleopError},
    CommandSink, Settings,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Server(ServerEvent),
}

/// Non-blocking handle for queuing commands onto the channel task.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<ClientCommand>,
}

impl CommandSender {
    pub fn send(&self, command: ClientCommand) -> Result<()> {
        self.tx.send(command).map_err(|_| TeleopError::ChannelClosed)
    }
}

impl CommandSink for CommandSender {
    fn emit(&self, command: ClientCommand) {
        let event = command.event_name();
        if self.send(command).is_err() {
            debug!(event, "channel task stopped; dropping command");
        }
    }
}

pub struct TeleopChannel {
    url: Url,
    commands: CommandSender,
    task: JoinHandle<()>,
}

impl TeleopChannel {
    /// Starts the connect/reconnect task. Must be called inside a tokio runtime.
    ///
    /// The returned receiver is subscribed before the task starts, so it observes the first
    /// `Connected`.
    pub fn spawn(settings: &Settings) -> Result<(Self, broadcast::Receiver<ChannelEvent>)> {
        let url = websocket_url(&settings.server_url)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, events_rx) = broadcast::channel(EVENT_CAPACITY);
        let task = tokio::spawn(run_channel(url.clone(), rx, events, settings.reconnect_delay()));

        Ok((
            Self {
                url,
                commands: CommandSender { tx },
                task,
            },
            events_rx,
        ))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn sender(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Drops this handle's sender and waits until the task has closed the socket.
    /// Other live `CommandSender` clones keep the task running.
    pub async fn close(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(err) = task.await {
            warn!(%err, "channel task ended abnormally");
        }
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Waits for the next `Connected` event.
pub async fn wait_for_connection(
    events: &mut broadcast::Receiver<ChannelEvent>,
    url: &Url,
    timeout: Duration,
) -> Result<()> {
    let connected = async {
        loop {
            match events.recv().await {
                Ok(ChannelEvent::Connected) => return Ok(()),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Err(TeleopError::ChannelClosed),
            }
        }
    };
    tokio::time::timeout(timeout, connected)
        .await
        .map_err(|_| TeleopError::ConnectTimeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })?
}

/// Accepts ws/wss directly and rewrites http/https to their websocket counterparts.
pub fn websocket_url(server_url: &str) -> Result<Url> {
    let invalid = |reason: String| TeleopError::InvalidUrl {
        url: server_url.to_string(),
        reason,
    };

    let mut url = Url::parse(server_url.trim()).map_err(|err| invalid(err.to_string()))?;
    let scheme = match url.scheme() {
        "ws" | "wss" => return Ok(url),
        "http" => "ws",
        "https" => "wss",
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| invalid(format!("cannot switch scheme to {scheme}")))?;
    Ok(url)
}

enum SessionEnd {
    SendersDropped,
    Lost,
}

async fn run_channel(
    url: Url,
    mut commands: mpsc::UnboundedReceiver<ClientCommand>,
    events: broadcast::Sender<ChannelEvent>,
    reconnect_delay: Duration,
) {
    loop {
        let attempt = connect_async(url.as_str()).await;
        if !drop_pending(&mut commands) {
            info!(%url, "all senders dropped; channel task exiting");
            return;
        }

        match attempt {
            Ok((stream, _)) => {
                info!(%url, "channel connected");
                let _ = events.send(ChannelEvent::Connected);
                let end = pump(stream, &mut commands, &events).await;
                let _ = events.send(ChannelEvent::Disconnected);
                match end {
                    SessionEnd::SendersDropped => {
                        info!(%url, "channel closed");
                        return;
                    }
                    SessionEnd::Lost => warn!(%url, "channel lost"),
                }
            }
            Err(err) => warn!(%url, %err, "channel connect failed"),
        }

        tokio::time::sleep(reconnect_delay).await;
        if !drop_pending(&mut commands) {
            info!(%url, "all senders dropped; channel task exiting");
            return;
        }
    }
}

/// Discards commands issued while offline. Returns `false` once every sender is gone.
fn drop_pending(commands: &mut mpsc::UnboundedReceiver<ClientCommand>) -> bool {
    loop {
        match commands.try_recv() {
            Ok(command) => debug!(event = command.event_name(), "offline; dropping command"),
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

async fn pump(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    commands: &mut mpsc::UnboundedReceiver<ClientCommand>,
    events: &broadcast::Sender<ChannelEvent>,
) -> SessionEnd {
    let (mut writer, mut reader) = stream.split();

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    let _ = writer.close().await;
                    return SessionEnd::SendersDropped;
                };
                let text = match command.encode() {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(event = command.event_name(), %err, "failed to encode command");
                        continue;
                    }
                };
                if let Err(err) = writer.send(Message::Text(text)).await {
                    warn!(%err, "channel send failed");
                    return SessionEnd::Lost;
                }
            }
            frame = reader.next() => match frame {
                Some(Ok(Message::Text(text))) => match ServerEvent::decode(&text) {
                    Ok(event) => {
                        info!(?event, "vehicle event");
                        let _ = events.send(ChannelEvent::Server(event));
                    }
                    Err(err) => warn!(%err, "ignoring undecodable vehicle frame"),
                },
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Lost,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(%err, "channel receive failed");
                    return SessionEnd::Lost;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
