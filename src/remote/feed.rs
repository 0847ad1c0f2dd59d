use std::fs;
use std::io::ErrorKind;
use std::net::TcpStream;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::types::World;

use super::ControlCommand;

/// How long a socket read blocks before outbound commands get a turn.
const READ_POLL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub enum FeedEvent {
    Snapshot(World),
    /// A message that did not parse or validate as a world.
    Rejected(String),
    Closed(Option<String>),
}

/// Everything that arrived since the last drain, reduced to the newest snapshot.
#[derive(Debug, Default)]
pub struct Drained {
    pub latest: Option<World>,
    /// Snapshots replaced by a newer one before they were applied.
    pub superseded: usize,
    pub rejected: Vec<String>,
    pub closed: Option<Option<String>>,
}

pub struct SnapshotFeed {
    source: String,
    events: Receiver<FeedEvent>,
    commands: Sender<ControlCommand>,
    _worker: Option<JoinHandle<()>>,
}

impl SnapshotFeed {
    /// Connect to a simulation socket. Each text frame is one full snapshot.
    pub fn connect(url: &str) -> Result<Self> {
        let (mut socket, _response) =
            tungstenite::connect(url).with_context(|| format!("Failed to connect to {url}"))?;
        if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
            stream
                .set_read_timeout(Some(READ_POLL))
                .context("Failed to configure socket timeout")?;
        }
        info!(url, "connected to snapshot feed");

        let (event_tx, events) = mpsc::channel();
        let (commands, command_rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("snapshot-feed".into())
            .spawn(move || run_socket(socket, event_tx, command_rx))
            .context("Failed to spawn feed thread")?;

        Ok(SnapshotFeed {
            source: url.to_string(),
            events,
            commands,
            _worker: Some(worker),
        })
    }

    /// Play back newline-delimited snapshots from a file. Stop/start pause and resume.
    pub fn replay(path: &Path, interval: Duration) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let lines: Vec<String> = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
        info!(path = %path.display(), snapshots = lines.len(), "replaying snapshots");

        let (event_tx, events) = mpsc::channel();
        let (commands, command_rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("snapshot-replay".into())
            .spawn(move || run_replay(lines, interval, event_tx, command_rx))
            .context("Failed to spawn replay thread")?;

        Ok(SnapshotFeed {
            source: path.display().to_string(),
            events,
            commands,
            _worker: Some(worker),
        })
    }

    /// A feed driven by the caller's own channels.
    pub fn from_channels(
        source: impl Into<String>,
        events: Receiver<FeedEvent>,
        commands: Sender<ControlCommand>,
    ) -> Self {
        SnapshotFeed {
            source: source.into(),
            events,
            commands,
            _worker: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Queue a control frame. Returns false once the feed has shut down.
    pub fn send(&self, command: ControlCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Take everything pending without blocking, keeping only the newest snapshot.
    pub fn drain(&self) -> Drained {
        let mut drained = Drained::default();
        loop {
            match self.events.try_recv() {
                Ok(FeedEvent::Snapshot(world)) => {
                    if drained.latest.replace(world).is_some() {
                        drained.superseded += 1;
                    }
                }
                Ok(FeedEvent::Rejected(reason)) => drained.rejected.push(reason),
                Ok(FeedEvent::Closed(reason)) => drained.closed = Some(reason),
                // The worker always reports `Closed` before it exits.
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        drained
    }
}

fn parse_event(text: &str) -> FeedEvent {
    match World::from_json(text) {
        Ok(world) => FeedEvent::Snapshot(world),
        Err(err) => {
            warn!(%err, "rejected snapshot");
            FeedEvent::Rejected(err.to_string())
        }
    }
}

fn run_socket(
    mut socket: WebSocket<MaybeTlsStream<TcpStream>>,
    events: Sender<FeedEvent>,
    commands: Receiver<ControlCommand>,
) {
    loop {
        loop {
            match commands.try_recv() {
                Ok(command) => match socket.send(Message::Text(command.as_str().into())) {
                    Ok(()) => debug!(command = command.as_str(), "sent control frame"),
                    Err(err) => warn!(%err, command = command.as_str(), "control frame failed"),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    return;
                }
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                if events.send(parse_event(&text)).is_err() {
                    let _ = socket.close(None);
                    return;
                }
            }
            Ok(Message::Close(frame)) => {
                info!("snapshot feed closed by peer");
                let _ = events.send(FeedEvent::Closed(frame.map(|f| f.reason.to_string())));
                return;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                let _ = events.send(FeedEvent::Closed(None));
                return;
            }
            Err(err) => {
                warn!(%err, "snapshot feed failed");
                let _ = events.send(FeedEvent::Closed(Some(err.to_string())));
                return;
            }
        }
    }
}

fn run_replay(
    lines: Vec<String>,
    interval: Duration,
    events: Sender<FeedEvent>,
    commands: Receiver<ControlCommand>,
) {
    let mut paused = false;
    let mut lines = lines.into_iter();
    loop {
        while let Ok(command) = commands.try_recv() {
            paused = command == ControlCommand::Stop;
        }
        if paused {
            match commands.recv() {
                Ok(command) => {
                    paused = command == ControlCommand::Stop;
                    continue;
                }
                Err(_) => return,
            }
        }

        let Some(line) = lines.next() else {
            let _ = events.send(FeedEvent::Closed(Some("replay finished".into())));
            return;
        };
        if events.send(parse_event(&line)).is_err() {
            return;
        }

        match commands.recv_timeout(interval) {
            Ok(command) => paused = command == ControlCommand::Stop,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
