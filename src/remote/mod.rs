//! Remote collaborators: the snapshot feed and the request/response API.
//!
//! Network work never runs on the UI thread. Snapshots are parsed on the feed
//! thread and handed over a channel; detail and observe requests run on
//! short-lived worker threads.

mod api;
mod feed;

use anyhow::{bail, Result};

pub use api::{ApiEvent, DetailOutcome, DetailResponse, RemoteApi};
pub use feed::{Drained, FeedEvent, SnapshotFeed};

/// Fire-and-forget control frames sent over the snapshot socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Stop,
    Start,
}

impl ControlCommand {
    pub const fn as_str(self) -> &'static str {
        match self {
            ControlCommand::Stop => "stop",
            ControlCommand::Start => "start",
        }
    }
}

/// `ws://host:port/ws` → `http://host:port`.
pub fn http_base_from_ws(url: &str) -> Result<String> {
    let (scheme, rest) = if let Some(rest) = url.strip_prefix("ws://") {
        ("http", rest)
    } else if let Some(rest) = url.strip_prefix("wss://") {
        ("https", rest)
    } else {
        bail!("not a websocket URL: {url}");
    };
    let authority = rest.split('/').next().unwrap_or_default();
    if authority.is_empty() {
        bail!("websocket URL has no host: {url}");
    }
    Ok(format!("{scheme}://{authority}"))
}
