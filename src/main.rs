use std::path::Path;
use std::time::Duration;
use std::{fs, process};

use anyhow::{bail, Context, Result};

use world_viewer::{
    app::Viewer,
    config::ViewerConfig,
    dump::AsciiDump,
    logging,
    remote::{http_base_from_ws, RemoteApi, SnapshotFeed},
    types::World,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const VIEW_USAGE: &str = "world-viewer view <ws-url>";
const REPLAY_USAGE: &str = "world-viewer replay <snapshots.jsonl>";
const DUMP_USAGE: &str = "world-viewer dump <snapshot.json>";

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("view") => {
            let url = args.next().context(VIEW_USAGE)?;
            view(&url)
        }
        Some("replay") => {
            let path = args.next().context(REPLAY_USAGE)?;
            replay(&path)
        }
        Some("dump") => {
            let path = args.next().context(DUMP_USAGE)?;
            dump(&path)
        }
        _ => bail!(
            "World Viewer: live terminal view of a simulated grid\n\nUsage:\n  {VIEW_USAGE}\n  {REPLAY_USAGE}\n  {DUMP_USAGE}"
        ),
    }
}

fn view(url: &str) -> Result<()> {
    let config = ViewerConfig::load();
    logging::init_file(config.log_file.as_deref())?;

    let base = match &config.http_base {
        Some(base) => base.clone(),
        None => http_base_from_ws(url)?,
    };
    let api = RemoteApi::new(base)?;
    let feed = SnapshotFeed::connect(url)?;

    let mut viewer = Viewer::new(config, feed, Some(api));
    viewer.run()
}

fn replay(path: &str) -> Result<()> {
    let config = ViewerConfig::load();
    logging::init_file(config.log_file.as_deref())?;

    let api = config.http_base.clone().map(RemoteApi::new).transpose()?;
    let interval = Duration::from_millis(config.replay_interval_ms);
    let feed = SnapshotFeed::replay(Path::new(path), interval)?;

    let mut viewer = Viewer::new(config, feed, api);
    viewer.run()
}

fn dump(path: &str) -> Result<()> {
    logging::init_stderr();

    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let world = World::from_json(&json).with_context(|| format!("Failed to parse {path}"))?;
    print!("{}", AsciiDump(&world));
    Ok(())
}
