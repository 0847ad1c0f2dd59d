mod canvas;
mod input;
mod menubar;
mod sidebar;
mod state;
mod ui;

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{cursor, event, execute, queue, style, terminal};
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::dispatcher::{Dispatcher, Update};
use crate::remote::{ApiEvent, ControlCommand, RemoteApi, SnapshotFeed};
use crate::router::{CellPress, InteractionRouter};

pub use canvas::{rasterize, CellMetrics, Raster};
pub use ui::Layout;

use canvas::Canvas;
use input::Action;
use sidebar::SidebarView;
use state::{FeedStatus, ViewerState};

/// Upper bound on how long the loop waits for input before pumping the feed.
const FRAME: Duration = Duration::from_millis(33);

/// How much of the screen needs repainting, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Redraw {
    Nothing,
    Panels,
    Canvas,
    Full,
}

impl Redraw {
    fn merge(&mut self, other: Redraw) {
        *self = (*self).max(other);
    }
}

/// Repaint the canvas only when a viewport exists and reported movement.
fn canvas_if(changed: Option<bool>) -> Redraw {
    match changed {
        Some(true) => Redraw::Canvas,
        _ => Redraw::Nothing,
    }
}

pub struct Viewer {
    config: ViewerConfig,
    metrics: CellMetrics,
    layout: Layout,
    dispatcher: Dispatcher,
    feed: SnapshotFeed,
    api: Option<RemoteApi>,
    presses: Receiver<CellPress>,
    state: ViewerState,
    canvas: Canvas,
    fullscreen: bool,
    last_tick: Instant,
}

impl Viewer {
    pub fn new(config: ViewerConfig, feed: SnapshotFeed, api: Option<RemoteApi>) -> Self {
        let (press_tx, presses) = mpsc::channel();
        let router = InteractionRouter::new(move |press| {
            let _ = press_tx.send(press);
        });
        let dispatcher = Dispatcher::new(config.dispatcher_options(), (0.0, 0.0), router);
        Viewer {
            metrics: CellMetrics::new(config.column_px, config.row_px),
            layout: Layout::compute(0, 0),
            config,
            dispatcher,
            feed,
            api,
            presses,
            state: ViewerState::default(),
            canvas: Canvas::default(),
            fullscreen: false,
            last_tick: Instant::now(),
        }
    }

    /// Run the viewer in the terminal.
    ///
    /// Sets up the terminal, enters the event loop, and restores the terminal
    /// on exit (even on error).
    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();

        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            event::EnableMouseCapture,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.main_loop(&mut stdout);

        let _ = execute!(
            stdout,
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();

        result
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    fn main_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        let (w, h) = terminal::size()?;
        self.resize(w, h);
        if let Some(api) = &self.api {
            api.observe(self.state.selected_island);
        }
        info!(source = self.feed.source(), "viewer started");

        let mut redraw = Redraw::Full;
        loop {
            self.paint(stdout, redraw)?;
            redraw = Redraw::Nothing;

            if event::poll(FRAME)? {
                let event = event::read()?;
                match input::handle_event(&self.config, &self.layout, event) {
                    Action::Quit => break,
                    action => redraw.merge(self.perform(action, stdout)?),
                }
            }

            redraw.merge(self.pump_presses());
            redraw.merge(self.pump_feed());
            redraw.merge(self.pump_api());
            redraw.merge(self.tick());
            if self.state.expire_status(Instant::now()) {
                redraw.merge(Redraw::Panels);
            }
        }

        info!("viewer stopped");
        Ok(())
    }

    fn perform(&mut self, action: Action, stdout: &mut io::Stdout) -> Result<Redraw> {
        let metrics = self.metrics;
        let redraw = match action {
            Action::Continue | Action::Quit => Redraw::Nothing,
            Action::Redraw => Redraw::Full,
            Action::Resize(w, h) => {
                self.resize(w, h);
                Redraw::Full
            }
            Action::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                if self.fullscreen {
                    stdout.write_all(b"\x1b[10;1t")?;
                } else {
                    stdout.write_all(b"\x1b[10;0t")?;
                }
                stdout.flush()?;
                Redraw::Full
            }
            Action::Pan { columns, rows } => {
                let dx = columns as f64 * metrics.column_px;
                let dy = rows as f64 * metrics.row_px;
                let moved = self.dispatcher.viewport_mut().map(|viewport| viewport.pan_by(dx, dy));
                canvas_if(moved)
            }
            Action::Zoom { factor, at } => {
                let anchor = match at {
                    Some((column, row)) => metrics.center(column, row),
                    None => {
                        let (w, h) = metrics
                            .screen_size(self.layout.canvas_width, self.layout.canvas_height);
                        (w / 2.0, h / 2.0)
                    }
                };
                let zoomed = self
                    .dispatcher
                    .viewport_mut()
                    .map(|viewport| viewport.zoom_at(factor, anchor));
                canvas_if(zoomed)
            }
            Action::NextScheme => {
                let scheme = self.dispatcher.scheme().next();
                let damage = self.dispatcher.set_scheme(scheme);
                self.state.notify(format!("Fill scheme: {}", scheme.name()));
                if damage.is_empty() {
                    Redraw::Panels
                } else {
                    Redraw::Canvas
                }
            }
            Action::Island(delta) => {
                let count = self.dispatcher.world().map_or(0, |w| w.islands.len());
                if let Some(island) = self.state.step_island(delta, count) {
                    match &self.api {
                        Some(api) => api.observe(island),
                        None => debug!(island, "no API configured, selection stays local"),
                    }
                }
                Redraw::Panels
            }
            Action::Control(command) => {
                if self.feed.send(command) {
                    self.state.feed = match command {
                        ControlCommand::Stop => FeedStatus::Paused,
                        ControlCommand::Start => FeedStatus::Live,
                    };
                    self.state.notify(format!("Sent {}", command.as_str()));
                } else {
                    self.state.notify("Feed is closed");
                }
                Redraw::Panels
            }
            Action::ClearDetail => {
                self.state.clear_detail();
                Redraw::Panels
            }
            Action::Press { column, row } => {
                let point = metrics.center(column, row);
                // Resolved presses arrive through the router callback.
                self.dispatcher.press(point);
                if let Some(viewport) = self.dispatcher.viewport_mut() {
                    viewport.drag_start(point);
                }
                Redraw::Nothing
            }
            Action::Drag { column, row } => {
                let point = metrics.center(column, row);
                let moved = self.dispatcher.viewport_mut().map(|viewport| viewport.drag_move(point));
                canvas_if(moved)
            }
            Action::Release => {
                if let Some(viewport) = self.dispatcher.viewport_mut() {
                    viewport.drag_end();
                }
                Redraw::Canvas
            }
        };
        Ok(redraw)
    }

    fn resize(&mut self, w: u16, h: u16) {
        self.layout = Layout::compute(w, h);
        let (sw, sh) = self
            .metrics
            .screen_size(self.layout.canvas_width, self.layout.canvas_height);
        self.dispatcher.set_screen(sw, sh);
        self.canvas.invalidate();
    }

    // -----------------------------------------------------------------------
    // Channels
    // -----------------------------------------------------------------------

    fn pump_presses(&mut self) -> Redraw {
        let mut redraw = Redraw::Nothing;
        while let Ok(press) = self.presses.try_recv() {
            let (x, y) = (press.x, press.y);
            self.state.cell_pressed(press);
            match &self.api {
                Some(api) => api.request_detail(x, y),
                None => {
                    self.state.detail = state::Detail::Failed("No detail API configured".into())
                }
            }
            redraw = Redraw::Panels;
        }
        redraw
    }

    fn pump_feed(&mut self) -> Redraw {
        let drained = self.feed.drain();
        let mut redraw = Redraw::Nothing;

        self.state.superseded += drained.superseded as u64;
        if let Some(reason) = drained.rejected.last() {
            self.state.rejected += drained.rejected.len() as u64;
            self.state.notify(format!("Rejected snapshot: {reason}"));
            redraw = Redraw::Panels;
        }

        if let Some(world) = drained.latest {
            if self.state.feed == FeedStatus::Waiting {
                self.state.feed = FeedStatus::Live;
            }
            match self.dispatcher.apply(world) {
                Ok(Update::Rebuilt { epoch, shape, .. }) => {
                    self.state.applied += 1;
                    self.canvas.invalidate();
                    self.state.notify(format!("Grid {shape} (epoch {})", epoch.0));
                    redraw.merge(Redraw::Canvas);
                }
                Ok(Update::Patched { damage }) => {
                    self.state.applied += 1;
                    redraw.merge(if damage.is_empty() {
                        Redraw::Panels
                    } else {
                        Redraw::Canvas
                    });
                }
                Err(err) => {
                    warn!(%err, "snapshot not applied");
                    self.state.rejected += 1;
                    self.state.notify(format!("Rejected snapshot: {err}"));
                    redraw.merge(Redraw::Panels);
                }
            }
        }

        if let Some(reason) = drained.closed {
            info!(reason = reason.as_deref().unwrap_or("none"), "feed closed");
            self.state.feed = FeedStatus::Closed(reason);
            redraw.merge(Redraw::Panels);
        }
        redraw
    }

    fn pump_api(&mut self) -> Redraw {
        let Some(api) = &self.api else {
            return Redraw::Nothing;
        };
        let mut redraw = Redraw::Nothing;
        for event in api.poll() {
            match event {
                ApiEvent::Detail(outcome) => {
                    if self.state.detail_arrived(outcome) {
                        redraw = Redraw::Panels;
                    }
                }
                ApiEvent::Observed(island) => debug!(island, "observe acknowledged"),
                ApiEvent::ObserveFailed { island, error } => {
                    self.state
                        .notify(format!("Could not observe island {}: {error}", island + 1));
                    redraw = Redraw::Panels;
                }
            }
        }
        redraw
    }

    fn tick(&mut self) -> Redraw {
        let now = Instant::now();
        let elapsed = now - self.last_tick;
        self.last_tick = now;
        let animated = self.dispatcher.viewport_mut().map(|viewport| viewport.tick(elapsed));
        canvas_if(animated)
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn paint(&mut self, stdout: &mut io::Stdout, redraw: Redraw) -> Result<()> {
        if redraw == Redraw::Nothing {
            return Ok(());
        }
        if redraw == Redraw::Full {
            queue!(stdout, terminal::Clear(terminal::ClearType::All))?;
            self.canvas.invalidate();
            menubar::render_menubar(stdout, &self.layout, &self.config.key_bindings)?;
        }
        if redraw >= Redraw::Canvas {
            let painted =
                self.canvas
                    .draw(stdout, &self.layout, self.dispatcher.scene(), self.metrics)?;
            debug!(painted, "canvas drawn");
        }

        let view = SidebarView {
            world: self.dispatcher.world(),
            scheme: self.dispatcher.scheme(),
            zoom: self.dispatcher.scene().map(|s| s.viewport().zoom()),
            state: &self.state,
        };
        sidebar::render_sidebar(stdout, &self.layout, &view)?;
        self.render_status(stdout)?;
        stdout.flush()?;
        Ok(())
    }

    fn render_status(&self, stdout: &mut io::Stdout) -> Result<()> {
        if self.layout.status_y < self.layout.canvas_y + self.layout.canvas_height {
            return Ok(()); // No room for status bar.
        }

        let status = match self.state.status_message() {
            Some(message) => format!(" {message}"),
            None => {
                let shape = self
                    .dispatcher
                    .scene()
                    .map_or_else(|| "-".to_string(), |s| s.shape().to_string());
                format!(
                    " {} | grid {} | {} applied, {} dropped, {} rejected",
                    self.feed.source(),
                    shape,
                    self.state.applied,
                    self.state.superseded,
                    self.state.rejected,
                )
            }
        };
        let width = self.layout.term_width as usize;
        let status: String = status.chars().take(width).collect();

        let mut cs = style::ContentStyle::default();
        cs.attributes.set(style::Attribute::Dim);

        queue!(
            stdout,
            cursor::MoveTo(0, self.layout.status_y),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::PrintStyledContent(style::StyledContent::new(cs, status)),
        )?;
        Ok(())
    }
}
