use std::io;

use crossterm::{cursor, queue, style};

use crate::dump::GridStats;
use crate::fill::FillScheme;
use crate::types::World;

use super::state::{Detail, FeedStatus, ViewerState};
use super::ui::Layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Title,
    Plain,
    Dim,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub tone: Tone,
}

impl Line {
    fn new(tone: Tone, text: impl Into<String>) -> Self {
        Line {
            text: text.into(),
            tone,
        }
    }

    fn blank() -> Self {
        Line::new(Tone::Plain, "")
    }
}

pub struct SidebarView<'a> {
    pub world: Option<&'a World>,
    pub scheme: FillScheme,
    pub zoom: Option<f64>,
    pub state: &'a ViewerState,
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}

fn field(label: &str, value: impl std::fmt::Display) -> Line {
    Line::new(Tone::Plain, format!("{label:<12}{value}"))
}

/// Break `text` into lines of at most `width` characters.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for raw in text.lines() {
        let chars: Vec<char> = raw.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
        }
        for chunk in chars.chunks(width) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}

pub fn sidebar_lines(view: &SidebarView<'_>, width: usize) -> Vec<Line> {
    let state = view.state;
    let mut lines = Vec::new();

    match view.world {
        None => lines.push(Line::new(Tone::Dim, "No snapshot yet")),
        Some(world) => {
            let stats = if world.islands.is_empty() {
                lines.push(Line::new(Tone::Title, "World"));
                GridStats::from_world(world)
            } else {
                let index = if state.selected_island < world.islands.len() {
                    state.selected_island
                } else {
                    world.observed_island_id
                };
                lines.push(Line::new(
                    Tone::Title,
                    format!("Island {} of {}", index + 1, world.islands.len()),
                ));
                world
                    .islands
                    .get(index)
                    .map(GridStats::from_island)
                    .unwrap_or_default()
            };
            lines.push(field("Computers", stats.computers));
            lines.push(field("Processors", stats.processors));
            lines.push(field("Proc/comp", ratio(stats.processors_per_computer())));
            lines.push(field("Bound/comp", ratio(stats.bound_per_computer())));
            lines.push(field("Memory/comp", ratio(stats.memory_per_computer())));
            lines.push(field("Free", stats.free_resources));
            lines.push(field("Bound", stats.bound_resources));
            lines.push(field("Memory", stats.memory));
            lines.push(field("Total", stats.total_resources()));
        }
    }

    lines.push(Line::blank());
    lines.push(field("Scheme", view.scheme.name()));
    if let Some(zoom) = view.zoom {
        lines.push(field("Zoom", format!("{zoom:.2}x")));
    }
    match &state.feed {
        FeedStatus::Waiting => lines.push(field("Feed", "waiting")),
        FeedStatus::Live => lines.push(field("Feed", "live")),
        FeedStatus::Paused => lines.push(field("Feed", "paused")),
        FeedStatus::Closed(reason) => {
            lines.push(field("Feed", "closed"));
            if let Some(reason) = reason {
                lines.extend(wrap(reason, width).into_iter().map(|l| Line::new(Tone::Dim, l)));
            }
        }
    }

    lines.push(Line::blank());
    let Some(press) = &state.pressed else {
        lines.push(Line::new(Tone::Dim, "Click a cell for details"));
        return lines;
    };
    lines.push(Line::new(Tone::Title, format!("Cell ({}, {})", press.x, press.y)));
    lines.push(field("Free", press.location.free_resources));
    match press.location.computer {
        Some(computer) => {
            lines.push(field("Memory", computer.memory_size));
            lines.push(field("Processors", computer.processors));
            lines.push(field("Bound", computer.bound_resources));
        }
        None => lines.push(Line::new(Tone::Dim, "No computer")),
    }
    lines.push(Line::blank());
    match &state.detail {
        Detail::Idle => {}
        Detail::Pending => lines.push(Line::new(Tone::Dim, "Loading program...")),
        Detail::Code(code) => {
            lines.extend(code.lines().map(|l| {
                Line::new(Tone::Plain, l.chars().take(width).collect::<String>())
            }));
        }
        Detail::Failed(message) => {
            lines.extend(wrap(message, width).into_iter().map(|l| Line::new(Tone::Error, l)));
        }
    }
    lines
}

pub fn render_sidebar(
    stdout: &mut io::Stdout,
    layout: &Layout,
    view: &SidebarView<'_>,
) -> anyhow::Result<()> {
    if layout.sidebar_width == 0 {
        return Ok(());
    }

    let panel_x = layout.sidebar_x();
    let width = layout.sidebar_width.saturating_sub(3) as usize;
    let lines = sidebar_lines(view, width);

    for y in 0..layout.canvas_height {
        queue!(
            stdout,
            cursor::MoveTo(panel_x, layout.canvas_y + y),
            style::Print("\u{2502} "),
        )?;
        let Some(line) = lines.get(y as usize) else {
            queue!(stdout, style::Print(" ".repeat(width)))?;
            continue;
        };
        let text: String = line.text.chars().take(width).collect();
        let padded = format!("{text:<width$}");
        let mut cs = style::ContentStyle::default();
        match line.tone {
            Tone::Title => cs.attributes.set(style::Attribute::Bold),
            Tone::Dim => cs.attributes.set(style::Attribute::Dim),
            Tone::Error => cs.foreground_color = Some(style::Color::Red),
            Tone::Plain => {}
        }
        queue!(
            stdout,
            style::PrintStyledContent(style::StyledContent::new(cs, padded))
        )?;
    }
    Ok(())
}
