//! Terminal rasterization of the scene.
//!
//! Each terminal cell samples the grid at its center pixel. The first frame
//! after an invalidation is painted in full; later frames only repaint the
//! terminal cells whose color differs from the previous frame.

use std::io;

use crossterm::{cursor, queue, style};

use crate::dispatcher::Scene;
use crate::types::Color;

use super::ui::Layout;

/// Fill of every terminal cell on the canvas; `None` is outside the grid.
pub type Raster = Vec<Vec<Option<Color>>>;

/// Screen pixels covered by one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub column_px: f64,
    pub row_px: f64,
}

impl CellMetrics {
    pub fn new(column_px: u32, row_px: u32) -> Self {
        CellMetrics {
            column_px: column_px as f64,
            row_px: row_px as f64,
        }
    }

    /// Center of a canvas-relative terminal cell in screen pixels.
    pub fn center(&self, column: u16, row: u16) -> (f64, f64) {
        (
            (column as f64 + 0.5) * self.column_px,
            (row as f64 + 0.5) * self.row_px,
        )
    }

    pub fn screen_size(&self, columns: u16, rows: u16) -> (f64, f64) {
        (columns as f64 * self.column_px, rows as f64 * self.row_px)
    }
}

pub fn rasterize(scene: &Scene, columns: u16, rows: u16, metrics: CellMetrics) -> Raster {
    let viewport = scene.viewport();
    let registry = scene.registry();
    (0..rows)
        .map(|row| {
            (0..columns)
                .map(|column| {
                    let point = metrics.center(column, row);
                    let (wx, wy) = viewport.screen_to_world(point)?;
                    registry.cell_at(wx, wy).map(|visual| visual.fill)
                })
                .collect()
        })
        .collect()
}

/// Terminal cells whose fill differs, as `(column, row, fill)`.
pub fn diff(prev: &Raster, next: &Raster) -> Vec<(u16, u16, Option<Color>)> {
    let mut changes = Vec::new();
    for (y, (prev_row, next_row)) in prev.iter().zip(next).enumerate() {
        for (x, (prev_fill, next_fill)) in prev_row.iter().zip(next_row).enumerate() {
            if prev_fill != next_fill {
                changes.push((x as u16, y as u16, *next_fill));
            }
        }
    }
    changes
}

fn same_size(a: &Raster, b: &Raster) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(ra, rb)| ra.len() == rb.len())
}

#[derive(Debug, Default)]
pub struct Canvas {
    prev: Option<Raster>,
}

impl Canvas {
    /// Force the next draw to repaint every cell.
    pub fn invalidate(&mut self) {
        self.prev = None;
    }

    /// Draw the scene into the canvas area. Returns the number of cells painted.
    pub fn draw(
        &mut self,
        stdout: &mut io::Stdout,
        layout: &Layout,
        scene: Option<&Scene>,
        metrics: CellMetrics,
    ) -> anyhow::Result<usize> {
        let Some(scene) = scene else {
            self.prev = None;
            draw_placeholder(stdout, layout)?;
            return Ok(0);
        };

        let next = rasterize(scene, layout.canvas_width, layout.canvas_height, metrics);
        let painted = match self.prev.as_ref().filter(|prev| same_size(prev, &next)) {
            Some(prev) => {
                let changes = diff(prev, &next);
                for &(x, y, fill) in &changes {
                    queue!(
                        stdout,
                        cursor::MoveTo(layout.canvas_x + x, layout.canvas_y + y)
                    )?;
                    paint(stdout, fill)?;
                }
                changes.len()
            }
            None => {
                for (y, row) in next.iter().enumerate() {
                    queue!(
                        stdout,
                        cursor::MoveTo(layout.canvas_x, layout.canvas_y + y as u16)
                    )?;
                    for fill in row {
                        paint(stdout, *fill)?;
                    }
                }
                next.iter().map(Vec::len).sum()
            }
        };
        self.prev = Some(next);
        Ok(painted)
    }
}

fn paint(stdout: &mut io::Stdout, fill: Option<Color>) -> anyhow::Result<()> {
    let mut cs = style::ContentStyle::default();
    cs.background_color = fill.as_ref().map(to_ct_color);
    queue!(
        stdout,
        style::PrintStyledContent(style::StyledContent::new(cs, ' '))
    )?;
    Ok(())
}

fn draw_placeholder(stdout: &mut io::Stdout, layout: &Layout) -> anyhow::Result<()> {
    let blank = " ".repeat(layout.canvas_width as usize);
    for y in 0..layout.canvas_height {
        queue!(
            stdout,
            cursor::MoveTo(layout.canvas_x, layout.canvas_y + y),
            style::Print(&blank),
        )?;
    }
    let message = "waiting for snapshot...";
    if layout.canvas_height > 0 && layout.canvas_width as usize > message.len() {
        queue!(
            stdout,
            cursor::MoveTo(
                layout.canvas_x + (layout.canvas_width - message.len() as u16) / 2,
                layout.canvas_y + layout.canvas_height / 2,
            ),
            style::SetAttribute(style::Attribute::Dim),
            style::Print(message),
            style::SetAttribute(style::Attribute::Reset),
        )?;
    }
    Ok(())
}

pub fn to_ct_color(c: &Color) -> style::Color {
    style::Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}
