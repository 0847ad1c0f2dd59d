//! Cell visual registry: one visual primitive per grid cell.
//!
//! The registry mirrors exactly one grid shape. `cells[row][col]` is the only
//! handle to a primitive: hit lookups compute that index arithmetically and
//! read it back, so there is no second structure to drift out of sync.

use thiserror::Error;

use crate::fill::{FillLimits, FillScheme};
use crate::router::{InteractionRouter, PressBinding};
use crate::types::{Color, GridShape, World};

/// Identity of one (shape, viewport, registry) generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Epoch(pub u64);

impl Epoch {
    /// Never issued to a registry; bindings carrying it are always inert.
    pub const NONE: Epoch = Epoch(0);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellVisual {
    /// Top-left corner in world pixels.
    pub position: (u32, u32),
    pub size: u32,
    pub fill: Color,
    pub binding: PressBinding,
}

/// Cells whose fill changed during a patch, as `(row, col)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Damage {
    pub cells: Vec<(usize, usize)>,
}

impl Damage {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry built for {registry}, snapshot is {snapshot}")]
    ShapeMismatch {
        registry: GridShape,
        snapshot: GridShape,
    },
}

#[derive(Debug)]
pub struct Registry {
    epoch: Epoch,
    shape: GridShape,
    cell_size: u32,
    cells: Vec<Vec<CellVisual>>,
}

impl Registry {
    /// Create one primitive per cell of `world` and bind its press handler.
    ///
    /// `world` must already be validated against `shape`.
    pub fn build(
        world: &World,
        shape: GridShape,
        scheme: FillScheme,
        limits: &FillLimits,
        cell_size: u32,
        epoch: Epoch,
        router: &mut InteractionRouter,
    ) -> Self {
        debug_assert_eq!(world.locations.len(), shape.height);
        router.begin_epoch(epoch);

        let cells = world
            .locations
            .iter()
            .enumerate()
            .map(|(row, locations)| {
                debug_assert_eq!(locations.len(), shape.width);
                locations
                    .iter()
                    .enumerate()
                    .map(|(col, location)| CellVisual {
                        position: (col as u32 * cell_size, row as u32 * cell_size),
                        size: cell_size,
                        fill: scheme.classify(location, limits),
                        binding: router.bind(row, col),
                    })
                    .collect()
            })
            .collect();

        Registry {
            epoch,
            shape,
            cell_size,
            cells,
        }
    }

    /// Recolor every primitive from `world`. Returns the cells whose fill changed.
    pub fn patch(
        &mut self,
        world: &World,
        scheme: FillScheme,
        limits: &FillLimits,
    ) -> Result<Damage, RegistryError> {
        let snapshot = world.declared_shape().unwrap_or(GridShape::new(
            world.locations.first().map_or(0, Vec::len),
            world.locations.len(),
        ));
        let rows_match = world.locations.len() == self.shape.height
            && world.locations.iter().all(|r| r.len() == self.shape.width);
        if snapshot != self.shape || !rows_match {
            return Err(RegistryError::ShapeMismatch {
                registry: self.shape,
                snapshot,
            });
        }

        let mut damage = Damage::default();
        for (row, (visuals, locations)) in self.cells.iter_mut().zip(&world.locations).enumerate() {
            for (col, (visual, location)) in visuals.iter_mut().zip(locations).enumerate() {
                let fill = scheme.classify(location, limits);
                if visual.fill != fill {
                    visual.fill = fill;
                    damage.cells.push((row, col));
                }
            }
        }
        Ok(damage)
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Extent of the grid in world pixels.
    pub fn pixel_size(&self) -> (f64, f64) {
        (
            (self.shape.width as u64 * self.cell_size as u64) as f64,
            (self.shape.height as u64 * self.cell_size as u64) as f64,
        )
    }

    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellVisual> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// The primitive covering a world-pixel point.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<&CellVisual> {
        if x < 0.0 || y < 0.0 || self.cell_size == 0 {
            return None;
        }
        let size = self.cell_size as f64;
        self.cell((y / size) as usize, (x / size) as usize)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellVisual]> {
        self.cells.iter().map(Vec::as_slice)
    }
}
