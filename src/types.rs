//! Shared boundary types for the world viewer.
//!
//! This module defines the two key data contracts:
//! - Remote → Dispatcher (wire): `World` snapshots, one complete grid per message
//! - Classifier → Terminal (in-memory): `Color` fills per cell

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Shared style primitives
// ---------------------------------------------------------------------------

/// A 24-bit terminal color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn hex(rgb: u32) -> Self {
        Color {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }
}

// ---------------------------------------------------------------------------
// Remote → Dispatcher boundary (one full snapshot per message)
// ---------------------------------------------------------------------------

/// Grid dimensions in cells. Two snapshots with equal shapes share a render epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub width: usize,
    pub height: usize,
}

impl GridShape {
    pub const fn new(width: usize, height: usize) -> Self {
        GridShape { width, height }
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Computer {
    pub memory_size: u64,
    pub processors: u64,
    pub bound_resources: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub free_resources: u64,
    #[serde(default)]
    pub computer: Option<Computer>,
}

impl Location {
    pub const fn empty(free_resources: u64) -> Self {
        Location {
            free_resources,
            computer: None,
        }
    }

    pub const fn occupied(free_resources: u64, computer: Computer) -> Self {
        Location {
            free_resources,
            computer: Some(computer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Island {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub total_free_resources: u64,
    #[serde(default)]
    pub total_bound_resources: u64,
    #[serde(default)]
    pub total_memory_resources: u64,
    #[serde(default)]
    pub total_computers: u64,
    #[serde(default)]
    pub total_processors: u64,
}

impl Island {
    pub fn shape(&self) -> GridShape {
        GridShape::new(self.width, self.height)
    }
}

/// One full snapshot of the simulated grid.
///
/// The locations always describe the observed grid: the observed island when
/// `islands` is non-empty, otherwise the whole world sized by `width`/`height`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct World {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    pub locations: Vec<Vec<Location>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub islands: Vec<Island>,
    #[serde(default)]
    pub observed_island_id: usize,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot carries neither width/height nor islands")]
    MissingShape,
    #[error("observed island {observed} out of range ({count} islands)")]
    ObservedIsland { observed: usize, count: usize },
    #[error("expected {expected} rows, snapshot has {actual}")]
    RowCount { expected: usize, actual: usize },
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl World {
    /// A world without islands whose shape is given by `locations`.
    pub fn from_rows(locations: Vec<Vec<Location>>) -> Self {
        let height = locations.len();
        let width = locations.first().map_or(0, Vec::len);
        World {
            width: Some(width),
            height: Some(height),
            locations,
            islands: Vec::new(),
            observed_island_id: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let world: World = serde_json::from_str(json)?;
        world.validate()?;
        Ok(world)
    }

    pub fn observed_island(&self) -> Option<&Island> {
        self.islands.get(self.observed_island_id)
    }

    /// The declared shape of the observed grid, without checking `locations`.
    pub fn declared_shape(&self) -> Result<GridShape, SnapshotError> {
        if !self.islands.is_empty() {
            return self
                .observed_island()
                .map(Island::shape)
                .ok_or(SnapshotError::ObservedIsland {
                    observed: self.observed_island_id,
                    count: self.islands.len(),
                });
        }
        match (self.width, self.height) {
            (Some(width), Some(height)) => Ok(GridShape::new(width, height)),
            _ => Err(SnapshotError::MissingShape),
        }
    }

    /// Check that `locations` matches the declared shape exactly.
    pub fn validate(&self) -> Result<GridShape, SnapshotError> {
        let shape = self.declared_shape()?;
        if self.locations.len() != shape.height {
            return Err(SnapshotError::RowCount {
                expected: shape.height,
                actual: self.locations.len(),
            });
        }
        for (row, cells) in self.locations.iter().enumerate() {
            if cells.len() != shape.width {
                return Err(SnapshotError::RowLength {
                    row,
                    expected: shape.width,
                    actual: cells.len(),
                });
            }
        }
        Ok(shape)
    }

    pub fn location(&self, row: usize, col: usize) -> Option<&Location> {
        self.locations.get(row).and_then(|r| r.get(col))
    }
}
