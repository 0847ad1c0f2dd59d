//! Plain-text rendering of a snapshot for the `dump` subcommand.

use std::fmt;

use crate::types::{Island, Location, World};

pub fn glyph(location: &Location) -> char {
    if location.computer.is_some() {
        '#'
    } else if location.free_resources > 5000 {
        'X'
    } else if location.free_resources > 2000 {
        'x'
    } else if location.free_resources > 0 {
        '.'
    } else {
        ' '
    }
}

/// Totals over the cells of one grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    pub computers: u64,
    pub processors: u64,
    pub free_resources: u64,
    pub bound_resources: u64,
    pub memory: u64,
}

impl GridStats {
    pub fn from_world(world: &World) -> Self {
        let mut stats = GridStats::default();
        for location in world.locations.iter().flatten() {
            stats.free_resources = stats.free_resources.saturating_add(location.free_resources);
            if let Some(computer) = location.computer {
                stats.computers += 1;
                stats.processors = stats.processors.saturating_add(computer.processors);
                stats.bound_resources =
                    stats.bound_resources.saturating_add(computer.bound_resources);
                stats.memory = stats.memory.saturating_add(computer.memory_size);
            }
        }
        stats
    }

    pub fn from_island(island: &Island) -> Self {
        GridStats {
            computers: island.total_computers,
            processors: island.total_processors,
            free_resources: island.total_free_resources,
            bound_resources: island.total_bound_resources,
            memory: island.total_memory_resources,
        }
    }

    /// Sum of free, bound and memory resources, saturating at `u64::MAX`.
    pub fn total_resources(&self) -> u64 {
        self.free_resources
            .saturating_add(self.bound_resources)
            .saturating_add(self.memory)
    }

    pub fn processors_per_computer(&self) -> Option<f64> {
        self.per_computer(self.processors)
    }

    pub fn bound_per_computer(&self) -> Option<f64> {
        self.per_computer(self.bound_resources)
    }

    pub fn memory_per_computer(&self) -> Option<f64> {
        self.per_computer(self.memory)
    }

    fn per_computer(&self, total: u64) -> Option<f64> {
        (self.computers > 0).then(|| total as f64 / self.computers as f64)
    }
}

struct Ratio(Option<f64>);

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:>8.3}"),
            None => write!(f, "{:>8}", "-"),
        }
    }
}

impl fmt::Display for GridStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Computers : {:>8}", self.computers)?;
        writeln!(f, "Processors: {:>8}", self.processors)?;
        writeln!(f, "Proc per computer  : {}", Ratio(self.processors_per_computer()))?;
        writeln!(f, "Bound per computer : {}", Ratio(self.bound_per_computer()))?;
        writeln!(f, "Memory per computer: {}", Ratio(self.memory_per_computer()))?;
        writeln!(
            f,
            "Resources Free: {:>10} Bound: {:>8} Memory: {:>8} Total {:>10}",
            self.free_resources,
            self.bound_resources,
            self.memory,
            self.total_resources()
        )
    }
}

/// The grid as one glyph per cell, followed by its statistics.
pub struct AsciiDump<'a>(pub &'a World);

impl fmt::Display for AsciiDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.0.locations {
            let line: String = row.iter().map(glyph).collect();
            writeln!(f, "{line}")?;
        }
        write!(f, "{}", GridStats::from_world(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Computer;

    fn computer(memory_size: u64, processors: u64, bound_resources: u64) -> Computer {
        Computer {
            memory_size,
            processors,
            bound_resources,
        }
    }

    #[test]
    fn glyph_thresholds() {
        assert_eq!(glyph(&Location::empty(0)), ' ');
        assert_eq!(glyph(&Location::empty(1)), '.');
        assert_eq!(glyph(&Location::empty(2000)), '.');
        assert_eq!(glyph(&Location::empty(2001)), 'x');
        assert_eq!(glyph(&Location::empty(5000)), 'x');
        assert_eq!(glyph(&Location::empty(5001)), 'X');
        assert_eq!(glyph(&Location::occupied(0, computer(1, 1, 1))), '#');
    }

    #[test]
    fn dump_draws_rows_then_stats() {
        let world = World::from_rows(vec![
            vec![Location::empty(0), Location::empty(3000)],
            vec![Location::occupied(10, computer(4, 2, 6)), Location::empty(9000)],
        ]);
        let text = AsciiDump(&world).to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(" x"));
        assert_eq!(lines.next(), Some("#X"));
        assert_eq!(lines.next(), Some("Computers :        1"));
        assert!(text.contains("Proc per computer  :    2.000"));
        assert!(text.contains("Total      12020"));
    }

    #[test]
    fn ratios_without_computers_are_blank() {
        let world = World::from_rows(vec![vec![Location::empty(5)]]);
        let stats = GridStats::from_world(&world);
        assert_eq!(stats.computers, 0);
        assert_eq!(stats.processors_per_computer(), None);
        assert!(stats.to_string().contains("Memory per computer:        -"));
    }

    #[test]
    fn island_totals_carry_over() {
        let island = Island {
            width: 2,
            height: 2,
            total_free_resources: 100,
            total_bound_resources: 40,
            total_memory_resources: 20,
            total_computers: 4,
            total_processors: 8,
        };
        let stats = GridStats::from_island(&island);
        assert_eq!(stats.total_resources(), 160);
        assert_eq!(stats.processors_per_computer(), Some(2.0));
        assert_eq!(stats.bound_per_computer(), Some(10.0));
        assert_eq!(stats.memory_per_computer(), Some(5.0));
    }

    #[test]
    fn huge_totals_saturate() {
        let half = u64::MAX / 2 + 1;
        let world = World::from_rows(vec![vec![
            Location::empty(half),
            Location::occupied(half, computer(u64::MAX, u64::MAX, u64::MAX)),
            Location::occupied(0, computer(1, 1, 1)),
        ]]);
        let stats = GridStats::from_world(&world);
        assert_eq!(stats.free_resources, u64::MAX);
        assert_eq!(stats.processors, u64::MAX);
        assert_eq!(stats.total_resources(), u64::MAX);
        assert!(AsciiDump(&world).to_string().contains(&u64::MAX.to_string()));

        let island = Island {
            width: 1,
            height: 1,
            total_free_resources: u64::MAX,
            total_bound_resources: u64::MAX,
            total_memory_resources: 1,
            total_computers: 2,
            total_processors: 4,
        };
        assert_eq!(GridStats::from_island(&island).total_resources(), u64::MAX);
    }
}
