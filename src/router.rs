//! Interaction router: turns a pointer press into a cell callback.
//!
//! Every visual primitive carries a `PressBinding` issued by `bind` while its
//! registry is built. A binding is only honored while its epoch is the
//! router's current epoch, so a primitive from a torn-down grid can never
//! fire.

use tracing::trace;

use crate::registry::{Epoch, Registry};
use crate::types::{Location, World};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressBinding {
    pub epoch: Epoch,
    pub row: usize,
    pub col: usize,
}

/// Payload handed to the caller: `x` is the column, `y` the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellPress {
    pub location: Location,
    pub x: usize,
    pub y: usize,
}

pub type PressCallback = Box<dyn FnMut(CellPress)>;

pub struct InteractionRouter {
    callback: Option<PressCallback>,
    epoch: Epoch,
    bindings: usize,
}

impl Default for InteractionRouter {
    fn default() -> Self {
        Self::unbound()
    }
}

impl InteractionRouter {
    pub fn new(callback: impl FnMut(CellPress) + 'static) -> Self {
        InteractionRouter {
            callback: Some(Box::new(callback)),
            epoch: Epoch::NONE,
            bindings: 0,
        }
    }

    /// A router with no callback; presses resolve but are never delivered.
    pub fn unbound() -> Self {
        InteractionRouter {
            callback: None,
            epoch: Epoch::NONE,
            bindings: 0,
        }
    }

    /// Start a new epoch. All bindings from earlier epochs become inert.
    pub fn begin_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch;
        self.bindings = 0;
    }

    /// Register the press handler of the primitive at `[row][col]`.
    pub fn bind(&mut self, row: usize, col: usize) -> PressBinding {
        self.bindings += 1;
        PressBinding {
            epoch: self.epoch,
            row,
            col,
        }
    }

    /// Bindings registered in the current epoch.
    pub fn binding_count(&self) -> usize {
        self.bindings
    }

    pub fn is_live(&self, binding: &PressBinding) -> bool {
        binding.epoch != Epoch::NONE && self.epoch == binding.epoch
    }

    /// Resolve a press at a screen point and invoke the callback.
    ///
    /// Returns the press only when a callback received it.
    pub fn press(
        &mut self,
        registry: &Registry,
        viewport: &Viewport,
        world: &World,
        point: (f64, f64),
    ) -> Option<CellPress> {
        let (wx, wy) = viewport.screen_to_world(point)?;
        let visual = registry.cell_at(wx, wy)?;
        let binding = visual.binding;
        if binding.epoch != registry.epoch() || !self.is_live(&binding) {
            trace!(?binding, "ignoring press on stale binding");
            return None;
        }
        let location = world.location(binding.row, binding.col)?.clone();
        let press = CellPress {
            location,
            x: binding.col,
            y: binding.row,
        };
        let Some(callback) = self.callback.as_mut() else {
            trace!(x = press.x, y = press.y, "press resolved, no callback");
            return None;
        };
        trace!(x = press.x, y = press.y, "cell pressed");
        callback(press.clone());
        Some(press)
    }
}
