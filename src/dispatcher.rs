//! Render/update dispatcher: the synchronization core.
//!
//! Each snapshot either patches the current scene in place (same grid shape)
//! or tears it down and builds a new viewport and registry (first snapshot,
//! shape change, or `SyncMode::AlwaysRebuild`). The dispatcher is the only
//! owner of the scene; everything else gets borrowed views or copied ids.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::fill::{FillLimits, FillScheme};
use crate::registry::{Damage, Epoch, Registry};
use crate::router::{CellPress, InteractionRouter};
use crate::types::{GridShape, SnapshotError, World};
use crate::viewport::{Viewport, ViewportId, ViewportOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Patch in place while the grid shape is unchanged.
    #[default]
    Incremental,
    /// Rebuild on every snapshot.
    AlwaysRebuild,
}

#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    pub cell_size: u32,
    pub sync_mode: SyncMode,
    pub scheme: FillScheme,
    pub limits: FillLimits,
    pub viewport: ViewportOptions,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        DispatcherOptions {
            cell_size: 20,
            sync_mode: SyncMode::Incremental,
            scheme: FillScheme::Default,
            limits: FillLimits::default(),
            viewport: ViewportOptions::default(),
        }
    }
}

/// The viewport and registry of one epoch, always built for the same shape.
#[derive(Debug)]
pub struct Scene {
    shape: GridShape,
    viewport: Viewport,
    registry: Registry,
}

impl Scene {
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn epoch(&self) -> Epoch {
        self.registry.epoch()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[derive(Debug)]
enum RenderState {
    Empty,
    Bound(Scene),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Rebuilt {
        epoch: Epoch,
        shape: GridShape,
        cells: usize,
    },
    Patched {
        damage: Damage,
    },
}

pub struct Dispatcher {
    state: RenderState,
    world: Option<World>,
    router: InteractionRouter,
    options: DispatcherOptions,
    screen: (f64, f64),
    last_epoch: u64,
}

impl Dispatcher {
    pub fn new(options: DispatcherOptions, screen: (f64, f64), router: InteractionRouter) -> Self {
        Dispatcher {
            state: RenderState::Empty,
            world: None,
            router,
            options,
            screen,
            last_epoch: Epoch::NONE.0,
        }
    }

    pub fn scene(&self) -> Option<&Scene> {
        match &self.state {
            RenderState::Empty => None,
            RenderState::Bound(scene) => Some(scene),
        }
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        match &mut self.state {
            RenderState::Empty => None,
            RenderState::Bound(scene) => Some(scene),
        }
    }

    pub fn viewport_mut(&mut self) -> Option<&mut Viewport> {
        self.scene_mut().map(Scene::viewport_mut)
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn scheme(&self) -> FillScheme {
        self.options.scheme
    }

    pub fn router_mut(&mut self) -> &mut InteractionRouter {
        &mut self.router
    }

    /// Apply one snapshot. A malformed snapshot leaves the current scene untouched.
    pub fn apply(&mut self, world: World) -> Result<Update, SnapshotError> {
        let shape = world.validate()?;

        let reuse = self.options.sync_mode == SyncMode::Incremental;
        if let RenderState::Bound(scene) = &mut self.state {
            if reuse && scene.shape == shape {
                match scene
                    .registry
                    .patch(&world, self.options.scheme, &self.options.limits)
                {
                    Ok(damage) => {
                        debug!(%shape, damaged = damage.len(), "patched scene");
                        self.world = Some(world);
                        return Ok(Update::Patched { damage });
                    }
                    Err(err) => {
                        debug_assert!(false, "keyed patch hit a shape mismatch: {err}");
                        error!(%err, "registry out of step with scene, rebuilding");
                    }
                }
            }
        }

        let update = self.rebuild(&world, shape);
        self.world = Some(world);
        Ok(update)
    }

    /// Switch fill scheme. Re-classifies in place; never rebuilds unless the
    /// registry is found out of step with the stored world.
    pub fn set_scheme(&mut self, scheme: FillScheme) -> Damage {
        self.options.scheme = scheme;
        let Some(world) = self.world.take() else {
            return Damage::default();
        };
        let damage = match &mut self.state {
            RenderState::Empty => Damage::default(),
            RenderState::Bound(scene) => {
                match scene.registry.patch(&world, scheme, &self.options.limits) {
                    Ok(damage) => damage,
                    Err(err) => {
                        debug_assert!(false, "scheme change hit a shape mismatch: {err}");
                        error!(%err, "registry out of step with world, rebuilding");
                        let shape = scene.shape;
                        self.rebuild(&world, shape);
                        Damage::default()
                    }
                }
            }
        };
        info!(scheme = scheme.name(), recolored = damage.len(), "fill scheme changed");
        self.world = Some(world);
        damage
    }

    /// Track the terminal's canvas size. Keeps the current epoch.
    pub fn set_screen(&mut self, width: f64, height: f64) {
        self.screen = (width, height);
        if let Some(viewport) = self.viewport_mut() {
            viewport.set_screen(width, height);
        }
    }

    /// Route a press at a screen point to the cell under it. Returns the
    /// press when the router's callback received it.
    pub fn press(&mut self, point: (f64, f64)) -> Option<CellPress> {
        let RenderState::Bound(scene) = &self.state else {
            return None;
        };
        let world = self.world.as_ref()?;
        self.router
            .press(&scene.registry, &scene.viewport, world, point)
    }

    fn rebuild(&mut self, world: &World, shape: GridShape) -> Update {
        // Drop the previous epoch before anything of the next one exists.
        self.state = RenderState::Empty;

        self.last_epoch += 1;
        let epoch = Epoch(self.last_epoch);
        let cell_size = self.options.cell_size;
        let world_px = (
            (shape.width as u64 * cell_size as u64) as f64,
            (shape.height as u64 * cell_size as u64) as f64,
        );
        let viewport = Viewport::new(
            ViewportId(epoch.0),
            self.screen.0,
            self.screen.1,
            world_px.0,
            world_px.1,
            self.options.viewport,
        );
        let registry = Registry::build(
            world,
            shape,
            self.options.scheme,
            &self.options.limits,
            cell_size,
            epoch,
            &mut self.router,
        );
        let cells = registry.len();
        info!(epoch = epoch.0, %shape, cells, "rebuilt scene");

        self.state = RenderState::Bound(Scene {
            shape,
            viewport,
            registry,
        });
        Update::Rebuilt {
            epoch,
            shape,
            cells,
        }
    }
}
