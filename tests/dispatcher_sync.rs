//! End-to-end synchronization tests: snapshots in, scene identity and
//! routed presses out.

use std::cell::RefCell;
use std::rc::Rc;

use world_viewer::dispatcher::{Dispatcher, DispatcherOptions, Update};
use world_viewer::fill::{FillLimits, FillScheme, BLUES, OCCUPIED, RAMP_LEN};
use world_viewer::registry::Epoch;
use world_viewer::router::{CellPress, InteractionRouter};
use world_viewer::types::{Computer, GridShape, Island, Location, World};

const COMPUTER: Computer = Computer {
    memory_size: 8,
    processors: 2,
    bound_resources: 40,
};

fn grid(width: usize, height: usize, free: u64) -> World {
    World::from_rows(vec![vec![Location::empty(free); width]; height])
}

fn island(width: usize, height: usize) -> Island {
    Island {
        width,
        height,
        total_free_resources: 0,
        total_bound_resources: 0,
        total_memory_resources: 0,
        total_computers: 0,
        total_processors: 0,
    }
}

/// A dispatcher whose router records every delivered press.
fn recording_dispatcher() -> (Dispatcher, Rc<RefCell<Vec<CellPress>>>) {
    let presses = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&presses);
    let router = InteractionRouter::new(move |press| sink.borrow_mut().push(press));
    let dispatcher = Dispatcher::new(DispatcherOptions::default(), (400.0, 300.0), router);
    (dispatcher, presses)
}

fn fills(dispatcher: &Dispatcher) -> Vec<Vec<world_viewer::types::Color>> {
    dispatcher
        .scene()
        .unwrap()
        .registry()
        .rows()
        .map(|row| row.iter().map(|v| v.fill).collect())
        .collect()
}

#[test]
fn first_snapshot_builds_scene() {
    let (mut d, _) = recording_dispatcher();
    assert!(d.scene().is_none());

    let update = d.apply(grid(5, 4, 0)).unwrap();
    assert_eq!(
        update,
        Update::Rebuilt {
            epoch: Epoch(1),
            shape: GridShape::new(5, 4),
            cells: 20,
        }
    );
    let scene = d.scene().unwrap();
    assert_eq!(scene.registry().len(), 20);
    assert_eq!(scene.viewport().world_size(), (100.0, 80.0));
    assert_eq!(d.router_mut().binding_count(), 20);
}

#[test]
fn equal_shape_patches_in_place() {
    let (mut d, _) = recording_dispatcher();
    d.apply(grid(30, 30, 0)).unwrap();
    let epoch = d.scene().unwrap().epoch();
    let viewport = d.scene().unwrap().viewport().id();
    d.viewport_mut().unwrap().pan_by(40.0, 20.0);
    let offset = d.scene().unwrap().viewport().offset();

    for step in 1..=5 {
        let update = d.apply(grid(30, 30, step * 100)).unwrap();
        assert!(matches!(update, Update::Patched { .. }), "step {step}");
        let scene = d.scene().unwrap();
        assert_eq!(scene.epoch(), epoch);
        assert_eq!(scene.viewport().id(), viewport);
        assert_eq!(scene.viewport().offset(), offset, "pan survives patches");
    }
    assert_eq!(d.router_mut().binding_count(), 900, "patches never rebind");
}

#[test]
fn patched_fills_match_a_fresh_build() {
    let (mut patched, _) = recording_dispatcher();
    patched.apply(grid(6, 6, 0)).unwrap();

    let mut next = grid(6, 6, 250);
    next.locations[2][3] = Location::occupied(0, COMPUTER);
    next.locations[5][0] = Location::empty(10_000);
    patched.apply(next.clone()).unwrap();

    let (mut fresh, _) = recording_dispatcher();
    fresh.apply(next).unwrap();

    assert_eq!(fills(&patched), fills(&fresh));
}

#[test]
fn scenario_a_free_resources_span_the_ramp() {
    let (mut d, _) = recording_dispatcher();
    let world = World::from_rows(vec![vec![Location::empty(0), Location::empty(10_000)]]);
    d.apply(world).unwrap();

    let registry = d.scene().unwrap().registry();
    assert_eq!(registry.cell(0, 0).unwrap().fill, BLUES.colors[0]);
    assert_eq!(registry.cell(0, 1).unwrap().fill, BLUES.colors[RAMP_LEN - 1]);
}

#[test]
fn scenario_b_occupied_cells_are_flagged() {
    let (mut d, _) = recording_dispatcher();
    let world = World::from_rows(vec![vec![
        Location::occupied(0, COMPUTER),
        Location::occupied(499, COMPUTER),
        Location::occupied(1_000_000, COMPUTER),
    ]]);
    d.apply(world).unwrap();

    for visual in d.scene().unwrap().registry().rows().flatten() {
        assert_eq!(visual.fill, OCCUPIED);
    }
}

#[test]
fn scenario_c_only_the_changed_cell_is_damaged() {
    let (mut d, _) = recording_dispatcher();
    let before = grid(10, 10, 0);
    d.apply(before.clone()).unwrap();

    let mut after = before;
    after.locations[7][2] = Location::occupied(0, COMPUTER);
    match d.apply(after).unwrap() {
        Update::Patched { damage } => assert_eq!(damage.cells, vec![(7, 2)]),
        other => panic!("expected a patch, got {other:?}"),
    }
    let registry = d.scene().unwrap().registry();
    assert_eq!(registry.cell(7, 2).unwrap().fill, OCCUPIED);
    assert_eq!(registry.cell(7, 3).unwrap().fill, BLUES.colors[0]);

    // Same data again: nothing to repaint.
    let again = d.world().unwrap().clone();
    match d.apply(again).unwrap() {
        Update::Patched { damage } => assert!(damage.is_empty()),
        other => panic!("expected a patch, got {other:?}"),
    }
}

#[test]
fn scenario_d_shape_change_rebuilds_and_retires_bindings() {
    let (mut d, presses) = recording_dispatcher();
    d.apply(grid(10, 10, 0)).unwrap();
    let old_epoch = d.scene().unwrap().epoch();
    let old_viewport = d.scene().unwrap().viewport().id();
    let old_binding = d.scene().unwrap().registry().cell(0, 0).unwrap().binding;
    assert!(d.router_mut().is_live(&old_binding));

    let update = d.apply(grid(20, 10, 0)).unwrap();
    assert!(matches!(update, Update::Rebuilt { cells: 200, .. }));

    let scene = d.scene().unwrap();
    assert_ne!(scene.epoch(), old_epoch);
    assert_ne!(scene.viewport().id(), old_viewport);
    assert_eq!(scene.registry().len(), 200);
    assert_eq!(scene.viewport().world_size(), (400.0, 200.0));
    assert!(!d.router_mut().is_live(&old_binding));
    assert_eq!(d.router_mut().binding_count(), 200);

    // A press lands on the new grid and carries its coordinates.
    let press = d.press((5.0, 5.0)).unwrap();
    assert_eq!((press.x, press.y), (0, 0));
    assert_eq!(presses.borrow().len(), 1);
}

#[test]
fn press_reports_column_as_x_and_row_as_y() {
    let (mut d, presses) = recording_dispatcher();
    let mut world = grid(8, 6, 3);
    world.locations[3][4] = Location::occupied(9, COMPUTER);
    d.apply(world).unwrap();

    // Cell (row 3, col 4) spans world pixels x 80..100, y 60..80.
    let press = d.press((85.0, 65.0)).unwrap();
    assert_eq!((press.x, press.y), (4, 3));
    assert_eq!(press.location, Location::occupied(9, COMPUTER));
    assert_eq!(presses.borrow().as_slice(), &[press]);

    // Off the grid: nothing is delivered.
    assert!(d.press((390.0, 290.0)).is_none());
    assert_eq!(presses.borrow().len(), 1);
}

#[test]
fn press_sees_latest_patched_location() {
    let (mut d, _) = recording_dispatcher();
    d.apply(grid(4, 4, 1)).unwrap();
    d.apply(grid(4, 4, 77)).unwrap();
    let press = d.press((10.0, 10.0)).unwrap();
    assert_eq!(press.location.free_resources, 77);
}

#[test]
fn island_switch_with_new_shape_rebuilds() {
    let (mut d, _) = recording_dispatcher();
    let mut first = grid(3, 2, 0);
    first.islands = vec![island(3, 2), island(2, 4)];
    first.observed_island_id = 0;
    d.apply(first).unwrap();
    let epoch = d.scene().unwrap().epoch();

    let mut second = grid(2, 4, 0);
    second.islands = vec![island(3, 2), island(2, 4)];
    second.observed_island_id = 1;
    let update = d.apply(second).unwrap();

    assert!(matches!(update, Update::Rebuilt { cells: 8, .. }));
    assert_ne!(d.scene().unwrap().epoch(), epoch);
    assert_eq!(d.scene().unwrap().shape(), GridShape::new(2, 4));
}

#[test]
fn malformed_snapshot_is_rejected_without_side_effects() {
    let (mut d, _) = recording_dispatcher();
    d.apply(grid(3, 3, 0)).unwrap();
    let epoch = d.scene().unwrap().epoch();

    let mut missing_row = grid(3, 3, 100);
    missing_row.locations.pop();
    assert!(d.apply(missing_row).is_err());

    let mut bad_island = grid(3, 3, 100);
    bad_island.islands = vec![island(3, 3)];
    bad_island.observed_island_id = 2;
    assert!(d.apply(bad_island).is_err());

    assert_eq!(d.scene().unwrap().epoch(), epoch);
    assert_eq!(d.world().unwrap().locations[0][0].free_resources, 0);
}

#[test]
fn scheme_change_recolors_without_rebuild() {
    let (mut d, _) = recording_dispatcher();
    let mut world = grid(4, 4, 0);
    world.locations[1][1] = Location::occupied(0, COMPUTER);
    d.apply(world).unwrap();
    let epoch = d.scene().unwrap().epoch();
    let bindings = d.router_mut().binding_count();

    let damage = d.set_scheme(FillScheme::BoundResources);
    assert!(!damage.is_empty());
    assert_eq!(d.scene().unwrap().epoch(), epoch);
    assert_eq!(d.router_mut().binding_count(), bindings);

    let limits = FillLimits::default();
    let expected = FillScheme::BoundResources.classify(&Location::occupied(0, COMPUTER), &limits);
    assert_eq!(d.scene().unwrap().registry().cell(1, 1).unwrap().fill, expected);

    // Later snapshots keep the new scheme.
    let update = d.apply(grid(4, 4, 0)).unwrap();
    assert!(matches!(update, Update::Patched { .. }));
    assert_eq!(d.scheme(), FillScheme::BoundResources);
}
