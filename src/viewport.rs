//! Viewport: the pannable, zoomable camera over the rendered grid.
//!
//! A viewport is created for one world extent and never resized to another;
//! when the grid shape changes the dispatcher builds a fresh one. Screen size
//! may change (terminal resize) without affecting that identity.
//!
//! Coordinates: world pixels are `cell * cell_size`; screen pixels are the
//! canvas in the terminal's pixel metrics. `offset` is the world point shown
//! at the screen's top-left corner.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewportId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportOptions {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub bounce: bool,
    #[serde(with = "millis")]
    pub bounce_duration: Duration,
    /// Fraction of drag distance applied past a clamped edge.
    pub overscroll_resistance: f64,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        ViewportOptions {
            min_zoom: 0.25,
            max_zoom: 4.0,
            bounce: true,
            bounce_duration: Duration::from_millis(300),
            overscroll_resistance: 0.5,
        }
    }
}

impl ViewportOptions {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.min_zoom > 0.0) || !(self.max_zoom >= self.min_zoom) {
            return Err(format!(
                "zoom range must satisfy 0 < min <= max, got {}..{}",
                self.min_zoom, self.max_zoom
            ));
        }
        if !(0.0..=1.0).contains(&self.overscroll_resistance) {
            return Err(format!(
                "overscroll_resistance must be within 0..=1, got {}",
                self.overscroll_resistance
            ));
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    anchor: (f64, f64),
    anchor_offset: (f64, f64),
}

#[derive(Debug, Clone, Copy)]
struct Bounce {
    from: (f64, f64),
    to: (f64, f64),
    elapsed: Duration,
}

#[derive(Debug)]
pub struct Viewport {
    id: ViewportId,
    world: (f64, f64),
    requested_screen: (f64, f64),
    screen: (f64, f64),
    zoom: f64,
    offset: (f64, f64),
    drag: Option<Drag>,
    bounce: Option<Bounce>,
    options: ViewportOptions,
}

impl Viewport {
    pub fn new(
        id: ViewportId,
        screen_width: f64,
        screen_height: f64,
        world_width: f64,
        world_height: f64,
        options: ViewportOptions,
    ) -> Self {
        let world = (world_width.max(0.0), world_height.max(0.0));
        let requested_screen = (screen_width.max(0.0), screen_height.max(0.0));
        Viewport {
            id,
            world,
            requested_screen,
            screen: effective_screen(requested_screen, world),
            zoom: 1.0f64.clamp(options.min_zoom, options.max_zoom),
            offset: (0.0, 0.0),
            drag: None,
            bounce: None,
            options,
        }
    }

    pub fn id(&self) -> ViewportId {
        self.id
    }

    pub fn world_size(&self) -> (f64, f64) {
        self.world
    }

    /// Screen extent actually used, never larger than the world.
    pub fn screen_size(&self) -> (f64, f64) {
        self.screen
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn offset(&self) -> (f64, f64) {
        self.offset
    }

    pub fn is_animating(&self) -> bool {
        self.bounce.is_some()
    }

    /// Apply a new terminal size. The world extent stays fixed.
    pub fn set_screen(&mut self, width: f64, height: f64) {
        self.requested_screen = (width.max(0.0), height.max(0.0));
        self.screen = effective_screen(self.requested_screen, self.world);
        self.bounce = None;
        self.offset = self.clamped(self.offset);
    }

    // -----------------------------------------------------------------------
    // Coordinate mapping
    // -----------------------------------------------------------------------

    pub fn screen_to_world(&self, point: (f64, f64)) -> Option<(f64, f64)> {
        let (sx, sy) = point;
        if !(sx >= 0.0 && sy >= 0.0 && sx < self.screen.0 && sy < self.screen.1) {
            return None;
        }
        let (wx, wy) = self.unchecked_screen_to_world(point);
        if wx < 0.0 || wy < 0.0 || wx >= self.world.0 || wy >= self.world.1 {
            return None;
        }
        Some((wx, wy))
    }

    pub fn world_to_screen(&self, point: (f64, f64)) -> (f64, f64) {
        (
            (point.0 - self.offset.0) * self.zoom,
            (point.1 - self.offset.1) * self.zoom,
        )
    }

    /// World rectangle `(x0, y0, x1, y1)` covered by the screen.
    pub fn visible_world(&self) -> (f64, f64, f64, f64) {
        let (w, h) = self.visible_extent();
        (
            self.offset.0,
            self.offset.1,
            self.offset.0 + w,
            self.offset.1 + h,
        )
    }

    fn unchecked_screen_to_world(&self, point: (f64, f64)) -> (f64, f64) {
        (
            self.offset.0 + point.0 / self.zoom,
            self.offset.1 + point.1 / self.zoom,
        )
    }

    fn visible_extent(&self) -> (f64, f64) {
        (self.screen.0 / self.zoom, self.screen.1 / self.zoom)
    }

    // -----------------------------------------------------------------------
    // Clamping
    // -----------------------------------------------------------------------

    /// Clamp an offset to the world on all four edges.
    ///
    /// When the world is narrower than the visible extent on an axis, content
    /// anchors to the top-left.
    fn clamped(&self, offset: (f64, f64)) -> (f64, f64) {
        let (vw, vh) = self.visible_extent();
        (
            clamp_axis(offset.0, self.world.0, vw),
            clamp_axis(offset.1, self.world.1, vh),
        )
    }

    pub fn is_within_bounds(&self) -> bool {
        let c = self.clamped(self.offset);
        (c.0 - self.offset.0).abs() < 1e-9 && (c.1 - self.offset.1).abs() < 1e-9
    }

    // -----------------------------------------------------------------------
    // Drag / bounce
    // -----------------------------------------------------------------------

    pub fn drag_start(&mut self, point: (f64, f64)) {
        self.bounce = None;
        self.drag = Some(Drag {
            anchor: point,
            anchor_offset: self.offset,
        });
    }

    /// Returns whether the offset moved.
    pub fn drag_move(&mut self, point: (f64, f64)) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        let raw = (
            drag.anchor_offset.0 - (point.0 - drag.anchor.0) / self.zoom,
            drag.anchor_offset.1 - (point.1 - drag.anchor.1) / self.zoom,
        );
        let next = if self.options.bounce {
            self.rubber_band(raw)
        } else {
            self.clamped(raw)
        };
        self.set_offset(next)
    }

    /// Release the drag; if the pan ended past an edge, start easing back.
    pub fn drag_end(&mut self) {
        if self.drag.take().is_none() {
            return;
        }
        let target = self.clamped(self.offset);
        if target == self.offset {
            return;
        }
        if self.options.bounce && !self.options.bounce_duration.is_zero() {
            self.bounce = Some(Bounce {
                from: self.offset,
                to: target,
                elapsed: Duration::ZERO,
            });
        } else {
            self.offset = target;
        }
    }

    /// Advance the bounce animation. Returns whether the offset moved.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        let Some(mut bounce) = self.bounce else {
            return false;
        };
        bounce.elapsed += elapsed;
        let duration = self.options.bounce_duration.as_secs_f64();
        let t = if duration > 0.0 {
            (bounce.elapsed.as_secs_f64() / duration).min(1.0)
        } else {
            1.0
        };
        if t >= 1.0 {
            self.bounce = None;
            return self.set_offset(bounce.to);
        }
        let eased = 1.0 - (1.0 - t).powi(3);
        let next = (
            bounce.from.0 + (bounce.to.0 - bounce.from.0) * eased,
            bounce.from.1 + (bounce.to.1 - bounce.from.1) * eased,
        );
        self.bounce = Some(bounce);
        self.set_offset(next)
    }

    fn rubber_band(&self, raw: (f64, f64)) -> (f64, f64) {
        let clamped = self.clamped(raw);
        let (vw, vh) = self.visible_extent();
        let r = self.options.overscroll_resistance;
        let band = |raw: f64, clamped: f64, limit: f64| {
            let over = ((raw - clamped) * r).clamp(-limit, limit);
            clamped + over
        };
        (
            band(raw.0, clamped.0, vw / 2.0),
            band(raw.1, clamped.1, vh / 2.0),
        )
    }

    // -----------------------------------------------------------------------
    // Keyboard pan / zoom
    // -----------------------------------------------------------------------

    /// Pan by a distance in screen pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        self.bounce = None;
        let next = self.clamped((
            self.offset.0 + dx / self.zoom,
            self.offset.1 + dy / self.zoom,
        ));
        self.set_offset(next)
    }

    /// Multiply zoom by `factor`, keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, factor: f64, anchor: (f64, f64)) -> bool {
        if !(factor > 0.0) {
            return false;
        }
        let new_zoom = (self.zoom * factor).clamp(self.options.min_zoom, self.options.max_zoom);
        if (new_zoom - self.zoom).abs() <= f64::EPSILON {
            return false;
        }
        let pinned = self.unchecked_screen_to_world(anchor);
        self.zoom = new_zoom;
        self.bounce = None;
        let next = self.clamped((
            pinned.0 - anchor.0 / new_zoom,
            pinned.1 - anchor.1 / new_zoom,
        ));
        self.offset = next;
        true
    }

    fn set_offset(&mut self, next: (f64, f64)) -> bool {
        if next == self.offset {
            return false;
        }
        self.offset = next;
        true
    }
}

fn effective_screen(requested: (f64, f64), world: (f64, f64)) -> (f64, f64) {
    (requested.0.min(world.0), requested.1.min(world.1))
}

fn clamp_axis(offset: f64, world: f64, visible: f64) -> f64 {
    if world <= visible {
        0.0
    } else {
        offset.clamp(0.0, world - visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(screen: (f64, f64), world: (f64, f64)) -> Viewport {
        Viewport::new(
            ViewportId(1),
            screen.0,
            screen.1,
            world.0,
            world.1,
            ViewportOptions::default(),
        )
    }

    #[test]
    fn screen_is_clamped_to_world() {
        let vp = viewport((800.0, 600.0), (200.0, 1000.0));
        assert_eq!(vp.screen_size(), (200.0, 600.0));
    }

    #[test]
    fn pan_clamps_on_all_edges() {
        let mut vp = viewport((100.0, 100.0), (400.0, 300.0));
        vp.pan_by(-50.0, -50.0);
        assert_eq!(vp.offset(), (0.0, 0.0));
        vp.pan_by(10_000.0, 10_000.0);
        assert_eq!(vp.offset(), (300.0, 200.0));
        let (_, _, x1, y1) = vp.visible_world();
        assert_eq!((x1, y1), (400.0, 300.0));
    }

    #[test]
    fn small_world_anchors_top_left_when_zoomed_out() {
        let mut vp = viewport((100.0, 100.0), (400.0, 400.0));
        vp.pan_by(200.0, 200.0);
        vp.zoom_at(0.25, (50.0, 50.0));
        assert_eq!(vp.offset(), (0.0, 0.0));
    }

    #[test]
    fn drag_past_edge_bounces_back() {
        let mut vp = viewport((100.0, 100.0), (400.0, 400.0));
        vp.drag_start((50.0, 50.0));
        assert!(vp.drag_move((90.0, 80.0)));
        assert!(!vp.is_within_bounds());
        // Resistance halves the overscroll.
        assert_eq!(vp.offset(), (-20.0, -15.0));
        vp.drag_end();
        assert!(vp.is_animating());

        assert!(vp.tick(Duration::from_millis(100)));
        let mid = vp.offset();
        assert!(mid.0 > -20.0 && mid.0 < 0.0, "mid = {mid:?}");

        vp.tick(Duration::from_millis(500));
        assert!(!vp.is_animating());
        assert_eq!(vp.offset(), (0.0, 0.0));
        assert!(!vp.tick(Duration::from_millis(16)));
    }

    #[test]
    fn drag_inside_bounds_does_not_animate() {
        let mut vp = viewport((100.0, 100.0), (400.0, 400.0));
        vp.drag_start((50.0, 50.0));
        vp.drag_move((20.0, 30.0));
        vp.drag_end();
        assert!(!vp.is_animating());
        assert_eq!(vp.offset(), (30.0, 20.0));
    }

    #[test]
    fn drag_without_bounce_clamps_immediately() {
        let options = ViewportOptions {
            bounce: false,
            ..ViewportOptions::default()
        };
        let mut vp = Viewport::new(ViewportId(2), 100.0, 100.0, 400.0, 400.0, options);
        vp.drag_start((0.0, 0.0));
        vp.drag_move((80.0, 80.0));
        assert_eq!(vp.offset(), (0.0, 0.0));
        vp.drag_end();
        assert!(!vp.is_animating());
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut vp = viewport((200.0, 200.0), (1000.0, 1000.0));
        vp.pan_by(100.0, 100.0);
        let anchor = (60.0, 80.0);
        let before = vp.screen_to_world(anchor).unwrap();
        assert!(vp.zoom_at(2.0, anchor));
        let after = vp.screen_to_world(anchor).unwrap();
        assert!((before.0 - after.0).abs() < 1e-9);
        assert!((before.1 - after.1).abs() < 1e-9);
        assert_eq!(vp.zoom(), 2.0);
    }

    #[test]
    fn zoom_respects_limits() {
        let mut vp = viewport((200.0, 200.0), (1000.0, 1000.0));
        vp.zoom_at(100.0, (0.0, 0.0));
        assert_eq!(vp.zoom(), ViewportOptions::default().max_zoom);
        assert!(!vp.zoom_at(2.0, (0.0, 0.0)));
    }

    #[test]
    fn screen_to_world_rejects_points_off_canvas() {
        let vp = viewport((100.0, 100.0), (60.0, 400.0));
        assert_eq!(vp.screen_to_world((10.0, 10.0)), Some((10.0, 10.0)));
        assert_eq!(vp.screen_to_world((70.0, 10.0)), None);
        assert_eq!(vp.screen_to_world((-1.0, 10.0)), None);
    }

    #[test]
    fn shrinking_screen_reclamps_offset() {
        let mut vp = viewport((100.0, 100.0), (400.0, 400.0));
        vp.pan_by(300.0, 300.0);
        assert_eq!(vp.offset(), (300.0, 300.0));
        vp.set_screen(200.0, 200.0);
        assert_eq!(vp.offset(), (200.0, 200.0));
        assert_eq!(vp.world_size(), (400.0, 400.0));
    }
}
