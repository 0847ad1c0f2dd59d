use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

use crate::config::{matches_binding, ViewerConfig};
use crate::remote::ControlCommand;

use super::ui::Layout;

const ZOOM_STEP: f64 = 1.25;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Continue,
    Redraw,
    Quit,
    ToggleFullscreen,
    /// Pan by a distance in terminal cells.
    Pan { columns: i32, rows: i32 },
    /// Zoom about a canvas cell, or the canvas center when `None`.
    Zoom { factor: f64, at: Option<(u16, u16)> },
    NextScheme,
    Island(isize),
    Control(ControlCommand),
    ClearDetail,
    /// Pointer positions are canvas-relative terminal cells.
    Press { column: u16, row: u16 },
    Drag { column: u16, row: u16 },
    Release,
    Resize(u16, u16),
}

pub fn handle_event(config: &ViewerConfig, layout: &Layout, event: Event) -> Action {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(config, key),
        Event::Mouse(mouse) => handle_mouse(layout, mouse),
        Event::Resize(w, h) => Action::Resize(w, h),
        _ => Action::Continue,
    }
}

fn handle_key(config: &ViewerConfig, key: KeyEvent) -> Action {
    let bindings = &config.key_bindings;
    let step = config.pan_step as i32;

    if matches_binding(&bindings.fullscreen, &key) {
        return Action::ToggleFullscreen;
    }
    if matches_binding(&bindings.quit, &key) {
        return Action::Quit;
    }
    if matches_binding(&bindings.pan_left, &key) {
        return Action::Pan { columns: -step, rows: 0 };
    }
    if matches_binding(&bindings.pan_right, &key) {
        return Action::Pan { columns: step, rows: 0 };
    }
    if matches_binding(&bindings.pan_up, &key) {
        return Action::Pan { columns: 0, rows: -step };
    }
    if matches_binding(&bindings.pan_down, &key) {
        return Action::Pan { columns: 0, rows: step };
    }
    if matches_binding(&bindings.zoom_in, &key) {
        return Action::Zoom { factor: ZOOM_STEP, at: None };
    }
    if matches_binding(&bindings.zoom_out, &key) {
        return Action::Zoom { factor: 1.0 / ZOOM_STEP, at: None };
    }
    if matches_binding(&bindings.next_scheme, &key) {
        return Action::NextScheme;
    }
    if matches_binding(&bindings.prev_island, &key) {
        return Action::Island(-1);
    }
    if matches_binding(&bindings.next_island, &key) {
        return Action::Island(1);
    }
    if matches_binding(&bindings.stop, &key) {
        return Action::Control(ControlCommand::Stop);
    }
    if matches_binding(&bindings.start, &key) {
        return Action::Control(ControlCommand::Start);
    }
    if matches_binding(&bindings.clear_detail, &key) {
        return Action::ClearDetail;
    }

    Action::Continue
}

fn handle_mouse(layout: &Layout, mouse: MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            match layout.canvas_cell(mouse.column, mouse.row) {
                Some((column, row)) => Action::Press { column, row },
                None => Action::Continue,
            }
        }
        // Drags keep tracking when the pointer leaves the canvas.
        MouseEventKind::Drag(MouseButton::Left) => {
            let (column, row) = layout.canvas_cell_clamped(mouse.column, mouse.row);
            Action::Drag { column, row }
        }
        MouseEventKind::Up(MouseButton::Left) => Action::Release,
        MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
            let Some(at) = layout.canvas_cell(mouse.column, mouse.row) else {
                return Action::Continue;
            };
            let factor = if mouse.kind == MouseEventKind::ScrollUp {
                ZOOM_STEP
            } else {
                1.0 / ZOOM_STEP
            };
            Action::Zoom { factor, at: Some(at) }
        }
        _ => Action::Continue,
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn default_keys_map_to_actions() {
        let config = ViewerConfig::default();
        let layout = Layout::compute(120, 40);
        let act = |code| handle_event(&config, &layout, key(code));

        assert_eq!(act(KeyCode::Char('q')), Action::Quit);
        assert_eq!(act(KeyCode::Left), Action::Pan { columns: -4, rows: 0 });
        assert_eq!(act(KeyCode::Down), Action::Pan { columns: 0, rows: 4 });
        assert_eq!(act(KeyCode::Char('s')), Action::NextScheme);
        assert_eq!(act(KeyCode::Char('[')), Action::Island(-1));
        assert_eq!(act(KeyCode::Char('x')), Action::Control(ControlCommand::Stop));
        assert_eq!(act(KeyCode::Char('g')), Action::Control(ControlCommand::Start));
        assert_eq!(act(KeyCode::Esc), Action::ClearDetail);
        assert_eq!(act(KeyCode::F(11)), Action::ToggleFullscreen);
        assert_eq!(act(KeyCode::Char('z')), Action::Continue);
    }

    #[test]
    fn key_release_is_ignored() {
        let config = ViewerConfig::default();
        let layout = Layout::compute(120, 40);
        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(handle_event(&config, &layout, Event::Key(release)), Action::Continue);
    }

    #[test]
    fn mouse_press_is_canvas_relative() {
        let config = ViewerConfig::default();
        let layout = Layout::compute(120, 40);
        assert_eq!(
            handle_event(&config, &layout, mouse(MouseEventKind::Down(MouseButton::Left), 4, 4)),
            Action::Press { column: 4, row: 3 }
        );
        // Menu bar and sidebar are not canvas.
        assert_eq!(
            handle_event(&config, &layout, mouse(MouseEventKind::Down(MouseButton::Left), 4, 0)),
            Action::Continue
        );
        assert_eq!(
            handle_event(&config, &layout, mouse(MouseEventKind::Down(MouseButton::Left), 100, 5)),
            Action::Continue
        );
        assert_eq!(
            handle_event(&config, &layout, mouse(MouseEventKind::Drag(MouseButton::Left), 100, 0)),
            Action::Drag { column: 87, row: 0 }
        );
        assert_eq!(
            handle_event(&config, &layout, mouse(MouseEventKind::ScrollUp, 10, 10)),
            Action::Zoom { factor: ZOOM_STEP, at: Some((10, 9)) }
        );
    }
}
