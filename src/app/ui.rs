/// Width (in columns) of the right-hand sidebar, border included.
pub const SIDEBAR_WIDTH: u16 = 32;

/// Narrowest canvas for which the sidebar is still shown.
const MIN_CANVAS_WIDTH: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub menu_h: u16,
    pub canvas_x: u16,
    pub canvas_y: u16,
    pub canvas_width: u16,
    pub canvas_height: u16,
    pub sidebar_width: u16,
    pub status_y: u16,
    pub term_width: u16,
}

impl Layout {
    pub fn compute(term_width: u16, term_height: u16) -> Self {
        let sidebar = if term_width >= SIDEBAR_WIDTH + MIN_CANVAS_WIDTH {
            SIDEBAR_WIDTH
        } else {
            0
        };
        let menu_h: u16 = 1;
        let status_h: u16 = 1;
        Layout {
            menu_h,
            canvas_x: 0,
            canvas_y: menu_h,
            canvas_width: term_width.saturating_sub(sidebar),
            canvas_height: term_height.saturating_sub(menu_h + status_h),
            sidebar_width: sidebar,
            status_y: term_height.saturating_sub(status_h),
            term_width,
        }
    }

    pub fn sidebar_x(&self) -> u16 {
        self.canvas_x + self.canvas_width
    }

    /// Canvas-relative position of a terminal cell, if it lies on the canvas.
    pub fn canvas_cell(&self, column: u16, row: u16) -> Option<(u16, u16)> {
        let x = column.checked_sub(self.canvas_x)?;
        let y = row.checked_sub(self.canvas_y)?;
        (x < self.canvas_width && y < self.canvas_height).then_some((x, y))
    }

    /// Like `canvas_cell`, but pins positions off the canvas to its edge.
    pub fn canvas_cell_clamped(&self, column: u16, row: u16) -> (u16, u16) {
        let x = column.saturating_sub(self.canvas_x);
        let y = row.saturating_sub(self.canvas_y);
        (
            x.min(self.canvas_width.saturating_sub(1)),
            y.min(self.canvas_height.saturating_sub(1)),
        )
    }
}
