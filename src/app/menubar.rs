use std::io;

use crossterm::{cursor, queue, style, terminal};

use crate::config::KeyBindings;

use super::ui::Layout;

/// Items are listed in a consistent order:
///   view → data → feed → escape/global
pub fn menu_items(bindings: &KeyBindings) -> Vec<String> {
    vec![
        format!(
            "[{}{}{}{}] pan",
            arrow(&bindings.pan_left),
            arrow(&bindings.pan_right),
            arrow(&bindings.pan_up),
            arrow(&bindings.pan_down)
        ),
        format!("[{}][{}] zoom", bindings.zoom_in, bindings.zoom_out),
        format!("[{}]cheme", bindings.next_scheme),
        format!("[{}][{}] island", bindings.prev_island, bindings.next_island),
        format!("[{}] stop", bindings.stop),
        format!("[{}]o", bindings.start),
        format!("[{}] clear", bindings.clear_detail),
        format!("[{}]uit", bindings.quit),
        format!("[{}] full", bindings.fullscreen),
    ]
}

fn arrow(binding: &str) -> &str {
    match binding {
        "Left" => "←",
        "Right" => "→",
        "Up" => "↑",
        "Down" => "↓",
        other => other,
    }
}

pub fn render_menubar(
    stdout: &mut io::Stdout,
    layout: &Layout,
    bindings: &KeyBindings,
) -> anyhow::Result<()> {
    if layout.menu_h == 0 {
        return Ok(());
    }

    let items = menu_items(bindings);

    let mut line: u16 = 0;
    let mut x: u16 = 1; // leading space

    queue!(
        stdout,
        cursor::MoveTo(0, 0),
        terminal::Clear(terminal::ClearType::CurrentLine),
        style::Print(" "),
    )?;

    for (i, item) in items.iter().enumerate() {
        let item_w = item.chars().count() as u16;

        if i > 0 {
            if x + 2 + item_w > layout.term_width {
                if line + 1 < layout.menu_h {
                    line += 1;
                    x = 1;
                    queue!(
                        stdout,
                        cursor::MoveTo(0, line),
                        terminal::Clear(terminal::ClearType::CurrentLine),
                        style::Print(" "),
                    )?;
                } else {
                    break;
                }
            } else {
                queue!(stdout, style::Print("  "))?;
                x += 2;
            }
        }

        if x + item_w > layout.term_width {
            break;
        }

        print_menu_item(stdout, item)?;
        x += item_w;
    }

    Ok(())
}

/// Print a menu item string, bolding any text inside `[...]` brackets.
/// Text outside brackets is printed dim.
pub fn print_menu_item(stdout: &mut io::Stdout, item: &str) -> anyhow::Result<()> {
    for (text, key) in menu_spans(item) {
        let attr = if key {
            style::Attribute::Bold
        } else {
            style::Attribute::Dim
        };
        queue!(
            stdout,
            style::SetAttribute(attr),
            style::Print(text),
            style::SetAttribute(style::Attribute::Reset),
        )?;
    }
    Ok(())
}

/// Split an item into `(text, is_key)` spans. An unclosed `[` runs to the end as a key.
fn menu_spans(item: &str) -> Vec<(&str, bool)> {
    let mut spans = Vec::new();
    let mut rest = item;
    while !rest.is_empty() {
        match rest.find('[') {
            Some(open) => {
                if open > 0 {
                    spans.push((&rest[..open], false));
                }
                rest = &rest[open..];
                match rest.find(']') {
                    Some(close) => {
                        spans.push((&rest[..=close], true));
                        rest = &rest[close + 1..];
                    }
                    None => {
                        spans.push((rest, true));
                        break;
                    }
                }
            }
            None => {
                spans.push((rest, false));
                break;
            }
        }
    }
    spans
}
