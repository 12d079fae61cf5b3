// src/ui/overlay.rs

//! # Overlay Compositor
//!
//! Modals are rendered into their own buffer and then merged over the live view cell by cell,
//! so the chat stays visible around (and under) the modal.
//!
//! Wide glyphs occupy several cells: the first carries the symbol and the rest are blank
//! continuation cells. The compositor never lets a glyph straddle the overlay border, because
//! the terminal would then draw half of it over the neighbouring content.

use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use unicode_width::UnicodeWidthStr;

/// Cells a symbol occupies. Zero-width symbols still take one cell.
fn cell_width(symbol: &str) -> u16 {
    u16::try_from(symbol.width()).unwrap_or(1).max(1)
}

/// Returns a `width x height` rectangle centered in `area`, clamped to it.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Merges `overlay` into `base` with the overlay's top-left corner at `origin`.
/// Cells falling outside `base` are dropped.
pub fn compose(base: &mut Buffer, overlay: &Buffer, origin: Position) {
    let src = overlay.area;
    let dst = base.area;

    for row in 0..src.height {
        let y = origin.y.saturating_add(row);
        if y < dst.y || y >= dst.bottom() {
            continue;
        }

        // 1. A wide base glyph just left of the overlay would spill into it.
        if origin.x > dst.x {
            blank_if_wide_spills(base, Position::new(origin.x - 1, y), origin.x);
        }

        // 2. Copy the overlay row, keeping wide glyphs whole.
        let mut col = 0;
        while col < src.width {
            let x = origin.x.saturating_add(col);
            if x >= dst.right() {
                break;
            }
            let Some(cell) = overlay.cell(Position::new(src.x + col, src.y + row)) else {
                break;
            };
            let width = cell_width(cell.symbol());
            let fits = col + width <= src.width && x.saturating_add(width) <= dst.right();

            if let Some(target) = base.cell_mut(Position::new(x, y)) {
                *target = cell.clone();
                if !fits {
                    target.set_symbol(" ");
                }
            }
            if fits && width > 1 {
                for k in 1..width {
                    if let Some(target) = base.cell_mut(Position::new(x + k, y)) {
                        target.reset();
                        target.set_style(cell.style());
                    }
                }
                col += width;
            } else {
                col += 1;
            }
        }
    }
}

fn blank_if_wide_spills(base: &mut Buffer, at: Position, overlay_x: u16) {
    let Some(cell) = base.cell_mut(at) else {
        return;
    };
    if at.x.saturating_add(cell_width(cell.symbol())) > overlay_x {
        cell.set_symbol(" ");
    }
}

// MARK: --- UNIT TESTS ---
