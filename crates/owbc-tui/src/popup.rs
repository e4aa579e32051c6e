//! Detail popover placement.
//!
//! A popover prefers to open below its anchor, left-aligned with it.
//! The final rectangle always stays `margin` cells inside the viewport:
//! horizontal overflow clamps the x position, bottom overflow flips the
//! popover above the anchor, and whatever remains is clamped as a last
//! resort. Placement is pure geometry so it can be tested without a
//! terminal.

use owbc_app::AnchorRect;
use ratatui::layout::Rect;

/// Gap kept between a popover and the viewport edges when rendering.
pub const POPOVER_MARGIN: u16 = 1;

pub fn anchor_to_rect(anchor: AnchorRect) -> Rect {
    Rect::new(anchor.x, anchor.y, anchor.width, anchor.height)
}

/// Place a popover of the given size relative to its anchor.
///
/// `viewport` is the full drawable area; `margin` is the minimum gap
/// kept from each viewport edge.
pub fn place(anchor: Rect, size: (u16, u16), viewport: Rect, margin: u16) -> Rect {
    let (width, height) = size;
    let width = width.min(viewport.width.saturating_sub(margin * 2));
    let height = height.min(viewport.height.saturating_sub(margin * 2));

    // Left-aligned with the anchor, clamped into the horizontal band.
    let min_x = viewport.left().saturating_add(margin);
    let max_x = viewport.right().saturating_sub(margin).saturating_sub(width);
    let x = anchor.x.min(max_x).max(min_x);

    // Below the anchor; flip above when it would cross the bottom edge.
    let min_y = viewport.top().saturating_add(margin);
    let max_y = viewport
        .bottom()
        .saturating_sub(margin)
        .saturating_sub(height);
    let below = anchor.bottom().saturating_add(margin);
    let y = if below <= max_y {
        below
    } else {
        anchor
            .y
            .saturating_sub(margin)
            .saturating_sub(height)
            .max(min_y)
    };

    Rect::new(x, y.min(max_y).max(min_y), width, height)
}
