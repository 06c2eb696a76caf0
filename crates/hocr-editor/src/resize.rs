//! Resize constraint solver.
//!
//! Turns a dragged handle plus pointer delta into new selection bounds,
//! then scales each selected element from its gesture-start bounds.
//!
//! ## Limits
//!
//! | Limit | Single selection | Multi selection |
//! |-------|------------------|-----------------|
//! | **outside** | parent element bounds (root bounds for the root's children) | root bounds |
//! | **inside** | union of children lying inside the node | empty |
//!
//! An edge may never pass the outside limit. It may not pass the inside
//! limit either, unless the inside limit is empty or children are resized
//! along with the node.
//!
//! ## Modifiers
//!
//! | Modifier | Effect |
//! |----------|--------|
//! | **Ctrl** | Resize a single node together with its children |
//! | **Alt** | Symmetric: mirror the opposite edge around the center |
//!
//! Limits may come out inverted (inside wider than outside) after nodes
//! were merged. Clamping then prefers the upper bound instead of failing;
//! see `geom::clamp`.

use crate::error::EditorError;
use crate::selection::CardinalDirections;
use hocr_core::geom::{self, clamp};
use hocr_core::{Point, Rect, Vec2};

/// Rectangles bounding a resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeLimits {
    /// How far the selection may shrink. Empty means unlimited.
    pub inside: Rect,
    /// How far the selection may grow.
    pub outside: Rect,
}

impl ResizeLimits {
    /// Only an outer limit.
    pub fn within(outside: Rect) -> Self {
        Self {
            inside: Rect::ZERO,
            outside,
        }
    }
}

/// One solver step: everything is relative to the gesture start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeRequest {
    pub direction: CardinalDirections,
    /// Where the dragged handle would be without limits: its center at
    /// gesture start plus the pointer delta, in document units.
    pub location: Point,
    /// Selection bounds at gesture start.
    pub initial: Rect,
    pub limits: ResizeLimits,
    pub with_children: bool,
    pub symmetric: bool,
}

/// Solved selection bounds and the scale that maps the initial bounds
/// onto them around `pivot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOutcome {
    pub bounds: Rect,
    pub pivot: Point,
    pub ratio: Vec2,
}

/// Resolve the active edges of a resize.
///
/// Fails only for a direction that isn't a compass point; that means the
/// handle and its direction got out of sync.
pub fn solve_resize(req: &ResizeRequest) -> Result<ResizeOutcome, EditorError> {
    let direction = req.direction.validate()?;
    let initial = req.initial;
    let outside = req.limits.outside;
    let inside = req.limits.inside;
    let location = req.location;

    // With no inner limit in force, near edges may travel to the far side
    // of the outer limit.
    let free = geom::is_empty(inside) || req.with_children;
    let left_max = if free { outside.x1 } else { inside.x0 };
    let top_max = if free { outside.y1 } else { inside.y0 };
    let right_min = if free { outside.x0 } else { inside.x1 };
    let bottom_min = if free { outside.y0 } else { inside.y1 };

    let mut bounds = initial;
    let mut pivot = initial.center();

    if direction.contains(CardinalDirections::WEST) {
        let mut next_left = clamp(location.x, outside.x0, left_max);
        if req.symmetric {
            let dx = pivot.x - next_left;
            bounds.x1 = clamp(next_left + 2.0 * dx, right_min, outside.x1).trunc();
            next_left = pivot.x - (bounds.x1 - pivot.x);
        } else {
            pivot.x = initial.x1;
        }
        bounds.x0 = next_left.trunc();
    }

    if direction.contains(CardinalDirections::NORTH) {
        let mut next_top = clamp(location.y, outside.y0, top_max);
        if req.symmetric {
            let dy = pivot.y - next_top;
            bounds.y1 = clamp(next_top + 2.0 * dy, bottom_min, outside.y1).trunc();
            next_top = pivot.y - (bounds.y1 - pivot.y);
        } else {
            pivot.y = initial.y1;
        }
        bounds.y0 = next_top.trunc();
    }

    if direction.contains(CardinalDirections::EAST) {
        let mut next_right = clamp(location.x, right_min, outside.x1);
        if req.symmetric {
            let dx = next_right - pivot.x;
            bounds.x0 = clamp(next_right - 2.0 * dx, outside.x0, left_max).trunc();
            next_right = pivot.x + (pivot.x - bounds.x0);
        } else {
            pivot.x = initial.x0;
        }
        bounds.x1 = next_right.trunc();
    }

    if direction.contains(CardinalDirections::SOUTH) {
        let mut next_bottom = clamp(location.y, bottom_min, outside.y1);
        if req.symmetric {
            let dy = next_bottom - pivot.y;
            bounds.y0 = clamp(next_bottom - 2.0 * dy, outside.y0, top_max).trunc();
            next_bottom = pivot.y + (pivot.y - bounds.y0);
        } else {
            pivot.y = initial.y0;
        }
        bounds.y1 = next_bottom.trunc();
    }

    let ratio = |now: f64, then: f64| if then == 0.0 { 1.0 } else { now / then };
    let ratio = Vec2::new(
        ratio(bounds.width(), initial.width()),
        ratio(bounds.height(), initial.height()),
    );
    log::trace!("resize {direction:?} -> {bounds:?} (pivot {pivot:?}, ratio {ratio:?})");

    Ok(ResizeOutcome {
        bounds,
        pivot,
        ratio,
    })
}

/// Scale `rect` by `ratio` around `pivot`. The result is normalized.
pub fn scale_about(rect: Rect, pivot: Point, ratio: Vec2) -> Rect {
    let map = |p: Point| {
        Point::new(
            pivot.x + (p.x - pivot.x) * ratio.x,
            pivot.y + (p.y - pivot.y) * ratio.y,
        )
    };
    Rect::from_points(map(Point::new(rect.x0, rect.y0)), map(Point::new(rect.x1, rect.y1)))
}

impl ResizeOutcome {
    /// Where an element that started at `original` ends up: scaled with
    /// the selection, truncated to whole units, kept inside the selection.
    pub fn place(&self, original: Rect) -> Rect {
        geom::clamp_rect(scale_about(original, self.pivot, self.ratio).trunc(), self.bounds)
    }
}
