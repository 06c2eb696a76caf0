//! Rectangle helpers shared by the tree model and the editor.
//!
//! Rectangles are `kurbo::Rect` with `x0`/`y0`/`x1`/`y1` read as
//! left/top/right/bottom. A rectangle with zero area counts as empty.

use kurbo::Rect;

/// True when `rect` has no area.
pub fn is_empty(rect: Rect) -> bool {
    rect.area() == 0.0
}

/// Union of all non-empty rectangles, or `Rect::ZERO` when there are none.
pub fn union_all<I>(rects: I) -> Rect
where
    I: IntoIterator<Item = Rect>,
{
    rects
        .into_iter()
        .filter(|r| !is_empty(*r))
        .reduce(|acc, r| acc.union(r))
        .unwrap_or(Rect::ZERO)
}

/// True when `inner` lies entirely within `outer` (edges may touch).
pub fn contains_rect(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

/// True when the two rectangles overlap with positive area.
pub fn intersects(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f64::clamp` this never panics: when the limits are inverted
/// the upper bound wins.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if min > max {
        log::debug!("inverted clamp range [{min}, {max}] for {value}");
    }
    value.max(min).min(max)
}

/// Clamp every edge of `rect` into `limit`.
pub fn clamp_rect(rect: Rect, limit: Rect) -> Rect {
    Rect::new(
        clamp(rect.x0, limit.x0, limit.x1),
        clamp(rect.y0, limit.y0, limit.y1),
        clamp(rect.x1, limit.x0, limit.x1),
        clamp(rect.y1, limit.y0, limit.y1),
    )
}
