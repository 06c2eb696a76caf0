//! Selection chrome: the selection rectangle and its eight resize handles.
//!
//! Bounds are kept in document space. Handles are hit-tested as fixed
//! size squares in screen space, so they stay grabbable at any zoom.

use crate::canvas::CursorIcon;
use crate::error::EditorError;
use bitflags::bitflags;
use hocr_core::{Affine, Point, Rect, Vec2, geom};

bitflags! {
    /// Compass directions a resize handle pulls in.
    ///
    /// North and South exclude each other, as do East and West.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CardinalDirections: u8 {
        const NORTH = 0b0001;
        const SOUTH = 0b0010;
        const EAST  = 0b0100;
        const WEST  = 0b1000;

        const NORTH_EAST = Self::NORTH.bits() | Self::EAST.bits();
        const SOUTH_EAST = Self::SOUTH.bits() | Self::EAST.bits();
        const SOUTH_WEST = Self::SOUTH.bits() | Self::WEST.bits();
        const NORTH_WEST = Self::NORTH.bits() | Self::WEST.bits();
    }
}

impl CardinalDirections {
    /// Handle order: clockwise from the top-left corner.
    pub const CLOCKWISE: [CardinalDirections; 8] = [
        Self::NORTH_WEST,
        Self::NORTH,
        Self::NORTH_EAST,
        Self::EAST,
        Self::SOUTH_EAST,
        Self::SOUTH,
        Self::SOUTH_WEST,
        Self::WEST,
    ];

    /// One of the eight compass points, and nothing else.
    pub fn is_valid(self) -> bool {
        !self.is_empty()
            && Self::all().contains(self)
            && !self.contains(Self::NORTH | Self::SOUTH)
            && !self.contains(Self::EAST | Self::WEST)
    }

    pub fn validate(self) -> Result<Self, EditorError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(EditorError::InvalidDirection(self.bits()))
        }
    }

    /// Cursor shown while hovering a handle pulling this way.
    pub fn resize_cursor(self) -> Result<CursorIcon, EditorError> {
        let d = self.validate()?;
        Ok(if d == Self::NORTH_WEST || d == Self::SOUTH_EAST {
            CursorIcon::ResizeNwse
        } else if d == Self::NORTH_EAST || d == Self::SOUTH_WEST {
            CursorIcon::ResizeNesw
        } else if d == Self::NORTH || d == Self::SOUTH {
            CursorIcon::ResizeNs
        } else {
            CursorIcon::ResizeWe
        })
    }
}

/// A resize handle centered on a corner or edge midpoint of the selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeHandle {
    /// Document-space center.
    pub center: Point,
    pub direction: CardinalDirections,
}

impl ResizeHandle {
    /// Screen-space hit square of side `size` around the handle.
    pub fn hit_rect(&self, transform: Affine, size: f64) -> Rect {
        Rect::from_center_size(transform * self.center, (size, size))
    }
}

/// The selection rectangle shown around the selected elements.
#[derive(Debug, Clone)]
pub struct CanvasSelection {
    bounds: Rect,
    initial_bounds: Rect,
    handles: [ResizeHandle; 8],
    resizing: bool,
}

impl Default for CanvasSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasSelection {
    pub fn new() -> Self {
        Self {
            bounds: Rect::ZERO,
            initial_bounds: Rect::ZERO,
            handles: CardinalDirections::CLOCKWISE.map(|direction| ResizeHandle {
                center: Point::ZERO,
                direction,
            }),
            resizing: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    /// Bounds captured by the last `begin_resize`.
    pub fn initial_bounds(&self) -> Rect {
        self.initial_bounds
    }

    pub fn left(&self) -> f64 {
        self.bounds.x0
    }

    pub fn top(&self) -> f64 {
        self.bounds.y0
    }

    pub fn right(&self) -> f64 {
        self.bounds.x1
    }

    pub fn bottom(&self) -> f64 {
        self.bounds.y1
    }

    pub fn set_left(&mut self, left: f64) {
        self.bounds.x0 = left;
    }

    pub fn set_top(&mut self, top: f64) {
        self.bounds.y0 = top;
    }

    pub fn set_right(&mut self, right: f64) {
        self.bounds.x1 = right;
    }

    pub fn set_bottom(&mut self, bottom: f64) {
        self.bounds.y1 = bottom;
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.bounds = self.bounds + offset;
    }

    /// No chrome is drawn for an empty selection.
    pub fn is_empty(&self) -> bool {
        geom::is_empty(self.bounds)
    }

    pub fn is_resizing(&self) -> bool {
        self.resizing
    }

    /// The eight handles, re-centered on the current bounds.
    ///
    /// Don't hold on to the result across a bounds change.
    pub fn resize_handles(&mut self) -> &[ResizeHandle; 8] {
        let r = self.bounds;
        let (mid_x, mid_y) = ((r.x0 + r.x1) / 2.0, (r.y0 + r.y1) / 2.0);
        let centers = [
            Point::new(r.x0, r.y0),
            Point::new(mid_x, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, mid_y),
            Point::new(r.x1, r.y1),
            Point::new(mid_x, r.y1),
            Point::new(r.x0, r.y1),
            Point::new(r.x0, mid_y),
        ];
        for (handle, center) in self.handles.iter_mut().zip(centers) {
            handle.center = center;
        }
        &self.handles
    }

    /// First handle (clockwise from top-left) whose hit square contains
    /// the screen-space `position`.
    pub fn handle_at(
        &mut self,
        position: Point,
        transform: Affine,
        size: f64,
    ) -> Option<ResizeHandle> {
        self.resize_handles()
            .iter()
            .find(|h| h.hit_rect(transform, size).contains(position))
            .copied()
    }

    pub fn begin_resize(&mut self) {
        self.initial_bounds = self.bounds;
        self.resizing = true;
    }

    pub fn end_resize(&mut self) {
        self.resizing = false;
    }

    /// Current extent over initial extent, per axis. An axis with no
    /// initial extent reports 1.
    pub fn resize_ratio(&self) -> Vec2 {
        let ratio = |now: f64, then: f64| if then == 0.0 { 1.0 } else { now / then };
        Vec2::new(
            ratio(self.bounds.width(), self.initial_bounds.width()),
            ratio(self.bounds.height(), self.initial_bounds.height()),
        )
    }
}
