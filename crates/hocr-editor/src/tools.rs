//! Canvas interaction: region tools and the gesture state machine.
//!
//! `InteractionMachine` owns the gesture protocol (`Idle` → `Selecting` |
//! `Dragging` | `Resizing` → `Idle`). Resizing is handled by the machine
//! itself; how a press starts a selection or a drag is up to the active
//! `RegionTool`.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Press | Resize | Arrow nudge |
//! |----------|-------|--------|-------------|
//! | **Shift** | Add hit element or rubber band to the selection | — | ×10 with Ctrl |
//! | **Ctrl** | — | Resize children along | ×5 |
//! | **Alt** | — | Symmetric about the center | — |

use crate::canvas::{Canvas, CanvasEffect, CursorIcon, InteractionConfig, contains_point};
use crate::error::EditorError;
use crate::input::{InputEvent, Key, Modifiers, PointerButton};
use crate::resize::{ResizeLimits, ResizeRequest, solve_resize};
use crate::selection::ResizeHandle;
use hocr_core::{NodeId, Point, Rect, Vec2, geom};

/// What a press turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// Start a rubber-band selection.
    Select,
    /// Start dragging the selection.
    Drag,
    Nothing,
}

/// Snapshot taken when a drag starts.
#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    /// Selection bounds at gesture start.
    pub initial_bounds: Rect,
    /// Bounds of every dragged element at gesture start.
    pub start: Vec<(NodeId, Rect)>,
}

/// Tool hooks the interaction machine delegates to.
pub trait RegionTool {
    /// Primary press at document point `point` that did not hit a resize
    /// handle.
    fn on_press(
        &mut self,
        canvas: &mut Canvas,
        point: Point,
        modifiers: Modifiers,
    ) -> PressOutcome;

    /// Rubber band moved: `delta` is the document offset from `origin`.
    /// Returns true if anything needs redrawing.
    fn on_select(&mut self, canvas: &mut Canvas, origin: Point, delta: Vec2) -> bool;

    /// Selection dragged by `delta` since the gesture began, to be kept
    /// within `limit`.
    fn on_drag(
        &mut self,
        canvas: &mut Canvas,
        gesture: &DragGesture,
        delta: Vec2,
        limit: Rect,
    ) -> bool;

    /// Rectangle the dragged selection must stay inside.
    fn drag_limit(&self, canvas: &Canvas) -> Rect;

    fn default_cursor(&self) -> CursorIcon {
        CursorIcon::Default
    }

    /// A rubber band was released as the normalized `rect`. `append` is
    /// set when Shift was held at the press.
    fn on_select_finished(&mut self, _canvas: &mut Canvas, _rect: Rect, _append: bool) {}
}

// ─── Rectangle Select Tool ───────────────────────────────────────────────

/// Click to select, drag to move, rubber-band to select many.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectangleSelectTool;

impl RegionTool for RectangleSelectTool {
    fn on_press(
        &mut self,
        canvas: &mut Canvas,
        point: Point,
        modifiers: Modifiers,
    ) -> PressOutcome {
        if canvas.should_show_selection() && contains_point(canvas.selection.bounds(), point) {
            return PressOutcome::Drag;
        }
        if let Some(hit) = canvas.hit_element(point) {
            if modifiers.contains(Modifiers::SHIFT) {
                canvas.select_append(&[hit]);
            } else {
                canvas.select(&[hit]);
            }
            return PressOutcome::Drag;
        }
        if !modifiers.contains(Modifiers::SHIFT) {
            canvas.select(&[]);
        }
        canvas.set_selection_bounds(Rect::from_points(point, point));
        PressOutcome::Select
    }

    fn on_select(&mut self, canvas: &mut Canvas, origin: Point, delta: Vec2) -> bool {
        let corner = origin + Vec2::new(delta.x.trunc(), delta.y.trunc());
        let band = Rect::new(origin.x, origin.y, corner.x, corner.y);
        if band == canvas.selection_bounds() {
            return false;
        }
        canvas.set_selection_bounds(band);
        true
    }

    fn on_drag(
        &mut self,
        canvas: &mut Canvas,
        gesture: &DragGesture,
        delta: Vec2,
        limit: Rect,
    ) -> bool {
        let initial = gesture.initial_bounds;
        let offset = Vec2::new(
            geom::clamp(delta.x, limit.x0 - initial.x0, limit.x1 - initial.x1).trunc(),
            geom::clamp(delta.y, limit.y0 - initial.y0, limit.y1 - initial.y1).trunc(),
        );
        let next = initial + offset;
        if next == canvas.selection.bounds() {
            return false;
        }
        canvas.selection.set_bounds(next);
        for (id, start) in &gesture.start {
            if let Some(element) = canvas.element_mut(*id) {
                element.bounds = *start + offset;
            }
        }
        true
    }

    fn drag_limit(&self, canvas: &Canvas) -> Rect {
        let mut parents = canvas
            .selected()
            .iter()
            .map(|id| canvas.element(*id).and_then(|e| e.parent));
        match parents.next() {
            Some(Some(first)) if parents.all(|p| p == Some(first)) => canvas
                .element(first)
                .map(|e| e.bounds)
                .unwrap_or_else(|| canvas.root_bounds()),
            _ => canvas.root_bounds(),
        }
    }

    fn on_select_finished(&mut self, canvas: &mut Canvas, rect: Rect, append: bool) {
        let inside = canvas.elements_within(rect);
        if inside.is_empty() {
            return;
        }
        if append {
            canvas.select_append(&inside);
        } else {
            canvas.select(&inside);
        }
    }
}

// ─── State machine ───────────────────────────────────────────────────────

/// Observable gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Selecting,
    Dragging,
    Resizing,
}

#[derive(Debug, Clone, PartialEq)]
struct ResizeGesture {
    handle: ResizeHandle,
    /// Handle center at gesture start, document space.
    offset_start: Point,
    limits: ResizeLimits,
    start: Vec<(NodeId, Rect)>,
}

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Idle,
    Selecting { origin: Point, append: bool },
    Dragging(DragGesture),
    Resizing(ResizeGesture),
}

/// Drives gestures on a `Canvas` from normalized input.
#[derive(Debug)]
pub struct InteractionMachine<T> {
    tool: T,
    config: InteractionConfig,
    gesture: Gesture,
    /// Screen position of the press that started the gesture.
    drag_start: Point,
    /// Screen position of the latest pointer event.
    last_position: Point,
    modifiers: Modifiers,
    drag_limit: Rect,
}

impl<T: RegionTool> InteractionMachine<T> {
    pub fn new(tool: T) -> Self {
        Self::with_config(tool, InteractionConfig::default())
    }

    pub fn with_config(tool: T, config: InteractionConfig) -> Self {
        Self {
            tool,
            config,
            gesture: Gesture::Idle,
            drag_start: Point::ZERO,
            last_position: Point::ZERO,
            modifiers: Modifiers::NONE,
            drag_limit: Rect::ZERO,
        }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn state(&self) -> InteractionState {
        match self.gesture {
            Gesture::Idle => InteractionState::Idle,
            Gesture::Selecting { .. } => InteractionState::Selecting,
            Gesture::Dragging(_) => InteractionState::Dragging,
            Gesture::Resizing(_) => InteractionState::Resizing,
        }
    }

    /// Feed one input event. Returns what the host should do about it.
    ///
    /// An error aborts the gesture in progress and leaves the machine
    /// idle; element bounds stay wherever the last good step put them.
    /// No effects are returned on error, so a host that captured the
    /// pointer for the aborted gesture has to release it and redraw
    /// itself, as it would for [`CanvasEffect::ReleasePointer`] and
    /// [`CanvasEffect::Redraw`].
    pub fn handle(
        &mut self,
        canvas: &mut Canvas,
        event: &InputEvent,
    ) -> Result<Vec<CanvasEffect>, EditorError> {
        let result = self.dispatch(canvas, event);
        if let Err(err) = &result {
            log::warn!("aborting {:?} gesture: {err}", self.state());
            self.gesture = Gesture::Idle;
            canvas.selection.end_resize();
        }
        result
    }

    fn dispatch(
        &mut self,
        canvas: &mut Canvas,
        event: &InputEvent,
    ) -> Result<Vec<CanvasEffect>, EditorError> {
        let mut effects = Vec::new();
        match *event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.press(canvas, Point::new(x, y), button, modifiers, &mut effects)?,
            InputEvent::PointerMove { x, y, modifiers } => {
                self.modifiers = modifiers;
                self.pointer_move(canvas, Point::new(x, y), &mut effects)?;
            }
            InputEvent::PointerUp {
                x,
                y,
                button,
                modifiers,
            } => {
                if button != PointerButton::Primary {
                    return Ok(effects);
                }
                self.modifiers = modifiers;
                self.release(canvas, Point::new(x, y), &mut effects);
            }
            InputEvent::Wheel { .. } => {
                self.drag_limit = self.tool.drag_limit(canvas);
            }
            InputEvent::TransformChanged { transform } => {
                canvas.set_transform(transform);
                self.drag_limit = self.tool.drag_limit(canvas);
                if let Gesture::Resizing(gesture) = &mut self.gesture {
                    gesture.limits = resize_limits(canvas);
                }
            }
            InputEvent::KeyDown { key, modifiers } => {
                self.modifiers = with_key(modifiers, key, true);
                if key.affects_resize() {
                    self.resize_step(canvas, &mut effects)?;
                } else if let Some(step) = key.arrow_delta() {
                    self.nudge(canvas, step, &mut effects);
                }
            }
            InputEvent::KeyUp { key, modifiers } => {
                self.modifiers = with_key(modifiers, key, false);
                if key.affects_resize() {
                    self.resize_step(canvas, &mut effects)?;
                }
            }
        }
        Ok(effects)
    }

    fn press(
        &mut self,
        canvas: &mut Canvas,
        position: Point,
        button: PointerButton,
        modifiers: Modifiers,
        effects: &mut Vec<CanvasEffect>,
    ) -> Result<(), EditorError> {
        if button != PointerButton::Primary
            || !matches!(self.gesture, Gesture::Idle)
            || !canvas.has_elements()
        {
            return Ok(());
        }
        self.modifiers = modifiers;
        self.drag_start = position;
        self.last_position = position;

        if canvas.should_show_selection() {
            let transform = canvas.transform();
            let hit = canvas
                .selection
                .handle_at(position, transform, self.config.handle_size);
            if let Some(handle) = hit {
                let cursor = handle.direction.resize_cursor()?;
                canvas.selection.begin_resize();
                let limits = resize_limits(canvas);
                let start = canvas.snapshot_bounds(&canvas.selected_elements());
                log::debug!(
                    "resize {:?} from {:?} within {limits:?}",
                    handle.direction,
                    canvas.selection.bounds()
                );
                self.gesture = Gesture::Resizing(ResizeGesture {
                    handle,
                    offset_start: handle.center,
                    limits,
                    start,
                });
                effects.extend(canvas.set_cursor(cursor));
                effects.push(CanvasEffect::CapturePointer);
                effects.push(CanvasEffect::Redraw);
                return Ok(());
            }
        }

        let point = truncate(canvas.to_document(position));
        match self.tool.on_press(canvas, point, modifiers) {
            PressOutcome::Select => {
                log::debug!("rubber band from {point:?}");
                self.gesture = Gesture::Selecting {
                    origin: point,
                    append: modifiers.contains(Modifiers::SHIFT),
                };
                effects.push(CanvasEffect::CapturePointer);
            }
            PressOutcome::Drag => {
                self.drag_limit = self.tool.drag_limit(canvas);
                let gesture = DragGesture {
                    initial_bounds: canvas.selection.bounds(),
                    start: canvas.snapshot_bounds(&canvas.selected_elements()),
                };
                log::debug!(
                    "drag {} elements within {:?}",
                    gesture.start.len(),
                    self.drag_limit
                );
                self.gesture = Gesture::Dragging(gesture);
                effects.push(CanvasEffect::CapturePointer);
            }
            PressOutcome::Nothing => {}
        }
        push_selection_change(canvas, effects);
        effects.push(CanvasEffect::Redraw);
        Ok(())
    }

    fn pointer_move(
        &mut self,
        canvas: &mut Canvas,
        position: Point,
        effects: &mut Vec<CanvasEffect>,
    ) -> Result<(), EditorError> {
        self.last_position = position;
        let delta = canvas.delta_to_document(position - self.drag_start);
        let redraw = match &self.gesture {
            Gesture::Idle => {
                let cursor = self.hover_cursor(canvas, position)?;
                effects.extend(canvas.set_cursor(cursor));
                false
            }
            Gesture::Selecting { origin, .. } => self.tool.on_select(canvas, *origin, delta),
            Gesture::Dragging(gesture) => {
                self.tool.on_drag(canvas, gesture, delta, self.drag_limit)
            }
            Gesture::Resizing(_) => self.perform_resize(canvas)?,
        };
        if redraw {
            effects.push(CanvasEffect::Redraw);
        }
        Ok(())
    }

    fn hover_cursor(
        &self,
        canvas: &mut Canvas,
        position: Point,
    ) -> Result<CursorIcon, EditorError> {
        if !canvas.should_show_selection() {
            return Ok(self.tool.default_cursor());
        }
        let transform = canvas.transform();
        if let Some(handle) = canvas
            .selection
            .handle_at(position, transform, self.config.handle_size)
        {
            return handle.direction.resize_cursor();
        }
        if contains_point(canvas.selection.bounds(), canvas.to_document(position)) {
            return Ok(CursorIcon::Move);
        }
        Ok(self.tool.default_cursor())
    }

    /// Re-solve the resize for the latest pointer position and modifiers.
    fn perform_resize(&self, canvas: &mut Canvas) -> Result<bool, EditorError> {
        // Only reachable while resizing; the gesture carries the handle.
        let Gesture::Resizing(gesture) = &self.gesture else {
            return Ok(false);
        };
        let delta = canvas.delta_to_document(self.last_position - self.drag_start);
        let with_children =
            canvas.selected().len() > 1 || self.modifiers.contains(Modifiers::CTRL);
        let request = ResizeRequest {
            direction: gesture.handle.direction,
            location: gesture.offset_start + delta,
            initial: canvas.selection.initial_bounds(),
            limits: gesture.limits,
            with_children,
            symmetric: self.modifiers.contains(Modifiers::ALT),
        };
        let outcome = solve_resize(&request)?;
        canvas.selection.set_bounds(outcome.bounds);
        for (id, start) in &gesture.start {
            let bounds = if with_children || canvas.selected().contains(id) {
                outcome.place(*start)
            } else {
                *start
            };
            if let Some(element) = canvas.element_mut(*id) {
                element.bounds = bounds;
            }
        }
        Ok(true)
    }

    /// Modifier change mid-resize: solve again without pointer motion.
    fn resize_step(
        &mut self,
        canvas: &mut Canvas,
        effects: &mut Vec<CanvasEffect>,
    ) -> Result<(), EditorError> {
        if self.perform_resize(canvas)? {
            effects.push(CanvasEffect::Redraw);
        }
        Ok(())
    }

    fn release(&mut self, canvas: &mut Canvas, position: Point, effects: &mut Vec<CanvasEffect>) {
        self.last_position = position;
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => return,
            Gesture::Selecting { append, .. } => {
                let band = canvas.selection_bounds().abs();
                canvas.set_selection_bounds(band);
                self.tool.on_select_finished(canvas, band, append);
                log::debug!("rubber band committed as {band:?}");
                effects.push(CanvasEffect::SelectionBounds(band));
            }
            Gesture::Dragging(gesture) => commit(canvas, &gesture.start, effects),
            Gesture::Resizing(gesture) => {
                canvas.selection.end_resize();
                commit(canvas, &gesture.start, effects);
            }
        }
        push_selection_change(canvas, effects);
        effects.push(CanvasEffect::ReleasePointer);
        effects.push(CanvasEffect::Redraw);
    }

    /// Arrow keys: a one-shot drag, committed right away.
    fn nudge(&mut self, canvas: &mut Canvas, step: Vec2, effects: &mut Vec<CanvasEffect>) {
        if !matches!(self.gesture, Gesture::Idle) || !canvas.should_show_selection() {
            return;
        }
        let multiplier = if self.modifiers.contains(Modifiers::CTRL | Modifiers::SHIFT) {
            self.config.nudge_ctrl_shift_multiplier
        } else if self.modifiers.contains(Modifiers::CTRL) {
            self.config.nudge_ctrl_multiplier
        } else {
            1.0
        };
        let gesture = DragGesture {
            initial_bounds: canvas.selection.bounds(),
            start: canvas.snapshot_bounds(&canvas.selected_elements()),
        };
        let limit = self.tool.drag_limit(canvas);
        if self.tool.on_drag(canvas, &gesture, step * multiplier, limit) {
            commit(canvas, &gesture.start, effects);
            effects.push(CanvasEffect::Redraw);
        }
    }
}

/// Inside and outside limits for resizing the current selection.
///
/// Built from committed bboxes only: mid-gesture the live bounds of the
/// selection and its children are already resized.
fn resize_limits(canvas: &Canvas) -> ResizeLimits {
    let root_bbox = canvas
        .root()
        .and_then(|id| canvas.element(id))
        .map(|e| e.bbox)
        .unwrap_or(Rect::ZERO);
    let [single] = canvas.selected() else {
        return ResizeLimits::within(root_bbox);
    };
    let Some(element) = canvas.element(*single) else {
        return ResizeLimits::within(root_bbox);
    };
    let inside = geom::union_all(
        element
            .children
            .iter()
            .filter_map(|c| canvas.element(*c))
            .map(|c| c.bbox)
            .filter(|b| geom::contains_rect(element.bbox, *b)),
    );
    let outside = element
        .parent
        .and_then(|p| canvas.element(p))
        .map(|p| p.bbox)
        .unwrap_or(root_bbox);
    ResizeLimits { inside, outside }
}

/// Diff elements against their gesture-start bounds and hand the
/// differences over as one batch.
fn commit(canvas: &mut Canvas, start: &[(NodeId, Rect)], effects: &mut Vec<CanvasEffect>) {
    canvas.update_selection();
    let bounds = canvas.selection.bounds();
    canvas.set_selection_bounds(bounds);
    effects.push(CanvasEffect::SelectionBounds(bounds));

    let changes = canvas.diff_bounds(start);
    if changes.is_empty() {
        return;
    }
    log::debug!("committing bounds of {} nodes", changes.len());
    effects.push(CanvasEffect::NodesChanged(changes));
}

fn push_selection_change(canvas: &mut Canvas, effects: &mut Vec<CanvasEffect>) {
    if let Some(selected) = canvas.take_selection_change() {
        effects.push(CanvasEffect::SelectionChanged(selected));
    }
}

fn with_key(modifiers: Modifiers, key: Key, down: bool) -> Modifiers {
    let flag = match key {
        Key::Control => Modifiers::CTRL,
        Key::Alt => Modifiers::ALT,
        Key::Shift => Modifiers::SHIFT,
        _ => return modifiers,
    };
    let mut out = modifiers;
    out.set(flag, down);
    out
}

fn truncate(p: Point) -> Point {
    Point::new(p.x.trunc(), p.y.trunc())
}
