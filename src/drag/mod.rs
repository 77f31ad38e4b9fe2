//! Drag-to-reorder gesture handling.
//!
//! [`DragSession`] turns pointer and keyboard input over a rendered list into
//! at most one [`ReorderIntent`] per gesture. Nothing is committed while a
//! drag is active; the session only exposes an overlay and a preview order.
//! A completed intent is handed to a [`DragSortSurface`], normally a list
//! controller.
//!
//! ## Gesture rules
//!
//! 1. A pointer press becomes a drag only after it travels the activation
//!    distance. A press released before that is a click.
//! 2. Keyboard drags start on pick, move one slot per key, and finish on drop.
//! 3. A drop reports `(from, to)` exactly once, and only if `from != to`.
//! 4. Cancel, disable, or a shrinking list ends the drag without an intent.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{self, DragSettings};

/// Receives committed reorders
#[async_trait]
pub trait DragSortSurface: Send + Sync {
    async fn on_reorder_committed(&self, from: usize, to: usize);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    /// Pointer travel in px before a press activates a drag
    pub activation_distance: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            activation_distance: 8.0,
        }
    }
}

impl From<&DragSettings> for DragConfig {
    fn from(settings: &DragSettings) -> Self {
        Self {
            activation_distance: settings.activation_distance.max(0.0),
        }
    }
}

impl DragConfig {
    /// Settings from the global application config
    pub fn from_config() -> Self {
        Self::from(&config::config().drag)
    }

    pub fn with_activation_distance(mut self, distance: f64) -> Self {
        self.activation_distance = distance.max(0.0);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensor {
    Pointer,
    Keyboard,
}

/// Net position change produced by one finished drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReorderIntent {
    pub from: usize,
    pub to: usize,
}

impl ReorderIntent {
    pub async fn dispatch<S: DragSortSurface + ?Sized>(self, surface: &S) {
        tracing::debug!("Reorder committed: {} -> {}", self.from, self.to);
        surface.on_reorder_committed(self.from, self.to).await;
    }
}

/// Detached rendering of the dragged row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overlay {
    /// Row being dragged, as an index into the committed order
    pub index: usize,
    /// Slot the row would land in if dropped now
    pub over: usize,
    pub sensor: Sensor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Pressed { index: usize, origin: Point },
    Dragging { from: usize, over: usize, sensor: Sensor },
}

#[derive(Debug, Clone)]
pub struct DragSession {
    config: DragConfig,
    len: usize,
    disabled: bool,
    phase: Phase,
}

impl DragSession {
    pub fn new(config: DragConfig, len: usize) -> Self {
        Self {
            config,
            len,
            disabled: false,
            phase: Phase::Idle,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Track the rendered row count; a drag that no longer fits is cancelled
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        let out_of_range = match self.phase {
            Phase::Idle => false,
            Phase::Pressed { index, .. } => index >= len,
            Phase::Dragging { from, over, .. } => from >= len || over >= len,
        };
        if out_of_range {
            self.cancel();
        }
    }

    /// Disabled lists accept no new gestures and drop the current one
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.cancel();
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn overlay(&self) -> Option<Overlay> {
        match self.phase {
            Phase::Dragging { from, over, sensor } => Some(Overlay { index: from, over, sensor }),
            _ => None,
        }
    }

    /// Row indices in the order they should render right now.
    ///
    /// Identity when idle; while dragging the active row sits at its hover slot.
    pub fn preview(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len).collect();
        if let Phase::Dragging { from, over, .. } = self.phase {
            let moved = order.remove(from);
            order.insert(over, moved);
        }
        order
    }

    /// Returns false when the press is ignored
    pub fn pointer_down(&mut self, index: usize, at: Point) -> bool {
        if !self.accepts_new_gesture(index) {
            return false;
        }
        self.phase = Phase::Pressed { index, origin: at };
        true
    }

    /// Returns true on the move that activates the drag
    pub fn pointer_move(&mut self, at: Point) -> bool {
        if let Phase::Pressed { index, origin } = self.phase {
            if origin.distance_to(at) >= self.config.activation_distance {
                self.phase = Phase::Dragging {
                    from: index,
                    over: index,
                    sensor: Sensor::Pointer,
                };
                return true;
            }
        }
        false
    }

    /// Pointer is hovering the row at `index`
    pub fn pointer_over(&mut self, index: usize) {
        if let Phase::Dragging { over, sensor: Sensor::Pointer, .. } = &mut self.phase {
            if index < self.len {
                *over = index;
            }
        }
    }

    pub fn pointer_up(&mut self) -> Option<ReorderIntent> {
        match self.phase {
            Phase::Pressed { .. } => {
                self.phase = Phase::Idle;
                None
            }
            Phase::Dragging { sensor: Sensor::Pointer, .. } => self.finish(),
            _ => None,
        }
    }

    /// Keyboard drags activate immediately
    pub fn key_pick(&mut self, index: usize) -> bool {
        if !self.accepts_new_gesture(index) {
            return false;
        }
        self.phase = Phase::Dragging {
            from: index,
            over: index,
            sensor: Sensor::Keyboard,
        };
        true
    }

    pub fn key_up(&mut self) {
        if let Phase::Dragging { over, sensor: Sensor::Keyboard, .. } = &mut self.phase {
            *over = over.saturating_sub(1);
        }
    }

    pub fn key_down(&mut self) {
        let last = self.len.saturating_sub(1);
        if let Phase::Dragging { over, sensor: Sensor::Keyboard, .. } = &mut self.phase {
            *over = (*over + 1).min(last);
        }
    }

    pub fn key_drop(&mut self) -> Option<ReorderIntent> {
        match self.phase {
            Phase::Dragging { sensor: Sensor::Keyboard, .. } => self.finish(),
            _ => None,
        }
    }

    /// Abandon the gesture (Escape, focus loss)
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            tracing::debug!("Drag cancelled");
        }
        self.phase = Phase::Idle;
    }

    fn accepts_new_gesture(&self, index: usize) -> bool {
        !self.disabled && self.phase == Phase::Idle && index < self.len
    }

    fn finish(&mut self) -> Option<ReorderIntent> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        match phase {
            Phase::Dragging { from, over, .. } if from != over => Some(ReorderIntent { from, to: over }),
            _ => None,
        }
    }
}

/// A rendered list wired to the surface that persists its reorders
pub struct SortableList<S: DragSortSurface + ?Sized> {
    session: DragSession,
    surface: Arc<S>,
}

impl<S: DragSortSurface + ?Sized> SortableList<S> {
    pub fn new(surface: Arc<S>, config: DragConfig, len: usize) -> Self {
        Self {
            session: DragSession::new(config, len),
            surface,
        }
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DragSession {
        &mut self.session
    }

    /// Release the pointer and forward any resulting intent
    pub async fn pointer_up(&mut self) -> Option<ReorderIntent> {
        let intent = self.session.pointer_up()?;
        intent.dispatch(self.surface.as_ref()).await;
        Some(intent)
    }

    pub async fn key_drop(&mut self) -> Option<ReorderIntent> {
        let intent = self.session.key_drop()?;
        intent.dispatch(self.surface.as_ref()).await;
        Some(intent)
    }
}
