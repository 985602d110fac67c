//! Pointer interaction state machine.
//!
//! [`transition`] is a pure function from the current [`InteractionState`],
//! one [`PointerEvent`] and the current [`ViewTransform`] to the next state and
//! an [`Effect`] the caller applies. Pointer positions arrive in screen space;
//! drawing positions are converted to image space at the moment of capture.
//!
//! | Current | Event | Mode | Next | Effect |
//! |---|---|---|---|---|
//! | Idle | down | draw | Drawing | - |
//! | Idle | down | pan | Panning | - |
//! | Drawing | move | any | Drawing | `Preview` |
//! | Panning | move | any | Panning | `PanBy` |
//! | Drawing | up | any | Idle | `Commit` or `Rejected` |
//! | Panning | up | any | Idle | - |
//! | Drawing/Panning | leave | any | Idle | `Cancelled` |
//!
//! The mode only decides how a pointer-down from Idle is interpreted, so
//! toggling it never interrupts a draw or pan in progress.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, ViewTransform};
use crate::model::BoundingBox;

/// A pointer event in screen-space (canvas pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    /// Primary button pressed
    Down(Point),
    /// Pointer moved
    Move(Point),
    /// Primary button released
    Up(Point),
    /// Pointer left the canvas or the gesture was cancelled by the host
    Leave,
}

/// What a pointer-down starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerMode {
    /// Drag out a new box
    #[default]
    Draw,
    /// Drag the view
    Pan,
}

impl PointerMode {
    pub fn from_pan_enabled(pan_enabled: bool) -> Self {
        if pan_enabled {
            PointerMode::Pan
        } else {
            PointerMode::Draw
        }
    }

    /// Label for a toggle control that switches *to the other* mode.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            PointerMode::Draw => "Pan Mode",
            PointerMode::Pan => "Draw Mode",
        }
    }
}

/// Gesture currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    /// No gesture.
    #[default]
    Idle,
    /// Dragging out a box; both points in image space.
    Drawing { start: Point, current: Point },
    /// Dragging the view; last pointer position in screen space.
    Panning { last: Point },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// Live rectangle while drawing.
    pub fn preview_box(&self) -> Option<BoundingBox> {
        match self {
            InteractionState::Drawing { start, current } => {
                Some(BoundingBox::from_corners(*start, *current))
            }
            _ => None,
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Nothing visible changed.
    None,
    /// The live rectangle changed.
    Preview(BoundingBox),
    /// Add a screen-space delta to the pan offset.
    PanBy { dx: f32, dy: f32 },
    /// Commit this box to the store.
    Commit(BoundingBox),
    /// The finished box was too small and is discarded.
    Rejected(BoundingBox),
    /// A gesture was aborted without committing anything.
    Cancelled,
}

impl Effect {
    /// True if the canvas must be repainted after applying this effect.
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, Effect::None)
    }
}

/// Next state plus the effect to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: InteractionState,
    pub effect: Effect,
}

impl Transition {
    fn new(next: InteractionState, effect: Effect) -> Self {
        Self { next, effect }
    }

    fn unchanged(state: InteractionState) -> Self {
        Self::new(state, Effect::None)
    }
}

/// Compute the next interaction state.
///
/// Boxes whose width or height is below `min_box_size` image-space units are
/// reported as [`Effect::Rejected`] instead of committed.
pub fn transition(
    state: InteractionState,
    event: PointerEvent,
    mode: PointerMode,
    transform: &ViewTransform,
    min_box_size: f32,
) -> Transition {
    use InteractionState::{Drawing, Idle, Panning};

    match (state, event) {
        (Idle, PointerEvent::Down(screen)) => match mode {
            PointerMode::Draw => {
                let start = transform.screen_to_image(screen);
                Transition::new(
                    Drawing {
                        start,
                        current: start,
                    },
                    Effect::None,
                )
            }
            PointerMode::Pan => Transition::new(Panning { last: screen }, Effect::None),
        },

        (Drawing { start, .. }, PointerEvent::Move(screen)) => {
            let current = transform.screen_to_image(screen);
            Transition::new(
                Drawing { start, current },
                Effect::Preview(BoundingBox::from_corners(start, current)),
            )
        }

        (Panning { last }, PointerEvent::Move(screen)) => {
            let delta = screen.delta_from(last);
            Transition::new(
                Panning { last: screen },
                Effect::PanBy {
                    dx: delta.x,
                    dy: delta.y,
                },
            )
        }

        (Drawing { start, .. }, PointerEvent::Up(screen)) => {
            let end = transform.screen_to_image(screen);
            let bbox = BoundingBox::from_corners(start, end);
            let effect = if bbox.is_degenerate(min_box_size) {
                Effect::Rejected(bbox)
            } else {
                Effect::Commit(bbox)
            };
            Transition::new(Idle, effect)
        }

        (Panning { .. }, PointerEvent::Up(_)) => Transition::unchanged(Idle),

        (Drawing { .. } | Panning { .. }, PointerEvent::Leave) => {
            Transition::new(Idle, Effect::Cancelled)
        }

        // Down during a gesture, and move/up/leave while idle, change nothing.
        (state, _) => Transition::unchanged(state),
    }
}
