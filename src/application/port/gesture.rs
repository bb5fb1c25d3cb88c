// SPDX-License-Identifier: MPL-2.0
//! Pinch gesture port definition.

use crate::domain::Point;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Start,
    Move,
    End,
    Abort,
}

/// One pinch sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub phase: GesturePhase,
    /// Focal point in viewport coordinates.
    pub focal: Point,
    /// Pinch scale relative to the start of the gesture (1.0 = unchanged,
    /// larger = fingers spread apart).
    pub scale: f64,
}

impl GestureEvent {
    #[must_use]
    pub fn start(focal: Point) -> Self {
        Self {
            phase: GesturePhase::Start,
            focal,
            scale: 1.0,
        }
    }

    #[must_use]
    pub fn moved(focal: Point, scale: f64) -> Self {
        Self {
            phase: GesturePhase::Move,
            focal,
            scale,
        }
    }

    #[must_use]
    pub fn end(focal: Point) -> Self {
        Self {
            phase: GesturePhase::End,
            focal,
            scale: 1.0,
        }
    }

    #[must_use]
    pub fn abort(focal: Point) -> Self {
        Self {
            phase: GesturePhase::Abort,
            focal,
            scale: 1.0,
        }
    }
}

/// Anything that yields pinch samples in order.
pub trait GestureSource {
    fn next_event(&mut self) -> Option<GestureEvent>;
}

impl GestureSource for VecDeque<GestureEvent> {
    fn next_event(&mut self) -> Option<GestureEvent> {
        self.pop_front()
    }
}
