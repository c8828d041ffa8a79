//! Pointer, touch and gesture events delivered by the host.

use serde::{Deserialize, Serialize};

/// Event types the picker listens for in the capture phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Pointer entered an element
    MouseOver,
    /// Pointer left an element
    MouseOut,
    /// Primary button click
    Click,
    /// Finger down
    TouchStart,
    /// Finger moved (scroll or drag)
    TouchMove,
    /// Finger up
    TouchEnd,
    /// Pinch/rotate gesture finished
    GestureEnd,
}

impl EventKind {
    /// Every kind bound on page elements for the duration of a session
    pub const ALL: [Self; 7] = [
        Self::MouseOver,
        Self::MouseOut,
        Self::Click,
        Self::TouchStart,
        Self::TouchMove,
        Self::TouchEnd,
        Self::GestureEnd,
    ];

    /// Kinds bound on placeholders and highlight borders, which only select
    pub const SELECT: [Self; 4] = [
        Self::Click,
        Self::TouchMove,
        Self::TouchEnd,
        Self::GestureEnd,
    ];

    /// DOM event type name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::Click => "click",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::GestureEnd => "gestureend",
        }
    }

    /// Whether this kind belongs to the touch family
    #[must_use]
    pub const fn is_touch(self) -> bool {
        matches!(
            self,
            Self::TouchStart | Self::TouchMove | Self::TouchEnd | Self::GestureEnd
        )
    }
}

/// An event observed on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEvent<N> {
    /// Event type
    pub kind: EventKind,
    /// Innermost element the event was dispatched to
    pub target: N,
    /// False when the page dispatched the event from script
    pub is_trusted: bool,
}

impl<N> PickerEvent<N> {
    /// Create a user-generated event
    #[must_use]
    pub const fn new(kind: EventKind, target: N) -> Self {
        Self {
            kind,
            target,
            is_trusted: true,
        }
    }

    /// Create a script-generated event
    #[must_use]
    pub const fn synthetic(kind: EventKind, target: N) -> Self {
        Self {
            kind,
            target,
            is_trusted: false,
        }
    }

    /// Create a mouse-over event
    #[must_use]
    pub const fn mouse_over(target: N) -> Self {
        Self::new(EventKind::MouseOver, target)
    }

    /// Create a mouse-out event
    #[must_use]
    pub const fn mouse_out(target: N) -> Self {
        Self::new(EventKind::MouseOut, target)
    }

    /// Create a click event
    #[must_use]
    pub const fn click(target: N) -> Self {
        Self::new(EventKind::Click, target)
    }

    /// Create a touch-start event
    #[must_use]
    pub const fn touch_start(target: N) -> Self {
        Self::new(EventKind::TouchStart, target)
    }

    /// Create a touch-move event
    #[must_use]
    pub const fn touch_move(target: N) -> Self {
        Self::new(EventKind::TouchMove, target)
    }

    /// Create a touch-end event
    #[must_use]
    pub const fn touch_end(target: N) -> Self {
        Self::new(EventKind::TouchEnd, target)
    }

    /// Create a gesture-end event
    #[must_use]
    pub const fn gesture_end(target: N) -> Self {
        Self::new(EventKind::GestureEnd, target)
    }
}

/// What the host must do with an event after the picker saw it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventResponse {
    /// Suppress the browser's default action
    pub prevent_default: bool,
    /// Stop the event from reaching page handlers
    pub stop_propagation: bool,
}

impl EventResponse {
    /// Leave the event alone
    pub const PASS: Self = Self {
        prevent_default: false,
        stop_propagation: false,
    };

    /// Keep the event from page handlers but allow its default action
    pub const STOP: Self = Self {
        prevent_default: false,
        stop_propagation: true,
    };

    /// Swallow the event entirely
    pub const CONSUME: Self = Self {
        prevent_default: true,
        stop_propagation: true,
    };

    /// Whether the page will never observe this event
    #[must_use]
    pub const fn is_consumed(self) -> bool {
        self.prevent_default && self.stop_propagation
    }
}
