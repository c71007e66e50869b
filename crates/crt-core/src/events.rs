//! Pointer and keyboard events that the shader surface hands back to the
//! source surface.

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// The six event types the shader surface listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    MouseMove,
    MouseDown,
    MouseUp,
    KeyDown,
    KeyUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Pointer,
    Keyboard,
}

impl EventType {
    pub const FORWARDED: [EventType; 6] = [
        EventType::Click,
        EventType::MouseMove,
        EventType::MouseDown,
        EventType::MouseUp,
        EventType::KeyDown,
        EventType::KeyUp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::MouseMove => "mousemove",
            EventType::MouseDown => "mousedown",
            EventType::MouseUp => "mouseup",
            EventType::KeyDown => "keydown",
            EventType::KeyUp => "keyup",
        }
    }

    pub fn category(self) -> EventCategory {
        match self {
            EventType::Click | EventType::MouseMove | EventType::MouseDown | EventType::MouseUp => {
                EventCategory::Pointer
            }
            EventType::KeyDown | EventType::KeyUp => EventCategory::Keyboard,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
    Other(u16),
}

impl PointerButton {
    /// DOM `button` numbering.
    pub fn code(self) -> u16 {
        match self {
            PointerButton::Primary => 0,
            PointerButton::Auxiliary => 1,
            PointerButton::Secondary => 2,
            PointerButton::Other(n) => n,
        }
    }

    /// Bit this button occupies in a `buttons` mask.
    pub fn mask(self) -> u16 {
        match self {
            PointerButton::Primary => 1,
            PointerButton::Secondary => 2,
            PointerButton::Auxiliary => 4,
            PointerButton::Other(n) => 1u16.checked_shl(n as u32).unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Click,
    Move,
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Down,
    Up,
}

/// Coordinates are in source-surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f64,
    pub y: f64,
    pub button: PointerButton,
    /// Mask of buttons held while the event fired.
    pub buttons: u16,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyKind,
    /// Logical key, e.g. `"a"` or `"Enter"`.
    pub key: String,
    /// Physical key code, e.g. `"KeyA"`.
    pub code: String,
    pub repeat: bool,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Keyboard(KeyEvent),
}

impl InputEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            InputEvent::Pointer(p) => match p.kind {
                PointerKind::Click => EventType::Click,
                PointerKind::Move => EventType::MouseMove,
                PointerKind::Down => EventType::MouseDown,
                PointerKind::Up => EventType::MouseUp,
            },
            InputEvent::Keyboard(k) => match k.kind {
                KeyKind::Down => EventType::KeyDown,
                KeyKind::Up => EventType::KeyUp,
            },
        }
    }

    pub fn category(&self) -> EventCategory {
        self.event_type().category()
    }

    /// Build the synthetic copy dispatched on the source surface. Each
    /// category copies a fixed set of fields.
    pub fn redispatch(&self) -> InputEvent {
        match self {
            InputEvent::Pointer(p) => InputEvent::Pointer(PointerEvent {
                kind: p.kind,
                x: p.x,
                y: p.y,
                button: p.button,
                buttons: p.buttons,
                modifiers: p.modifiers,
            }),
            InputEvent::Keyboard(k) => InputEvent::Keyboard(KeyEvent {
                kind: k.kind,
                key: k.key.clone(),
                code: k.code.clone(),
                repeat: k.repeat,
                modifiers: k.modifiers,
            }),
        }
    }
}
