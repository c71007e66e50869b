use crt_core::presets::Preset;

// ---------------------------------------------------------------------------
// Key — windowing-library-independent key representation
// ---------------------------------------------------------------------------

/// A keyboard key bound to a demo action, independent of any windowing
/// library.
///
/// `main.rs` maps `winit::keyboard::PhysicalKey` → `Key`; everything else
/// in the input pipeline works purely with this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Space,
    Enter,
    T,
    M,
    L,
    Q,
    Escape,
}

// ---------------------------------------------------------------------------
// InputAction — what the app does in response to input
// ---------------------------------------------------------------------------

/// High-level action produced by a key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    LoadPreset(Preset),
    CycleNextPreset,
    /// Start the effect if stopped, stop it if running.
    ToggleEffect,
    ToggleRetrace,
    ToggleDotMask,
    /// Re-read the config file the demo was launched with.
    ReloadConfig,
    Quit,
}

// ---------------------------------------------------------------------------
// InputState
// ---------------------------------------------------------------------------

pub struct InputState;

impl InputState {
    pub fn new() -> Self {
        Self
    }

    /// Translate a `Key` press into an `InputAction`, if the key is mapped.
    pub fn on_key(&self, key: Key) -> Option<InputAction> {
        match key {
            Key::Digit1 => Some(InputAction::LoadPreset(Preset::Standard)),
            Key::Digit2 => Some(InputAction::LoadPreset(Preset::Clean)),
            Key::Digit3 => Some(InputAction::LoadPreset(Preset::Arcade)),
            Key::Digit4 => Some(InputAction::LoadPreset(Preset::BrokenSignal)),
            Key::Space => Some(InputAction::CycleNextPreset),
            Key::Enter => Some(InputAction::ToggleEffect),
            Key::T => Some(InputAction::ToggleRetrace),
            Key::M => Some(InputAction::ToggleDotMask),
            Key::L => Some(InputAction::ReloadConfig),
            Key::Q | Key::Escape => Some(InputAction::Quit),
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinate mapping (pure, testable)
// ---------------------------------------------------------------------------

/// Map a cursor position in window pixels to source-surface pixels.
///
/// The shader surface is stretched over the whole window, so each axis
/// scales independently.
pub fn window_to_canvas(
    x: f64,
    y: f64,
    window: (u32, u32),
    canvas: (u32, u32),
) -> (f64, f64) {
    let sx = canvas.0 as f64 / window.0.max(1) as f64;
    let sy = canvas.1 as f64 / window.1.max(1) as f64;
    (x * sx, y * sy)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> InputState {
        InputState::new()
    }

    // --- Digit keys load the correct preset -----------------------------------

    #[test]
    fn digit_1_loads_standard() {
        assert_eq!(
            input().on_key(Key::Digit1),
            Some(InputAction::LoadPreset(Preset::Standard))
        );
    }

    #[test]
    fn digit_2_loads_clean() {
        assert_eq!(
            input().on_key(Key::Digit2),
            Some(InputAction::LoadPreset(Preset::Clean))
        );
    }

    #[test]
    fn digit_4_loads_broken_signal() {
        assert_eq!(
            input().on_key(Key::Digit4),
            Some(InputAction::LoadPreset(Preset::BrokenSignal))
        );
    }

    #[test]
    fn all_digit_keys_map_to_different_presets() {
        let presets: Vec<_> = [Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4]
            .iter()
            .map(|&k| input().on_key(k))
            .collect();

        for i in 0..presets.len() {
            for j in (i + 1)..presets.len() {
                assert_ne!(presets[i], presets[j], "keys {i} and {j} collide");
            }
        }
    }

    // --- Other key mappings ---------------------------------------------------

    #[test]
    fn space_cycles_next_preset() {
        assert_eq!(
            input().on_key(Key::Space),
            Some(InputAction::CycleNextPreset)
        );
    }

    #[test]
    fn enter_toggles_effect() {
        assert_eq!(input().on_key(Key::Enter), Some(InputAction::ToggleEffect));
    }

    #[test]
    fn t_and_m_toggle_switches() {
        assert_eq!(input().on_key(Key::T), Some(InputAction::ToggleRetrace));
        assert_eq!(input().on_key(Key::M), Some(InputAction::ToggleDotMask));
    }

    #[test]
    fn l_reloads_config() {
        assert_eq!(input().on_key(Key::L), Some(InputAction::ReloadConfig));
    }

    #[test]
    fn q_and_escape_quit() {
        assert_eq!(input().on_key(Key::Q), Some(InputAction::Quit));
        assert_eq!(input().on_key(Key::Escape), Some(InputAction::Quit));
    }

    // --- Coordinate mapping ---------------------------------------------------

    #[test]
    fn same_size_window_is_identity() {
        assert_eq!(
            window_to_canvas(12.0, 34.0, (480, 360), (480, 360)),
            (12.0, 34.0)
        );
    }

    #[test]
    fn hidpi_window_halves_coordinates() {
        assert_eq!(
            window_to_canvas(200.0, 100.0, (960, 720), (480, 360)),
            (100.0, 50.0)
        );
    }

    #[test]
    fn zero_sized_window_does_not_divide_by_zero() {
        let (x, y) = window_to_canvas(5.0, 5.0, (0, 0), (480, 360));
        assert!(x.is_finite() && y.is_finite());
    }
}
