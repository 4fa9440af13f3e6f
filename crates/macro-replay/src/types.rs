//! Common types for macro-replay.
//!
//! Hotkey combinations are stored on recordings and in the configuration
//! but interpreted by an external registration layer; this module only
//! gives them a typed shape.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Virtual key code for F6 (default "begin recording" hotkey).
pub const VK_F6: u32 = 0x75;

/// Virtual key code for F7 (default "stop" hotkey).
pub const VK_F7: u32 = 0x76;

/// Virtual key code for F8 (default "begin playback" hotkey).
pub const VK_F8: u32 = 0x77;

bitflags! {
    /// Modifier keys held as part of a hotkey combination.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HotkeyModifiers: u32 {
        /// Alt key.
        const ALT = 1;
        /// Control key.
        const CONTROL = 2;
        /// Shift key.
        const SHIFT = 4;
        /// Windows / command key.
        const WIN = 8;
    }
}

impl Serialize for HotkeyModifiers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for HotkeyModifiers {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

/// A key combination bound to an activation signal or a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hotkey {
    /// Virtual key code.
    pub code: u32,
    /// Modifier keys.
    #[serde(default)]
    pub modifiers: HotkeyModifiers,
}

impl Hotkey {
    /// Create a hotkey without modifiers.
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self {
            code,
            modifiers: HotkeyModifiers::empty(),
        }
    }

    /// Add modifiers to the hotkey.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: HotkeyModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check whether a key press matches this hotkey exactly.
    #[must_use]
    pub fn matches(&self, code: u32, modifiers: HotkeyModifiers) -> bool {
        self.code == code && self.modifiers == modifiers
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (HotkeyModifiers::CONTROL, "Ctrl"),
            (HotkeyModifiers::ALT, "Alt"),
            (HotkeyModifiers::SHIFT, "Shift"),
            (HotkeyModifiers::WIN, "Win"),
        ];
        for (flag, name) in names {
            if self.modifiers.contains(flag) {
                write!(f, "{name}+")?;
            }
        }
        match self.code {
            0x70..=0x87 => write!(f, "F{}", self.code - 0x6F),
            code => write!(f, "{code:#04x}"),
        }
    }
}
