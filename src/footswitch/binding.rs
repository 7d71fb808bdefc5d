use serde::{Deserialize, Serialize};

/// Highest value a MIDI data byte can carry.
pub const MIDI_DATA_MAX: u8 = 127;

/// First controller number of the channel-mode range (120..=127).
pub const CHANNEL_MODE_FIRST: u8 = 120;

/// How a button reacts to physical presses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonMode {
    /// ON while held, OFF on release.
    #[default]
    Push,
    /// Flips on each press, release is ignored.
    Toggle,
}

/// Message family a binding emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[default]
    #[serde(rename = "cc")]
    ControlChange,
    #[serde(rename = "note")]
    Note,
}

/// What one button does on one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(default)]
    pub kind: MessageKind,
    pub number: u8,
    #[serde(default)]
    pub mode: ButtonMode,
}

impl Binding {
    pub fn cc(number: u8, mode: ButtonMode) -> Self {
        Self {
            kind: MessageKind::ControlChange,
            number,
            mode,
        }
    }

    #[allow(dead_code)]
    pub fn note(number: u8, mode: ButtonMode) -> Self {
        Self {
            kind: MessageKind::Note,
            number,
            mode,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.number <= MIDI_DATA_MAX
    }

    /// Controllers 120..=127 are channel-mode messages rather than
    /// assignable controllers.
    pub fn is_channel_mode(&self) -> bool {
        self.kind == MessageKind::ControlChange && self.number >= CHANNEL_MODE_FIRST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_binding_with_defaults() {
        let binding: Binding = serde_yaml::from_str("{ number: 49 }").unwrap();
        assert_eq!(binding, Binding::cc(49, ButtonMode::Push));

        let binding: Binding =
            serde_yaml::from_str("{ kind: note, number: 60, mode: toggle }").unwrap();
        assert_eq!(binding, Binding::note(60, ButtonMode::Toggle));
    }

    #[test]
    fn flags_channel_mode_controllers() {
        assert!(!Binding::cc(119, ButtonMode::Push).is_channel_mode());
        assert!(Binding::cc(123, ButtonMode::Push).is_channel_mode());
        assert!(!Binding::note(123, ButtonMode::Push).is_channel_mode());
        assert!(!Binding::cc(128, ButtonMode::Push).is_valid());
    }
}
