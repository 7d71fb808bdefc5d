//! Line protocol for inspecting and rebinding the footswitch at runtime.
//!
//! Slots are addressed as `layer * button_count + button`. Message type is
//! `1` for CC and `0` for Note; mode is `1` for toggle and `0` for push.
//!
//! ```text
//! > GET
//! < BTN:0:1:49:0
//! < ...
//! < OK: GET
//! > SET 12 0 60 1
//! < OK: SET 12
//! ```

use std::{fmt, str::FromStr};

use log::{info, warn};

use crate::footswitch::{Binding, ButtonMode, ControllerState, Layer, MessageKind, MIDI_DATA_MAX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Get,
    Set {
        slot: usize,
        kind: MessageKind,
        number: u8,
        mode: ButtonMode,
    },
    Save,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();

        match name.to_ascii_uppercase().as_str() {
            "GET" => Ok(Command::Get),
            "SAVE" => Ok(Command::Save),
            "SET" => {
                let args: Vec<u32> = parts
                    .map(|part| {
                        part.parse::<u32>()
                            .map_err(|_| CommandError::Syntax(format!("not a number: {part}")))
                    })
                    .collect::<Result<_, _>>()?;
                let [slot, kind, number, mode] = args[..] else {
                    return Err(CommandError::Syntax(
                        "usage: SET <slot> <type> <value> <mode>".into(),
                    ));
                };

                let kind = match kind {
                    0 => MessageKind::Note,
                    1 => MessageKind::ControlChange,
                    other => return Err(CommandError::Syntax(format!("unknown type {other}"))),
                };
                let mode = match mode {
                    0 => ButtonMode::Push,
                    1 => ButtonMode::Toggle,
                    other => return Err(CommandError::Syntax(format!("unknown mode {other}"))),
                };
                let number = u8::try_from(number)
                    .ok()
                    .filter(|&n| n <= MIDI_DATA_MAX)
                    .ok_or(CommandError::ValueOutOfRange(number))?;

                Ok(Command::Set {
                    slot: slot as usize,
                    kind,
                    number,
                    mode,
                })
            }
            _ => Err(CommandError::Unknown(line.trim().to_string())),
        }
    }
}

impl Command {
    /// Apply the command to the live state and return the reply lines.
    pub fn execute(self, state: &mut ControllerState) -> Result<Vec<String>, CommandError> {
        match self {
            Command::Get => {
                let count = state.buttons().len();
                let mut lines = Vec::new();
                for layer in Layer::ALL {
                    for index in 0..count {
                        if let Some(binding) = state.lookup(layer, index) {
                            let slot = layer.index() * count + index;
                            lines.push(format_slot(slot, binding));
                        }
                    }
                }
                lines.push("OK: GET".to_string());
                Ok(lines)
            }
            Command::Set {
                slot,
                kind,
                number,
                mode,
            } => {
                let count = state.buttons().len();
                let layer =
                    Layer::from_index(slot / count).ok_or(CommandError::SlotOutOfRange(slot))?;
                let index = slot % count;
                let binding = Binding { kind, number, mode };
                if binding.is_channel_mode() {
                    warn!(
                        "button {index} on {layer}: CC {} is a channel-mode message",
                        binding.number
                    );
                }

                state.rebind(layer, index, Some(binding));
                info!("button {index} on {layer} rebound to {}", format_slot(slot, binding));
                Ok(vec![format!("OK: SET {slot}")])
            }
            Command::Save => Err(CommandError::Unsupported("SAVE")),
        }
    }
}

/// Parse and run one line, turning failures into an `ERR:` reply.
pub fn handle_line(state: &mut ControllerState, line: &str) -> Vec<String> {
    match line.parse::<Command>().and_then(|cmd| cmd.execute(state)) {
        Ok(lines) => lines,
        Err(err) => vec![format!("ERR: {err}")],
    }
}

fn format_slot(slot: usize, binding: Binding) -> String {
    let kind = match binding.kind {
        MessageKind::ControlChange => 1,
        MessageKind::Note => 0,
    };
    let mode = match binding.mode {
        ButtonMode::Push => 0,
        ButtonMode::Toggle => 1,
    };
    format!("BTN:{slot}:{kind}:{}:{mode}", binding.number)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    Syntax(String),
    SlotOutOfRange(usize),
    ValueOutOfRange(u32),
    Unsupported(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(line) => write!(f, "unknown command \"{line}\""),
            CommandError::Syntax(reason) => write!(f, "{reason}"),
            CommandError::SlotOutOfRange(slot) => write!(f, "slot {slot} does not exist"),
            CommandError::ValueOutOfRange(value) => {
                write!(f, "value {value} is outside 0..=127")
            }
            CommandError::Unsupported(name) => {
                write!(f, "{name} is not supported, settings are not persisted")
            }
        }
    }
}

impl std::error::Error for CommandError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;

    fn state() -> ControllerState {
        ControllerState::from_config(&BoardConfig::default())
    }

    #[test]
    fn get_lists_mapped_slots() {
        let mut state = state();
        let lines = handle_line(&mut state, "GET");

        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "BTN:0:1:49:0");
        assert_eq!(lines[8], "BTN:8:1:19:0");
        assert_eq!(lines[10], "OK: GET");
    }

    #[test]
    fn set_rebinds_slot_on_third_layer() {
        let mut state = state();

        assert_eq!(handle_line(&mut state, "SET 12 0 60 1"), vec!["OK: SET 12"]);
        assert_eq!(
            state.lookup(Layer::Down, 2),
            Some(Binding::note(60, ButtonMode::Toggle))
        );
        assert!(handle_line(&mut state, "get").contains(&"BTN:12:0:60:1".to_string()));
    }

    #[test]
    fn set_accepts_channel_mode_controller() {
        let mut state = state();

        assert_eq!(handle_line(&mut state, "SET 6 1 123 0"), vec!["OK: SET 6"]);
        let binding = state.lookup(Layer::Off, 1).unwrap();
        assert_eq!(binding, Binding::cc(123, ButtonMode::Push));
        assert!(binding.is_channel_mode());
    }

    #[test]
    fn set_while_held_keeps_release_paired() {
        let mut state = state();
        state.process(0, true, 0).unwrap();

        assert_eq!(handle_line(&mut state, "SET 5 1 90 0"), vec!["OK: SET 5"]);
        let release = state.process(0, false, 500).unwrap();
        assert_eq!(
            release.message,
            crate::midi::MidiMessage::ControlChange {
                channel: 0,
                controller: 16,
                value: 0
            }
        );
        assert_eq!(
            state.lookup(Layer::Off, 0),
            Some(Binding::cc(90, ButtonMode::Push))
        );
    }

    #[test]
    fn rejects_bad_input() {
        let mut state = state();

        assert_eq!(
            handle_line(&mut state, "SET 15 1 10 0"),
            vec!["ERR: slot 15 does not exist"]
        );
        assert_eq!(
            handle_line(&mut state, "SET 1 1 128 0"),
            vec!["ERR: value 128 is outside 0..=127"]
        );
        assert!(handle_line(&mut state, "SET 1 2 10 0")[0].starts_with("ERR: unknown type"));
        assert!(handle_line(&mut state, "SET 1 1")[0].starts_with("ERR: usage"));
        assert!(handle_line(&mut state, "SAVE")[0].starts_with("ERR: SAVE"));
        assert_eq!(
            handle_line(&mut state, "PING"),
            vec!["ERR: unknown command \"PING\""]
        );
    }

    #[test]
    fn parses_set_arguments() {
        let command: Command = "set 3 1 80 0".parse().unwrap();
        assert_eq!(
            command,
            Command::Set {
                slot: 3,
                kind: MessageKind::ControlChange,
                number: 80,
                mode: ButtonMode::Push,
            }
        );
    }
}
