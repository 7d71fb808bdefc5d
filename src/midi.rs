use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use std::fmt;

const CLIENT_NAME: &str = "midi-footswitch";
const CONNECTION_NAME: &str = "midi-footswitch-out";

/// Channel voice messages the footswitch emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    ControlChange { channel: u8, controller: u8, value: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
}

impl MidiMessage {
    /// Wire encoding: status byte with the channel in the low nibble,
    /// followed by two 7-bit data bytes.
    pub fn to_bytes(self) -> [u8; 3] {
        let (status, data1, data2, channel) = match self {
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => (0xB0, controller, value, channel),
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => (0x90, note, velocity, channel),
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => (0x80, note, velocity, channel),
        };
        [status | (channel & 0x0F), data1 & 0x7F, data2 & 0x7F]
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => write!(f, "CC ch{} #{} = {}", channel + 1, controller, value),
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => write!(f, "NoteOn ch{} {} vel {}", channel + 1, note, velocity),
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => write!(f, "NoteOff ch{} {} vel {}", channel + 1, note, velocity),
        }
    }
}

/// Destination for emitted MIDI messages.
pub trait MidiSink {
    fn send(&mut self, message: MidiMessage) -> Result<(), MidiOutError>;
}

/// MIDI output port opened through `midir`.
pub struct MidiOut {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidiOut {
    /// Open the first output port whose name contains `port_hint`
    /// (case-insensitive). An empty hint picks the first port.
    pub fn open(port_hint: &str) -> Result<Self, MidiOutError> {
        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|err| MidiOutError::MidiInit(err.to_string()))?;
        let (port, port_name) = find_port(&midi_out, port_hint)?;

        let connection = midi_out
            .connect(&port, CONNECTION_NAME)
            .map_err(|err| MidiOutError::Connection(err.to_string()))?;

        Ok(Self {
            connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

fn find_port(
    midi_out: &MidiOutput,
    hint: &str,
) -> Result<(MidiOutputPort, String), MidiOutError> {
    midi_out
        .ports()
        .into_iter()
        .filter_map(|port| {
            let name = midi_out.port_name(&port).ok()?;
            log::debug!("midi output port: {name}");
            Some((port, name))
        })
        .find(|(_, name)| port_matches(name, hint))
        .ok_or_else(|| MidiOutError::PortNotFound(hint.to_string()))
}

fn port_matches(name: &str, hint: &str) -> bool {
    let hint = hint.trim();
    hint.is_empty() || name.to_lowercase().contains(&hint.to_lowercase())
}

impl MidiSink for MidiOut {
    fn send(&mut self, message: MidiMessage) -> Result<(), MidiOutError> {
        self.connection
            .send(&message.to_bytes())
            .map_err(|err| MidiOutError::Send(err.to_string()))
    }
}

/// Stand-in used when no output port is available: messages are only logged.
#[derive(Debug, Default)]
pub struct LogSink;

impl MidiSink for LogSink {
    fn send(&mut self, message: MidiMessage) -> Result<(), MidiOutError> {
        log::info!("midi (no port): {}", message);
        Ok(())
    }
}

#[derive(Debug)]
pub enum MidiOutError {
    MidiInit(String),
    PortNotFound(String),
    Connection(String),
    Send(String),
}

impl fmt::Display for MidiOutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiOutError::MidiInit(err) => write!(f, "failed to initialise MIDI output: {err}"),
            MidiOutError::PortNotFound(port) => {
                write!(f, "no MIDI output port matching \"{port}\" was found")
            }
            MidiOutError::Connection(err) => write!(f, "failed to open MIDI connection: {err}"),
            MidiOutError::Send(err) => write!(f, "failed to send MIDI message: {err}"),
        }
    }
}

impl std::error::Error for MidiOutError {}
