use std::{collections::HashSet, fmt, fs, path::Path};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::footswitch::{Binding, ButtonMode, Layer, DEBOUNCE_MS, LAYER_COUNT, MIDI_DATA_MAX};

pub const DEFAULT_CONFIG_PATH: &str = "board.yml";

const DEFAULT_BUTTON_PINS: [u8; 5] = [5, 6, 7, 8, 9];
const DEFAULT_LED_PINS: [u8; 5] = [10, 16, 14, 15, 18];
const DEFAULT_SWITCH_UP_PIN: u8 = 1;
const DEFAULT_SWITCH_DOWN_PIN: u8 = 0;

// Layer 0 (switch up)      Layer 1 (switch off)
// ,-----------------,      ,-----------------,
// |  49    |     50 |      |  16    |     17 |
// |-----------------|      |-----------------|
// |  51 |  80 |  81 |      |  18 |  19 |  48 |
// `-----------------`      `-----------------`
const DEFAULT_CC_TABLE: [[u8; 5]; 2] = [[49, 50, 51, 80, 81], [16, 17, 18, 19, 48]];

/// Complete description of the footswitch board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub midi: MidiConfig,
    pub debounce_ms: u32,
    /// Inputs use pull-ups: a pressed contact reads low.
    pub active_low: bool,
    pub switch: SwitchConfig,
    pub buttons: Vec<ButtonConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Case-insensitive substring of the output port name; empty picks the
    /// first port.
    pub port: String,
    pub channel: u8,
    pub on_value: u8,
    pub off_value: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub up_pin: u8,
    pub down_pin: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonConfig {
    pub pin: u8,
    pub led_pin: u8,
    /// One entry per switch position; missing or `~` entries are unmapped.
    #[serde(default)]
    pub layers: Vec<Option<Binding>>,
}

impl ButtonConfig {
    pub fn bindings(&self) -> [Option<Binding>; LAYER_COUNT] {
        let mut bindings = [None; LAYER_COUNT];
        for (slot, binding) in bindings.iter_mut().zip(self.layers.iter()) {
            *slot = *binding;
        }
        bindings
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            channel: 0,
            on_value: MIDI_DATA_MAX,
            off_value: 0,
        }
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            up_pin: DEFAULT_SWITCH_UP_PIN,
            down_pin: DEFAULT_SWITCH_DOWN_PIN,
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        let buttons = DEFAULT_BUTTON_PINS
            .iter()
            .zip(DEFAULT_LED_PINS.iter())
            .enumerate()
            .map(|(idx, (&pin, &led_pin))| ButtonConfig {
                pin,
                led_pin,
                layers: DEFAULT_CC_TABLE
                    .iter()
                    .map(|row| Some(Binding::cc(row[idx], ButtonMode::Push)))
                    .collect(),
            })
            .collect();

        Self {
            midi: MidiConfig::default(),
            debounce_ms: DEBOUNCE_MS,
            active_low: true,
            switch: SwitchConfig::default(),
            buttons,
        }
    }
}

impl BoardConfig {
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_yaml(&source)
    }

    /// Load `path` if given, else `board.yml` if it exists, else the built-in
    /// board. Returns the config and a label for where it came from.
    pub fn resolve(path: Option<&str>) -> Result<(Self, String), ConfigError> {
        if let Some(path) = path {
            return Ok((Self::load(Path::new(path))?, path.to_string()));
        }

        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Ok((Self::load(default_path)?, DEFAULT_CONFIG_PATH.to_string()));
        }

        Ok((Self::default(), "built-in defaults".to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buttons.is_empty() {
            return Err(ConfigError::Invalid("no buttons configured".into()));
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::Invalid("debounce_ms must be non-zero".into()));
        }
        if self.midi.channel > 15 {
            return Err(ConfigError::Invalid(format!(
                "MIDI channel {} is out of range 0..=15",
                self.midi.channel
            )));
        }
        if self.midi.on_value > MIDI_DATA_MAX || self.midi.off_value > MIDI_DATA_MAX {
            return Err(ConfigError::Invalid(
                "on_value and off_value must be within 0..=127".into(),
            ));
        }

        let mut pins = HashSet::new();
        let switch_pins = [self.switch.up_pin, self.switch.down_pin];
        let button_pins = self.buttons.iter().flat_map(|b| [b.pin, b.led_pin]);
        for pin in switch_pins.into_iter().chain(button_pins) {
            if !pins.insert(pin) {
                return Err(ConfigError::Invalid(format!(
                    "pin {pin} is assigned more than once"
                )));
            }
        }

        for (idx, button) in self.buttons.iter().enumerate() {
            if button.layers.len() > LAYER_COUNT {
                return Err(ConfigError::Invalid(format!(
                    "button {idx} lists {} layers, the switch has {LAYER_COUNT}",
                    button.layers.len()
                )));
            }
            for (layer, binding) in button.layers.iter().enumerate() {
                let Some(binding) = binding else { continue };
                if !binding.is_valid() {
                    return Err(ConfigError::Invalid(format!(
                        "button {idx} layer {layer}: number {} exceeds 127",
                        binding.number
                    )));
                }
                if binding.is_channel_mode() {
                    warn!(
                        "button {idx} layer {layer}: CC {} is a channel-mode message",
                        binding.number
                    );
                }
            }
        }

        Ok(())
    }

    /// Layers on which no button has a binding.
    pub fn unmapped_layers(&self) -> Vec<Layer> {
        Layer::ALL
            .into_iter()
            .filter(|layer| {
                self.buttons
                    .iter()
                    .all(|button| button.bindings()[layer.index()].is_none())
            })
            .collect()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: String, reason: String },
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, reason } => write!(f, "cannot read {path}: {reason}"),
            ConfigError::Parse(err) => write!(f, "invalid board description: {err}"),
            ConfigError::Invalid(reason) => write!(f, "invalid board configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}
