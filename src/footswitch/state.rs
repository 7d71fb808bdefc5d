use log::{debug, trace, warn};

use super::binding::{Binding, MessageKind};
use super::button::{Button, ButtonEventKind};
use super::layer::Layer;
use crate::config::BoardConfig;
use crate::midi::MidiMessage;

/// A button whose logical state changed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonChange {
    pub index: usize,
    pub layer: Layer,
    pub kind: ButtonEventKind,
    pub on: bool,
    pub message: MidiMessage,
}

/// All runtime state of the footswitch, owned in one place.
#[derive(Debug, Clone)]
pub struct ControllerState {
    layer: Layer,
    both_contacts: bool,
    buttons: Vec<Button>,
    leds: Vec<bool>,
    channel: u8,
    on_value: u8,
    off_value: u8,
    // Pulses-per-quarter-note counter reserved for MIDI clock input.
    ppqn: u8,
}

impl ControllerState {
    pub fn from_config(config: &BoardConfig) -> Self {
        let buttons: Vec<Button> = config
            .buttons
            .iter()
            .map(|b| Button::new(b.pin, b.led_pin, b.bindings(), config.debounce_ms))
            .collect();
        let leds = vec![false; buttons.len()];

        Self {
            layer: Layer::default(),
            both_contacts: false,
            buttons,
            leds,
            channel: config.midi.channel,
            on_value: config.midi.on_value,
            off_value: config.midi.off_value,
            ppqn: 0,
        }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn leds(&self) -> &[bool] {
        &self.leds
    }

    pub fn ppqn(&self) -> u8 {
        self.ppqn
    }

    /// Update the current layer from the switch contacts.
    ///
    /// Returns the new layer when it differs from the previous one.
    pub fn select_layer(&mut self, up: bool, down: bool) -> Option<Layer> {
        let both = up && down;
        if both && !self.both_contacts {
            warn!("layer switch reports up and down at once, using {}", Layer::Off);
        }
        self.both_contacts = both;

        let layer = Layer::from_switch(up, down);
        if layer == self.layer {
            return None;
        }
        self.layer = layer;
        Some(layer)
    }

    /// Binding for `index` on `layer`, if that slot is mapped.
    pub fn lookup(&self, layer: Layer, index: usize) -> Option<Binding> {
        self.buttons.get(index).and_then(|b| b.binding(layer))
    }

    /// Replace the binding of one slot. Returns `false` if `index` is out of
    /// range.
    pub fn rebind(&mut self, layer: Layer, index: usize, binding: Option<Binding>) -> bool {
        match self.buttons.get_mut(index) {
            Some(button) => {
                button.set_binding(layer, binding);
                true
            }
            None => false,
        }
    }

    /// Feed one raw read of button `index` taken at `now`.
    ///
    /// Bounces, edges that leave the logical state unchanged and presses on
    /// an unmapped layer yield `None`. A button that is ON is turned OFF with
    /// the binding that turned it ON, whatever the current layer.
    pub fn process(&mut self, index: usize, pressed: bool, now: u32) -> Option<ButtonChange> {
        let layer = self.layer;
        let button = self.buttons.get_mut(index)?;
        let held_before = button.is_held();

        let Some(kind) = button.debounce(pressed, now) else {
            if pressed != held_before {
                trace!("button {index}: bounce suppressed at {now}");
            }
            return None;
        };

        let Some(binding) = button.resolve(layer) else {
            debug!("button {index}: {kind:?} ignored, no binding on {layer}");
            return None;
        };

        if !button.apply(binding, kind) {
            return None;
        }
        let on = button.is_on();
        self.leds[index] = on;

        let message = self.message_for(binding, on);
        debug!("button {index}: {kind:?} on {layer} -> {}", if on { "ON" } else { "OFF" });

        Some(ButtonChange {
            index,
            layer,
            kind,
            on,
            message,
        })
    }

    /// MIDI message for a binding entering `on`.
    pub fn message_for(&self, binding: Binding, on: bool) -> MidiMessage {
        let channel = self.channel;
        match (binding.kind, on) {
            (MessageKind::ControlChange, on) => MidiMessage::ControlChange {
                channel,
                controller: binding.number,
                value: if on { self.on_value } else { self.off_value },
            },
            (MessageKind::Note, true) => MidiMessage::NoteOn {
                channel,
                note: binding.number,
                velocity: self.on_value,
            },
            (MessageKind::Note, false) => MidiMessage::NoteOff {
                channel,
                note: binding.number,
                velocity: 0,
            },
        }
    }
}
