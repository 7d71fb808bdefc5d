use std::fmt;

use embedded_hal::digital::v2::{InputPin, OutputPin};
use log::{error, info};

use super::state::{ButtonChange, ControllerState};
use crate::config::BoardConfig;
use crate::midi::MidiSink;

/// Footswitch wired to digital pins.
///
/// Each call to [`FootswitchController::poll_once`] reads the layer switch,
/// runs every button through its debouncer, sends a MIDI message for each
/// logical change and mirrors the new state onto the button's LED.
pub struct FootswitchController<I, O> {
    state: ControllerState,
    active_low: bool,
    switch_up: I,
    switch_down: I,
    switch_pins: [u8; 2],
    button_pins: Vec<I>,
    led_pins: Vec<O>,
}

impl<I, O> FootswitchController<I, O>
where
    I: InputPin,
    O: OutputPin,
{
    /// Pin vectors are in button order and must match the configured
    /// button count.
    pub fn new(
        config: &BoardConfig,
        switch_up: I,
        switch_down: I,
        button_pins: Vec<I>,
        led_pins: Vec<O>,
    ) -> Result<Self, ControllerError> {
        let expected = config.buttons.len();
        if button_pins.len() != expected || led_pins.len() != expected {
            return Err(ControllerError::Wiring(format!(
                "{expected} buttons configured, got {} button pins and {} LED pins",
                button_pins.len(),
                led_pins.len()
            )));
        }

        Ok(Self {
            state: ControllerState::from_config(config),
            active_low: config.active_low,
            switch_up,
            switch_down,
            switch_pins: [config.switch.up_pin, config.switch.down_pin],
            button_pins,
            led_pins,
        })
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ControllerState {
        &mut self.state
    }

    /// Drive every LED to the logical state of its button.
    pub fn sync_leds(&mut self) -> Result<(), ControllerError> {
        for index in 0..self.led_pins.len() {
            let on = self.state.leds()[index];
            self.write_led(index, on)?;
        }
        Ok(())
    }

    /// Run one polling tick at `now` (wrapping milliseconds).
    pub fn poll_once<S: MidiSink + ?Sized>(
        &mut self,
        now: u32,
        sink: &mut S,
    ) -> Result<Vec<ButtonChange>, ControllerError> {
        let up = read_active(&self.switch_up, self.active_low, self.switch_pins[0])?;
        let down = read_active(&self.switch_down, self.active_low, self.switch_pins[1])?;
        if let Some(layer) = self.state.select_layer(up, down) {
            info!("layer switched to {layer}");
        }

        let mut changes = Vec::new();
        for index in 0..self.button_pins.len() {
            let pin = self.state.buttons()[index].pin();
            let pressed = read_active(&self.button_pins[index], self.active_low, pin)?;

            let Some(change) = self.state.process(index, pressed, now) else {
                continue;
            };

            if let Err(err) = sink.send(change.message) {
                error!("button {index}: {err}");
            }
            self.write_led(index, change.on)?;
            changes.push(change);
        }

        Ok(changes)
    }

    fn write_led(&mut self, index: usize, on: bool) -> Result<(), ControllerError> {
        let pin = self.state.buttons()[index].led_pin();
        let led = &mut self.led_pins[index];
        let result = if on { led.set_high() } else { led.set_low() };
        result.map_err(|_| ControllerError::PinWrite(pin))
    }
}

fn read_active<P: InputPin>(
    pin: &P,
    active_low: bool,
    number: u8,
) -> Result<bool, ControllerError> {
    let level = if active_low { pin.is_low() } else { pin.is_high() };
    level.map_err(|_| ControllerError::PinRead(number))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    PinRead(u8),
    PinWrite(u8),
    Wiring(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::PinRead(pin) => write!(f, "failed to read pin {pin}"),
            ControllerError::PinWrite(pin) => write!(f, "failed to write pin {pin}"),
            ControllerError::Wiring(reason) => write!(f, "pin wiring mismatch: {reason}"),
        }
    }
}

impl std::error::Error for ControllerError {}
