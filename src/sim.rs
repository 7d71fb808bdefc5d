//! Desktop stand-in for the footswitch hardware.
//!
//! Pins are shared level cells so the polling loop and the event handler can
//! both see them. Everything here lives on the main thread; only the stdin
//! reader runs on its own thread and talks to the loop through a channel.

use std::{
    cell::Cell,
    convert::Infallible,
    fmt,
    io::{self, BufRead},
    rc::Rc,
    str::FromStr,
    sync::mpsc::Sender,
    thread,
};

use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::config::BoardConfig;
use crate::footswitch::{ControllerError, FootswitchController, Layer};

const THREAD_NAME: &str = "midi-footswitch-stdin";

/// Digital pin backed by a shared level.
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    level: Rc<Cell<bool>>,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(high)),
        }
    }

    pub fn set(&self, high: bool) {
        self.level.set(high);
    }

    pub fn get(&self) -> bool {
        self.level.get()
    }
}

impl InputPin for SimPin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}

impl OutputPin for SimPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(true);
        Ok(())
    }
}

/// Virtual board: the switch, buttons and LEDs described by a config.
pub struct SimBoard {
    active_low: bool,
    switch_up: SimPin,
    switch_down: SimPin,
    buttons: Vec<SimPin>,
    leds: Vec<SimPin>,
}

impl SimBoard {
    /// All contacts start open and all LEDs dark.
    pub fn new(config: &BoardConfig) -> Self {
        let idle = config.active_low;
        Self {
            active_low: config.active_low,
            switch_up: SimPin::new(idle),
            switch_down: SimPin::new(idle),
            buttons: config.buttons.iter().map(|_| SimPin::new(idle)).collect(),
            leds: config.buttons.iter().map(|_| SimPin::new(false)).collect(),
        }
    }

    /// Build a controller wired to this board's pins.
    pub fn controller(
        &self,
        config: &BoardConfig,
    ) -> Result<FootswitchController<SimPin, SimPin>, ControllerError> {
        FootswitchController::new(
            config,
            self.switch_up.clone(),
            self.switch_down.clone(),
            self.buttons.clone(),
            self.leds.clone(),
        )
    }

    /// Close or open button `index`. Returns `false` for an unknown index.
    pub fn set_button(&self, index: usize, pressed: bool) -> bool {
        match self.buttons.get(index) {
            Some(pin) => {
                pin.set(self.level(pressed));
                true
            }
            None => false,
        }
    }

    pub fn set_switch(&self, layer: Layer) {
        self.switch_up.set(self.level(layer == Layer::Up));
        self.switch_down.set(self.level(layer == Layer::Down));
    }

    pub fn led_levels(&self) -> Vec<bool> {
        self.leds.iter().map(SimPin::get).collect()
    }

    fn level(&self, active: bool) -> bool {
        active != self.active_low
    }
}

/// Input accepted on stdin by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    Press(usize),
    Release(usize),
    Switch(Layer),
    Leds,
    State,
    Console(String),
    Quit,
}

impl FromStr for SimEvent {
    type Err = ParseEventError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        let word = parts.next().ok_or(ParseEventError::Empty)?;
        let arg = parts.next();

        let button = |arg: Option<&str>| {
            arg.and_then(|a| a.parse::<usize>().ok())
                .ok_or_else(|| ParseEventError::Invalid(line.to_string()))
        };

        match word.to_ascii_lowercase().as_str() {
            "press" | "p" => Ok(SimEvent::Press(button(arg)?)),
            "release" | "r" => Ok(SimEvent::Release(button(arg)?)),
            "switch" | "s" => match arg.map(str::to_ascii_lowercase).as_deref() {
                Some("up") => Ok(SimEvent::Switch(Layer::Up)),
                Some("off") => Ok(SimEvent::Switch(Layer::Off)),
                Some("down") => Ok(SimEvent::Switch(Layer::Down)),
                _ => Err(ParseEventError::Invalid(line.to_string())),
            },
            "leds" => Ok(SimEvent::Leds),
            "state" => Ok(SimEvent::State),
            "quit" | "exit" => Ok(SimEvent::Quit),
            _ => Ok(SimEvent::Console(line.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEventError {
    Empty,
    Invalid(String),
}

impl fmt::Display for ParseEventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseEventError::Empty => write!(f, "empty input"),
            ParseEventError::Invalid(line) => write!(f, "cannot parse \"{line}\""),
        }
    }
}

impl std::error::Error for ParseEventError {}

/// Read stdin on a background thread and forward parsed events. End of input
/// is sent as [`SimEvent::Quit`].
pub fn spawn_stdin_reader(tx: Sender<SimEvent>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name(THREAD_NAME.into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match line.parse::<SimEvent>() {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                    Err(ParseEventError::Empty) => {}
                    Err(err) => eprintln!("{err}"),
                }
            }
            let _ = tx.send(SimEvent::Quit);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::tests::RecordingSink;
    use crate::midi::MidiMessage;

    #[test]
    fn parses_events() {
        assert_eq!("press 2".parse::<SimEvent>(), Ok(SimEvent::Press(2)));
        assert_eq!("r 0".parse::<SimEvent>(), Ok(SimEvent::Release(0)));
        assert_eq!(
            "switch DOWN".parse::<SimEvent>(),
            Ok(SimEvent::Switch(Layer::Down))
        );
        assert_eq!(
            "GET".parse::<SimEvent>(),
            Ok(SimEvent::Console("GET".to_string()))
        );
        assert_eq!("   ".parse::<SimEvent>(), Err(ParseEventError::Empty));
        assert!("press x".parse::<SimEvent>().is_err());
        assert!("switch sideways".parse::<SimEvent>().is_err());
    }

    #[test]
    fn active_low_board_inverts_levels() {
        let config = BoardConfig::default();
        let board = SimBoard::new(&config);

        assert!(board.buttons[0].get());
        board.set_button(0, true);
        assert!(!board.buttons[0].get());
        assert!(!board.set_button(9, true));

        board.set_switch(Layer::Down);
        assert!(board.switch_up.get());
        assert!(!board.switch_down.get());
    }

    #[test]
    fn drives_controller_through_virtual_pins() {
        let config = BoardConfig::default();
        let board = SimBoard::new(&config);
        let mut controller = board.controller(&config).unwrap();
        let mut sink = RecordingSink::default();

        board.set_switch(Layer::Up);
        board.set_button(4, true);
        controller.poll_once(10, &mut sink).unwrap();
        assert_eq!(board.led_levels(), vec![false, false, false, false, true]);

        board.set_button(4, false);
        controller.poll_once(100, &mut sink).unwrap();
        assert!(board.led_levels()[4]);
        controller.poll_once(300, &mut sink).unwrap();
        assert!(!board.led_levels()[4]);

        assert_eq!(
            sink.sent,
            vec![
                MidiMessage::ControlChange {
                    channel: 0,
                    controller: 81,
                    value: 127
                },
                MidiMessage::ControlChange {
                    channel: 0,
                    controller: 81,
                    value: 0
                },
            ]
        );
    }
}
