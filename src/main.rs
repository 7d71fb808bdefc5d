mod config;
mod console;
mod footswitch;
mod midi;
mod sim;

use std::{
    env,
    error::Error,
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

use log::{info, warn};

use config::BoardConfig;
use footswitch::ControllerState;
use midi::{LogSink, MidiOut, MidiSink};
use sim::{SimBoard, SimEvent};

const POLL_INTERVAL_MS: u64 = 2;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = env::args().nth(1);
    let (config, source) = BoardConfig::resolve(path.as_deref())?;
    info!(
        "board loaded from {source}: {} buttons, debounce {} ms",
        config.buttons.len(),
        config.debounce_ms
    );
    for layer in config.unmapped_layers() {
        warn!("{layer} has no bindings, presses there are ignored");
    }

    let mut output: Box<dyn MidiSink> = match MidiOut::open(&config.midi.port) {
        Ok(out) => {
            info!("MIDI output: {}", out.port_name());
            Box::new(out)
        }
        Err(err) => {
            warn!("{err}; messages will only be logged");
            Box::new(LogSink)
        }
    };

    let board = SimBoard::new(&config);
    let mut controller = board.controller(&config)?;
    controller.sync_leds()?;

    let (tx, rx) = mpsc::channel::<SimEvent>();
    sim::spawn_stdin_reader(tx)?;
    print_help();

    let app_start = Instant::now();
    let mut last_leds = board.led_levels();

    'running: loop {
        // Drain simulator input.
        while let Ok(event) = rx.try_recv() {
            match event {
                SimEvent::Press(index) => set_button(&board, index, true),
                SimEvent::Release(index) => set_button(&board, index, false),
                SimEvent::Switch(layer) => board.set_switch(layer),
                SimEvent::Leds => println!("LEDs {}", render_leds(&board.led_levels())),
                SimEvent::State => print_state(controller.state()),
                SimEvent::Console(line) => {
                    for reply in console::handle_line(controller.state_mut(), &line) {
                        println!("{reply}");
                    }
                }
                SimEvent::Quit => break 'running,
            }
        }

        // Millisecond counter, wraps like a firmware tick counter.
        let now = app_start.elapsed().as_millis() as u32;
        for change in controller.poll_once(now, output.as_mut())? {
            println!(
                "button {} {:?} on {}: {}",
                change.index, change.kind, change.layer, change.message
            );
        }

        let leds = board.led_levels();
        if leds != last_leds {
            println!("LEDs {}", render_leds(&leds));
            last_leds = leds;
        }

        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }

    info!("shutting down");
    Ok(())
}

fn set_button(board: &SimBoard, index: usize, pressed: bool) {
    if !board.set_button(index, pressed) {
        warn!("there is no button {index}");
    }
}

fn render_leds(leds: &[bool]) -> String {
    leds.iter().map(|&on| if on { '●' } else { '○' }).collect()
}

fn print_state(state: &ControllerState) {
    println!("layer: {}", state.layer());
    for (index, button) in state.buttons().iter().enumerate() {
        // An ON button reports the binding it will release with.
        let binding = button
            .active()
            .or_else(|| state.lookup(state.layer(), index))
            .map(|b| format!("{:?} {} ({:?})", b.kind, b.number, b.mode))
            .unwrap_or_else(|| "unmapped".to_string());
        println!(
            "  button {index} (pin {}, led {}): {} {}",
            button.pin(),
            button.led_pin(),
            if button.is_on() { "ON " } else { "OFF" },
            binding
        );
    }
    println!("ppqn: {}", state.ppqn());
}

fn print_help() {
    println!("commands: press N | release N | switch up|off|down | leds | state | quit");
    println!("          GET | SET <slot> <type> <value> <mode>");
}
