mod binding;
mod button;
mod controller;
mod layer;
mod state;

#[allow(unused_imports)]
pub use binding::{Binding, ButtonMode, MessageKind, CHANNEL_MODE_FIRST, MIDI_DATA_MAX};
#[allow(unused_imports)]
pub use button::{next_state, Button, ButtonEventKind, Debouncer, DEBOUNCE_MS};
#[allow(unused_imports)]
pub use controller::{ControllerError, FootswitchController};
#[allow(unused_imports)]
pub use layer::{Layer, LAYER_COUNT};
#[allow(unused_imports)]
pub use state::{ButtonChange, ControllerState};
