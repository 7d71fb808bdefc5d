use super::binding::{Binding, ButtonMode};
use super::layer::{Layer, LAYER_COUNT};

/// Default refractory window between accepted edges, in milliseconds.
pub const DEBOUNCE_MS: u32 = 200;

/// Classification for an accepted button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEventKind {
    Pressed,
    Released,
}

/// Time-gated contact filter for one input.
///
/// An edge is accepted only if the raw level differs from the last accepted
/// level and more than `interval` milliseconds have passed since the last
/// accepted edge. The very first edge is always accepted.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: u32,
    last_accepted: Option<u32>,
    level: bool,
}

impl Debouncer {
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            last_accepted: None,
            level: false,
        }
    }

    /// Feed one raw read taken at `now` (wrapping milliseconds).
    ///
    /// Returns the newly accepted level, or `None` if nothing changed or the
    /// edge fell inside the refractory window.
    pub fn update(&mut self, raw: bool, now: u32) -> Option<bool> {
        if raw == self.level {
            return None;
        }

        if let Some(last) = self.last_accepted {
            if now.wrapping_sub(last) <= self.interval {
                return None;
            }
        }

        self.level = raw;
        self.last_accepted = Some(now);
        Some(raw)
    }

    /// Last accepted level.
    pub fn level(&self) -> bool {
        self.level
    }

    #[allow(dead_code)]
    pub fn last_accepted(&self) -> Option<u32> {
        self.last_accepted
    }
}

/// Compute the logical state after an accepted edge.
pub fn next_state(mode: ButtonMode, on: bool, kind: ButtonEventKind) -> bool {
    match (mode, kind) {
        (ButtonMode::Push, ButtonEventKind::Pressed) => true,
        (ButtonMode::Push, ButtonEventKind::Released) => false,
        (ButtonMode::Toggle, ButtonEventKind::Pressed) => !on,
        (ButtonMode::Toggle, ButtonEventKind::Released) => on,
    }
}

/// One footswitch: its wiring, what it does on each layer and its live state.
#[derive(Debug, Clone)]
pub struct Button {
    pin: u8,
    led_pin: u8,
    bindings: [Option<Binding>; LAYER_COUNT],
    on: bool,
    // Binding that turned the button ON; cleared when it turns OFF.
    active: Option<Binding>,
    debouncer: Debouncer,
}

impl Button {
    pub fn new(
        pin: u8,
        led_pin: u8,
        bindings: [Option<Binding>; LAYER_COUNT],
        debounce_ms: u32,
    ) -> Self {
        Self {
            pin,
            led_pin,
            bindings,
            on: false,
            active: None,
            debouncer: Debouncer::new(debounce_ms),
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn led_pin(&self) -> u8 {
        self.led_pin
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Whether the contact is currently held, as seen through the debouncer.
    pub fn is_held(&self) -> bool {
        self.debouncer.level()
    }

    pub fn binding(&self, layer: Layer) -> Option<Binding> {
        self.bindings[layer.index()]
    }

    pub fn set_binding(&mut self, layer: Layer, binding: Option<Binding>) {
        self.bindings[layer.index()] = binding;
    }

    pub fn active(&self) -> Option<Binding> {
        self.active
    }

    /// Binding the next accepted edge is applied with.
    ///
    /// While the button is ON this is the binding that turned it ON, so the
    /// OFF edge pairs with it even if the layer or the slot changed since.
    pub fn resolve(&self, layer: Layer) -> Option<Binding> {
        self.active.or_else(|| self.binding(layer))
    }

    /// Run a raw read through the debouncer.
    pub fn debounce(&mut self, pressed: bool, now: u32) -> Option<ButtonEventKind> {
        self.debouncer.update(pressed, now).map(|level| {
            if level {
                ButtonEventKind::Pressed
            } else {
                ButtonEventKind::Released
            }
        })
    }

    /// Apply an accepted edge under `binding`. Returns `true` if the logical
    /// state changed.
    pub fn apply(&mut self, binding: Binding, kind: ButtonEventKind) -> bool {
        let next = next_state(binding.mode, self.on, kind);
        let changed = next != self.on;
        self.on = next;
        self.active = if next { Some(binding) } else { None };
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppresses_bounce_inside_window() {
        let mut debouncer = Debouncer::new(DEBOUNCE_MS);

        assert_eq!(debouncer.update(true, 0), Some(true));
        assert_eq!(debouncer.update(false, 150), None);
        assert_eq!(debouncer.update(false, 200), None);
        assert_eq!(debouncer.update(false, 201), Some(false));
        assert_eq!(debouncer.last_accepted(), Some(201));
    }

    #[test]
    fn ignores_reads_without_edge() {
        let mut debouncer = Debouncer::new(DEBOUNCE_MS);

        assert_eq!(debouncer.update(false, 1_000), None);
        assert_eq!(debouncer.last_accepted(), None);
        assert_eq!(debouncer.update(true, 1_000), Some(true));
        assert_eq!(debouncer.update(true, 5_000), None);
        assert!(debouncer.level());
    }

    #[test]
    fn elapsed_time_survives_counter_wrap() {
        let mut debouncer = Debouncer::new(DEBOUNCE_MS);

        assert_eq!(debouncer.update(true, u32::MAX - 50), Some(true));
        // 100 ms after the edge, across the wrap.
        assert_eq!(debouncer.update(false, 49), None);
        // 251 ms after the edge.
        assert_eq!(debouncer.update(false, 200), Some(false));
    }

    #[test]
    fn push_mode_mirrors_contact() {
        let mut button = Button::new(5, 10, [None; LAYER_COUNT], DEBOUNCE_MS);
        let push = Binding::cc(49, ButtonMode::Push);

        assert!(button.apply(push, ButtonEventKind::Pressed));
        assert!(button.is_on());
        assert!(!button.apply(push, ButtonEventKind::Pressed));
        assert!(button.apply(push, ButtonEventKind::Released));
        assert!(!button.is_on());
    }

    #[test]
    fn toggle_mode_flips_on_press_only() {
        let mut button = Button::new(5, 10, [None; LAYER_COUNT], DEBOUNCE_MS);
        let toggle = Binding::cc(80, ButtonMode::Toggle);

        assert!(button.apply(toggle, ButtonEventKind::Pressed));
        assert!(button.is_on());
        assert!(!button.apply(toggle, ButtonEventKind::Released));
        assert!(button.is_on());
        assert!(button.apply(toggle, ButtonEventKind::Pressed));
        assert!(!button.is_on());
    }

    #[test]
    fn on_state_keeps_binding_across_layers() {
        let mut button = Button::new(
            5,
            10,
            [
                Some(Binding::cc(49, ButtonMode::Push)),
                Some(Binding::cc(16, ButtonMode::Toggle)),
                None,
            ],
            DEBOUNCE_MS,
        );

        assert_eq!(
            button.resolve(Layer::Off),
            Some(Binding::cc(16, ButtonMode::Toggle))
        );
        let press = button.resolve(Layer::Up).unwrap();
        assert!(button.apply(press, ButtonEventKind::Pressed));
        assert_eq!(button.active(), Some(press));

        assert_eq!(button.resolve(Layer::Down), Some(press));
        assert_eq!(button.resolve(Layer::Off), Some(press));

        assert!(button.apply(press, ButtonEventKind::Released));
        assert_eq!(button.active(), None);
        assert_eq!(button.resolve(Layer::Down), None);
    }

    #[test]
    fn debounce_reports_edge_kind() {
        let mut button = Button::new(5, 10, [None; LAYER_COUNT], DEBOUNCE_MS);

        assert_eq!(button.debounce(true, 0), Some(ButtonEventKind::Pressed));
        assert!(button.is_held());
        assert_eq!(button.debounce(false, 10), None);
        assert_eq!(
            button.debounce(false, 300),
            Some(ButtonEventKind::Released)
        );
    }
}
