use std::fmt;

/// Number of positions on the layer switch.
pub const LAYER_COUNT: usize = 3;

/// Mapping layer selected by the three-position switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Layer {
    Up,
    #[default]
    Off,
    Down,
}

impl Layer {
    pub const ALL: [Layer; LAYER_COUNT] = [Layer::Up, Layer::Off, Layer::Down];

    /// Resolve the layer from the two switch contacts.
    ///
    /// Both contacts closed is not a physical switch position; it resolves to
    /// [`Layer::Off`], the same layer a disconnected switch produces.
    pub fn from_switch(up: bool, down: bool) -> Self {
        match (up, down) {
            (true, false) => Layer::Up,
            (false, true) => Layer::Down,
            _ => Layer::Off,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Layer::Up => 0,
            Layer::Off => 1,
            Layer::Down => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Up => "up",
            Layer::Off => "off",
            Layer::Down => "down",
        };
        write!(f, "{} (layer {})", name, self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::Layer;

    #[test]
    fn maps_switch_positions() {
        assert_eq!(Layer::from_switch(true, false).index(), 0);
        assert_eq!(Layer::from_switch(false, false).index(), 1);
        assert_eq!(Layer::from_switch(false, true).index(), 2);
    }

    #[test]
    fn both_contacts_resolve_to_neutral() {
        assert_eq!(Layer::from_switch(true, true), Layer::Off);
    }

    #[test]
    fn index_round_trips() {
        for layer in Layer::ALL {
            assert_eq!(Layer::from_index(layer.index()), Some(layer));
        }
        assert_eq!(Layer::from_index(3), None);
    }
}
