//! Binary cell state and its byte encoding.

/// State of a single grid cell.
///
/// The byte encoding used by image collaborators and the wire format is
/// `0` for dead and `255` for alive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cell {
    /// Dead cell (byte `0`).
    #[default]
    Dead = 0,
    /// Live cell (byte `255`).
    Alive = 255,
}

impl Cell {
    /// Byte value of a live cell.
    pub const ALIVE_BYTE: u8 = 255;

    /// Decode a byte. Only `255` is alive; every other value is dead.
    pub fn from_byte(b: u8) -> Self {
        if b == Self::ALIVE_BYTE {
            Self::Alive
        } else {
            Self::Dead
        }
    }

    /// Encode as a byte (`0` or `255`).
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether the cell is alive.
    pub fn is_alive(self) -> bool {
        self == Self::Alive
    }
}

impl From<bool> for Cell {
    fn from(alive: bool) -> Self {
        if alive {
            Self::Alive
        } else {
            Self::Dead
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_encoding() {
        assert_eq!(Cell::Alive.as_byte(), 255);
        assert_eq!(Cell::Dead.as_byte(), 0);
        assert_eq!(Cell::from_byte(255), Cell::Alive);
        assert_eq!(Cell::from_byte(0), Cell::Dead);
        // Anything that is not exactly 255 reads as dead.
        assert_eq!(Cell::from_byte(1), Cell::Dead);
        assert_eq!(Cell::from_byte(254), Cell::Dead);
    }
}
