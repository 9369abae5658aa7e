//! Lifecycle events published by a run.
//!
//! Events are a closed enumeration. For a given turn `CellsFlipped` is
//! always emitted before `TurnComplete`, and both precede any event for the
//! following turn. `AliveCellsCount` is observational and may appear at any
//! turn boundary.

use std::fmt;

use crate::id::{CellCoord, TurnId};

/// Execution state reported through [`Event::StateChange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// Turn advancement is suspended.
    Paused,
    /// Turns are being computed.
    Executing,
    /// The run is finishing; no further turns will execute.
    Quitting,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paused => write!(f, "Paused"),
            Self::Executing => write!(f, "Executing"),
            Self::Quitting => write!(f, "Quitting"),
        }
    }
}

/// One entry of the ordered event stream consumed by a presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Cells whose state changed in `turn` (for turn 0 or a resumed turn:
    /// every initially live cell).
    CellsFlipped {
        /// Turn the flips belong to.
        turn: TurnId,
        /// Flipped coordinates, row-major.
        cells: Vec<CellCoord>,
    },
    /// `turn` has been fully computed and published.
    TurnComplete {
        /// The completed turn.
        turn: TurnId,
    },
    /// Periodic population telemetry.
    AliveCellsCount {
        /// Turn the count was taken at.
        turn: TurnId,
        /// Number of live cells.
        count: usize,
    },
    /// The run entered a new execution state.
    StateChange {
        /// Turn at which the change happened.
        turn: TurnId,
        /// The new state.
        state: State,
    },
    /// The run has reached its last turn.
    FinalTurnComplete {
        /// The final turn.
        turn: TurnId,
        /// Every live coordinate, row-major.
        alive: Vec<CellCoord>,
    },
    /// A snapshot has been written by the output collaborator.
    ImageOutputComplete {
        /// Turn the snapshot was taken at.
        turn: TurnId,
        /// Output name, `"{width}x{height}x{turn}"`.
        filename: String,
    },
}

impl Event {
    /// The turn this event refers to.
    pub fn turn(&self) -> TurnId {
        match self {
            Self::CellsFlipped { turn, .. }
            | Self::TurnComplete { turn }
            | Self::AliveCellsCount { turn, .. }
            | Self::StateChange { turn, .. }
            | Self::FinalTurnComplete { turn, .. }
            | Self::ImageOutputComplete { turn, .. } => *turn,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CellsFlipped { turn, cells } => {
                write!(f, "turn {turn}: {} cells flipped", cells.len())
            }
            Self::TurnComplete { turn } => write!(f, "turn {turn} complete"),
            Self::AliveCellsCount { turn, count } => {
                write!(f, "turn {turn}: {count} alive cells")
            }
            Self::StateChange { turn, state } => write!(f, "turn {turn}: {state}"),
            Self::FinalTurnComplete { turn, alive } => {
                write!(f, "final turn {turn}: {} alive cells", alive.len())
            }
            Self::ImageOutputComplete { turn, filename } => {
                write!(f, "turn {turn}: wrote {filename}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_accessor_covers_every_variant() {
        let t = TurnId(7);
        let events = [
            Event::CellsFlipped {
                turn: t,
                cells: vec![],
            },
            Event::TurnComplete { turn: t },
            Event::AliveCellsCount { turn: t, count: 3 },
            Event::StateChange {
                turn: t,
                state: State::Paused,
            },
            Event::FinalTurnComplete {
                turn: t,
                alive: vec![],
            },
            Event::ImageOutputComplete {
                turn: t,
                filename: "4x4x7".into(),
            },
        ];
        assert!(events.iter().all(|e| e.turn() == t));
    }

    #[test]
    fn display_is_human_readable() {
        let e = Event::StateChange {
            turn: TurnId(3),
            state: State::Quitting,
        };
        assert_eq!(e.to_string(), "turn 3: Quitting");
    }
}
