//! Live control commands accepted while a run is in flight.

/// A control command, carried out-of-band from the compute path.
///
/// # Examples
///
/// ```
/// use gol_core::Command;
///
/// assert_eq!(Command::from_key('p'), Some(Command::PauseToggle));
/// assert_eq!(Command::from_key('x'), None);
/// assert_eq!(Command::Save.key(), 's');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Write the current snapshot to the output collaborator (`s`).
    Save,
    /// Save, publish the final turn and stop (`q`).
    Quit,
    /// Toggle between paused and executing (`p`).
    PauseToggle,
    /// Like [`Quit`](Self::Quit), then shut down remote workers and the
    /// broker (`k`). Equivalent to `Quit` for a purely local run.
    Kill,
}

impl Command {
    /// Map a key press to a command. Unknown keys map to `None`.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            's' => Some(Self::Save),
            'q' => Some(Self::Quit),
            'p' => Some(Self::PauseToggle),
            'k' => Some(Self::Kill),
            _ => None,
        }
    }

    /// The key that produces this command.
    pub fn key(self) -> char {
        match self {
            Self::Save => 's',
            Self::Quit => 'q',
            Self::PauseToggle => 'p',
            Self::Kill => 'k',
        }
    }
}
