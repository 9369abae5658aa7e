//! Keyboard commands: one key per command, read from any byte stream.

use std::io::{self, Read};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use gol_core::Command;
use tracing::debug;

/// Read `input` byte by byte on a background thread, sending a
/// [`Command`] for every recognised key (`s`, `q`, `p`, `k`). Other bytes
/// are ignored.
///
/// The thread stops at end of input, on a read error, or once the run
/// has dropped its command receiver.
pub fn spawn_reader<R>(input: R, commands: Sender<Command>) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("gol-keys".into())
        .spawn(move || read_commands(input, &commands))
}

fn read_commands<R: Read>(input: R, commands: &Sender<Command>) {
    for byte in input.bytes() {
        let Ok(byte) = byte else {
            debug!("key input failed; reader stopped");
            return;
        };
        let Some(cmd) = Command::from_key(byte as char) else {
            continue;
        };
        if commands.send(cmd).is_err() {
            return;
        }
    }
    debug!("key input closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn recognised_keys_become_commands() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let reader = spawn_reader(Cursor::new(b"s\nxp\nkq".to_vec()), tx).unwrap();
        reader.join().unwrap();
        let got: Vec<Command> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                Command::Save,
                Command::PauseToggle,
                Command::Kill,
                Command::Quit
            ]
        );
    }

    #[test]
    fn reader_stops_when_run_is_gone() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let reader = spawn_reader(Cursor::new(b"ssss".to_vec()), tx).unwrap();
        reader.join().unwrap();
    }
}
