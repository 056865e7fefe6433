//! Note-change commands typed on stdin.
//!
//! Runs on its own thread; the tick loop picks commands up between frames.

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

/// A request from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteCommand {
    /// Move the reference note by this many semitones.
    Shift(i32),
    Quit,
}

/// Maps one line of input to a command.
///
/// `left`/`right` step a semitone, `down`/`up` an octave; `+N`/`-N` move by
/// `N` semitones; `q` quits.
pub fn parse_command(line: &str) -> Option<NoteCommand> {
    let line = line.trim();
    let command = match line {
        "left" | "l" => NoteCommand::Shift(-1),
        "right" | "r" => NoteCommand::Shift(1),
        "down" | "d" => NoteCommand::Shift(-12),
        "up" | "u" => NoteCommand::Shift(12),
        "q" | "quit" | "exit" => NoteCommand::Quit,
        _ if line.starts_with('+') || line.starts_with('-') => {
            NoteCommand::Shift(line.parse().ok()?)
        }
        _ => return None,
    };
    Some(command)
}

/// Spawns the stdin reader. It exits at end of input or once the receiver
/// is gone.
pub fn spawn_stdin_reader(sender: Sender<NoteCommand>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(command) => {
                    if sender.send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => log::warn!("[INPUT] Unknown command '{}'", line.trim()),
            }
        }
        log::debug!("[INPUT] Input closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_words() {
        assert_eq!(parse_command("left"), Some(NoteCommand::Shift(-1)));
        assert_eq!(parse_command("right\n"), Some(NoteCommand::Shift(1)));
        assert_eq!(parse_command(" down "), Some(NoteCommand::Shift(-12)));
        assert_eq!(parse_command("up"), Some(NoteCommand::Shift(12)));
    }

    #[test]
    fn signed_deltas() {
        assert_eq!(parse_command("+7"), Some(NoteCommand::Shift(7)));
        assert_eq!(parse_command("-3"), Some(NoteCommand::Shift(-3)));
        assert_eq!(parse_command("+x"), None);
    }

    #[test]
    fn quit_and_junk() {
        assert_eq!(parse_command("q"), Some(NoteCommand::Quit));
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command(""), None);
    }
}
