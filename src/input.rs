use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;
use tracing::trace;

use crate::selector::Rotation;

/// what a user can ask the panel to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Quit,
    StepSelector(Rotation),
    SelectPosition(usize),
}

/// number row straight onto the twelve MAR selector stops
const SELECTOR_KEYMAP: [(char, usize); 12] = [
    ('1', 0),  // IR1
    ('2', 1),  // IR2
    ('3', 2),  // IR3
    ('4', 3),  // IR4
    ('5', 4),  // OR1
    ('6', 5),  // OR2
    ('7', 6),  // OR3
    ('8', 7),  // OR4
    ('9', 8),  // OR5
    ('0', 9),  // PR1
    ('-', 10), // PR2
    ('=', 11), // CR1
];

/// reads panel commands
pub trait Input {
    /// next pending command, without blocking; `None` once drained
    fn poll_command(&mut self) -> Result<Option<PanelCommand>, io::Error>;
}

/// keyboard input from the terminal via crossterm
pub struct StdinInput {
    keymap: HashMap<char, usize>,
}

impl StdinInput {
    pub fn new() -> Self {
        StdinInput {
            keymap: HashMap::from(SELECTOR_KEYMAP),
        }
    }

    fn translate(&self, key: KeyEvent) -> Option<PanelCommand> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(PanelCommand::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(PanelCommand::Quit)
            }
            KeyCode::Right | KeyCode::Char(']') => {
                Some(PanelCommand::StepSelector(Rotation::Clockwise))
            }
            KeyCode::Left | KeyCode::Char('[') => {
                Some(PanelCommand::StepSelector(Rotation::CounterClockwise))
            }
            KeyCode::Char(c) => match self.keymap.get(&c) {
                Some(position) => Some(PanelCommand::SelectPosition(*position)),
                None => {
                    trace!(key = ?c, "unmapped key");
                    None
                }
            },
            _ => None,
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        StdinInput::new()
    }
}

impl Input for StdinInput {
    fn poll_command(&mut self) -> Result<Option<PanelCommand>, io::Error> {
        while poll(Duration::from_millis(0))? {
            if let Event::Key(key) = read()? {
                if let Some(command) = self.translate(key) {
                    return Ok(Some(command));
                }
            }
        }
        Ok(None)
    }
}

/// dummy Input implementation for testing; hands out a fixed queue
pub struct DummyInput {
    commands: VecDeque<PanelCommand>,
}

impl DummyInput {
    pub fn new(commands: &[PanelCommand]) -> Self {
        DummyInput {
            commands: commands.iter().copied().collect(),
        }
    }

    pub fn push(&mut self, command: PanelCommand) {
        self.commands.push_back(command);
    }
}

impl Input for DummyInput {
    fn poll_command(&mut self) -> Result<Option<PanelCommand>, io::Error> {
        Ok(self.commands.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_keys() {
        let i = StdinInput::new();
        assert_eq!(i.translate(key(KeyCode::Esc)), Some(PanelCommand::Quit));
        assert_eq!(i.translate(key(KeyCode::Char('q'))), Some(PanelCommand::Quit));
        assert_eq!(
            i.translate(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(PanelCommand::Quit)
        );
    }

    #[test]
    fn test_step_keys() {
        let i = StdinInput::new();
        assert_eq!(
            i.translate(key(KeyCode::Right)),
            Some(PanelCommand::StepSelector(Rotation::Clockwise))
        );
        assert_eq!(
            i.translate(key(KeyCode::Char('['))),
            Some(PanelCommand::StepSelector(Rotation::CounterClockwise))
        );
    }

    #[test]
    fn test_number_row_selects() {
        let i = StdinInput::new();
        assert_eq!(
            i.translate(key(KeyCode::Char('1'))),
            Some(PanelCommand::SelectPosition(0))
        );
        assert_eq!(
            i.translate(key(KeyCode::Char('='))),
            Some(PanelCommand::SelectPosition(11))
        );
        assert_eq!(i.translate(key(KeyCode::Char('x'))), None);
        assert_eq!(i.translate(key(KeyCode::Tab)), None);
    }

    #[test]
    fn test_dummy_input_drains() -> Result<(), io::Error> {
        let mut i = DummyInput::new(&[PanelCommand::SelectPosition(3)]);
        i.push(PanelCommand::Quit);
        assert_eq!(i.poll_command()?, Some(PanelCommand::SelectPosition(3)));
        assert_eq!(i.poll_command()?, Some(PanelCommand::Quit));
        assert_eq!(i.poll_command()?, None);
        Ok(())
    }
}
