/// Keyboard input.
///
/// Drains pending terminal events without blocking and translates key
/// presses into game events:
///   Arrow keys   →  Sammy (player 1)
///   W A S D      →  Jake (player 2)
///   P            →  Pause
///   Space        →  Continue
///   Esc / Ctrl-C →  Quit
///
/// Release events are ignored. The raw key events of the last drain are kept
/// for prompts that need typed characters.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::direction::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputEvent {
    Turn { player: usize, dir: Direction },
    Pause,
    Continue,
    Quit,
}

pub struct InputState {
    /// Game events from the most recent drain, in arrival order.
    pub events: Vec<InputEvent>,

    /// Raw key presses from the most recent drain.
    pub raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            events: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per tick.
    pub fn drain_events(&mut self) {
        self.events.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                self.raw_events.push(key);
                if let Some(ev) = translate(&key) {
                    self.events.push(ev);
                }
            }
        }
    }

    /// Throw away anything typed so far.
    pub fn flush(&mut self) {
        self.drain_events();
        self.events.clear();
        self.raw_events.clear();
    }

    pub fn quit_requested(&self) -> bool {
        self.events.contains(&InputEvent::Quit)
    }

    /// Any key press at all in the last drain.
    pub fn any_key(&self) -> bool {
        !self.raw_events.is_empty()
    }

    /// Upper-cased character keys from the last drain.
    pub fn typed_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.raw_events.iter().filter_map(|k| match k.code {
            KeyCode::Char(c) if !k.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(c.to_ascii_uppercase())
            }
            _ => None,
        })
    }
}

fn translate(key: &KeyEvent) -> Option<InputEvent> {
    use Direction::*;

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')).then_some(InputEvent::Quit);
    }

    let turn = |player, dir| Some(InputEvent::Turn { player, dir });
    match key.code {
        KeyCode::Up => turn(0, Up),
        KeyCode::Down => turn(0, Down),
        KeyCode::Left => turn(0, Left),
        KeyCode::Right => turn(0, Right),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => turn(1, Up),
            's' => turn(1, Down),
            'a' => turn(1, Left),
            'd' => turn(1, Right),
            'p' => Some(InputEvent::Pause),
            ' ' => Some(InputEvent::Continue),
            _ => None,
        },
        KeyCode::Esc => Some(InputEvent::Quit),
        _ => None,
    }
}
