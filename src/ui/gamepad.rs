/// Gamepad input using gilrs.
///
/// Pads are assigned to players in the order they are first seen: the first
/// pad steers Sammy, the second Jake. Button mapping for pause, continue and
/// quit is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Turn
///   Start                 →  Pause / Continue
///   A                     →  Continue
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};

use crate::config::GamepadConfig;
#[cfg(feature = "gamepad")]
use crate::domain::direction::Direction;
use crate::ui::input::InputEvent;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    pause: Vec<Btn>,
    resume: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            pause: vec![Btn::Start],
            resume: vec![Btn::Start, Btn::A],
            quit: vec![Btn::Select],
        }
    }
}

impl ActionMap {
    /// Events for one button press, in pause / continue / quit order.
    fn events_for(&self, btn: Btn) -> Vec<InputEvent> {
        let mut out = Vec::new();
        if self.pause.contains(&btn) { out.push(InputEvent::Pause); }
        if self.resume.contains(&btn) { out.push(InputEvent::Continue); }
        if self.quit.contains(&btn) { out.push(InputEvent::Quit); }
        out
    }
}

/// Per-pad stick state, so a held stick only turns once.
#[cfg(feature = "gamepad")]
struct Pad {
    id: GamepadId,
    stick_x: f32,
    stick_y: f32,
    stick_dir: Option<Direction>,
}

#[cfg(feature = "gamepad")]
fn stick_direction(x: f32, y: f32) -> Option<Direction> {
    if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
        None
    } else if x.abs() > y.abs() {
        Some(if x < 0.0 { Direction::Left } else { Direction::Right })
    } else {
        Some(if y > 0.0 { Direction::Up } else { Direction::Down })
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Index = player.
    #[cfg(feature = "gamepad")]
    pads: Vec<Pad>,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(err) => {
                tracing::warn!(?err, "gamepad support unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            #[cfg(feature = "gamepad")]
            pads: Vec::with_capacity(2),
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unknown lists keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let p = parse_list(&cfg.pause);
        if !p.is_empty() { map.pause = p; }
        let r = parse_list(&cfg.resume);
        if !r.is_empty() { map.resume = r; }
        let q = parse_list(&cfg.quit);
        if !q.is_empty() { map.quit = q; }
    }

    /// Poll the pads and append their events.
    pub fn update(&mut self, out: &mut Vec<InputEvent>) {
        #[cfg(feature = "gamepad")]
        self.poll_gilrs(out);
        #[cfg(not(feature = "gamepad"))]
        let _ = out;
    }

    #[cfg(feature = "gamepad")]
    fn player_for(&mut self, id: GamepadId) -> usize {
        if let Some(i) = self.pads.iter().position(|p| p.id == id) {
            return i;
        }
        self.pads.push(Pad { id, stick_x: 0.0, stick_y: 0.0, stick_dir: None });
        let player = self.pads.len() - 1;
        tracing::info!(player, "gamepad assigned");
        player
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self, out: &mut Vec<InputEvent>) {
        let events: Vec<_> = match &mut self.gilrs {
            Some(g) => std::iter::from_fn(|| g.next_event()).collect(),
            None => return,
        };

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    let player = self.player_for(event.id) % 2;
                    let dir = match btn {
                        Button::DPadUp => Some(Direction::Up),
                        Button::DPadDown => Some(Direction::Down),
                        Button::DPadLeft => Some(Direction::Left),
                        Button::DPadRight => Some(Direction::Right),
                        _ => None,
                    };
                    if let Some(dir) = dir {
                        out.push(InputEvent::Turn { player, dir });
                    } else if let Some(b) = Btn::from_gilrs(btn) {
                        out.extend(self.action_map.events_for(b));
                    }
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    let idx = self.player_for(event.id);
                    let pad = &mut self.pads[idx];
                    match axis {
                        Axis::LeftStickX => pad.stick_x = value,
                        Axis::LeftStickY => pad.stick_y = value,
                        _ => continue,
                    }
                    let dir = stick_direction(pad.stick_x, pad.stick_y);
                    if dir != pad.stick_dir {
                        pad.stick_dir = dir;
                        if let Some(dir) = dir {
                            out.push(InputEvent::Turn { player: idx % 2, dir });
                        }
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    if let Some(pad) = self.pads.iter_mut().find(|p| p.id == event.id) {
                        pad.stick_x = 0.0;
                        pad.stick_y = 0.0;
                        pad.stick_dir = None;
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names_parse() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Turbo"), None);
    }

    #[test]
    fn start_pauses_and_continues_by_default() {
        let map = ActionMap::default();
        assert_eq!(map.events_for(Btn::Start), vec![InputEvent::Pause, InputEvent::Continue]);
        assert_eq!(map.events_for(Btn::Select), vec![InputEvent::Quit]);
        assert!(map.events_for(Btn::Y).is_empty());
    }

    #[test]
    fn config_overrides_mapping() {
        let mut gp = GamepadState::new();
        gp.load_button_config(&GamepadConfig {
            pause: vec!["Y".into()],
            resume: vec!["nonsense".into()],
            quit: vec!["B".into(), "Select".into()],
        });
        assert_eq!(gp.action_map.pause, vec![Btn::Y]);
        assert_eq!(gp.action_map.resume, vec![Btn::Start, Btn::A]);
        assert_eq!(gp.action_map.quit, vec![Btn::B, Btn::Select]);
    }

    #[cfg(feature = "gamepad")]
    #[test]
    fn stick_needs_a_clear_push() {
        assert_eq!(stick_direction(0.1, -0.2), None);
        assert_eq!(stick_direction(-0.9, 0.2), Some(Direction::Left));
        assert_eq!(stick_direction(0.3, 0.8), Some(Direction::Up));
        assert_eq!(stick_direction(0.1, -0.7), Some(Direction::Down));
    }
}
