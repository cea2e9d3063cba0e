/// Entry point, intro and setup screens, and the round loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;

use config::{GameConfig, GameSettings};
use domain::color::Color;
use domain::palette::ColorScheme;
use domain::surface::Surface;
use sim::event::GameEvent;
use sim::round::{Phase, RoundController, RoundSettings};
use ui::gamepad::GamepadState;
use ui::input::{InputEvent, InputState};
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};

type GameResult<T> = Result<T, Box<dyn std::error::Error>>;

/// `Break` means the player asked to quit.
type Flow = ControlFlow<()>;

const POLL_SLEEP: Duration = Duration::from_millis(10);
const SPARKLE_FRAME: Duration = Duration::from_millis(30);

const DIALOG_ROW: usize = 10;
const GAME_OVER_ROW: usize = 9;

fn main() {
    let config = GameConfig::load();
    if let Err(e) = logging::init(&config.log) {
        eprintln!("Warning: logging disabled: {e}");
    }

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    ui::renderer::install_panic_hook();

    let sound = if config.sound_enabled { SoundEngine::new() } else { None };
    if config.sound_enabled && sound.is_none() {
        tracing::warn!("no audio output, playing silently");
    }

    let result = run(&mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        tracing::error!(%e, "game aborted");
        eprintln!("Game error: {e}");
        return;
    }

    println!("Thanks for playing Nibbles!");
}

// ── Console: the terminal plus both input sources ──

struct Console<'a> {
    renderer: &'a mut Renderer,
    kb: InputState,
    gp: GamepadState,
    sound: Option<&'a SoundEngine>,
}

impl<'a> Console<'a> {
    fn new(renderer: &'a mut Renderer, sound: Option<&'a SoundEngine>, config: &GameConfig) -> Self {
        let mut gp = GamepadState::new();
        gp.load_button_config(&config.gamepad);
        tracing::info!(gamepad = gp.connected, "input ready");
        Console { renderer, kb: InputState::new(), gp, sound }
    }

    /// Keyboard then gamepad events, gathered into `kb.events`.
    fn poll(&mut self) {
        self.kb.drain_events();
        self.gp.update(&mut self.kb.events);
    }

    fn flush_input(&mut self) {
        self.kb.flush();
        let mut discard = Vec::new();
        self.gp.update(&mut discard);
    }

    fn quit_requested(&self) -> bool {
        self.kb.quit_requested()
    }
}

fn run(renderer: &mut Renderer, sound: Option<&SoundEngine>, config: &GameConfig) -> GameResult<()> {
    let mut con = Console::new(renderer, sound, config);

    if config.game.intro && intro(&mut con)?.is_break() {
        return Ok(());
    }
    let Some(settings) = setup(&mut con, &config.game)? else {
        return Ok(());
    };
    tracing::info!(?settings, "game settings");

    let mut rc = RoundController::new(settings, StdRng::from_entropy());
    loop {
        if play_nibbles(&mut con, &mut rc)?.is_break() {
            break;
        }
        if !still_wants_to_play(&mut con, &settings.scheme)? {
            break;
        }
    }
    Ok(())
}

// ── Intro ──

const INTRO_TEXT: [&str; 4] = [
    "Nibbles is a game for one or two players.  Navigate your snakes",
    "around the game board trying to eat up numbers while avoiding",
    "running into walls or other snakes.  The more numbers you eat up,",
    "the more points you gain and the longer your snake becomes.",
];

const CONTROLS: [&str; 5] = [
    "                        (Up)                   (Up)      ",
    "P - Pause                ↑                      W       ",
    "                     (Left) ←   → (Right)   (Left) A   D (Right)  ",
    "                         ↓                      S       ",
    "                       (Down)                 (Down)     ",
];

fn intro(con: &mut Console) -> GameResult<Flow> {
    let r = &mut *con.renderer;
    r.clear(Color::Black);
    r.center(3, "N i b b l e s", Color::White, Color::Black);
    r.center(5, "(A snake game for the terminal)", Color::Gray, Color::Black);
    for (i, line) in INTRO_TEXT.iter().enumerate() {
        r.center(7 + i, line, Color::Gray, Color::Black);
    }
    r.center(12, " Game Controls ", Color::White, Color::Black);
    r.center(14, "  General             Player 1               Player 2    ", Color::Gray, Color::Black);
    for (i, line) in CONTROLS.iter().enumerate() {
        r.center(15 + i, line, Color::DarkGray, Color::Black);
    }
    r.center(23, "Press any key to continue", Color::Cyan, Color::Black);
    r.present()?;

    sound::play(con.sound, sound::TUNE_INTRO, true);
    let flow = sparkle_pause(con)?;
    if flow.is_continue() {
        sound::wait(con.sound);
    }
    Ok(flow)
}

/// Animate the star border until a key is pressed.
fn sparkle_pause(con: &mut Console) -> GameResult<Flow> {
    con.flush_input();
    let stop = AtomicBool::new(false);
    let Console { renderer, kb, gp, .. } = con;
    let renderer: &mut Renderer = renderer;

    let (anim, flow) = thread::scope(|s| {
        let handle = s.spawn(|| sparkle(renderer, &stop));
        let flow = wait_any_key(kb, gp);
        stop.store(true, Ordering::Relaxed);
        (handle.join(), flow)
    });
    anim.map_err(|_| "sparkle animation panicked")??;
    Ok(flow)
}

fn wait_any_key(kb: &mut InputState, gp: &mut GamepadState) -> Flow {
    loop {
        kb.drain_events();
        gp.update(&mut kb.events);
        if kb.quit_requested() {
            return ControlFlow::Break(());
        }
        if kb.any_key() || !kb.events.is_empty() {
            return ControlFlow::Continue(());
        }
        thread::sleep(POLL_SLEEP);
    }
}

fn sparkle(renderer: &mut Renderer, stop: &AtomicBool) -> std::io::Result<()> {
    let stars = "*    ".repeat(17);
    while !stop.load(Ordering::Relaxed) {
        for a in 1..=5usize {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep(SPARKLE_FRAME);
            renderer.put_str(0, 0, &stars[a..a + 80], Color::Red, Color::Black);
            renderer.put_str(0, 21, &stars[6 - a..86 - a], Color::Red, Color::Black);
            for b in 2..=21usize {
                let ch = if (a + b) % 5 == 1 { "*" } else { " " };
                renderer.put_str(79, b - 1, ch, Color::Red, Color::Black);
                renderer.put_str(0, 22 - b, ch, Color::Red, Color::Black);
            }
            renderer.present()?;
        }
    }
    Ok(())
}

// ── Setup ──

/// Ask for whatever the config left open. `None` if the player quits.
fn setup(con: &mut Console, game: &GameSettings) -> GameResult<Option<RoundSettings>> {
    let asks_anything = game.players.is_none()
        || game.skill.is_none()
        || game.increase_speed.is_none()
        || game.monochrome.is_none();
    if asks_anything {
        con.renderer.clear(Color::Black);
    }

    let players = match game.players {
        Some(n) => n,
        None => {
            let q = "How many players (1 or 2)? ";
            match ask(con, 19, 4, q, 2, |s| s.parse().ok().and_then(|n| config::validate_players(n).ok()))? {
                Some(n) => n,
                None => return Ok(None),
            }
        }
    };

    let skill = match game.skill {
        Some(n) => n,
        None => {
            let r = &mut *con.renderer;
            r.put_str(21, 8, "1   = Novice", Color::Gray, Color::Black);
            r.put_str(21, 9, "90  = Expert", Color::Gray, Color::Black);
            r.put_str(21, 10, "100 = Twiddle Fingers", Color::Gray, Color::Black);
            r.put_str(14, 11, "(Computer speed may affect your skill level)", Color::Gray, Color::Black);
            let q = "Skill level (1 to 100)? ";
            match ask(con, 20, 7, q, 4, |s| s.parse().ok().and_then(|n| config::validate_skill(n).ok()))? {
                Some(n) => n,
                None => return Ok(None),
            }
        }
    };

    let increase_speed = match game.increase_speed {
        Some(b) => b,
        None => {
            let q = "Increase game speed during play (Y or N)? ";
            match ask(con, 14, 14, q, 2, |s| yes_no(s, 'Y', 'N'))? {
                Some(b) => b,
                None => return Ok(None),
            }
        }
    };

    let monochrome = match game.monochrome {
        Some(b) => b,
        None => {
            let q = "Monochrome or color monitor (M or C)? ";
            match ask(con, 16, 16, q, 2, |s| yes_no(s, 'M', 'C'))? {
                Some(b) => b,
                None => return Ok(None),
            }
        }
    };

    Ok(Some(RoundSettings {
        players,
        base_speed_ms: config::skill_to_speed_ms(skill),
        increase_speed,
        scheme: ColorScheme::for_monitor(monochrome),
    }))
}

/// First letter of the answer: `yes` gives true, `no` false.
fn yes_no(answer: &str, yes: char, no: char) -> Option<bool> {
    match answer.chars().next()?.to_ascii_uppercase() {
        c if c == yes => Some(true),
        c if c == no => Some(false),
        _ => None,
    }
}

/// Show `question` at (col, row) and re-ask until `parse` accepts the answer.
fn ask<T>(
    con: &mut Console,
    col: usize,
    row: usize,
    question: &str,
    width: usize,
    parse: impl Fn(&str) -> Option<T>,
) -> GameResult<Option<T>> {
    let input_col = col + question.chars().count();
    loop {
        con.renderer.put_str(col, row, question, Color::Gray, Color::Black);
        let Some(line) = read_line(con, input_col, row, width)? else {
            return Ok(None);
        };
        if let Some(value) = parse(line.trim()) {
            return Ok(Some(value));
        }
    }
}

/// Minimal line editor. `None` on Esc or Ctrl-C.
fn read_line(con: &mut Console, col: usize, row: usize, width: usize) -> GameResult<Option<String>> {
    let mut text = String::new();
    con.flush_input();
    loop {
        let shown = format!("{text}_");
        con.renderer.put_str(col, row, &format!("{shown:<width$}"), Color::Gray, Color::Black);
        con.renderer.present()?;
        thread::sleep(POLL_SLEEP);

        con.kb.drain_events();
        for key in std::mem::take(&mut con.kb.raw_events) {
            match key.code {
                KeyCode::Enter => {
                    con.renderer.put_str(col, row, &format!("{text:<width$}"), Color::Gray, Color::Black);
                    return Ok(Some(text));
                }
                KeyCode::Esc => return Ok(None),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(None);
                }
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Char(c) if !c.is_control() && text.chars().count() + 1 < width => {
                    text.push(c);
                }
                _ => {}
            }
        }
    }
}

// ── Play ──

fn print_score(con: &mut Console, rc: &RoundController) {
    let [sammy, jake] = &rc.snakes;
    con.renderer.print_score(
        rc.players(),
        [sammy.score, jake.score],
        [sammy.lives, jake.lives],
        rc.settings().scheme.background,
    );
}

fn death_message(player: usize) -> &'static str {
    if player == 0 {
        " Sammy Dies! Push Space! --->"
    } else {
        " <--- Jake Dies! Push Space! "
    }
}

/// One full game, from level 1 until someone runs out of lives.
fn play_nibbles(con: &mut Console, rc: &mut RoundController) -> GameResult<Flow> {
    rc.start_game(con.renderer);
    print_score(con, rc);
    if space_pause(con, rc, &format!("     Level {}, Push Space", rc.level))?.is_break() {
        return Ok(ControlFlow::Break(()));
    }

    loop {
        rc.begin_round();
        print_score(con, rc);
        sound::play(con.sound, sound::TUNE_ROUND_START, true);

        while rc.phase != Phase::PlayerDied {
            if rc.needs_target() {
                rc.spawn_target(con.renderer);
            }
            con.renderer.present()?;
            thread::sleep(Duration::from_millis(rc.cur_speed_ms));

            con.poll();
            let events = std::mem::take(&mut con.kb.events);
            match route_input(rc, &events) {
                Some(InputEvent::Quit) => return Ok(ControlFlow::Break(())),
                Some(InputEvent::Pause) => {
                    if space_pause(con, rc, " Game Paused ... Push Space  ")?.is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                    rc.redraw_target(con.renderer);
                }
                _ => {}
            }

            for ev in rc.tick(con.renderer) {
                match ev {
                    GameEvent::NumberEaten { .. } => {
                        sound::play(con.sound, sound::TUNE_EAT, true);
                        print_score(con, rc);
                    }
                    GameEvent::LevelComplete { level } => {
                        print_score(con, rc);
                        let text = format!("     Level {level}, Push Space");
                        if space_pause(con, rc, &text)?.is_break() {
                            return Ok(ControlFlow::Break(()));
                        }
                    }
                    GameEvent::SnakeDied { .. } => {
                        sound::play(con.sound, sound::TUNE_DEATH, true);
                    }
                }
            }
        }

        for player in 0..rc.players() {
            rc.erase_snake(player, con.renderer);
            if !rc.snakes[player].alive {
                rc.apply_death_penalty(player);
                print_score(con, rc);
                if space_pause(con, rc, death_message(player))?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }
        }

        rc.restart_level(con.renderer);
        print_score(con, rc);
        if rc.phase == Phase::GameOver {
            return Ok(ControlFlow::Continue(()));
        }
    }
}

/// Queue turns in arrival order up to the first Pause or Quit, which is
/// returned. Whatever follows it in the batch is dropped.
fn route_input(rc: &mut RoundController, events: &[InputEvent]) -> Option<InputEvent> {
    for &ev in events {
        match ev {
            InputEvent::Turn { player, dir } => rc.queue_direction(player, dir),
            InputEvent::Pause | InputEvent::Quit => return Some(ev),
            InputEvent::Continue => {}
        }
    }
    None
}

/// Show a one-line message and wait for Continue, then restore the board
/// under the box.
fn space_pause(con: &mut Console, rc: &RoundController, text: &str) -> GameResult<Flow> {
    let scheme = rc.settings().scheme;
    con.renderer.message_box(DIALOG_ROW, text, scheme.dialog_fg, scheme.dialog_bg);
    con.renderer.present()?;
    con.flush_input();

    loop {
        thread::sleep(POLL_SLEEP);
        con.poll();
        if con.quit_requested() {
            return Ok(ControlFlow::Break(()));
        }
        if con.kb.events.contains(&InputEvent::Continue) {
            break;
        }
    }

    for row in 21..=26 {
        for col in 24..=57 {
            rc.arena.repaint(con.renderer, row, col);
        }
    }
    rc.redraw_target(con.renderer);
    con.renderer.present()?;
    Ok(ControlFlow::Continue(()))
}

fn still_wants_to_play(con: &mut Console, scheme: &ColorScheme) -> GameResult<bool> {
    let lines = ["G A M E   O V E R", "", "Play Again?   (Y/N)"];
    con.renderer.dialog(GAME_OVER_ROW, &lines, scheme.dialog_fg, scheme.dialog_bg);
    con.renderer.present()?;
    con.flush_input();

    let again = loop {
        thread::sleep(POLL_SLEEP);
        con.kb.drain_events();
        let mut pad = Vec::new();
        con.gp.update(&mut pad);
        if con.quit_requested() {
            break false;
        }
        if let Some(answer) = play_again_answer(con.kb.typed_chars(), &pad) {
            break answer;
        }
    };

    let blank = " ".repeat(33);
    for row in GAME_OVER_ROW..GAME_OVER_ROW + 5 {
        con.renderer.center(row, &blank, Color::White, scheme.background);
    }
    con.renderer.present()?;
    tracing::info!(again, "game over");
    Ok(again)
}

/// Y or N from the keyboard. A gamepad answers with Continue (yes) or
/// Quit (no).
fn play_again_answer(typed: impl IntoIterator<Item = char>, pad: &[InputEvent]) -> Option<bool> {
    typed
        .into_iter()
        .find_map(|c| yes_no(&c.to_string(), 'Y', 'N'))
        .or_else(|| {
            pad.iter().find_map(|ev| match ev {
                InputEvent::Continue => Some(true),
                InputEvent::Quit => Some(false),
                _ => None,
            })
        })
}
