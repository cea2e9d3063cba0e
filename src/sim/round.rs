/// Round controller: owns the arena, both snakes and their input queues,
/// and advances the game one tick at a time.
///
/// ## Tick order
///   1. Every active snake pops one queued turn and moves.
///   2. A head on the target's text cell eats it. Eating the ninth digit
///      completes the level and ends the tick.
///   3. Collision verdicts are taken for all snakes against the arena as it
///      stood before anyone moved, so neither player is favoured.
///   4. Survivors commit their move; the dead do not.

use rand::rngs::StdRng;
use rand::Rng;

use crate::domain::arena::Arena;
use crate::domain::direction::{Direction, DirectionQueue};
use crate::domain::palette::ColorScheme;
use crate::domain::snake::{Snake, START_LIVES};
use crate::domain::surface::Surface;
use crate::sim::event::GameEvent;
use crate::sim::level::{self, LevelChoice};

pub const DEATH_PENALTY: i32 = 10;
pub const SPEED_STEP_MS: u64 = 10;
pub const MIN_SPEED_MS: u64 = 10;
/// Digits run 1..=9; eating the last one finishes the level.
const LAST_DIGIT: u32 = 9;
const SPAWN_ATTEMPTS: usize = 10_000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    SpawningNumber,
    Ticking,
    NumberEaten,
    LevelComplete,
    PlayerDied,
    RoundOver,
    GameOver,
}

#[derive(Clone, Copy, Debug)]
pub struct RoundSettings {
    pub players: usize,
    pub base_speed_ms: u64,
    pub increase_speed: bool,
    pub scheme: ColorScheme,
}

/// The digit on screen: the pixel it was spawned at and its text row.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Target {
    pub row: usize,
    pub col: usize,
    pub physical_row: usize,
}

pub struct RoundController {
    pub arena: Arena,
    pub snakes: [Snake; 2],
    inputs: [DirectionQueue; 2],
    pub level: usize,
    pub number: u32,
    target: Option<Target>,
    pub phase: Phase,
    pub cur_speed_ms: u64,
    settings: RoundSettings,
    rng: StdRng,
}

impl RoundController {
    pub fn new(settings: RoundSettings, rng: StdRng) -> Self {
        let scheme = settings.scheme;
        RoundController {
            arena: Arena::new(scheme.background),
            snakes: [Snake::new(scheme.sammy), Snake::new(scheme.jake)],
            inputs: [DirectionQueue::new(), DirectionQueue::new()],
            level: 1,
            number: 1,
            target: None,
            phase: Phase::RoundOver,
            cur_speed_ms: settings.base_speed_ms,
            settings,
            rng,
        }
    }

    pub fn settings(&self) -> &RoundSettings {
        &self.settings
    }

    pub fn players(&self) -> usize {
        self.settings.players.clamp(1, 2)
    }

    #[cfg(test)]
    pub fn target(&self) -> Option<Target> {
        self.target
    }

    // ── Game / level lifecycle ──

    /// Fresh lives and scores, back to level 1.
    pub fn start_game(&mut self, surface: &mut dyn Surface) {
        for snake in &mut self.snakes {
            snake.lives = START_LIVES;
            snake.score = 0;
        }
        self.cur_speed_ms = self.settings.base_speed_ms;
        self.set_level(LevelChoice::StartOver, surface);
    }

    /// Rebuild the board for the chosen level and re-seed both snakes.
    pub fn set_level(&mut self, choice: LevelChoice, surface: &mut dyn Surface) {
        self.level = choice.apply(self.level);
        let scheme = self.settings.scheme;
        let placements = level::build(self.level, &mut self.arena, surface, &scheme);
        for (snake, p) in self.snakes.iter_mut().zip(placements) {
            snake.reset(p.row, p.col, p.direction);
        }
        self.clear_inputs();
        self.target = None;
        tracing::info!(level = self.level, ?choice, "level built");
    }

    pub fn begin_round(&mut self) {
        self.pin_unused_snake();
        self.number = 1;
        self.target = None;
        self.phase = Phase::SpawningNumber;
    }

    /// After the dead have been dealt with: reset speed and rebuild the
    /// same level, or stop if someone is out of lives.
    pub fn restart_level(&mut self, surface: &mut dyn Surface) {
        self.cur_speed_ms = self.settings.base_speed_ms;
        self.set_level(LevelChoice::SameLevel, surface);
        self.phase = if self.is_game_over() { Phase::GameOver } else { Phase::RoundOver };
    }

    pub fn is_game_over(&self) -> bool {
        (0..self.players()).any(|i| self.snakes[i].lives == 0)
    }

    fn pin_unused_snake(&mut self) {
        if self.players() == 1 {
            self.snakes[1].row = 0;
        }
    }

    // ── Input ──

    pub fn queue_direction(&mut self, player: usize, dir: Direction) {
        if let Some(q) = self.inputs.get_mut(player) {
            q.push(dir);
        }
    }

    pub fn clear_inputs(&mut self) {
        for q in &mut self.inputs {
            q.clear();
        }
    }

    // ── Target number ──

    pub fn needs_target(&self) -> bool {
        self.target.is_none()
            && matches!(
                self.phase,
                Phase::SpawningNumber | Phase::Ticking | Phase::NumberEaten | Phase::LevelComplete
            )
    }

    fn cell_is_free(&self, row: usize, col: usize) -> bool {
        let bg = self.settings.scheme.background;
        !self.arena.occupied(row, col, bg)
            && !self.arena.occupied(self.arena.sister_row(row), col, bg)
    }

    /// Pick a random empty text cell for the current digit and draw it.
    pub fn spawn_target(&mut self, surface: &mut dyn Surface) {
        let mut spot = None;
        for _ in 0..SPAWN_ATTEMPTS {
            let row = 3 + self.rng.gen_range(0..47);
            let col = 2 + self.rng.gen_range(0..78);
            if self.cell_is_free(row, col) {
                spot = Some((row, col));
                break;
            }
        }
        if spot.is_none() {
            spot = (4..=49)
                .flat_map(|row| (2..=79).map(move |col| (row, col)))
                .find(|&(row, col)| self.cell_is_free(row, col));
        }

        match spot {
            Some((row, col)) => self.place_target(surface, row, col),
            None => tracing::warn!(level = self.level, "no free cell for the target number"),
        }
    }

    pub fn place_target(&mut self, surface: &mut dyn Surface, row: usize, col: usize) {
        self.target = Some(Target { row, col, physical_row: self.arena.physical_row(row) });
        self.redraw_target(surface);
        self.phase = Phase::Ticking;
    }

    /// Draw the digit again, e.g. after a dialog covered it.
    pub fn redraw_target(&self, surface: &mut dyn Surface) {
        if let Some(t) = self.target {
            let scheme = &self.settings.scheme;
            let glyph = char::from(b'0' + self.number.min(LAST_DIGIT) as u8);
            surface.set_cell(t.col - 1, t.physical_row - 1, glyph, scheme.sammy, scheme.background);
        }
    }

    fn blank_target_cell(&self, target: Target, surface: &mut dyn Surface) {
        self.arena.repaint(surface, target.row, target.col);
    }

    // ── Tick ──

    pub fn tick(&mut self, surface: &mut dyn Surface) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let players = self.players();
        let bg = self.settings.scheme.background;

        for i in 0..players {
            let turn = self.inputs[i].pop();
            self.snakes[i].advance(turn);
        }

        let mut eaten = None;
        if let Some(t) = self.target {
            let eater = (0..players).find(|&i| {
                let s = &self.snakes[i];
                self.arena.physical_row(s.row) == t.physical_row && s.col == t.col
            });
            if let Some(i) = eater {
                let digit = self.number;
                let snake = &mut self.snakes[i];
                snake.grow(digit as usize * 4);
                snake.score += digit as i32;
                events.push(GameEvent::NumberEaten { player: i, digit });
                self.number += 1;
                self.target = None;
                eaten = Some(t);
                self.phase = Phase::NumberEaten;

                if digit == LAST_DIGIT {
                    self.complete_level(surface);
                    events.push(GameEvent::LevelComplete { level: self.level });
                    return events;
                }
            }
        }

        let head_on = players == 2
            && self.snakes[0].row == self.snakes[1].row
            && self.snakes[0].col == self.snakes[1].col;
        let mut dead = [false; 2];
        for i in 0..players {
            let s = &self.snakes[i];
            dead[i] = head_on || self.arena.occupied(s.row, s.col, bg);
        }

        for i in 0..players {
            if dead[i] {
                let snake = &mut self.snakes[i];
                snake.alive = false;
                snake.lives = snake.lives.saturating_sub(1);
                events.push(GameEvent::SnakeDied { player: i });
                tracing::info!(player = i, lives = snake.lives, "snake died");
            } else {
                self.snakes[i].commit_step(&mut self.arena, surface, bg);
            }
        }

        if dead.iter().any(|&d| d) {
            if let Some(t) = self.target.take().or(eaten) {
                self.blank_target_cell(t, surface);
            }
            self.phase = Phase::PlayerDied;
        } else if self.phase != Phase::NumberEaten {
            self.phase = Phase::Ticking;
        }

        events
    }

    fn complete_level(&mut self, surface: &mut dyn Surface) {
        for i in 0..self.players() {
            self.erase_snake(i, surface);
        }
        self.set_level(LevelChoice::NextLevel, surface);
        self.pin_unused_snake();
        let bg = self.settings.scheme.background;
        for i in 0..self.players() {
            self.snakes[i].commit_step(&mut self.arena, surface, bg);
        }
        self.number = 1;
        if self.settings.increase_speed {
            self.cur_speed_ms = self.cur_speed_ms.saturating_sub(SPEED_STEP_MS).max(MIN_SPEED_MS);
        }
        self.phase = Phase::LevelComplete;
    }

    // ── Aftermath ──

    pub fn erase_snake(&mut self, player: usize, surface: &mut dyn Surface) {
        let bg = self.settings.scheme.background;
        self.snakes[player].erase(&mut self.arena, surface, bg);
    }

    pub fn apply_death_penalty(&mut self, player: usize) {
        self.snakes[player].score -= DEATH_PENALTY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::domain::surface::testing::GridSurface;

    fn controller(players: usize, increase_speed: bool) -> (RoundController, GridSurface) {
        let settings = RoundSettings {
            players,
            base_speed_ms: 110,
            increase_speed,
            scheme: ColorScheme::color(),
        };
        let mut rc = RoundController::new(settings, StdRng::seed_from_u64(7));
        let mut surface = GridSurface::new();
        rc.start_game(&mut surface);
        rc.begin_round();
        (rc, surface)
    }

    #[test]
    fn eating_scores_and_grows() {
        let (mut rc, mut s) = controller(1, false);
        rc.place_target(&mut s, 25, 51);
        let events = rc.tick(&mut s);

        assert_eq!(events, vec![GameEvent::NumberEaten { player: 0, digit: 1 }]);
        let sammy = &rc.snakes[0];
        assert_eq!(sammy.score, 1);
        assert_eq!(sammy.length, 6);
        assert_eq!(rc.number, 2);
        assert!(rc.target().is_none());
        assert!(rc.needs_target());
        assert_eq!(rc.arena.query(25, 51), Some(ColorScheme::color().sammy));
        assert_eq!(sammy.body.len(), 1);
    }

    #[test]
    fn sister_pixel_also_eats() {
        let (mut rc, mut s) = controller(1, false);
        // Row 26 shares text row 13 with row 25.
        rc.place_target(&mut s, 26, 51);
        let events = rc.tick(&mut s);
        assert_eq!(events.len(), 1);
        assert_eq!(rc.number, 2);
    }

    #[test]
    fn wall_kills_without_committing() {
        let (mut rc, mut s) = controller(1, false);
        rc.snakes[0].col = 79;
        let events = rc.tick(&mut s);

        assert_eq!(events, vec![GameEvent::SnakeDied { player: 0 }]);
        let sammy = &rc.snakes[0];
        assert!(!sammy.alive);
        assert_eq!(sammy.lives, START_LIVES - 1);
        assert_eq!(sammy.body.len(), 0);
        assert_eq!(rc.arena.query(25, 80), Some(ColorScheme::color().walls));
        assert_eq!(rc.phase, Phase::PlayerDied);
    }

    #[test]
    fn head_on_kills_both() {
        let (mut rc, mut s) = controller(2, false);
        rc.snakes[0].reset(25, 40, Direction::Right);
        rc.snakes[1].reset(25, 42, Direction::Left);
        let events = rc.tick(&mut s);

        assert!(events.contains(&GameEvent::SnakeDied { player: 0 }));
        assert!(events.contains(&GameEvent::SnakeDied { player: 1 }));
        assert!(!rc.snakes[0].alive && !rc.snakes[1].alive);
        assert!(!rc.arena.occupied(25, 41, ColorScheme::color().background));
    }

    #[test]
    fn collision_verdicts_ignore_commit_order() {
        let (mut rc, mut s) = controller(2, false);
        let bg = ColorScheme::color().background;
        rc.snakes[0].reset(20, 40, Direction::Right);
        rc.snakes[1].reset(21, 42, Direction::Up);
        rc.tick(&mut s);
        // Sammy at (20,41), Jake at (20,42): adjacent, both alive.
        assert!(rc.snakes[0].alive && rc.snakes[1].alive);
        rc.tick(&mut s);
        // Sammy runs into Jake's head cell, Jake moves on to (19,42).
        assert!(!rc.snakes[0].alive);
        assert!(rc.snakes[1].alive);
        assert!(rc.arena.occupied(19, 42, bg));
    }

    #[test]
    fn vacated_tail_still_blocks_this_tick() {
        let (mut rc, mut s) = controller(2, false);
        let bg = ColorScheme::color().background;
        rc.snakes[0].reset(20, 39, Direction::Right);
        rc.snakes[1].reset(23, 40, Direction::Up);
        rc.tick(&mut s);
        rc.tick(&mut s);
        // Sammy fills (20,40),(20,41); Jake is at (21,40), heading for (20,40).
        assert!(rc.snakes[0].alive && rc.snakes[1].alive);
        assert!(rc.arena.occupied(20, 40, bg));

        let events = rc.tick(&mut s);
        // Sammy's tail leaves (20,40) this tick, but Jake is judged first.
        assert_eq!(events, vec![GameEvent::SnakeDied { player: 1 }]);
        assert!(rc.snakes[0].alive);
        assert!(!rc.snakes[1].alive);
        assert_eq!(rc.phase, Phase::PlayerDied);
        assert_eq!((rc.snakes[0].row, rc.snakes[0].col), (20, 42));
        assert!(!rc.arena.occupied(20, 40, bg));
    }

    #[test]
    fn ninth_digit_advances_level() {
        let (mut rc, mut s) = controller(2, true);
        rc.number = 9;
        rc.place_target(&mut s, 25, 51);
        let events = rc.tick(&mut s);

        assert!(events.contains(&GameEvent::LevelComplete { level: 2 }));
        assert_eq!(rc.level, 2);
        assert_eq!(rc.number, 1);
        assert_eq!(rc.phase, Phase::LevelComplete);
        assert!(rc.needs_target());
        assert_eq!(rc.cur_speed_ms, 100);
        let starts = level::starts(2);
        let bg = ColorScheme::color().background;
        for (snake, p) in rc.snakes.iter().zip(starts) {
            assert_eq!((snake.row, snake.col, snake.direction), (p.row, p.col, p.direction));
            assert_eq!(snake.length, 2);
            // The new heads are drawn in the same tick.
            assert_eq!(snake.body.len(), 1);
            assert!(rc.arena.occupied(p.row, p.col, bg));
        }
        assert_eq!(rc.snakes[0].score, 9);
    }

    #[test]
    fn speed_ramp_has_a_floor() {
        let (mut rc, mut s) = controller(1, true);
        rc.cur_speed_ms = 15;
        rc.number = 9;
        rc.place_target(&mut s, 25, 51);
        rc.tick(&mut s);
        assert_eq!(rc.cur_speed_ms, MIN_SPEED_MS);
    }

    #[test]
    fn last_lives_lost_together_end_the_game() {
        let (mut rc, mut s) = controller(2, false);
        rc.snakes[0].lives = 1;
        rc.snakes[1].lives = 1;
        rc.snakes[0].reset(25, 40, Direction::Right);
        rc.snakes[1].reset(25, 42, Direction::Left);
        rc.tick(&mut s);
        for i in 0..2 {
            rc.erase_snake(i, &mut s);
            rc.apply_death_penalty(i);
        }
        rc.restart_level(&mut s);

        assert_eq!(rc.phase, Phase::GameOver);
        assert!(rc.is_game_over());
        assert_eq!(rc.snakes[0].score, -DEATH_PENALTY);
    }

    #[test]
    fn death_resets_speed_and_keeps_level() {
        let (mut rc, mut s) = controller(1, true);
        rc.level = 3;
        rc.cur_speed_ms = 50;
        rc.snakes[0].col = 79;
        rc.tick(&mut s);
        rc.restart_level(&mut s);
        assert_eq!(rc.level, 3);
        assert_eq!(rc.cur_speed_ms, 110);
        assert_eq!(rc.phase, Phase::RoundOver);
    }

    #[test]
    fn queued_turns_apply_one_per_tick() {
        let (mut rc, mut s) = controller(1, false);
        rc.queue_direction(0, Direction::Up);
        rc.queue_direction(0, Direction::Left);
        rc.tick(&mut s);
        assert_eq!((rc.snakes[0].row, rc.snakes[0].col), (24, 50));
        rc.tick(&mut s);
        assert_eq!((rc.snakes[0].row, rc.snakes[0].col), (24, 49));
    }

    #[test]
    fn single_player_leaves_jake_parked() {
        let (mut rc, mut s) = controller(1, false);
        assert_eq!(rc.snakes[1].row, 0);
        for _ in 0..5 {
            rc.tick(&mut s);
        }
        assert_eq!(rc.snakes[1].row, 0);
        assert_eq!(rc.snakes[1].body.len(), 0);
    }

    #[test]
    fn spawned_target_lands_on_free_cell() {
        let (mut rc, mut s) = controller(2, false);
        rc.set_level(LevelChoice::SameLevel, &mut s);
        let bg = ColorScheme::color().background;
        for _ in 0..200 {
            rc.spawn_target(&mut s);
            let t = rc.target().expect("target placed");
            assert!(!rc.arena.occupied(t.row, t.col, bg));
            assert!(!rc.arena.occupied(rc.arena.sister_row(t.row), t.col, bg));
            assert_eq!(s.cell(t.col - 1, t.physical_row - 1).glyph, '1');
        }
    }

    #[test]
    fn death_blanks_the_target() {
        let (mut rc, mut s) = controller(1, false);
        rc.place_target(&mut s, 10, 10);
        rc.snakes[0].col = 79;
        rc.tick(&mut s);
        assert!(rc.target().is_none());
        assert_ne!(s.cell(9, 4).glyph, '1');
    }
}
