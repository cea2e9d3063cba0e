/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete. Game
/// settings left out of the file are asked for on the setup screen.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config.toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("players must be 1 or 2, got {0}")]
    Players(u32),
    #[error("skill must be from 1 to 100, got {0}")]
    Skill(u32),
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub game: GameSettings,
    pub sound_enabled: bool,
    pub gamepad: GamepadConfig,
    pub log: LogConfig,
}

/// `None` means "ask at startup".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GameSettings {
    pub players: Option<usize>,
    pub skill: Option<u32>,
    pub increase_speed: Option<bool>,
    pub monochrome: Option<bool>,
    pub intro: bool,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub pause: Vec<String>,
    pub resume: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    players: Option<u32>,
    skill: Option<u32>,
    increase_speed: Option<bool>,
    monochrome: Option<bool>,
    #[serde(default = "default_true")]
    intro: bool,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_true")]
    enabled: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_resume", rename = "continue")]
    resume: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    file: Option<String>,
    #[serde(default = "default_log_level")]
    level: String,
}

// ── Defaults ──

fn default_true() -> bool { true }
fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_resume() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_log_level() -> String { "info".into() }

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            players: None,
            skill: None,
            increase_speed: None,
            monochrome: None,
            intro: default_true(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: default_true() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            pause: default_pause(),
            resume: default_resume(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog { file: None, level: default_log_level() }
    }
}

// ── Validation ──

pub fn validate_players(n: u32) -> Result<usize, ConfigError> {
    match n {
        1 | 2 => Ok(n as usize),
        _ => Err(ConfigError::Players(n)),
    }
}

pub fn validate_skill(n: u32) -> Result<u32, ConfigError> {
    if (1..=100).contains(&n) { Ok(n) } else { Err(ConfigError::Skill(n)) }
}

/// Tick interval for a skill level: 1 is slowest, 100 fastest.
pub fn skill_to_speed_ms(skill: u32) -> u64 {
    (100 - skill.clamp(1, 100) as u64) * 2 + 10
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, working directory, XDG data dir,
    /// system data dir. A broken file is reported and ignored.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        for dir in &search_dirs {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => match GameConfig::parse(&text, &search_dirs) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: {e}");
                        eprintln!("Using default settings.");
                        return GameConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
        GameConfig::default()
    }

    pub fn parse(text: &str, search_dirs: &[PathBuf]) -> Result<Self, ConfigError> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        if let Some(n) = toml_cfg.game.players {
            validate_players(n)?;
        }
        if let Some(n) = toml_cfg.game.skill {
            validate_skill(n)?;
        }
        Ok(GameConfig::from_toml(toml_cfg, search_dirs))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Relative log paths land next to the first candidate directory.
        let file = cfg.log.file.map(|f| {
            let p = PathBuf::from(f);
            match search_dirs.first() {
                Some(dir) if p.is_relative() => dir.join(p),
                _ => p,
            }
        });

        GameConfig {
            game: GameSettings {
                players: cfg.game.players.map(|n| n as usize),
                skill: cfg.game.skill,
                increase_speed: cfg.game.increase_speed,
                monochrome: cfg.game.monochrome,
                intro: cfg.game.intro,
            },
            sound_enabled: cfg.sound.enabled,
            gamepad: GamepadConfig {
                pause: cfg.gamepad.pause,
                resume: cfg.gamepad.resume,
                quit: cfg.gamepad.quit,
            },
            log: LogConfig { file, level: cfg.log.level },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/nibbles");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    let sys = PathBuf::from("/usr/share/nibbles");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
