/// Events emitted by a round tick.
/// The driver maps these onto tunes, HUD refreshes and dialogs.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    NumberEaten { player: usize, digit: u32 },
    LevelComplete { level: usize },
    SnakeDied { player: usize },
}
