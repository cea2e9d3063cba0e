pub mod gamepad;
pub mod input;
pub mod music;
pub mod renderer;
pub mod sound;
