pub mod arena;
pub mod color;
pub mod direction;
pub mod palette;
pub mod snake;
pub mod surface;
