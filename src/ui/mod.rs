pub mod board;
pub mod icons;
pub mod progress;

pub use board::{render_board, render_move_outcome};
pub use progress::LoadSpinner;
