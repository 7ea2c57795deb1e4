mod card;
mod feeders;
mod keymap;
mod styles;
mod tui;
mod view;

pub use card::{CardLine, bar, feedback_lines, result_lines};
pub use feeders::spawn_tui_feeders;
pub use keymap::{Action, Focus, KeyState, map_key};
pub use tui::{TuiActor, TuiMsg};
