pub mod audio;
pub mod audio_api;
pub mod board;
pub mod capture;
pub mod doc;
pub mod engine;
pub mod error;
pub mod kit;
pub mod scenes;
pub mod sequencer;
pub mod shared;
pub mod speech;
pub mod testkit;
pub mod tui;
pub mod vocab;
pub mod wav;

pub use board::{Board, Caps};
pub use error::CoreError;
pub use shared::{Command, PadRef};
