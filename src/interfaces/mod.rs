pub mod cli;
pub mod commands;
pub mod state;

pub use state::AppState;
