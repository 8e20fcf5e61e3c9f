pub mod cli;
pub mod gemini;
pub mod load_config;
pub mod mail;

pub use cli::{run, Cli, Commands};
