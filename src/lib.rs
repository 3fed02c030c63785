pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod player;
pub mod renderer;
pub mod types;
