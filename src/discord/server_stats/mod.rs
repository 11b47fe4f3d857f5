pub mod commands;
pub mod refresh;
