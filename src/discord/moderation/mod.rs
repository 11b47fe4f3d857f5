pub mod commands;
pub mod message_events;
