pub mod commands;
pub mod member_events;
