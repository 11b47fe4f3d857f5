// Core moderation module - the real-time moderation engine.
// Following the same pattern as the other core modules: models, ports, services.

pub mod activity_tracker;
pub mod chat_gateway;
pub mod content_matcher;
pub mod moderation_config;
pub mod moderation_models;
pub mod moderation_service;
pub mod moderation_state;
pub mod remediation;
pub mod violation_coordinator;

#[cfg(test)]
pub(crate) mod test_support;

pub use chat_gateway::{ChatGateway, GatewayError};
pub use moderation_config::ModerationSettings;
pub use moderation_models::*;
pub use moderation_service::*;
