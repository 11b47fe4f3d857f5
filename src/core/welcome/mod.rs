pub mod welcome_models;
pub mod welcome_service;

pub use welcome_models::*;
pub use welcome_service::{ImageCompositor, WelcomeError, WelcomeService};
