// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "server_stats/mod.rs"]
pub mod server_stats;

#[path = "welcome/mod.rs"]
pub mod welcome;
