// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Discord REST, image service)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file loads configuration, wires services together, sets up the poise
// framework and routes gateway events.

#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::moderation::{ModerationService, ModerationSettings};
use crate::core::server_stats::ServerStatsService;
use crate::core::welcome::WelcomeService;
use crate::discord::commands::presence;
use crate::discord::moderation::message_events;
use crate::discord::server_stats::refresh as stats_refresh;
use crate::discord::welcome::member_events;
use crate::discord::{Data, Error};
use crate::infra::moderation::SerenityGateway;
use crate::infra::server_stats::JsonStatsStore;
use crate::infra::welcome::HttpImageCompositor;
use poise::serenity_prelude as serenity;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_COMMUNITY_NAME: &str = "Only Gamers";
const DEFAULT_SERVER_STATS_FILE: &str = "data/server_stats.json";

/// How often idle per-user moderation state is swept, and how idle it must be.
const EVICTION_INTERVAL: Duration = Duration::from_secs(10 * 60);
const EVICTION_MAX_IDLE: Duration = Duration::from_secs(60 * 60);

/// Discord allows two renames per channel every ten minutes.
const STATS_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Read an optional env var. Garbage is logged and treated as unset.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}

fn moderation_settings_from_env() -> ModerationSettings {
    let defaults = ModerationSettings::default();
    ModerationSettings {
        spam_message_threshold: env_parse("MODERATION_SPAM_THRESHOLD")
            .unwrap_or(defaults.spam_message_threshold),
        spam_window_secs: env_parse("MODERATION_SPAM_WINDOW_SECS")
            .unwrap_or(defaults.spam_window_secs),
        max_warnings: env_parse("MODERATION_MAX_WARNINGS").unwrap_or(defaults.max_warnings),
    }
    .clamped()
}

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            message_events::moderate_message(ctx, data, new_message);
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            data.server_stats.mark_dirty(new_member.guild_id.get());
            if let Err(e) = member_events::handle_member_join(ctx, data, new_member).await {
                tracing::error!("Error posting welcome card: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberRemoval {
            guild_id,
            user,
            member_data_if_available,
        } => {
            data.server_stats.mark_dirty(guild_id.get());
            if let Err(e) = member_events::handle_member_remove(
                ctx,
                data,
                *guild_id,
                user,
                member_data_if_available.as_ref(),
            )
            .await
            {
                tracing::error!("Error posting leave card: {}", e);
            }
        }
        serenity::FullEvent::GuildUpdate { new_data, .. } => {
            // Boost count lives on the guild itself
            data.server_stats.mark_dirty(new_data.id.get());
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    let settings = moderation_settings_from_env();
    let mod_log_channel: Option<u64> = env_parse("MOD_LOG_CHANNEL_ID");
    let welcome_channel: Option<u64> = env_parse("WELCOME_CHANNEL_ID");
    let leave_channel: Option<u64> = env_parse("LEAVE_CHANNEL_ID");
    let community_name = std::env::var("COMMUNITY_NAME")
        .unwrap_or_else(|_| DEFAULT_COMMUNITY_NAME.to_string());

    let compositor = match std::env::var("IMAGE_COMPOSITOR_URL") {
        Ok(url) => match HttpImageCompositor::new(url) {
            Ok(compositor) => Some(compositor),
            Err(e) => {
                tracing::warn!("Image compositor disabled: {}", e);
                None
            }
        },
        Err(_) => None,
    };
    if compositor.is_none() {
        tracing::info!("No image compositor configured, welcome cards will be text-only");
    }

    let welcome_service = Arc::new(WelcomeService::new(
        compositor,
        welcome_channel,
        leave_channel,
        community_name,
    ));

    let stats_file = std::env::var("SERVER_STATS_FILE")
        .unwrap_or_else(|_| DEFAULT_SERVER_STATS_FILE.to_string());
    let stats_store = JsonStatsStore::open(&stats_file)
        .await
        .expect("Failed to load server stats config");

    tracing::info!(
        spam_threshold = settings.spam_message_threshold,
        spam_window_secs = settings.spam_window_secs,
        max_warnings = settings.max_warnings,
        "Moderation settings loaded"
    );

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::all_commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("🤖 Bot is starting up...");

                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("✅ Commands registered!");

                // The moderation engine talks to Discord through the same HTTP
                // client the framework uses.
                let gateway = SerenityGateway::new(ctx.http.clone());
                let moderation =
                    ModerationService::new(Arc::new(gateway.clone()), settings, mod_log_channel);
                let server_stats = Arc::new(ServerStatsService::new(stats_store, gateway));

                // Per-user state for people who went quiet is dropped periodically.
                let sweeper = moderation.clone();
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(EVICTION_INTERVAL);
                    // First tick fires immediately
                    interval.tick().await;
                    loop {
                        interval.tick().await;
                        let evicted = sweeper.evict_idle_users(EVICTION_MAX_IDLE);
                        if evicted > 0 {
                            tracing::debug!(evicted, "Evicted idle moderation records");
                        }
                    }
                });

                // Counter channels catch up after a restart, then follow member events.
                if let Err(e) = server_stats.mark_all_dirty().await {
                    tracing::warn!("Couldn't queue server stats refresh: {}", e);
                }
                let stats = Arc::clone(&server_stats);
                let cache = ctx.cache.clone();
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(STATS_REFRESH_INTERVAL);
                    loop {
                        interval.tick().await;
                        stats_refresh::flush_dirty(&cache, &stats).await;
                    }
                });

                presence::on_ready(ctx);
                tracing::info!("🚀 Bot is ready!");

                Ok(Data {
                    moderation,
                    welcome: welcome_service,
                    server_stats,
                })
            })
        })
        .build();

    // Privilege checks and stats counts read guilds out of the cache
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
