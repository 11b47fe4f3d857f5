// Bot presence. Discord-layer only: nothing here reaches the core.

use poise::serenity_prelude as serenity;

/// Called once the bot is ready.
pub fn on_ready(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("over the lobby");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
