// Discord commands module.
// Feature-specific commands live next to their events (see `moderation`,
// `welcome`); this holds the general-purpose ones.

pub mod announce;

pub mod presence;
