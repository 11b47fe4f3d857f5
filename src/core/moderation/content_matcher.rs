// Pattern matchers - stateless classification of a message body.
//
// Keywords match as case-insensitive substrings; domains are looked for inside
// every URL in the message.

use super::moderation_models::Violation;
use regex::Regex;

const INVITE_PATTERN: &str = r"(?i)(discord\.gg/|discord\.com/invite/|discordapp\.com/invite/)";
const URL_PATTERN: &str = r"(?i)https?://[^\s<>]+";

const DISALLOWED_KEYWORDS: &[&str] = &[
    "porn",
    "xxx",
    "sex",
    "nude",
    "naked",
    "nsfw",
    "erotic",
    "hentai",
    "masturbate",
    "orgasm",
    "penis",
    "vagina",
    "dick",
    "fuck",
    "bitch",
    "whore",
    "slut",
    "pussy",
];

const DISALLOWED_DOMAINS: &[&str] = &[
    "pornhub.com",
    "xvideos.com",
    "xnxx.com",
    "redtube.com",
    "youporn.com",
    "tube8.com",
    "spankbang.com",
    "xhamster.com",
    "onlyfans.com",
];

pub struct ContentMatcher {
    invite: Regex,
    url: Regex,
    keywords: Vec<String>,
    domains: Vec<String>,
}

impl ContentMatcher {
    pub fn new() -> Self {
        Self::with_lists(
            DISALLOWED_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            DISALLOWED_DOMAINS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Build a matcher with custom keyword and domain lists.
    pub fn with_lists(keywords: Vec<String>, domains: Vec<String>) -> Self {
        Self {
            invite: Regex::new(INVITE_PATTERN).expect("invite pattern is a valid regex"),
            url: Regex::new(URL_PATTERN).expect("url pattern is a valid regex"),
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            domains: domains.into_iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    pub fn match_invite(&self, text: &str) -> bool {
        self.invite.is_match(text)
    }

    /// Returns a human-readable reason when the text is disallowed.
    ///
    /// Keywords are checked first (plain substring, case-insensitive), then the
    /// domains of any URL-shaped substrings.
    pub fn match_disallowed_content(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();

        if let Some(keyword) = self.keywords.iter().find(|k| lowered.contains(k.as_str())) {
            return Some(format!("keyword: {keyword}"));
        }

        self.url.find_iter(&lowered).find_map(|url| {
            self.domains
                .iter()
                .find(|domain| url.as_str().contains(domain.as_str()))
                .map(|domain| format!("domain: {domain}"))
        })
    }

    /// Invite check as a violation signal.
    pub fn classify_invite(&self, text: &str) -> Violation {
        if self.match_invite(text) {
            Violation::Invite
        } else {
            Violation::None
        }
    }

    /// Content check as a violation signal.
    pub fn classify_content(&self, text: &str) -> Violation {
        match self.match_disallowed_content(text) {
            Some(reason) => Violation::DisallowedContent { reason },
            None => Violation::None,
        }
    }
}

impl Default for ContentMatcher {
    fn default() -> Self {
        Self::new()
    }
}
