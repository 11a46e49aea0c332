//! Target-link detection.

use std::sync::OnceLock;

use regex::Regex;

use crate::{errors::Error, Result};

/// `http(s)://` + optional `www.`/`vm.`/`vt.` + `tiktok.com/` + a non-empty path.
pub const TIKTOK_LINK_PATTERN: &str = r"https?://(?:www\.|vm\.|vt\.)?tiktok\.com/[^\s]+";

/// Decides whether a text body contains a link the bot should act on.
pub trait LinkMatcher: Send + Sync {
    fn is_match(&self, text: &str) -> bool;
}

/// Matcher backed by an arbitrary regular expression.
#[derive(Clone, Debug)]
pub struct RegexLinkMatcher {
    re: Regex,
}

impl RegexLinkMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid link pattern {pattern:?}: {e}")))?;
        Ok(Self { re })
    }

    /// The default TikTok matcher.
    pub fn tiktok() -> Self {
        Self {
            re: tiktok_regex().clone(),
        }
    }
}

impl Default for RegexLinkMatcher {
    fn default() -> Self {
        Self::tiktok()
    }
}

impl LinkMatcher for RegexLinkMatcher {
    fn is_match(&self, text: &str) -> bool {
        self.re.is_match(text)
    }
}

fn tiktok_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIKTOK_LINK_PATTERN).expect("static pattern compiles"))
}

/// True iff `text` contains a TikTok link.
pub fn contains_target_link(text: &str) -> bool {
    tiktok_regex().is_match(text)
}
