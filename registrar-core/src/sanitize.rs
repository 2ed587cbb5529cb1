//! Validation and escaping of values before they are interpolated into SQL text.

use crate::{Config, Value};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Whether `clean` leaves markup alone or strips it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagPolicy {
    /// Keep tags as they are
    #[default]
    Keep,
    /// Strip every tag not on the allow-list
    Strip,
}

/// How string literals are escaped for the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    /// Backslash escaping of quotes, backslash, NUL and control characters
    #[default]
    Backslash,
    /// Doubling of `'` and `"`, for servers running with `NO_BACKSLASH_ESCAPES`
    QuoteDoubling,
}

fn blank_regex() -> &'static Regex {
    static BLANK_RE: OnceLock<Regex> = OnceLock::new();
    BLANK_RE.get_or_init(|| Regex::new(r"^\s+$").expect("invalid built-in blank regex"))
}

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->|<[!?][^>]*>|</?([A-Za-z][A-Za-z0-9-]*)\b[^>]*>")
            .expect("invalid built-in tag regex")
    })
}

fn allow_list_regex() -> &'static Regex {
    static ALLOW_RE: OnceLock<Regex> = OnceLock::new();
    ALLOW_RE.get_or_init(|| {
        Regex::new(r"<\s*([A-Za-z][A-Za-z0-9-]*)\s*/?>").expect("invalid built-in allow-list regex")
    })
}

/// Tags exempt from stripping, parsed from a string like `"<a><b>"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedTags {
    names: HashSet<String>,
}

impl AllowedTags {
    pub fn parse(tags: &str) -> Self {
        let names = allow_list_regex()
            .captures_iter(tags)
            .map(|caps| caps[1].to_ascii_lowercase())
            .collect();
        Self { names }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.names.contains(&tag.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Remove markup tags and comments, keeping the allow-listed tags intact
pub fn strip_tags(text: &str, allowed: &AllowedTags) -> String {
    tag_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| match caps.get(1) {
            Some(name) if allowed.contains(name.as_str()) => caps[0].to_string(),
            _ => String::new(),
        })
        .into_owned()
}

/// Undo backslash escaping: `\x` becomes `x`, `\\` becomes `\` and `\0` becomes NUL
pub fn strip_slashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('\0'),
            Some(next) => out.push(next),
            None => {}
        }
    }
    out
}

/// Escape text for use inside a quoted MySQL string literal
pub fn escape_string(text: &str, mode: EscapeMode) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    match mode {
        EscapeMode::Backslash => {
            for c in text.chars() {
                match c {
                    '\0' => out.push_str("\\0"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\\' => out.push_str("\\\\"),
                    '\'' => out.push_str("\\'"),
                    '"' => out.push_str("\\\""),
                    '\x1a' => out.push_str("\\Z"),
                    other => out.push(other),
                }
            }
        }
        EscapeMode::QuoteDoubling => {
            for c in text.chars() {
                if c == '\'' || c == '"' {
                    out.push(c);
                }
                out.push(c);
            }
        }
    }
    out
}

/// Value checks and the cleaning pipeline, configured once per registry
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    allowed_tags: AllowedTags,
    magic_quotes: bool,
    legacy_blank_check: bool,
}

impl Sanitizer {
    pub fn new(config: &Config) -> Self {
        Self {
            allowed_tags: AllowedTags::parse(&config.allowed_tags),
            magic_quotes: config.magic_quotes,
            legacy_blank_check: config.legacy_blank_check,
        }
    }

    /// False when the value's text is only whitespace.
    ///
    /// Null always passes so optional arguments flow through. The empty string
    /// is blank unless the legacy blank check is enabled.
    pub fn is_non_blank(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        self.is_non_blank_str(&value.to_text())
    }

    pub fn is_non_blank_str(&self, text: &str) -> bool {
        if text.is_empty() {
            return self.legacy_blank_check;
        }
        !blank_regex().is_match(text)
    }

    /// Everything `clean` does before the connection-specific escape
    pub fn prepare(&self, value: &str, tags: TagPolicy) -> String {
        let mut text = match tags {
            TagPolicy::Keep => value.to_string(),
            TagPolicy::Strip => strip_tags(value, &self.allowed_tags),
        };
        if self.magic_quotes {
            text = strip_slashes(&text);
        }
        text
    }

    /// Strip tags if asked, undo legacy escaping, then apply `escape`.
    ///
    /// Call once per raw value: cleaning an already escaped value escapes it twice.
    pub fn clean<F>(&self, value: &str, tags: TagPolicy, escape: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        escape(&self.prepare(value, tags))
    }
}
