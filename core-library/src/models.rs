//! Domain models for the recitation library
//!
//! Metadata is read from `data/<key>/meta.json`:
//!
//! ```json
//! {
//!   "name": "دعای کمیل",
//!   "icon": "🌙",
//!   "reciters": [
//!     { "name": "Narrator A", "audioUrl": "https://cdn.example.org/kumayl.mp3", "timingKey": "a" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const DEFAULT_ICON: &str = "📜";

// =============================================================================
// Metadata
// =============================================================================

/// One narrator (reciter) of a recitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrator {
    #[serde(default)]
    pub name: Option<String>,
    /// Original, pre-proxy audio URL.
    pub audio_url: String,
    /// Suffix of the timing file; narrators without one have no timing.
    #[serde(default)]
    pub timing_key: Option<String>,
}

impl Narrator {
    /// Display name, falling back to "Reciter <n>" (1-based).
    pub fn display_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("Reciter {}", index + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecitationMeta {
    /// Directory key under `data/`. Not part of the file; filled in on load.
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Narrators in menu order.
    #[serde(default, alias = "narrators")]
    pub reciters: Vec<Narrator>,
}

impl RecitationMeta {
    pub fn icon(&self) -> &str {
        self.icon.as_deref().unwrap_or(DEFAULT_ICON)
    }

    pub fn narrator(&self, index: usize) -> Option<&Narrator> {
        self.reciters.get(index)
    }

    /// Case-insensitive substring match on the display name.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.name.to_lowercase().contains(&query)
    }
}

// =============================================================================
// Text
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Arabic,
    Farsi,
    English,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Arabic, Language::Farsi, Language::English];

    pub fn file_name(&self) -> &'static str {
        match self {
            Language::Arabic => "arabic.txt",
            Language::Farsi => "farsi.txt",
            Language::English => "english.txt",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Arabic => "arabic",
            Language::Farsi => "farsi",
            Language::English => "english",
        };
        f.write_str(name)
    }
}

/// Verse lines per language. Missing languages are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecitationText {
    verses: HashMap<Language, Vec<String>>,
}

impl RecitationText {
    /// Splits newline-delimited text, dropping empty lines.
    pub fn parse_lines(text: &str) -> Vec<String> {
        text.split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn insert(&mut self, language: Language, lines: Vec<String>) {
        self.verses.insert(language, lines);
    }

    pub fn lines(&self, language: Language) -> &[String] {
        self.verses
            .get(&language)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a non-empty translation exists for `language`.
    pub fn has(&self, language: Language) -> bool {
        !self.lines(language).is_empty()
    }

    /// Number of verses, driven by the Arabic text.
    pub fn verse_count(&self) -> usize {
        self.lines(Language::Arabic).len()
    }

    /// The line of `language` aligned with verse `index`, if any.
    pub fn verse(&self, language: Language, index: usize) -> Option<&str> {
        self.lines(language).get(index).map(String::as_str)
    }
}
