//! Publishable work items and text normalization.

use serde::{Deserialize, Serialize};

/// One unit of publishable content.
///
/// Stored form uses `post` for the body; `text` and `content` are accepted
/// on read, in that order of preference after `post`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredItem")]
pub struct WorkItem {
    #[serde(rename = "post")]
    pub text: String,

    #[serde(rename = "imagePrompt", skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,

    /// 1-based position within the batch that created it
    pub index: usize,
}

/// Lenient on-disk / generator shape of an item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredItem {
    #[serde(default)]
    post: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "imagePrompt")]
    image_prompt: Option<String>,
    #[serde(default)]
    index: Option<usize>,
}

impl StoredItem {
    /// The first non-empty body among the accepted keys.
    pub fn body(&self) -> &str {
        [&self.post, &self.text, &self.content]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
            .unwrap_or("")
    }
}

impl From<StoredItem> for WorkItem {
    fn from(raw: StoredItem) -> Self {
        Self {
            text: raw.body().to_string(),
            image_prompt: raw.image_prompt.filter(|p| !p.is_empty()),
            index: raw.index.filter(|i| *i > 0).unwrap_or(1),
        }
    }
}

impl WorkItem {
    pub fn new(text: impl Into<String>, index: usize) -> Self {
        Self {
            text: text.into(),
            image_prompt: None,
            index,
        }
    }

    pub fn with_image_prompt(mut self, prompt: Option<String>) -> Self {
        self.image_prompt = prompt;
        self
    }
}

/// Collapse newlines to spaces, trim, and cut to `max_chars` characters.
pub fn normalize_text(text: &str, max_chars: usize) -> String {
    let flat = text.replace("\r\n", " ").replace(|c: char| c == '\n' || c == '\r', " ");
    let trimmed = flat.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => trimmed[..cut].to_string(),
        None => trimmed.to_string(),
    }
}

/// The first `max_chars` characters of `text`.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}
