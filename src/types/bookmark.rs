use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A bookmark card as read from page markup. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CardDescriptor {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: String,
}

impl CardDescriptor {
    /// A card is usable only with a non-empty URL and title.
    pub fn is_valid(&self) -> bool {
        is_valid_favorite(&self.url, &self.title)
    }
}

/// A persisted favorite entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: String,
    pub id: String,
    #[serde(rename = "addedAt")]
    pub added_at: String,
}

impl BookmarkRecord {
    /// Builds a new record from a card, trimming every field and assigning
    /// a fresh `id` and `addedAt`.
    pub fn from_card(card: &CardDescriptor) -> Self {
        Self {
            url: card.url.trim().to_string(),
            title: card.title.trim().to_string(),
            description: card.description.trim().to_string(),
            icon: card.icon.trim().to_string(),
            category: card.category.trim().to_string(),
            id: new_record_id(),
            added_at: now_iso8601(),
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_favorite(&self.url, &self.title)
    }

    /// Returns a copy with all string fields trimmed.
    pub fn normalized(&self) -> Self {
        Self {
            url: self.url.trim().to_string(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            icon: self.icon.trim().to_string(),
            category: self.category.trim().to_string(),
            id: self.id.trim().to_string(),
            added_at: self.added_at.trim().to_string(),
        }
    }

    /// Decodes one persisted entry leniently.
    ///
    /// Returns `None` when the entry is not an object or lacks a non-empty
    /// `url`/`title`. Optional fields that are missing or not strings become
    /// empty; a missing `id` or `addedAt` is generated. The boolean is `true`
    /// when the decoded record differs from what was stored.
    pub fn from_stored(value: &Value) -> Option<(Self, bool)> {
        let obj = value.as_object()?;
        let url = obj.get("url").and_then(Value::as_str)?;
        let title = obj.get("title").and_then(Value::as_str)?;
        if !is_valid_favorite(url, title) {
            return None;
        }

        let mut changed = url.trim() != url || title.trim() != title;
        let mut text = |field: &str| -> String {
            match obj.get(field) {
                Some(Value::String(s)) => {
                    if s.trim() != s {
                        changed = true;
                    }
                    s.trim().to_string()
                }
                Some(Value::Null) | None => String::new(),
                Some(_) => {
                    changed = true;
                    String::new()
                }
            }
        };
        let description = text("description");
        let icon = text("icon");
        let category = text("category");

        // Older drafts stored numeric ids.
        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                if s.trim() != s {
                    changed = true;
                }
                s.trim().to_string()
            }
            Some(Value::Number(n)) => {
                changed = true;
                n.to_string()
            }
            _ => {
                changed = true;
                new_record_id()
            }
        };
        let added_at = match obj.get("addedAt") {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                if s.trim() != s {
                    changed = true;
                }
                s.trim().to_string()
            }
            _ => {
                changed = true;
                now_iso8601()
            }
        };

        Some((
            Self {
                url: url.trim().to_string(),
                title: title.trim().to_string(),
                description,
                icon,
                category,
                id,
                added_at,
            },
            changed,
        ))
    }

    /// The card view of this record.
    pub fn to_card(&self) -> CardDescriptor {
        CardDescriptor {
            url: self.url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            category: self.category.clone(),
        }
    }
}

/// The "valid favorite" predicate: non-empty url and title after trimming.
pub fn is_valid_favorite(url: &str, title: &str) -> bool {
    !url.trim().is_empty() && !title.trim().is_empty()
}

fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC time as an ISO-8601 string with millisecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
