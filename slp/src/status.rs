//! Decoding of the status JSON into a [`ServerStatus`].

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// MOTD used when the description has a shape we don't understand.
pub const FALLBACK_MOTD: &str = "ProxyCraft Server";
/// MOTD reported for a server that could not be queried.
pub const OFFLINE_MOTD: &str = "Server offline";
/// Version name used when the server doesn't send one, or is offline.
pub const UNKNOWN_VERSION: &str = "Unknown";

/// The status of a server, either as reported by the server or the fixed
/// offline record.
///
/// Serializes to the shape served to API clients:
///
/// ```json
/// {"online": true, "players": {"online": 3, "max": 20}, "version": "1.8.9", "motd": "Hi", "favicon": ""}
/// {"online": false, "error": "connection refused", "players": {"online": 0, "max": 0}, "version": "Unknown", "motd": "Server offline"}
/// ```
#[derive(Serialize, Debug, Clone, Eq, PartialEq)]
pub struct ServerStatus {
    online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    players: Players,
    version: String,
    motd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    favicon: Option<String>,
}

/// Player counts.
#[derive(Serialize, Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Players {
    pub online: i64,
    pub max: i64,
}

/// The subset of the status JSON we read. Anything missing or `null` falls
/// back to a default instead of failing the decode.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawStatus {
    players: Option<RawPlayers>,
    version: Option<RawVersion>,
    description: Option<Value>,
    favicon: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPlayers {
    online: Option<i64>,
    max: Option<i64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawVersion {
    name: Option<String>,
}

impl ServerStatus {
    /// Decodes the JSON payload of a status response.
    ///
    /// # Errors
    /// [`Error::InvalidJson`] if `json` is not a JSON object with the expected
    /// field types.
    pub fn decode(json: &str) -> Result<Self, Error> {
        let raw: RawStatus = serde_json::from_str(json)?;
        let players = raw.players.unwrap_or_default();
        Ok(Self {
            online: true,
            error: None,
            players: Players {
                online: players.online.unwrap_or(0),
                max: players.max.unwrap_or(0),
            },
            version: raw
                .version
                .and_then(|version| version.name)
                .unwrap_or_else(|| UNKNOWN_VERSION.to_owned()),
            motd: raw
                .description
                .as_ref()
                .map_or_else(|| FALLBACK_MOTD.to_owned(), normalize_motd),
            favicon: Some(raw.favicon.unwrap_or_default()),
        })
    }

    /// The record reported when a query failed.
    pub fn offline(error: impl Display) -> Self {
        Self {
            online: false,
            error: Some(error.to_string()),
            players: Players::default(),
            version: UNKNOWN_VERSION.to_owned(),
            motd: OFFLINE_MOTD.to_owned(),
            favicon: None,
        }
    }

    #[must_use]
    pub const fn online(&self) -> bool {
        self.online
    }

    #[must_use]
    pub const fn players(&self) -> Players {
        self.players
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn motd(&self) -> &str {
        &self.motd
    }

    /// The server icon, a `data:image/png;base64,...` URI. Empty if the
    /// server sent none, `None` when offline.
    #[must_use]
    pub fn favicon(&self) -> Option<&str> {
        self.favicon.as_deref()
    }

    /// Why the query failed. Only set when offline.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Flattens a chat component description into plain text.
///
/// A plain string is returned as is, an object's `text` wins over its
/// `extra`, and `extra` is flattened one level only. Anything else yields
/// [`FALLBACK_MOTD`].
#[must_use]
pub fn normalize_motd(description: &Value) -> String {
    match description {
        Value::String(text) => text.clone(),
        Value::Object(component) => {
            if let Some(text) = component.get("text") {
                return text_of(text);
            }
            if let Some(extra) = component.get("extra") {
                return match extra {
                    Value::Array(parts) => parts
                        .iter()
                        .map(|part| part.get("text").map(text_of).unwrap_or_default())
                        .collect(),
                    _ => FALLBACK_MOTD.to_owned(),
                };
            }
            FALLBACK_MOTD.to_owned()
        }
        _ => FALLBACK_MOTD.to_owned(),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
