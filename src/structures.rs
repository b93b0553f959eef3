use serde::{Deserialize, Serialize};

/// Query string of a status request. Both fields fall back to the configured
/// defaults when absent.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct StatusQuery {
    pub host: Option<String>,
    /// Kept as text so a malformed port is reported by us rather than by the
    /// query extractor.
    pub port: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct ErrorSerialization {
    pub error: String,
}
