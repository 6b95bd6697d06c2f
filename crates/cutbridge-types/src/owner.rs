//! Clipboard owner identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity the bridge opens the clipboard under.
///
/// One is generated per bridge at startup. A change notification that
/// names it reports the bridge's own write and must not be echoed back.
/// Serialises as the bare hyphenated UUID, the same text it displays as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
