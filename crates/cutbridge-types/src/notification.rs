//! Local clipboard change notifications.

use serde::{Deserialize, Serialize};

use crate::owner::OwnerId;

/// "The local clipboard changed", as delivered by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardNotification {
    /// Current clipboard owner. `None` when the owner is unknown or is
    /// not an identity this process handed out.
    pub owner: Option<OwnerId>,
}

impl ClipboardNotification {
    #[must_use]
    pub fn owned_by(owner: OwnerId) -> Self {
        Self { owner: Some(owner) }
    }

    #[must_use]
    pub fn foreign() -> Self {
        Self { owner: None }
    }

    /// Whether `identity` is the current owner.
    #[must_use]
    pub fn is_owned_by(&self, identity: OwnerId) -> bool {
        self.owner == Some(identity)
    }
}
