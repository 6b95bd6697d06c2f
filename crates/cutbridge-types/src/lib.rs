//! Shared types for cutbridge.
//!
//! This crate contains the value types shared across the cutbridge
//! workspace: clipboard owner identities, NUL-terminated clipboard text
//! and the "local clipboard changed" notification.

pub mod notification;
pub mod owner;
pub mod text;

pub use notification::ClipboardNotification;
pub use owner::OwnerId;
pub use text::{ClipboardText, LineEnding};
