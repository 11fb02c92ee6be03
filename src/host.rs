//! Host navigation capability
//!
//! The controller never touches a global history object. Everything it needs
//! from the runtime goes through [`HistoryHost`], so a browser binding and the
//! in-memory [`MemoryHistory`](crate::MemoryHistory) are interchangeable.

use crate::Tag;
use std::time::Duration;

/// A single entry of the host's navigation stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    /// Window slot attached by the controller, `None` for foreign entries
    pub tag: Option<Tag>,
    /// Address shown for this entry
    pub url: String,
}

impl StackEntry {
    /// Create an entry with a window tag
    pub fn tagged(tag: Tag, url: impl Into<String>) -> Self {
        Self {
            tag: Some(tag),
            url: url.into(),
        }
    }

    /// Create an entry the controller did not create
    pub fn foreign(url: impl Into<String>) -> Self {
        Self {
            tag: None,
            url: url.into(),
        }
    }
}

/// "Position changed" notification delivered by the host
///
/// Carries the tag of the entry the host moved to and the address it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostNotification {
    /// Tag of the new current entry, `None` if untagged
    pub tag: Option<Tag>,
    /// Address reported alongside the notification
    pub url: String,
}

impl HostNotification {
    /// Build the notification for arriving at `entry`
    pub fn arrived_at(entry: &StackEntry) -> Self {
        Self {
            tag: entry.tag,
            url: entry.url.clone(),
        }
    }
}

/// Navigation primitives the controller consumes.
///
/// Contract:
/// - `move_back` / `move_forward` schedule exactly one asynchronous position
///   notification, delivered later through
///   [`NavKeys::handle_notification`](crate::NavKeys::handle_notification).
///   A host may silently drop it; the controller times out in that case.
/// - `replace_current` / `push_current` never notify.
/// - `now` is monotonic. Embedders advance it; the controller only reads it.
pub trait HistoryHost {
    /// Overwrite the current entry without adding a frame
    fn replace_current(&mut self, tag: Option<Tag>, url: &str);

    /// Push a new entry after the current one, discarding anything ahead
    fn push_current(&mut self, tag: Option<Tag>, url: &str);

    /// Native back navigation
    fn move_back(&mut self);

    /// Native forward navigation
    fn move_forward(&mut self);

    /// The entry the host currently sits on
    fn current(&self) -> StackEntry;

    /// Monotonic time
    fn now(&self) -> Duration;

    /// Stop delivering position notifications
    fn unsubscribe(&mut self) {}
}
