//! In-memory navigation stack
//!
//! A deterministic [`HistoryHost`] for tests and headless embedders:
//! - Push truncates forward entries, like a browser
//! - Back/forward queue one notification each instead of delivering it
//! - Time only moves when [`MemoryHistory::advance`] is called
//! - Notifications can be dropped to model hosts that lose them
//!
//! The embedder drains [`MemoryHistory::take_notification`] into the
//! controller, usually through [`NavKeys::deliver_pending`](crate::NavKeys::deliver_pending).

use crate::host::{HistoryHost, HostNotification, StackEntry};
use crate::{trace_log, Tag};
use std::collections::VecDeque;
use std::time::Duration;

/// Navigation stack held in memory
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    /// History stack
    entries: Vec<StackEntry>,
    /// Current position in history
    current: usize,
    /// Notifications not yet delivered
    pending: VecDeque<HostNotification>,
    /// Number of upcoming notifications to drop
    muted: usize,
    subscribed: bool,
    now: Duration,
}

impl MemoryHistory {
    /// Create a stack holding a single foreign entry
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self::with_entries(vec![StackEntry::foreign(initial_url)], 0)
    }

    /// Create from existing entries, sitting on `current`
    ///
    /// Out-of-range positions clamp to the last entry. An empty list gets a
    /// single `about:blank` entry.
    pub fn with_entries(mut entries: Vec<StackEntry>, current: usize) -> Self {
        if entries.is_empty() {
            entries.push(StackEntry::foreign("about:blank"));
        }
        let current = current.min(entries.len() - 1);
        Self {
            entries,
            current,
            pending: VecDeque::new(),
            muted: 0,
            subscribed: true,
            now: Duration::ZERO,
        }
    }

    /// Get current entry
    pub fn current_entry(&self) -> &StackEntry {
        &self.entries[self.current]
    }

    /// Get all entries
    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    /// Get current index
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Get history length
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false, the stack keeps at least one entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if can go back
    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    /// Check if can go forward
    pub fn can_go_forward(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    /// Tags of all entries, oldest first
    pub fn tags(&self) -> Vec<Option<Tag>> {
        self.entries.iter().map(|entry| entry.tag).collect()
    }

    /// Whether notifications are still being queued
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Pop the next undelivered notification
    pub fn take_notification(&mut self) -> Option<HostNotification> {
        self.pending.pop_front()
    }

    /// Number of undelivered notifications
    pub fn pending_notifications(&self) -> usize {
        self.pending.len()
    }

    /// Silently drop the next `count` notifications
    pub fn drop_next_notifications(&mut self, count: usize) {
        self.muted += count;
    }

    /// Advance the monotonic clock
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    /// User presses the back button
    ///
    /// Returns false if there is nothing behind.
    pub fn press_back(&mut self) -> bool {
        self.step_back()
    }

    /// User presses the forward button
    ///
    /// Returns false if there is nothing ahead.
    pub fn press_forward(&mut self) -> bool {
        self.step_forward()
    }

    /// User edits the address (e.g. a hash link)
    ///
    /// Adds an untagged entry, dropping everything ahead, and notifies.
    pub fn navigate_to(&mut self, url: impl Into<String>) {
        self.entries.truncate(self.current + 1);
        self.entries.push(StackEntry::foreign(url));
        self.current += 1;
        self.notify();
    }

    fn step_back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.current -= 1;
        self.notify();
        true
    }

    fn step_forward(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.current += 1;
        self.notify();
        true
    }

    fn notify(&mut self) {
        if !self.subscribed {
            return;
        }
        if self.muted > 0 {
            self.muted -= 1;
            trace_log!("Dropping notification for entry {}", self.current);
            return;
        }
        let notification = HostNotification::arrived_at(self.current_entry());
        self.pending.push_back(notification);
    }
}

impl HistoryHost for MemoryHistory {
    fn replace_current(&mut self, tag: Option<Tag>, url: &str) {
        self.entries[self.current] = StackEntry {
            tag,
            url: url.to_string(),
        };
    }

    fn push_current(&mut self, tag: Option<Tag>, url: &str) {
        // Remove forward history when pushing
        self.entries.truncate(self.current + 1);
        self.entries.push(StackEntry {
            tag,
            url: url.to_string(),
        });
        self.current += 1;
    }

    fn move_back(&mut self) {
        self.step_back();
    }

    fn move_forward(&mut self) {
        self.step_forward();
    }

    fn current(&self) -> StackEntry {
        self.current_entry().clone()
    }

    fn now(&self) -> Duration {
        self.now
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
        self.pending.clear();
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_creation() {
        let history = MemoryHistory::new("https://x/");
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_entry(), &StackEntry::foreign("https://x/"));
        assert!(!history.can_go_back());
        assert!(!history.can_go_forward());
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut history = MemoryHistory::new("https://x/");
        history.push_current(Some(Tag::Center), "https://x/1");
        history.push_current(Some(Tag::Ahead), "https://x/2");
        history.move_back();
        history.move_back();
        assert_eq!(history.current_index(), 0);

        history.push_current(Some(Tag::Center), "https://x/3");
        assert_eq!(history.len(), 2);
        assert!(!history.can_go_forward());
        assert_eq!(history.current_entry().url, "https://x/3");
    }

    #[test]
    fn test_replace_keeps_length_and_stays_silent() {
        let mut history = MemoryHistory::new("https://x/");
        history.replace_current(Some(Tag::Behind), "https://x/a");
        assert_eq!(history.len(), 1);
        assert_eq!(history.tags(), vec![Some(Tag::Behind)]);
        assert_eq!(history.pending_notifications(), 0);
    }

    #[test]
    fn test_moves_queue_one_notification_each() {
        let mut history = MemoryHistory::new("https://x/");
        history.replace_current(Some(Tag::Behind), "https://x/");
        history.push_current(Some(Tag::Center), "https://x/");

        history.move_back();
        history.move_forward();

        assert_eq!(
            history.take_notification(),
            Some(HostNotification {
                tag: Some(Tag::Behind),
                url: "https://x/".to_string(),
            })
        );
        assert_eq!(
            history.take_notification().and_then(|n| n.tag),
            Some(Tag::Center)
        );
        assert_eq!(history.take_notification(), None);
    }

    #[test]
    fn test_impossible_moves_do_not_notify() {
        let mut history = MemoryHistory::new("https://x/");
        assert!(!history.press_back());
        assert!(!history.press_forward());
        assert_eq!(history.pending_notifications(), 0);
    }

    #[test]
    fn test_dropped_notifications() {
        let mut history = MemoryHistory::new("https://x/");
        history.push_current(None, "https://x/1");
        history.drop_next_notifications(1);

        assert!(history.press_back());
        assert_eq!(history.current_index(), 0);
        assert_eq!(history.pending_notifications(), 0);

        assert!(history.press_forward());
        assert_eq!(history.pending_notifications(), 1);
    }

    #[test]
    fn test_navigate_to_adds_foreign_entry() {
        let mut history = MemoryHistory::new("https://x/");
        history.replace_current(Some(Tag::Center), "https://x/");
        history.navigate_to("https://x/#top");

        assert_eq!(history.tags(), vec![Some(Tag::Center), None]);
        let notification = history.take_notification().unwrap();
        assert_eq!(notification.tag, None);
        assert_eq!(notification.url, "https://x/#top");
    }

    #[test]
    fn test_unsubscribe_silences_and_clears() {
        let mut history = MemoryHistory::new("https://x/");
        history.push_current(None, "https://x/1");
        history.move_back();
        assert_eq!(history.pending_notifications(), 1);

        history.unsubscribe();
        assert!(!history.is_subscribed());
        assert_eq!(history.pending_notifications(), 0);

        history.move_forward();
        assert_eq!(history.current_index(), 1);
        assert_eq!(history.pending_notifications(), 0);
    }

    #[test]
    fn test_clock_advances() {
        let mut history = MemoryHistory::default();
        assert_eq!(history.now(), Duration::ZERO);
        history.advance(Duration::from_millis(40));
        history.advance(Duration::from_millis(60));
        assert_eq!(history.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_with_entries_clamps_position() {
        let history = MemoryHistory::with_entries(
            vec![
                StackEntry::foreign("https://x/0"),
                StackEntry::foreign("https://x/1"),
            ],
            7,
        );
        assert_eq!(history.current_index(), 1);

        let empty = MemoryHistory::with_entries(Vec::new(), 0);
        assert_eq!(empty.len(), 1);
        assert!(!empty.is_empty());
    }
}
