//! Three-slot window over the host stack
//!
//! ```text
//! {pos: 0}, {pos: 1}, {pos: 2}     resting, forward enabled
//!              ^
//! {pos: 0}, {pos: 1}               resting, forward disabled
//!              ^
//! ```
//!
//! The window only executes stack operations. Deciding what a notification
//! means is the controller's job.

use crate::host::HistoryHost;
use crate::{trace_log, Tag};

/// Low-level operations on the tagged window
#[derive(Debug)]
pub struct HistoryWindow<H> {
    host: H,
}

impl<H: HistoryHost> HistoryWindow<H> {
    /// Wrap a host without touching its stack
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Tag the current entry as slot 0 and push slot 1 on top.
    ///
    /// Leaves the window centered with forward disabled. Does not notify.
    pub fn initialize(&mut self, url: &str) {
        self.host.replace_current(Some(Tag::Behind), url);
        self.host.push_current(Some(Tag::Center), url);
    }

    /// Push slot 2 and step back onto slot 1.
    ///
    /// Notifies once, on arrival at slot 1.
    pub fn grow_forward(&mut self, url: &str) {
        trace_log!("Growing forward slot");
        self.host.push_current(Some(Tag::Ahead), url);
        self.host.move_back();
    }

    /// Step back onto slot 0 so the next [`recenter`](Self::recenter)
    /// overwrites slot 2.
    ///
    /// Notifies once, on arrival at slot 0.
    pub fn shrink_forward(&mut self) {
        trace_log!("Shrinking forward slot");
        self.host.move_back();
    }

    /// Push a fresh slot 1, discarding anything ahead. Does not notify.
    pub fn recenter(&mut self, url: &str) {
        self.host.push_current(Some(Tag::Center), url);
    }

    /// Native back. Notifies once.
    pub fn move_back(&mut self) {
        self.host.move_back();
    }

    /// Native forward. Notifies once.
    pub fn move_forward(&mut self) {
        self.host.move_forward();
    }

    /// Overwrite the current entry in place. Does not notify.
    pub fn replace_current_url(&mut self, tag: Tag, url: &str) {
        self.host.replace_current(Some(tag), url);
    }

    /// Tag of the entry the host sits on, `None` if foreign
    pub fn current_tag(&self) -> Option<Tag> {
        self.host.current().tag
    }

    /// Detach from the host's notification channel
    pub fn detach(&mut self) {
        self.host.unsubscribe();
    }

    /// Get the wrapped host
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Get the wrapped host mutably
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
