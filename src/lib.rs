//! # navkeys
//!
//! Back and forward button detection for hosts that only report
//! "the history position changed", plus an application-controlled forward
//! button.
//!
//! - **Classification** - Every host notification becomes a back, forward or
//!   navigate event, or is recognized as the echo of a corrective move
//! - **Forward Button Control** - Enable or disable the host's forward button
//! - **Stable Addresses** - The host keeps showing the application's logical
//!   address while the window is being corrected
//! - **Injected Host** - Stack operations go through [`HistoryHost`], with an
//!   in-memory [`MemoryHistory`] for tests and headless use
//!
//! # How it works
//!
//! The controller keeps three tagged entries on the host stack and sits on the
//! middle one. Arriving on slot 0 means back, slot 2 means forward, an untagged
//! entry means the user edited the address. After each notification the
//! controller moves the host back to slot 1 and only then emits the event.
//!
//! # Quick Start
//!
//! ```
//! use navkeys::{MemoryHistory, NavKeys, NavKeysConfig, NavigationAction, NavigationEvent};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let host = MemoryHistory::new("https://example.com/app");
//! let mut nav = NavKeys::new(host, NavKeysConfig::default())?;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! nav.listen(move |event: &NavigationEvent| sink.borrow_mut().push(event.action()));
//!
//! nav.host_mut().press_back();
//! nav.deliver_pending();
//!
//! assert_eq!(*seen.borrow(), vec![NavigationAction::Back]);
//! assert!(!nav.is_forward_button_enabled());
//! # Ok::<(), navkeys::NavKeysError>(())
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually exclusive with `log`)

#![doc(html_root_url = "https://docs.rs/navkeys/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Host side
pub mod host;
pub mod memory;
pub mod window;

// Controller
pub mod config;
pub mod listeners;
pub mod settle;
mod controller;

// Error handling
pub mod error;

pub use config::NavKeysConfig;
pub use controller::NavKeys;
pub use error::NavKeysError;
pub use host::{HistoryHost, HostNotification, StackEntry};
pub use listeners::{ListenerHandle, ListenerId, ListenerRegistry, Propagation};
pub use memory::MemoryHistory;
pub use settle::ForwardButtonSettled;
pub use window::HistoryWindow;

use std::fmt;
use url::Url;

/// Role of an entry in the three-slot window.
///
/// # Example
///
/// ```
/// use navkeys::Tag;
///
/// assert_eq!(Tag::from_pos(1), Some(Tag::Center));
/// assert_eq!(Tag::Ahead.pos(), 2);
/// assert_eq!(Tag::from_pos(3), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `{pos: 0}`, reached by the back button
    Behind,
    /// `{pos: 1}`, the resting slot
    Center,
    /// `{pos: 2}`, reached by the forward button when enabled
    Ahead,
}

impl Tag {
    /// Numeric slot stored with the host entry
    pub fn pos(self) -> u8 {
        match self {
            Tag::Behind => 0,
            Tag::Center => 1,
            Tag::Ahead => 2,
        }
    }

    /// Parse a numeric slot
    pub fn from_pos(pos: u8) -> Option<Self> {
        match pos {
            0 => Some(Tag::Behind),
            1 => Some(Tag::Center),
            2 => Some(Tag::Ahead),
            _ => None,
        }
    }
}

/// Kind of user action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationAction {
    /// Forward button pressed
    Forward,
    /// Back button pressed
    Back,
    /// Address edited, usually an in-page anchor
    Navigate,
}

impl NavigationAction {
    /// Name of the action
    pub fn as_str(self) -> &'static str {
        match self {
            NavigationAction::Forward => "forward",
            NavigationAction::Back => "back",
            NavigationAction::Navigate => "hashchange",
        }
    }
}

impl fmt::Display for NavigationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered to listeners.
///
/// `Forward` and `Back` carry the logical address at the time of the press;
/// `Navigate` carries the address the host reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// Forward button pressed
    Forward { url: Url },
    /// Back button pressed
    Back { url: Url },
    /// Address edited by the user
    Navigate { url: Url },
}

impl NavigationEvent {
    /// Kind of action
    pub fn action(&self) -> NavigationAction {
        match self {
            NavigationEvent::Forward { .. } => NavigationAction::Forward,
            NavigationEvent::Back { .. } => NavigationAction::Back,
            NavigationEvent::Navigate { .. } => NavigationAction::Navigate,
        }
    }

    /// Address carried by the event
    pub fn url(&self) -> &Url {
        match self {
            NavigationEvent::Forward { url }
            | NavigationEvent::Back { url }
            | NavigationEvent::Navigate { url } => url,
        }
    }
}
