//! Controller configuration

use std::time::Duration;

/// Options recognized by [`NavKeys::new`](crate::NavKeys::new).
///
/// # Example
///
/// ```
/// use navkeys::NavKeysConfig;
/// use std::time::Duration;
///
/// let config = NavKeysConfig::new()
///     .initial_url("/inbox")
///     .allow_address_capture(true)
///     .ack_timeout(Duration::from_millis(250));
///
/// assert_eq!(config.initial_url.as_deref(), Some("/inbox"));
/// assert!(config.listen_for_address_change);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavKeysConfig {
    /// Starting logical address, resolved against the host's current one.
    /// `None` keeps the host's current address.
    pub initial_url: Option<String>,
    /// Adopt the address of a foreign (hash) navigation as the new logical
    /// address instead of pinning the old one back
    pub allow_address_capture: bool,
    /// Emit [`NavigationEvent::Navigate`](crate::NavigationEvent::Navigate) at all
    pub listen_for_address_change: bool,
    /// Call the most recently registered listener first
    pub deliver_listeners_in_reverse_order: bool,
    /// How long to wait for the host to acknowledge a corrective move
    pub ack_timeout: Duration,
}

impl NavKeysConfig {
    /// Fallback for hosts that drop notifications of synthetic moves.
    pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(100);

    /// Create a configuration with default options
    pub fn new() -> Self {
        Self {
            initial_url: None,
            allow_address_capture: false,
            listen_for_address_change: true,
            deliver_listeners_in_reverse_order: false,
            ack_timeout: Self::DEFAULT_ACK_TIMEOUT,
        }
    }

    /// Set the starting logical address
    pub fn initial_url(mut self, url: impl Into<String>) -> Self {
        self.initial_url = Some(url.into());
        self
    }

    /// Capture the address of foreign navigations
    pub fn allow_address_capture(mut self, allow: bool) -> Self {
        self.allow_address_capture = allow;
        self
    }

    /// Enable or disable navigate events
    pub fn listen_for_address_change(mut self, listen: bool) -> Self {
        self.listen_for_address_change = listen;
        self
    }

    /// Deliver events to listeners as a stack instead of a queue
    pub fn deliver_listeners_in_reverse_order(mut self, reverse: bool) -> Self {
        self.deliver_listeners_in_reverse_order = reverse;
        self
    }

    /// Set the acknowledgment timeout
    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }
}

impl Default for NavKeysConfig {
    fn default() -> Self {
        Self::new()
    }
}
