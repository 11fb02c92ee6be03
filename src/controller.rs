//! Back/forward classification state machine
//!
//! The host reports one thing: "the position changed". [`NavKeys`] turns that
//! into back, forward or navigate by looking at the tag of the entry the host
//! landed on, then moves the host back to the centered slot. Its own moves
//! produce notifications too; those are matched against the single outstanding
//! acknowledgment wait and never classified as user input.
//!
//! ```text
//!            user notification                   all moves acknowledged
//! Resting ─────────────────────▶ Correcting ───────────────────────────▶ Draining ─▶ Resting
//!                                 │      ▲                               (flush events,
//!                                 └──────┘                                apply staged URL,
//!                            ack / timeout, next move                     replay deferred)
//! ```
//!
//! The host is only mutated while it sits on the entry the controller last
//! heard about. If it has already moved on, its notification is still on the
//! way, so corrections are held until that notification is classified. A
//! hold that outlives the acknowledgment timeout re-centers from wherever the
//! host is.

use crate::error::{resolve_url, NavKeysError};
use crate::host::{HistoryHost, HostNotification};
use crate::listeners::{ListenerHandle, ListenerRegistry, Propagation};
use crate::settle::{AckWait, ForwardButtonSettled, SettleResolver};
use crate::window::HistoryWindow;
use crate::{
    debug_log, info_log, trace_log, warn_log, MemoryHistory, NavKeysConfig, NavigationEvent, Tag,
};
use std::collections::VecDeque;
use std::time::Duration;
use url::Url;

/// Entry the host sits on, as far as the controller has heard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Slot 1 of the current window
    Center,
    /// Slot 0 directly behind the current window's slot 1
    Behind,
    /// A slot 0 whose successor is unknown
    StrayBehind,
    /// A slot 2, always directly ahead of a slot 1
    Ahead,
    /// A slot 1 reached outside a correction, neighbors unknown
    StrayCenter,
    /// Untagged entry the user created
    Foreign { from_center: bool },
}

impl Position {
    /// Tag the host reports while sitting here
    fn tag(self) -> Option<Tag> {
        match self {
            Position::Center | Position::StrayCenter => Some(Tag::Center),
            Position::Behind | Position::StrayBehind => Some(Tag::Behind),
            Position::Ahead => Some(Tag::Ahead),
            Position::Foreign { .. } => None,
        }
    }

    /// Sitting on `tag` without knowing its neighbors
    fn stray(tag: Tag) -> Self {
        match tag {
            Tag::Behind => Position::StrayBehind,
            Tag::Center => Position::StrayCenter,
            Tag::Ahead => Position::Ahead,
        }
    }
}

impl From<Tag> for Position {
    fn from(tag: Tag) -> Self {
        match tag {
            Tag::Behind => Position::Behind,
            Tag::Center => Position::Center,
            Tag::Ahead => Position::Ahead,
        }
    }
}

/// Infers back/forward/navigate actions from host notifications and lets the
/// application toggle the forward button.
///
/// Single-threaded and host-driven: feed every host notification to
/// [`handle_notification`](Self::handle_notification) in arrival order and
/// call [`poll_timeout`](Self::poll_timeout) when
/// [`next_deadline`](Self::next_deadline) passes.
#[derive(Debug)]
pub struct NavKeys<H> {
    window: HistoryWindow<H>,
    config: NavKeysConfig,
    /// Logical address
    url: Url,
    /// Address set mid-correction, applied when draining
    staged_url: Option<Url>,
    /// Forward state the application asked for
    forward_requested: bool,
    /// Whether slot 2 currently exists ahead of slot 1
    forward_slot: bool,
    /// Entry the host is believed to sit on
    position: Position,
    /// Corrective moves not yet acknowledged
    depth: u32,
    wait: Option<AckWait>,
    /// Deadline of a hold on a host that moved without reporting it yet
    resync: Option<Duration>,
    /// User notifications that arrived mid-correction
    deferred: VecDeque<HostNotification>,
    pending_events: Vec<NavigationEvent>,
    settle_waiters: Vec<SettleResolver>,
    listeners: ListenerRegistry,
    exited: bool,
}

impl<H: HistoryHost> NavKeys<H> {
    /// Take over the host stack.
    ///
    /// Tags the current entry as slot 0 and pushes slot 1, leaving forward
    /// disabled. Fails if the starting address cannot be resolved.
    pub fn new(host: H, config: NavKeysConfig) -> Result<Self, NavKeysError> {
        let current = host.current().url;
        let base = Url::parse(&current)
            .map_err(|source| NavKeysError::invalid_url(current.as_str(), source))?;
        let url = match &config.initial_url {
            Some(initial) => resolve_url(&base, initial)?,
            None => base,
        };

        let mut window = HistoryWindow::new(host);
        window.initialize(url.as_str());
        info_log!("Navigation window initialized at {}", url);

        Ok(Self {
            window,
            config,
            url,
            staged_url: None,
            forward_requested: false,
            forward_slot: false,
            position: Position::Center,
            depth: 0,
            wait: None,
            resync: None,
            deferred: VecDeque::new(),
            pending_events: Vec::new(),
            settle_waiters: Vec::new(),
            listeners: ListenerRegistry::new(),
            exited: false,
        })
    }

    /// Feed one "position changed" notification from the host
    pub fn handle_notification(&mut self, notification: HostNotification) {
        if self.exited {
            warn_log!(
                "Ignoring notification for {:?} after exit",
                notification.tag
            );
            return;
        }

        match self.wait {
            Some(wait) if wait.acknowledged_by(notification.tag) => {
                self.acknowledge(wait.expected());
            }
            Some(wait) => {
                debug_log!(
                    "Deferring notification for {:?} while awaiting {:?}",
                    notification.tag,
                    wait.expected()
                );
                self.deferred.push_back(notification);
            }
            None => {
                self.classify(notification);
                self.reconcile();
            }
        }
    }

    /// Feed the host's secondary address-change notification.
    ///
    /// Only acts if the host still sits on an untagged entry, so hosts that
    /// fire both channels for one navigation produce a single cycle.
    pub fn handle_address_change(&mut self, reported_url: &str) {
        if self.exited {
            warn_log!("Ignoring address change to {} after exit", reported_url);
            return;
        }
        if self.window.current_tag().is_some() {
            trace_log!("Address change to {} already handled", reported_url);
            return;
        }
        self.handle_notification(HostNotification {
            tag: None,
            url: reported_url.to_string(),
        });
    }

    /// Give up on the outstanding acknowledgment, or on a hold, if its
    /// deadline passed.
    ///
    /// Returns true if a wait or hold was abandoned.
    pub fn poll_timeout(&mut self) -> bool {
        let now = self.window.host().now();
        if let Some(wait) = self.wait {
            if !wait.is_expired(now) {
                return false;
            }
            warn_log!(
                "No notification for move to {:?} within {:?}, continuing",
                wait.expected(),
                self.config.ack_timeout
            );
            self.acknowledge(wait.expected());
            return true;
        }
        match self.resync {
            Some(deadline) if now >= deadline => {
                warn_log!(
                    "Host never reported its move to {:?}, re-centering",
                    self.window.current_tag()
                );
                self.resync = None;
                self.recover();
                self.reconcile();
                true
            }
            _ => false,
        }
    }

    /// When [`poll_timeout`](Self::poll_timeout) should be called next
    pub fn next_deadline(&self) -> Option<Duration> {
        self.wait.map(|wait| wait.deadline()).or(self.resync)
    }

    /// Keep the forward button enabled from now on
    pub fn enable_forward_button(&mut self) -> ForwardButtonSettled {
        self.request_forward(true)
    }

    /// Keep the forward button disabled from now on
    pub fn disable_forward_button(&mut self) -> ForwardButtonSettled {
        self.request_forward(false)
    }

    /// Requested forward state, including a change still being applied
    pub fn is_forward_button_enabled(&self) -> bool {
        self.forward_requested
    }

    /// Whether slot 2 exists right now
    pub fn forward_slot_present(&self) -> bool {
        self.forward_slot
    }

    /// Logical address, including one staged mid-correction
    pub fn url(&self) -> &Url {
        self.staged_url.as_ref().unwrap_or(&self.url)
    }

    /// Change the logical address without adding a stack frame.
    ///
    /// Relative input resolves against the current address. Mid-correction
    /// the new address is staged and written once the window is centered.
    pub fn set_url(&mut self, input: &str) -> Result<(), NavKeysError> {
        if self.exited {
            return Err(NavKeysError::Exited);
        }
        let url = resolve_url(self.url(), input)?;
        if self.is_resting() && self.in_sync() {
            trace_log!("Address set to {}", url);
            self.url = url;
            self.pin_center();
        } else {
            trace_log!("Staging address {} until the window is centered", url);
            self.staged_url = Some(url);
            if self.is_resting() {
                self.reconcile();
            }
        }
        Ok(())
    }

    /// Register a listener.
    ///
    /// The callback may return `()` or a [`Propagation`].
    pub fn listen<F, R>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&NavigationEvent) -> R + 'static,
        R: Into<Propagation>,
    {
        self.listeners.add(listener)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Release the host stack.
    ///
    /// Unsubscribes, then steps back over the synthetic slot 1 without
    /// waiting for acknowledgment. A correction in flight is abandoned and its
    /// buffered events are dropped.
    pub fn exit(&mut self) {
        if self.exited {
            return;
        }
        self.exited = true;
        self.window.detach();
        info_log!("Leaving navigation window at {}", self.url);
        self.window.move_back();

        if !self.pending_events.is_empty() {
            debug_log!(
                "Dropping {} undelivered event(s) on exit",
                self.pending_events.len()
            );
        }
        self.pending_events.clear();
        self.deferred.clear();
        self.wait = None;
        self.resync = None;
        self.depth = 0;
        self.resolve_waiters();
    }

    /// Check if `exit()` was called
    pub fn has_exited(&self) -> bool {
        self.exited
    }

    /// Check if no correction is in flight or held
    pub fn is_resting(&self) -> bool {
        self.wait.is_none() && self.resync.is_none()
    }

    /// Corrective moves still awaiting acknowledgment
    pub fn correction_depth(&self) -> u32 {
        self.depth
    }

    /// Events buffered until the current correction drains
    pub fn pending_event_count(&self) -> usize {
        self.pending_events.len()
    }

    /// User notifications waiting for the current correction to drain
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Get the configuration
    pub fn config(&self) -> &NavKeysConfig {
        &self.config
    }

    /// Get the host
    pub fn host(&self) -> &H {
        self.window.host()
    }

    /// Get the host mutably.
    ///
    /// Meant for delivering notifications and advancing time. Editing the
    /// stack directly desynchronizes the window.
    pub fn host_mut(&mut self) -> &mut H {
        self.window.host_mut()
    }

    fn request_forward(&mut self, enabled: bool) -> ForwardButtonSettled {
        if self.exited {
            warn_log!("Forward button change requested after exit");
            return ForwardButtonSettled::ready(self.forward_slot);
        }
        if self.forward_requested == enabled && self.is_resting() {
            return ForwardButtonSettled::ready(self.forward_slot);
        }

        let (settled, resolver) = ForwardButtonSettled::pending();
        self.settle_waiters.push(resolver);
        if self.forward_requested != enabled {
            debug_log!(
                "Forward button {} requested",
                if enabled { "enable" } else { "disable" }
            );
            self.forward_requested = enabled;
            // Off-center hosts have a notification on the way that will
            // reconcile with the new request
            if self.is_resting() {
                self.reconcile();
            }
        }
        settled
    }

    fn acknowledge(&mut self, tag: Tag) {
        trace_log!("Acknowledged move to {:?}", tag);
        self.wait = None;
        self.depth = self.depth.saturating_sub(1);
        // The host may have moved on since, so the slot's neighbors are only
        // known if it is still there
        self.position = if self.window.current_tag() == Some(tag) {
            Position::from(tag)
        } else {
            Position::stray(tag)
        };
        self.reconcile();
    }

    /// Interpret a notification that is not an acknowledgment.
    ///
    /// Only records the event and where the host went. Moves are left to
    /// `reconcile`, which waits until the host is still there.
    fn classify(&mut self, notification: HostNotification) {
        let from = self.position;
        self.position = match notification.tag {
            Some(Tag::Behind) => {
                debug_log!("Back button pressed at {}", self.url);
                self.pending_events.push(NavigationEvent::Back {
                    url: self.url.clone(),
                });
                if from == Position::Center {
                    Position::Behind
                } else {
                    Position::StrayBehind
                }
            }
            Some(Tag::Ahead) => {
                debug_log!("Forward button pressed at {}", self.url);
                self.pending_events.push(NavigationEvent::Forward {
                    url: self.url.clone(),
                });
                Position::Ahead
            }
            Some(Tag::Center) => {
                warn_log!("Notification for a centered entry outside a correction");
                Position::StrayCenter
            }
            None => {
                self.record_address_change(&notification.url);
                Position::Foreign {
                    from_center: from == Position::Center,
                }
            }
        };
    }

    fn record_address_change(&mut self, reported: &str) {
        let address = match resolve_url(&self.url, reported) {
            Ok(address) => address,
            Err(error) => {
                warn_log!("Host reported an unusable address: {}", error);
                self.url.clone()
            }
        };
        debug_log!("Address changed to {}", address);

        if self.config.allow_address_capture {
            self.url = address.clone();
        }
        if self.config.listen_for_address_change {
            self.pending_events
                .push(NavigationEvent::Navigate { url: address });
        }
    }

    /// Tag the current entry as slot 0 and push a fresh slot 1 without a
    /// forward slot. Everything ahead of the current entry is discarded.
    fn restart_window(&mut self) {
        self.window
            .replace_current_url(Tag::Behind, self.url.as_str());
        self.window.recenter(self.url.as_str());
        self.forward_slot = false;
        self.position = Position::Center;
    }

    /// Take the position from the host after it stopped reporting.
    fn recover(&mut self) {
        let current = self.window.host().current();
        self.position = match current.tag {
            Some(tag) => Position::stray(tag),
            None => {
                self.record_address_change(&current.url);
                Position::Foreign { from_center: false }
            }
        };
    }

    /// Issue corrective moves until one is outstanding or the window is
    /// centered with the requested forward state.
    fn reconcile(&mut self) {
        while self.wait.is_none() && !self.exited {
            let current = self.window.current_tag();
            if current != self.position.tag() {
                // A deferred notification may explain where the host went
                if let Some(notification) = self.deferred.pop_front() {
                    self.replay(notification);
                    continue;
                }
                self.hold(current);
                return;
            }
            self.resync = None;

            match self.position {
                Position::Behind => {
                    self.window
                        .replace_current_url(Tag::Behind, self.url.as_str());
                    if self.forward_requested {
                        debug_log!("Stepping forward onto slot 1");
                        self.window.move_forward();
                        self.await_ack(Tag::Center);
                    } else {
                        debug_log!("Re-centering without forward slot");
                        self.window.recenter(self.url.as_str());
                        self.forward_slot = false;
                        self.position = Position::Center;
                    }
                }
                Position::StrayBehind => {
                    debug_log!("Re-centering from a slot 0 outside the window");
                    self.window
                        .replace_current_url(Tag::Behind, self.url.as_str());
                    self.window.recenter(self.url.as_str());
                    self.forward_slot = false;
                    self.position = Position::Center;
                }
                Position::Ahead => {
                    self.window
                        .replace_current_url(Tag::Ahead, self.url.as_str());
                    self.forward_slot = true;
                    debug_log!("Stepping back onto slot 1");
                    self.window.move_back();
                    self.await_ack(Tag::Center);
                }
                Position::Foreign { from_center: true } => {
                    self.window
                        .replace_current_url(Tag::Ahead, self.url.as_str());
                    self.forward_slot = true;
                    self.position = Position::Ahead;
                }
                Position::Foreign { from_center: false } | Position::StrayCenter => {
                    debug_log!("Starting a new window at the current entry");
                    self.restart_window();
                }
                Position::Center if self.forward_requested && !self.forward_slot => {
                    self.window.grow_forward(self.url.as_str());
                    self.forward_slot = true;
                    self.await_ack(Tag::Center);
                }
                Position::Center if !self.forward_requested && self.forward_slot => {
                    self.window.shrink_forward();
                    self.await_ack(Tag::Behind);
                }
                Position::Center => {
                    self.drain();
                    match self.deferred.pop_front() {
                        Some(notification) => self.replay(notification),
                        None => return,
                    }
                }
            }
        }
    }

    fn hold(&mut self, current: Option<Tag>) {
        if self.resync.is_none() {
            debug_log!(
                "Host is at {:?} but last reported {:?}, holding corrections",
                current,
                self.position
            );
        }
        let now = self.window.host().now();
        self.resync = Some(now.saturating_add(self.config.ack_timeout));
    }

    fn in_sync(&self) -> bool {
        self.window.current_tag() == self.position.tag()
    }

    fn await_ack(&mut self, expected: Tag) {
        let wait = AckWait::new(expected, self.window.host().now(), self.config.ack_timeout);
        trace_log!("Awaiting move to {:?} until {:?}", expected, wait.deadline());
        self.depth += 1;
        self.wait = Some(wait);
    }

    /// Centered with nothing outstanding: release everything held back.
    fn drain(&mut self) {
        if let Some(url) = self.staged_url.take() {
            trace_log!("Applying staged address {}", url);
            self.url = url;
        }
        self.pin_center();

        let reverse = self.config.deliver_listeners_in_reverse_order;
        for event in std::mem::take(&mut self.pending_events) {
            debug_log!("Emitting {} for {}", event.action(), event.url());
            let delivered = self.listeners.dispatch(&event, reverse);
            trace_log!("Delivered to {} listener(s)", delivered);
        }
        self.resolve_waiters();
    }

    /// Classify a deferred notification, unless the host already left the
    /// entry it reports.
    fn replay(&mut self, notification: HostNotification) {
        let current = self.window.current_tag();
        if notification.tag != current {
            warn_log!(
                "Dropping stale notification for {:?}, host is at {:?}",
                notification.tag,
                current
            );
            return;
        }
        debug_log!("Replaying deferred notification for {:?}", notification.tag);
        self.classify(notification);
    }

    fn pin_center(&mut self) {
        if self.window.current_tag() == Some(Tag::Center) {
            self.window
                .replace_current_url(Tag::Center, self.url.as_str());
        }
    }

    fn resolve_waiters(&mut self) {
        let enabled = self.forward_slot;
        for resolver in self.settle_waiters.drain(..) {
            resolver.resolve(enabled);
        }
    }
}

impl NavKeys<MemoryHistory> {
    /// Deliver every queued notification of the in-memory host.
    ///
    /// Returns how many were delivered.
    pub fn deliver_pending(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(notification) = self.window.host_mut().take_notification() {
            self.handle_notification(notification);
            delivered += 1;
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StackEntry;
    use crate::NavigationAction;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn controller() -> NavKeys<MemoryHistory> {
        NavKeys::new(MemoryHistory::new("https://x/a"), NavKeysConfig::default()).unwrap()
    }

    fn record(nav: &NavKeys<MemoryHistory>) -> Rc<RefCell<Vec<NavigationEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        nav.listen(move |event: &NavigationEvent| sink.borrow_mut().push(event.clone()));
        events
    }

    fn deliver_one(nav: &mut NavKeys<MemoryHistory>) {
        let notification = nav.host_mut().take_notification().unwrap();
        nav.handle_notification(notification);
    }

    #[test]
    fn test_new_initializes_window() {
        let nav = controller();
        assert_eq!(nav.url().as_str(), "https://x/a");
        assert_eq!(
            nav.host().tags(),
            vec![Some(Tag::Behind), Some(Tag::Center)]
        );
        assert!(nav.is_resting());
        assert!(!nav.is_forward_button_enabled());
    }

    #[test]
    fn test_new_resolves_relative_initial_url() {
        let config = NavKeysConfig::new().initial_url("inbox?page=2");
        let nav = NavKeys::new(MemoryHistory::new("https://x/app/"), config).unwrap();
        assert_eq!(nav.url().as_str(), "https://x/app/inbox?page=2");
        assert_eq!(
            nav.host().current_entry().url,
            "https://x/app/inbox?page=2"
        );
    }

    #[test]
    fn test_new_rejects_unparseable_host_address() {
        let result = NavKeys::new(MemoryHistory::new("not a url"), NavKeysConfig::default());
        assert!(result.unwrap_err().is_invalid_url());
    }

    #[test]
    fn test_enable_waits_for_acknowledgment() {
        let mut nav = controller();
        let settled = nav.enable_forward_button();

        assert!(!settled.is_settled());
        assert!(!nav.is_resting());
        assert_eq!(nav.correction_depth(), 1);
        assert_eq!(nav.next_deadline(), Some(Duration::from_millis(100)));
        assert!(nav.is_forward_button_enabled());

        assert_eq!(nav.deliver_pending(), 1);
        assert_eq!(settled.outcome(), Some(true));
        assert_eq!(nav.correction_depth(), 0);
        assert_eq!(nav.next_deadline(), None);
    }

    #[test]
    fn test_disable_when_already_disabled_is_ready() {
        let mut nav = controller();
        let settled = nav.disable_forward_button();
        assert_eq!(settled.outcome(), Some(false));
        assert_eq!(nav.host().pending_notifications(), 0);
    }

    #[test]
    fn test_disable_shrinks_forward_slot() {
        let mut nav = controller();
        let _ = nav.enable_forward_button();
        nav.deliver_pending();

        let settled = nav.disable_forward_button();
        assert!(nav.forward_slot_present());
        nav.deliver_pending();

        assert_eq!(settled.outcome(), Some(false));
        assert!(!nav.forward_slot_present());
        assert_eq!(
            nav.host().tags(),
            vec![Some(Tag::Behind), Some(Tag::Center)]
        );
        assert_eq!(nav.host().current_index(), 1);
    }

    #[test]
    fn test_back_event_is_buffered_until_centered() {
        let mut nav = controller();
        let _ = nav.enable_forward_button();
        nav.deliver_pending();
        let events = record(&nav);

        nav.host_mut().press_back();
        deliver_one(&mut nav);

        assert_eq!(nav.pending_event_count(), 1);
        assert!(events.borrow().is_empty());

        nav.deliver_pending();
        assert_eq!(nav.pending_event_count(), 0);
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(events.borrow()[0].action(), NavigationAction::Back);
    }

    #[test]
    fn test_set_url_mid_correction_is_staged() {
        let mut nav = controller();
        let _ = nav.enable_forward_button();
        nav.deliver_pending();
        let events = record(&nav);

        nav.host_mut().press_back();
        deliver_one(&mut nav);
        nav.set_url("/c").unwrap();

        assert_eq!(nav.url().as_str(), "https://x/c");
        assert_eq!(nav.host().current_entry().url, "https://x/a");

        nav.deliver_pending();
        assert_eq!(nav.host().current_entry().url, "https://x/c");
        assert_eq!(nav.host().current_entry().tag, Some(Tag::Center));
        assert_eq!(events.borrow()[0].url().as_str(), "https://x/a");
    }

    #[test]
    fn test_set_url_rejects_malformed_input() {
        let mut nav = controller();
        let error = nav.set_url("https://x:99999/").unwrap_err();
        assert!(error.is_invalid_url());
        assert_eq!(nav.url().as_str(), "https://x/a");
    }

    #[test]
    fn test_centered_notification_outside_correction_starts_new_window() {
        let mut nav = controller();
        let events = record(&nav);

        nav.handle_notification(HostNotification {
            tag: Some(Tag::Center),
            url: "https://x/a".to_string(),
        });

        assert!(events.borrow().is_empty());
        assert!(nav.is_resting());
        assert_eq!(nav.host().pending_notifications(), 0);
        assert_eq!(
            nav.host().tags(),
            vec![Some(Tag::Behind), Some(Tag::Behind), Some(Tag::Center)]
        );
        assert!(!nav.host().can_go_forward());
    }

    #[test]
    fn test_forward_request_waits_for_unreported_move() {
        let mut nav = controller();
        nav.host_mut().press_back();

        let settled = nav.enable_forward_button();

        assert!(!settled.is_settled());
        assert!(!nav.is_resting());
        assert_eq!(nav.correction_depth(), 0);
        assert_eq!(nav.next_deadline(), Some(Duration::from_millis(100)));
        // Nothing was pushed over the entry the user is on
        assert_eq!(
            nav.host().tags(),
            vec![Some(Tag::Behind), Some(Tag::Center)]
        );
        assert_eq!(nav.host().current_index(), 0);
        assert_eq!(nav.host().pending_notifications(), 1);

        nav.deliver_pending();
        assert_eq!(settled.outcome(), Some(true));
        assert!(nav.is_resting());
    }

    #[test]
    fn test_set_url_waits_for_unreported_move() {
        let mut nav = controller();
        let events = record(&nav);
        nav.host_mut().press_back();

        nav.set_url("/b").unwrap();
        assert_eq!(nav.url().as_str(), "https://x/b");
        assert_eq!(nav.host().current_entry().url, "https://x/a");

        nav.deliver_pending();
        assert_eq!(events.borrow()[0].url().as_str(), "https://x/a");
        assert_eq!(nav.host().current_entry().url, "https://x/b");
        assert_eq!(nav.host().current_entry().tag, Some(Tag::Center));
    }

    #[test]
    fn test_expired_hold_recenters_from_host() {
        let mut nav = controller();
        let events = record(&nav);
        // This back press is never reported
        nav.host_mut().drop_next_notifications(1);
        nav.host_mut().press_back();

        let settled = nav.enable_forward_button();
        assert!(!nav.poll_timeout());
        nav.host_mut().advance(Duration::from_millis(100));
        assert!(nav.poll_timeout());
        nav.deliver_pending();

        assert_eq!(settled.outcome(), Some(true));
        assert!(events.borrow().is_empty());
        assert_eq!(
            nav.host().tags(),
            vec![Some(Tag::Behind), Some(Tag::Center), Some(Tag::Ahead)]
        );
        assert_eq!(nav.host().current_index(), 1);
        assert!(nav.is_resting());
    }

    #[test]
    fn test_new_over_previously_tagged_stack() {
        let host = MemoryHistory::with_entries(
            vec![
                StackEntry::tagged(Tag::Behind, "https://x/a"),
                StackEntry::tagged(Tag::Center, "https://x/a"),
            ],
            1,
        );
        let mut nav = NavKeys::new(host, NavKeysConfig::default()).unwrap();
        let events = record(&nav);
        assert_eq!(
            nav.host().tags(),
            vec![Some(Tag::Behind), Some(Tag::Behind), Some(Tag::Center)]
        );

        nav.host_mut().press_back();
        nav.deliver_pending();
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(nav.host().current_entry().tag, Some(Tag::Center));
    }

    #[test]
    fn test_address_change_after_exit_is_ignored() {
        let mut nav = controller();
        let events = record(&nav);
        nav.exit();

        nav.host_mut().navigate_to("https://x/a#late");
        nav.handle_address_change("https://x/a#late");

        assert!(events.borrow().is_empty());
        assert_eq!(nav.host().current_entry().tag, None);
    }

    #[test]
    fn test_stale_deferred_notification_is_dropped() {
        let mut nav = controller();
        let _ = nav.enable_forward_button();
        let events = record(&nav);

        // Not an acknowledgment, and the host never sits on slot 0 again
        nav.handle_notification(HostNotification {
            tag: Some(Tag::Behind),
            url: "https://x/a".to_string(),
        });
        assert_eq!(nav.deferred_count(), 1);

        nav.deliver_pending();
        assert_eq!(nav.deferred_count(), 0);
        assert!(events.borrow().is_empty());
        assert!(nav.is_resting());
    }

    #[test]
    fn test_address_change_channel_alone_drives_cycle() {
        let mut nav = controller();
        let events = record(&nav);

        nav.host_mut().navigate_to("https://x/a#intro");
        // This host never fires the position notification
        nav.host_mut().take_notification();
        nav.handle_address_change("https://x/a#intro");
        nav.deliver_pending();

        assert_eq!(events.borrow().len(), 1);
        assert_eq!(events.borrow()[0].action(), NavigationAction::Navigate);
        assert_eq!(
            nav.host().tags(),
            vec![Some(Tag::Behind), Some(Tag::Center)]
        );
    }

    #[test]
    fn test_address_change_after_position_notification_is_noop() {
        let mut nav = controller();
        let events = record(&nav);

        nav.host_mut().navigate_to("https://x/a#intro");
        nav.deliver_pending();
        nav.handle_address_change("https://x/a#intro");
        nav.deliver_pending();

        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn test_exit_releases_host() {
        let mut nav = controller();
        let events = record(&nav);
        nav.exit();

        assert!(nav.has_exited());
        assert!(!nav.host().is_subscribed());
        assert_eq!(nav.host().current_index(), 0);

        nav.handle_notification(HostNotification {
            tag: Some(Tag::Behind),
            url: "https://x/a".to_string(),
        });
        assert!(events.borrow().is_empty());
        assert_eq!(nav.set_url("/b"), Err(NavKeysError::Exited));
        assert_eq!(nav.enable_forward_button().outcome(), Some(false));
    }

    #[test]
    fn test_exit_resolves_outstanding_settle_futures() {
        let mut nav = controller();
        let settled = nav.enable_forward_button();
        nav.exit();

        assert!(settled.is_settled());
        assert!(nav.is_resting());
        assert_eq!(nav.correction_depth(), 0);
    }
}
