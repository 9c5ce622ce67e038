//! Connection-lifecycle state machine and callback dispatch
//!
//! Both transports drive the same session object, so the lifecycle
//! invariants live here exactly once:
//!
//! - at most one active connection per service instance, and only one
//!   connect attempt outstanding at a time (a second call fails fast);
//! - the connection-state callback fires exactly once with `(true, name)`
//!   per successful connect and exactly once with `(false, None)` per
//!   disconnect event, in that order, never duplicated;
//! - data callbacks fire only while the state is `Connected`; frames that
//!   arrive after a disconnect has been processed are discarded and
//!   counted, not delivered.
//!
//! Callback slots are single-listener by design: each `set_*` call
//! overwrites the previous callback, and only the most recently registered
//! one receives events.

use core::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::debug;

use crate::errors::{LinkError, Result};
use crate::types::{LinkRole, PeerDevice, SensorSample};

// ----------------------------------------------------------------------------
// Callback Slots
// ----------------------------------------------------------------------------

/// Invoked with every successfully decoded sample while connected
pub type DataCallback = Box<dyn FnMut(SensorSample) + Send>;

/// Invoked with `(true, Some(remote name))` on connect and `(false, None)`
/// on disconnect
pub type ConnectionCallback = Box<dyn FnMut(bool, Option<String>) + Send>;

/// Invoked once per distinct device discovered in a scan session
pub type DeviceFoundCallback = Box<dyn FnMut(PeerDevice) + Send>;

/// Shared handle to a session; each service instance owns exactly one
pub type SharedSession = Arc<Mutex<LinkSession>>;

// ----------------------------------------------------------------------------
// Link State
// ----------------------------------------------------------------------------

/// Lifecycle of the link between sender and receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Scanning,
    Connecting,
    Connected,
    Disconnected,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Idle => "idle",
            LinkState::Scanning => "scanning",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Disconnected => "disconnected",
        };
        write!(f, "{name}")
    }
}

// ----------------------------------------------------------------------------
// Link Session
// ----------------------------------------------------------------------------

/// Lifecycle state, active-connection bookkeeping, and the two registered
/// callbacks for one service instance.
pub struct LinkSession {
    state: LinkState,
    role: Option<LinkRole>,
    remote_name: Option<String>,
    established_at: Option<Instant>,
    dropped_frames: u64,
    on_data: Option<DataCallback>,
    on_connection_change: Option<ConnectionCallback>,
}

impl Default for LinkSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkSession {
    pub fn new() -> Self {
        Self {
            state: LinkState::Idle,
            role: None,
            remote_name: None,
            established_at: None,
            dropped_frames: 0,
            on_data: None,
            on_connection_change: None,
        }
    }

    /// Create a session behind the shared handle the transports use
    pub fn shared() -> SharedSession {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn role(&self) -> Option<LinkRole> {
        self.role
    }

    pub fn remote_name(&self) -> Option<&str> {
        self.remote_name.as_deref()
    }

    pub fn established_at(&self) -> Option<Instant> {
        self.established_at
    }

    /// Frames dropped so far: malformed payloads plus frames that arrived
    /// outside the connected state
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    // ------------------------------------------------------------------
    // Callback registration
    // ------------------------------------------------------------------

    /// Register the data callback, replacing any previous one
    pub fn set_on_data(&mut self, callback: DataCallback) {
        self.on_data = Some(callback);
    }

    /// Register the connection-state callback, replacing any previous one
    pub fn set_on_connection_change(&mut self, callback: ConnectionCallback) {
        self.on_connection_change = Some(callback);
    }

    /// Drop both callbacks; part of `destroy`
    pub fn clear_callbacks(&mut self) {
        self.on_data = None;
        self.on_connection_change = None;
    }

    // ------------------------------------------------------------------
    // Discovery transitions
    // ------------------------------------------------------------------

    /// `Idle → Scanning`. A no-op while already scanning; fails while a
    /// connect is outstanding or a link is active (never scan and connect
    /// simultaneously).
    pub fn begin_scan(&mut self) -> Result<()> {
        match self.state {
            LinkState::Scanning => Ok(()),
            LinkState::Idle | LinkState::Disconnected => {
                self.state = LinkState::Scanning;
                Ok(())
            }
            LinkState::Connecting => Err(LinkError::ConnectInProgress),
            LinkState::Connected => Err(LinkError::AlreadyConnected),
        }
    }

    /// `Scanning → Idle`; safe to call when not scanning
    pub fn end_scan(&mut self) {
        if self.state == LinkState::Scanning {
            self.state = LinkState::Idle;
        }
    }

    // ------------------------------------------------------------------
    // Connection transitions
    // ------------------------------------------------------------------

    /// `Idle/Scanning → Connecting`. Single-flight: fails immediately while
    /// another attempt is outstanding or a link is already up.
    pub fn begin_connect(&mut self, role: LinkRole) -> Result<()> {
        match self.state {
            LinkState::Connecting => Err(LinkError::ConnectInProgress),
            LinkState::Connected => Err(LinkError::AlreadyConnected),
            LinkState::Idle | LinkState::Scanning | LinkState::Disconnected => {
                self.state = LinkState::Connecting;
                self.role = Some(role);
                Ok(())
            }
        }
    }

    /// `Connecting → Connected`; fires the connection callback once with
    /// `(true, Some(remote_name))`.
    pub fn complete_connect(&mut self, remote_name: &str) -> Result<()> {
        if self.state != LinkState::Connecting {
            return Err(LinkError::invalid_state("connecting", self.state.to_string()));
        }
        self.state = LinkState::Connected;
        self.remote_name = Some(remote_name.to_string());
        self.established_at = Some(Instant::now());
        if let Some(callback) = self.on_connection_change.as_mut() {
            callback(true, Some(remote_name.to_string()));
        }
        Ok(())
    }

    /// `Connecting → Disconnected` on handshake failure. The error goes to
    /// the caller of `connect`; the connection callback stays silent because
    /// no connect was ever announced.
    pub fn fail_connect(&mut self) {
        if self.state == LinkState::Connecting {
            self.state = LinkState::Disconnected;
            self.role = None;
        }
    }

    /// `Connected → Disconnected` on explicit disconnect, remote close, or
    /// transport error. Fires the connection callback exactly once with
    /// `(false, None)`; repeated calls are no-ops so a close event and an
    /// error event for the same link cannot double-fire it. Returns whether
    /// the callback fired.
    pub fn mark_disconnected(&mut self) -> bool {
        match self.state {
            LinkState::Connected => {
                self.state = LinkState::Disconnected;
                self.role = None;
                self.remote_name = None;
                self.established_at = None;
                if let Some(callback) = self.on_connection_change.as_mut() {
                    callback(false, None);
                }
                true
            }
            LinkState::Connecting => {
                self.fail_connect();
                false
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Data delivery
    // ------------------------------------------------------------------

    /// Hand a decoded sample to the data callback. Only delivers while
    /// `Connected`; anything else is discarded and counted.
    pub fn deliver(&mut self, sample: SensorSample) -> bool {
        if self.state != LinkState::Connected {
            self.dropped_frames += 1;
            debug!(state = %self.state, "discarding frame outside connected state");
            return false;
        }
        match self.on_data.as_mut() {
            Some(callback) => {
                callback(sample);
                true
            }
            None => false,
        }
    }

    /// Count a frame that failed to decode; never surfaced to callers
    pub fn note_dropped(&mut self) {
        self.dropped_frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_session() -> (LinkSession, Arc<Mutex<Vec<(bool, Option<String>)>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut session = LinkSession::new();
        session.set_on_connection_change(Box::new(move |up, name| {
            sink.lock().unwrap().push((up, name));
        }));
        (session, events)
    }

    #[test]
    fn connect_then_disconnect_fires_exactly_twice() {
        let (mut session, events) = recording_session();
        session.begin_connect(LinkRole::Receiver).unwrap();
        session.complete_connect("CarDashboard_Sensor").unwrap();
        assert!(session.mark_disconnected());

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (true, Some("CarDashboard_Sensor".to_string())),
                (false, None)
            ]
        );
    }

    #[test]
    fn repeated_disconnects_fire_once() {
        let (mut session, events) = recording_session();
        session.begin_connect(LinkRole::Receiver).unwrap();
        session.complete_connect("remote").unwrap();
        assert!(session.mark_disconnected());
        assert!(!session.mark_disconnected());
        assert!(!session.mark_disconnected());
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn second_connect_while_connecting_fails_fast() {
        let mut session = LinkSession::new();
        session.begin_connect(LinkRole::Receiver).unwrap();
        assert!(matches!(
            session.begin_connect(LinkRole::Receiver),
            Err(LinkError::ConnectInProgress)
        ));
        session.complete_connect("remote").unwrap();
        assert!(matches!(
            session.begin_connect(LinkRole::Receiver),
            Err(LinkError::AlreadyConnected)
        ));
    }

    #[test]
    fn failed_handshake_stays_silent_and_allows_retry() {
        let (mut session, events) = recording_session();
        session.begin_connect(LinkRole::Receiver).unwrap();
        session.fail_connect();
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(session.state(), LinkState::Disconnected);
        // a fresh attempt may be issued immediately
        session.begin_connect(LinkRole::Receiver).unwrap();
    }

    #[test]
    fn delivery_only_while_connected() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let mut session = LinkSession::new();
        session.set_on_data(Box::new(move |sample| {
            sink.lock().unwrap().push(sample);
        }));

        let sample = SensorSample::new(12.0, -3.0);
        assert!(!session.deliver(sample));
        assert_eq!(session.dropped_frames(), 1);

        session.begin_connect(LinkRole::Receiver).unwrap();
        session.complete_connect("remote").unwrap();
        assert!(session.deliver(sample));

        session.mark_disconnected();
        assert!(!session.deliver(sample));
        assert_eq!(session.dropped_frames(), 2);
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn scanning_is_idempotent_and_exclusive_with_connect() {
        let mut session = LinkSession::new();
        session.begin_scan().unwrap();
        session.begin_scan().unwrap();
        assert_eq!(session.state(), LinkState::Scanning);
        session.end_scan();
        session.end_scan();
        assert_eq!(session.state(), LinkState::Idle);

        session.begin_connect(LinkRole::Receiver).unwrap();
        assert!(matches!(session.begin_scan(), Err(LinkError::ConnectInProgress)));
        session.complete_connect("remote").unwrap();
        assert!(matches!(session.begin_scan(), Err(LinkError::AlreadyConnected)));

        // disconnected re-enters idle on the next scan
        session.mark_disconnected();
        session.begin_scan().unwrap();
    }

    #[test]
    fn latest_registered_callback_wins() {
        let first = Arc::new(Mutex::new(0u32));
        let second = Arc::new(Mutex::new(0u32));
        let mut session = LinkSession::new();

        let sink = Arc::clone(&first);
        session.set_on_data(Box::new(move |_| *sink.lock().unwrap() += 1));
        let sink = Arc::clone(&second);
        session.set_on_data(Box::new(move |_| *sink.lock().unwrap() += 1));

        session.begin_connect(LinkRole::Receiver).unwrap();
        session.complete_connect("remote").unwrap();
        session.deliver(SensorSample::new(0.0, 0.0));

        assert_eq!(*first.lock().unwrap(), 0);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[test]
    fn connected_session_reports_remote() {
        let mut session = LinkSession::new();
        session.begin_connect(LinkRole::Sender).unwrap();
        session.complete_connect("192.168.1.50").unwrap();
        assert!(session.is_connected());
        assert_eq!(session.remote_name(), Some("192.168.1.50"));
        assert_eq!(session.role(), Some(LinkRole::Sender));
        assert!(session.established_at().is_some());

        session.mark_disconnected();
        assert!(!session.is_connected());
        assert_eq!(session.remote_name(), None);
        assert_eq!(session.role(), None);
    }
}
