//! Live data sources
//!
//! [`LiveSource`] is the lifecycle engine shared by every protocol. It owns
//! the status state machine, identity filtering, the reconnect timer and the
//! per-epoch clock baseline and log, and defers payload handling to its
//! [`Protocol`].
//!
//! The engine is a plain `&mut self` state machine. It never sleeps or
//! spawns; a pending reconnect is exposed as a deadline
//! ([`LiveDataSource::reconnect_deadline`]) that whoever drives the source
//! must honour by calling [`LiveDataSource::poll_reconnect`]. See
//! [`crate::driver`] for a tokio driver that does this.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use livefeed_core::{
//!     ChannelMessenger, ConnectionStatus, InboundMessage, LiveDataSource, LiveSource,
//!     Preferences, StaticConfig, TelemetryLog, TimeSupplier, XyvProtocol,
//! };
//!
//! let (messenger, _intents) = ChannelMessenger::create();
//! let config = StaticConfig::new(Preferences::default());
//! let mut source = LiveSource::new(XyvProtocol, Arc::new(messenger), Arc::new(config));
//!
//! source.connect(
//!     "10.0.0.2",
//!     Box::new(|status: ConnectionStatus| println!("status: {status}")),
//!     Box::new(|log: &TelemetryLog, time: &TimeSupplier| {
//!         println!("{} keys at t={:.3}", log.len(), time.now())
//!     }),
//! );
//!
//! let id = source.correlation_id();
//! source.handle_main_message(&InboundMessage::success(
//!     &id,
//!     r#"{"data":{"temp":42},"now_sec":10}"#,
//! ));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::clock::{Clock, SystemClock};
use crate::config::defaults::DEFAULT_RECONNECT_DELAY_MS;
use crate::config::ConfigProvider;
use crate::identity::CorrelationId;
use crate::log::TelemetryLog;
use crate::message::{HostIntent, HostMessenger, InboundMessage};
use crate::protocol::{Protocol, VexideProtocol, XyvProtocol};
use crate::status::{ConnectionStatus, StatusCallback, StatusTracker};

/// Callback invoked with the epoch's log after every successful message
pub type OutputCallback = Box<dyn FnMut(&TelemetryLog, &TimeSupplier) + Send>;

/// Live source for the server-timestamped protocol
pub type XyvSource = LiveSource<XyvProtocol>;

/// Live source for the locally-timestamped protocol
pub type VexideSource = LiveSource<VexideProtocol>;

/// Zero time of one connection epoch
///
/// Shared between the source and every supplier handed out during the
/// epoch, so a supplier kept from before the baseline was known picks it up
/// once it is set. Unset is stored as NaN.
#[derive(Debug, Clone)]
struct EpochBaseline {
    bits: Arc<AtomicU64>,
}

impl EpochBaseline {
    fn new(baseline: Option<f64>) -> Self {
        let value = baseline.unwrap_or(f64::NAN);
        Self {
            bits: Arc::new(AtomicU64::new(value.to_bits())),
        }
    }

    fn get(&self) -> Option<f64> {
        let value = f64::from_bits(self.bits.load(Ordering::SeqCst));
        (!value.is_nan()).then_some(value)
    }

    fn set(&self, baseline: f64) {
        self.bits.store(baseline.to_bits(), Ordering::SeqCst);
    }
}

/// Session-relative "now", handed to output callbacks
///
/// Reads the clock and the epoch baseline each time [`TimeSupplier::now`] is
/// called, so a consumer can keep it and ask later.
#[derive(Clone)]
pub struct TimeSupplier {
    clock: Arc<dyn Clock>,
    baseline: EpochBaseline,
}

impl TimeSupplier {
    pub fn new(clock: Arc<dyn Clock>, baseline: Option<f64>) -> Self {
        Self {
            clock,
            baseline: EpochBaseline::new(baseline),
        }
    }

    /// Seconds since the epoch's zero time, or `0.0` before it is known
    pub fn now(&self) -> f64 {
        match self.baseline.get() {
            Some(baseline) => self.clock.now_secs() - baseline,
            None => 0.0,
        }
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline.get()
    }
}

impl fmt::Debug for TimeSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSupplier")
            .field("baseline", &self.baseline.get())
            .finish()
    }
}

/// Base contract for a live data source
pub trait LiveDataSource: Send {
    fn correlation_id(&self) -> CorrelationId;

    fn status(&self) -> ConnectionStatus;

    /// Begin producing data. Moves to `Connecting`, or `Error` without
    /// usable preferences.
    fn connect(&mut self, address: &str, on_status: StatusCallback, on_output: OutputCallback);

    /// Cancel the connection. `Stopped` is final.
    fn stop(&mut self);

    /// Process a message delivered by the host process
    fn handle_main_message(&mut self, _message: &InboundMessage) {}

    /// When the pending reconnect attempt is due, if one is armed
    fn reconnect_deadline(&self) -> Option<Instant> {
        None
    }

    /// Fire the reconnect attempt if it is due at `now`.
    ///
    /// Returns `true` if the timer fired.
    fn poll_reconnect(&mut self, _now: Instant) -> bool {
        false
    }
}

/// Pending one-shot reconnect
#[derive(Debug, Clone, Copy)]
struct ReconnectTimer {
    deadline: Instant,
}

/// Live source engine parameterized by payload protocol
pub struct LiveSource<P: Protocol> {
    protocol: P,
    id: CorrelationId,
    tracker: StatusTracker,
    address: Option<String>,
    on_output: Option<OutputCallback>,

    host: Arc<dyn HostMessenger>,
    config: Arc<dyn ConfigProvider>,
    clock: Arc<dyn Clock>,
    reconnect_delay: Duration,

    // Connection epoch state
    timer: Option<ReconnectTimer>,
    baseline: EpochBaseline,
    log: Option<TelemetryLog>,
}

impl<P: Protocol> LiveSource<P> {
    /// Create a source with a fresh identity, using the system clock
    pub fn new(protocol: P, host: Arc<dyn HostMessenger>, config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            protocol,
            id: CorrelationId::new(),
            tracker: StatusTracker::new(),
            address: None,
            on_output: None,
            host,
            config,
            clock: Arc::new(SystemClock),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            timer: None,
            baseline: EpochBaseline::new(None),
            log: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Address given to the last `connect` call
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Log of the current epoch
    pub fn log(&self) -> Option<&TelemetryLog> {
        self.log.as_ref()
    }

    /// Clock baseline of the current epoch, if established
    pub fn baseline(&self) -> Option<f64> {
        self.baseline.get()
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    pub fn time_supplier(&self) -> TimeSupplier {
        TimeSupplier {
            clock: self.clock.clone(),
            baseline: self.baseline.clone(),
        }
    }

    /// Allocate a fresh log, forget the baseline, and ask the host to start
    fn start_epoch(&mut self) {
        self.log = Some(TelemetryLog::new());
        self.baseline = EpochBaseline::new(None);
        self.host.send(HostIntent::Start {
            feed: self.protocol.feed(),
            correlation_id: self.id,
        });
    }

    fn cancel_reconnect(&mut self) {
        if self.timer.take().is_some() {
            tracing::debug!(source = %self.id, "Cancelled pending reconnect");
        }
    }

    fn reconnect(&mut self) {
        self.tracker.set(ConnectionStatus::Connecting);
        self.host.send(HostIntent::Stop {
            feed: self.protocol.feed(),
        });
        self.timer = Some(ReconnectTimer {
            deadline: Instant::now() + self.reconnect_delay,
        });
        tracing::info!(
            source = %self.id,
            "Feed {} failed, reconnecting in {:?}",
            self.protocol.feed(),
            self.reconnect_delay
        );
    }

    fn handle_data(&mut self, payload: Option<&str>) {
        let received_at = self.clock.now_secs();
        self.tracker.set(ConnectionStatus::Active);

        let update = match payload.map(|p| self.protocol.decode(p)) {
            Some(Ok(update)) => Some(update),
            Some(Err(e)) => {
                tracing::warn!(source = %self.id, "Skipping undecodable payload: {}", e);
                None
            }
            None => {
                tracing::warn!(source = %self.id, "Success message without payload");
                None
            }
        };

        if self.baseline.get().is_none() {
            if let Some(baseline) = self.protocol.baseline(update.as_ref(), received_at) {
                self.baseline.set(baseline);
                tracing::debug!(source = %self.id, baseline, "Clock baseline established");
            }
        }

        if let (Some(update), Some(baseline), Some(log)) =
            (update.as_ref(), self.baseline.get(), self.log.as_mut())
        {
            self.protocol.record(update, log, received_at - baseline);
        }

        self.emit_output();
    }

    fn emit_output(&mut self) {
        let supplier = self.time_supplier();
        let (Some(callback), Some(log)) = (self.on_output.as_mut(), self.log.as_ref()) else {
            return;
        };
        callback(log, &supplier);
    }
}

impl<P: Protocol> LiveDataSource for LiveSource<P> {
    fn correlation_id(&self) -> CorrelationId {
        self.id
    }

    fn status(&self) -> ConnectionStatus {
        self.tracker.status()
    }

    fn connect(&mut self, address: &str, on_status: StatusCallback, on_output: OutputCallback) {
        if self.tracker.is_stopped() {
            tracing::warn!(source = %self.id, "Ignoring connect on a stopped source");
            return;
        }

        self.address = Some(address.to_string());
        self.tracker.set_callback(on_status);
        self.on_output = Some(on_output);
        self.tracker.set(ConnectionStatus::Connecting);
        self.cancel_reconnect();

        if self.config.preferences().is_none() {
            tracing::warn!(source = %self.id, "No preferences available, cannot connect");
            self.tracker.set(ConnectionStatus::Error);
            return;
        }

        tracing::info!(source = %self.id, "Connecting to {} via {}", address, self.protocol.feed());
        self.start_epoch();
    }

    fn stop(&mut self) {
        self.tracker.set(ConnectionStatus::Stopped);
        self.cancel_reconnect();
        self.host.send(HostIntent::Stop {
            feed: self.protocol.feed(),
        });
        tracing::info!(source = %self.id, "Stopped feed {}", self.protocol.feed());
    }

    fn handle_main_message(&mut self, message: &InboundMessage) {
        if self.log.is_none()
            || self.tracker.is_stopped()
            || !self.id.matches(&message.correlation_id)
        {
            tracing::trace!(source = %self.id, "Dropping message for {}", message.correlation_id);
            return;
        }

        self.cancel_reconnect();

        if message.success {
            self.handle_data(message.payload.as_deref());
        } else {
            self.reconnect();
        }
    }

    fn reconnect_deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.deadline)
    }

    fn poll_reconnect(&mut self, now: Instant) -> bool {
        match self.timer {
            Some(timer) if timer.deadline <= now => self.timer = None,
            _ => return false,
        }

        if self.tracker.is_stopped() {
            return false;
        }

        if self.config.preferences().is_none() {
            tracing::warn!(source = %self.id, "No preferences available, giving up reconnect");
            self.tracker.set(ConnectionStatus::Error);
            return true;
        }

        tracing::info!(source = %self.id, "Restarting feed {}", self.protocol.feed());
        self.start_epoch();
        true
    }
}

impl<P: Protocol> fmt::Debug for LiveSource<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSource")
            .field("feed", &self.protocol.feed())
            .field("id", &self.id)
            .field("status", &self.tracker.status())
            .field("baseline", &self.baseline.get())
            .field("reconnect_pending", &self.timer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{Preferences, StaticConfig};
    use crate::log::LogValue;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMessenger {
        intents: Mutex<Vec<HostIntent>>,
    }

    impl RecordingMessenger {
        fn take(&self) -> Vec<HostIntent> {
            std::mem::take(&mut *self.intents.lock().unwrap())
        }
    }

    impl HostMessenger for RecordingMessenger {
        fn send(&self, intent: HostIntent) {
            self.intents.lock().unwrap().push(intent);
        }
    }

    #[derive(Debug, Clone)]
    struct Output {
        points: usize,
        keys: Vec<String>,
        now: f64,
    }

    struct Harness<P: Protocol> {
        source: LiveSource<P>,
        host: Arc<RecordingMessenger>,
        config: StaticConfig,
        clock: ManualClock,
        statuses: Arc<Mutex<Vec<ConnectionStatus>>>,
        outputs: Arc<Mutex<Vec<Output>>>,
    }

    impl<P: Protocol> Harness<P> {
        fn new(protocol: P) -> Self {
            let host = Arc::new(RecordingMessenger::default());
            let config = StaticConfig::new(Preferences::default());
            let clock = ManualClock::new(1000.0);
            let source = LiveSource::new(protocol, host.clone(), Arc::new(config.clone()))
                .with_clock(Arc::new(clock.clone()));
            Self {
                source,
                host,
                config,
                clock,
                statuses: Arc::new(Mutex::new(Vec::new())),
                outputs: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn connect(&mut self) {
            let statuses = self.statuses.clone();
            let outputs = self.outputs.clone();
            self.source.connect(
                "10.0.0.2",
                Box::new(move |s: ConnectionStatus| statuses.lock().unwrap().push(s)),
                Box::new(move |log: &TelemetryLog, time: &TimeSupplier| {
                    outputs.lock().unwrap().push(Output {
                        points: log.point_count(),
                        keys: log.keys().map(String::from).collect(),
                        now: time.now(),
                    })
                }),
            );
        }

        fn id(&self) -> CorrelationId {
            self.source.correlation_id()
        }

        fn succeed(&mut self, payload: &str) {
            let msg = InboundMessage::success(&self.id(), payload);
            self.source.handle_main_message(&msg);
        }

        fn fail(&mut self) {
            let msg = InboundMessage::failure(&self.id());
            self.source.handle_main_message(&msg);
        }

        fn fire_timer(&mut self) -> bool {
            let deadline = self.source.reconnect_deadline().expect("timer armed");
            self.source.poll_reconnect(deadline)
        }

        fn statuses(&self) -> Vec<ConnectionStatus> {
            self.statuses.lock().unwrap().clone()
        }

        fn outputs(&self) -> Vec<Output> {
            self.outputs.lock().unwrap().clone()
        }
    }

    fn start_intent(feed: &'static str, id: CorrelationId) -> HostIntent {
        HostIntent::Start {
            feed,
            correlation_id: id,
        }
    }

    #[test]
    fn test_connect_issues_start() {
        let mut h = Harness::new(XyvProtocol);
        assert_eq!(h.source.status(), ConnectionStatus::Waiting);

        h.connect();

        assert_eq!(h.statuses(), vec![ConnectionStatus::Connecting]);
        assert_eq!(h.host.take(), vec![start_intent("live-vex-v5", h.id())]);
        assert_eq!(h.source.address(), Some("10.0.0.2"));
        assert!(h.source.log().is_some());
    }

    #[test]
    fn test_connect_without_preferences_errors() {
        let mut h = Harness::new(XyvProtocol);
        h.config.set(None);

        h.connect();

        assert_eq!(
            h.statuses(),
            vec![ConnectionStatus::Connecting, ConnectionStatus::Error]
        );
        assert!(h.host.take().is_empty());
        assert!(h.source.reconnect_deadline().is_none());

        // No log allocated, so messages are ignored
        h.succeed(r#"{"data":{"temp":1},"now_sec":0}"#);
        assert_eq!(h.source.status(), ConnectionStatus::Error);
        assert!(h.outputs().is_empty());
    }

    #[test]
    fn test_server_timestamped_success() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();

        h.succeed(r#"{"data":{"temp":42}, "now_sec":10}"#);

        assert_eq!(h.source.baseline(), Some(990.0));
        assert_eq!(h.source.status(), ConnectionStatus::Active);
        let log = h.source.log().unwrap();
        assert_eq!(log.value_at("temp", 10.0), Some(&LogValue::Number(42.0)));
        assert_eq!(log.series("temp").unwrap().points()[0].timestamp, 10.0);

        let outputs = h.outputs();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].points, 1);
        assert_eq!(outputs[0].now, 10.0);

        // Supplier follows the clock
        h.clock.advance(2.0);
        assert_eq!(h.source.time_supplier().now(), 12.0);
    }

    #[test]
    fn test_undecodable_payload_still_outputs() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();
        h.succeed(r#"{"data":{"temp":42}, "now_sec":10}"#);

        h.succeed("not json");

        assert_eq!(h.source.status(), ConnectionStatus::Active);
        let outputs = h.outputs();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1].points, 1);
        assert_eq!(h.source.log().unwrap().point_count(), 1);
    }

    #[test]
    fn test_first_message_undecodable_leaves_xyv_baseline_unset() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();

        h.succeed("garbage");
        assert_eq!(h.source.baseline(), None);
        assert_eq!(h.outputs()[0].now, 0.0);

        h.clock.set(1005.0);
        h.succeed(r#"{"data":{"x":1},"now_sec":3}"#);
        assert_eq!(h.source.baseline(), Some(1002.0));
    }

    #[test]
    fn test_success_without_payload() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();

        let msg = InboundMessage {
            correlation_id: h.id().to_string(),
            success: true,
            payload: None,
        };
        h.source.handle_main_message(&msg);

        assert_eq!(h.source.status(), ConnectionStatus::Active);
        assert_eq!(h.outputs().len(), 1);
    }

    #[test]
    fn test_baseline_computed_once_per_epoch() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();

        h.succeed(r#"{"data":{"a":1},"now_sec":10}"#);
        h.clock.advance(1.0);
        // Server time jumps; baseline must not follow it
        h.succeed(r#"{"data":{"a":2},"now_sec":50}"#);

        assert_eq!(h.source.baseline(), Some(990.0));
        let points = h.source.log().unwrap().series("a").unwrap().points().to_vec();
        assert_eq!(points[0].timestamp, 10.0);
        assert_eq!(points[1].timestamp, 11.0);
    }

    #[test]
    fn test_session_time_is_monotonic() {
        let mut h = Harness::new(VexideProtocol);
        h.connect();

        for step in [0.0, 0.1, 0.1, 0.5, 2.0] {
            h.clock.advance(step);
            h.succeed(r#"{"updates":{"x":1}}"#);
        }

        let points = h.source.log().unwrap().series("x").unwrap().points().to_vec();
        assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(points[0].timestamp, 0.0);
    }

    #[test]
    fn test_failure_schedules_reconnect() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();
        h.succeed(r#"{"data":{"temp":42},"now_sec":10}"#);
        h.host.take();

        let before = Instant::now();
        h.fail();

        assert_eq!(h.source.status(), ConnectionStatus::Connecting);
        assert_eq!(h.host.take(), vec![HostIntent::Stop { feed: "live-vex-v5" }]);

        let deadline = h.source.reconnect_deadline().unwrap();
        assert!(deadline >= before + Duration::from_millis(500));

        // Not due yet
        assert!(!h.source.poll_reconnect(deadline - Duration::from_millis(1)));
        assert!(h.host.take().is_empty());

        assert!(h.source.poll_reconnect(deadline));
        assert_eq!(h.host.take(), vec![start_intent("live-vex-v5", h.id())]);
        assert_eq!(h.source.baseline(), None);
        assert_eq!(h.source.log().unwrap().point_count(), 0);
        assert!(h.source.reconnect_deadline().is_none());

        // Fires exactly once
        assert!(!h.source.poll_reconnect(deadline + Duration::from_secs(10)));
    }

    #[test]
    fn test_reconnect_starts_new_epoch() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();
        h.succeed(r#"{"data":{"old":1},"now_sec":10}"#);
        h.fail();
        h.fire_timer();

        h.clock.set(2000.0);
        h.succeed(r#"{"data":{"new":1},"now_sec":1}"#);

        assert_eq!(h.source.baseline(), Some(1999.0));
        let log = h.source.log().unwrap();
        assert!(log.series("old").is_none());
        assert_eq!(log.series("new").unwrap().points()[0].timestamp, 1.0);
        assert_eq!(
            h.statuses(),
            vec![
                ConnectionStatus::Connecting,
                ConnectionStatus::Active,
                ConnectionStatus::Connecting,
                ConnectionStatus::Active,
            ]
        );
    }

    #[test]
    fn test_message_cancels_pending_reconnect() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();
        h.fail();
        assert!(h.source.reconnect_deadline().is_some());

        h.succeed(r#"{"data":{},"now_sec":0}"#);
        assert!(h.source.reconnect_deadline().is_none());
        assert_eq!(h.source.status(), ConnectionStatus::Active);
    }

    #[test]
    fn test_repeated_failures_keep_one_timer() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();
        h.fail();
        h.fail();
        h.fail();

        let deadline = h.source.reconnect_deadline().unwrap();
        assert!(h.source.poll_reconnect(deadline));
        assert!(h.source.reconnect_deadline().is_none());
        let starts = h
            .host
            .take()
            .into_iter()
            .filter(|i| matches!(i, HostIntent::Start { .. }))
            .count();
        // One from connect, one from the single timer
        assert_eq!(starts, 2);
    }

    #[test]
    fn test_reconnect_without_preferences_errors() {
        let mut h = Harness::new(VexideProtocol);
        h.connect();
        h.fail();
        h.config.set(None);
        h.host.take();

        assert!(h.fire_timer());

        assert_eq!(h.source.status(), ConnectionStatus::Error);
        assert!(h.host.take().is_empty());
        assert!(h.source.reconnect_deadline().is_none());
    }

    #[test]
    fn test_stop_is_terminal() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();
        h.succeed(r#"{"data":{"temp":42},"now_sec":10}"#);
        h.host.take();

        h.source.stop();
        assert_eq!(h.host.take(), vec![HostIntent::Stop { feed: "live-vex-v5" }]);

        let statuses_before = h.statuses();
        let outputs_before = h.outputs().len();

        h.succeed(r#"{"data":{"temp":43},"now_sec":11}"#);
        h.fail();
        h.connect();

        assert_eq!(h.source.status(), ConnectionStatus::Stopped);
        assert_eq!(h.statuses(), statuses_before);
        assert_eq!(*statuses_before.last().unwrap(), ConnectionStatus::Stopped);
        assert_eq!(h.outputs().len(), outputs_before);
        assert_eq!(h.source.log().unwrap().point_count(), 1);
        assert!(h.source.reconnect_deadline().is_none());
        assert!(h.host.take().is_empty());
    }

    #[test]
    fn test_stop_cancels_pending_reconnect() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();
        h.fail();
        let deadline = h.source.reconnect_deadline().unwrap();

        h.source.stop();
        h.host.take();

        assert!(h.source.reconnect_deadline().is_none());
        assert!(!h.source.poll_reconnect(deadline));
        assert!(h.host.take().is_empty());
    }

    #[test]
    fn test_foreign_messages_are_ignored() {
        let mut h = Harness::new(XyvProtocol);
        h.connect();
        h.fail();
        let deadline = h.source.reconnect_deadline();
        let statuses = h.statuses();

        let other = CorrelationId::new();
        h.source
            .handle_main_message(&InboundMessage::success(&other, r#"{"data":{"x":1},"now_sec":1}"#));
        h.source.handle_main_message(&InboundMessage::failure(&other));

        assert_eq!(h.statuses(), statuses);
        assert_eq!(h.source.reconnect_deadline(), deadline);
        assert_eq!(h.source.log().unwrap().point_count(), 0);
        assert!(h.outputs().is_empty());
    }

    #[test]
    fn test_messages_before_connect_are_ignored() {
        let mut h = Harness::new(XyvProtocol);
        h.succeed(r#"{"data":{"x":1},"now_sec":1}"#);
        assert_eq!(h.source.status(), ConnectionStatus::Waiting);
        assert!(h.source.log().is_none());
    }

    #[test]
    fn test_locally_timestamped_baseline() {
        let mut h = Harness::new(VexideProtocol);
        h.connect();
        assert_eq!(
            h.host.take(),
            vec![start_intent("live-cargo-v5", h.id())]
        );

        // Undecodable first message still pins the baseline
        h.succeed("not json");
        assert_eq!(h.source.baseline(), Some(1000.0));

        h.clock.advance(1.5);
        h.succeed(r#"{"updates":{"drive":{"left":1.5}}}"#);

        let log = h.source.log().unwrap();
        assert_eq!(log.value_at("drive/left", 1.5), Some(&LogValue::Number(1.5)));
        assert_eq!(h.outputs().last().unwrap().keys, vec!["drive/left".to_string()]);
        assert_eq!(h.outputs().last().unwrap().now, 1.5);
    }

    #[test]
    fn test_kept_supplier_reads_baseline_once_set() {
        let mut h = Harness::new(XyvProtocol);
        let suppliers = Arc::new(Mutex::new(Vec::new()));
        let sink = suppliers.clone();
        h.source.connect(
            "10.0.0.2",
            Box::new(|_: ConnectionStatus| {}),
            Box::new(move |_: &TelemetryLog, time: &TimeSupplier| {
                sink.lock().unwrap().push(time.clone());
            }),
        );

        h.succeed("garbage");
        let first = suppliers.lock().unwrap()[0].clone();
        assert_eq!(first.now(), 0.0);

        h.succeed(r#"{"data":{},"now_sec":10}"#);
        h.clock.advance(5.0);
        assert_eq!(first.baseline(), Some(990.0));
        assert_eq!(first.now(), 15.0);

        // The next epoch has its own baseline
        h.fail();
        assert!(h.fire_timer());
        h.clock.set(2000.0);
        h.succeed(r#"{"data":{},"now_sec":1}"#);
        assert_eq!(h.source.baseline(), Some(1999.0));
        assert_eq!(first.baseline(), Some(990.0));
        assert_eq!(suppliers.lock().unwrap().last().unwrap().now(), 1.0);
    }

    #[test]
    fn test_time_supplier_without_baseline() {
        let clock = Arc::new(ManualClock::new(50.0));
        let supplier = TimeSupplier::new(clock.clone(), None);
        assert_eq!(supplier.now(), 0.0);

        let supplier = TimeSupplier::new(clock.clone(), Some(40.0));
        clock.advance(5.0);
        assert_eq!(supplier.now(), 15.0);
    }
}
