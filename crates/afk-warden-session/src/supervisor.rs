//! Session lifecycle controller.
//!
//! The [`Supervisor`] is the only component that creates or retires sessions.
//! It owns all mutable lifecycle state in one [`SupervisorState`] and is driven
//! by a single cooperative loop: connection events, three periodic polls
//! (watchdog, presence, heartbeat) and three one-shot timers (reconnect,
//! rotation, handoff). Every handler runs to completion before the next one
//! fires, so no locking is needed.
//!
//! The handlers are plain synchronous methods taking `now`, which lets tests
//! drive the supervisor step by step without a runtime.

use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use afk_warden_core::{
    FailureKind, Identity, RetireReason, SessionEnvelope, SessionEvent, SupervisorSettings,
};

use crate::backoff::{FailureRecord, FailureTracker};
use crate::behavior::Behavior;
use crate::connection::{Connector, EventReceiver, EventSender};
use crate::handle::SessionHandle;
use crate::machine::Effect;
use crate::presence::{PresenceMonitor, PresenceVerdict};
use crate::rotation::RotationScheduler;
use crate::timer::{TimerKind, TimerSlot};
use crate::watchdog::LivenessWatchdog;

/// Process-wide lifecycle state.
#[derive(Debug)]
pub struct SupervisorState {
    /// Current session; empty only while a reconnect is pending
    current: Option<SessionHandle>,

    /// Previous session kept alive during a rotation overlap
    outgoing: Option<SessionHandle>,

    /// Consecutive failure counter
    failures: FailureTracker,

    /// Last identity rotation
    last_rotation_at: Instant,

    /// Last event observed from the current session
    last_activity_at: Instant,
}

impl SupervisorState {
    fn new(max_failures: u32, now: Instant) -> Self {
        Self {
            current: None,
            outgoing: None,
            failures: FailureTracker::new(max_failures),
            last_rotation_at: now,
            last_activity_at: now,
        }
    }

    /// Current session.
    pub fn current(&self) -> Option<&SessionHandle> {
        self.current.as_ref()
    }

    /// Outgoing session during a rotation overlap.
    pub fn outgoing(&self) -> Option<&SessionHandle> {
        self.outgoing.as_ref()
    }

    /// Failure tracker.
    pub fn failures(&self) -> &FailureTracker {
        &self.failures
    }

    /// Last identity rotation.
    pub fn last_rotation_at(&self) -> Instant {
        self.last_rotation_at
    }

    /// Last activity from the current session.
    pub fn last_activity_at(&self) -> Instant {
        self.last_activity_at
    }

    /// Number of live (non-terminated) handles.
    pub fn live_sessions(&self) -> usize {
        self.current
            .iter()
            .chain(self.outgoing.iter())
            .filter(|handle| !handle.state().is_terminated())
            .count()
    }
}

/// Keeps exactly one automated occupant connected.
pub struct Supervisor<C: Connector> {
    /// Identity base label
    base: String,

    /// Timings and thresholds
    settings: SupervisorSettings,

    /// Opens new connections
    connector: C,

    /// Capabilities run inside active sessions
    behaviors: Vec<Box<dyn Behavior>>,

    /// Lifecycle state
    state: SupervisorState,

    watchdog: LivenessWatchdog,
    presence: PresenceMonitor,
    rotation: RotationScheduler,

    reconnect_timer: TimerSlot,
    rotation_timer: TimerSlot,
    handoff_timer: TimerSlot,

    /// Identity and timing randomness
    rng: StdRng,

    events_tx: EventSender,
    events_rx: Option<EventReceiver>,
}

impl<C: Connector> Supervisor<C> {
    /// Create a supervisor generating identities from `base`.
    pub fn new(base: impl Into<String>, settings: SupervisorSettings, connector: C) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            base: base.into(),
            watchdog: LivenessWatchdog::new(settings.liveness_timeout()),
            presence: PresenceMonitor::new(),
            rotation: RotationScheduler::from_settings(&settings),
            state: SupervisorState::new(settings.max_failures, Instant::now()),
            settings,
            connector,
            behaviors: Vec::new(),
            reconnect_timer: TimerSlot::new(),
            rotation_timer: TimerSlot::new(),
            handoff_timer: TimerSlot::new(),
            rng: StdRng::from_entropy(),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Use a specific random source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Add a behavior run inside active sessions.
    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behaviors.push(Box::new(behavior));
        self
    }

    /// Sender connections push events into.
    pub fn event_sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    /// Lifecycle state.
    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    /// Current session.
    pub fn current(&self) -> Option<&SessionHandle> {
        self.state.current()
    }

    /// Outgoing session during a rotation overlap.
    pub fn outgoing(&self) -> Option<&SessionHandle> {
        self.state.outgoing()
    }

    /// Failure tracker.
    pub fn failures(&self) -> &FailureTracker {
        self.state.failures()
    }

    /// Settings in use.
    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    /// Borrow a one-shot timer.
    pub fn timer(&self, kind: TimerKind) -> &TimerSlot {
        match kind {
            TimerKind::Reconnect => &self.reconnect_timer,
            TimerKind::Rotation => &self.rotation_timer,
            TimerKind::Handoff => &self.handoff_timer,
        }
    }

    fn timer_mut(&mut self, kind: TimerKind) -> &mut TimerSlot {
        match kind {
            TimerKind::Reconnect => &mut self.reconnect_timer,
            TimerKind::Rotation => &mut self.rotation_timer,
            TimerKind::Handoff => &mut self.handoff_timer,
        }
    }

    /// Create the first session and arm the rotation timer.
    pub fn start(&mut self, now: Instant) {
        info!("Supervisor starting: base identity '{}'", self.base);
        self.state.last_rotation_at = now;
        self.state.last_activity_at = now;
        self.ensure_session(now);
        self.schedule_rotation(now);
    }

    /// Make sure a healthy session exists, replacing the current one if needed.
    ///
    /// No-op while the current session is active and playing, or still within
    /// its connect timeout. Returns whether a new session was started.
    pub fn ensure_session(&mut self, now: Instant) -> bool {
        if let Some(current) = &self.state.current {
            if current.is_healthy(now, self.settings.connect_timeout()) {
                debug!("Session healthy, nothing to ensure: identity={}", current.identity());
                return false;
            }
        }
        self.open_session(now)
    }

    /// Retire the current session gracefully.
    pub fn retire_current(&mut self, reason: RetireReason) {
        if let Some(handle) = self.state.current.take() {
            handle.retire(reason);
        }
    }

    /// Retire every session. Used on shutdown.
    pub fn shutdown(&mut self) {
        info!("Supervisor shutting down");
        self.retire_current(RetireReason::Shutdown);
        if let Some(outgoing) = self.state.outgoing.take() {
            outgoing.retire(RetireReason::Shutdown);
        }
        self.reconnect_timer.clear();
        self.rotation_timer.clear();
        self.handoff_timer.clear();
    }

    /// Replace the current session with a fresh one under a new identity.
    fn open_session(&mut self, now: Instant) -> bool {
        if let Some(previous) = self.state.current.take() {
            previous.retire(RetireReason::Replaced);
        }
        self.reconnect_timer.clear();

        let identity = Identity::generate(&self.base, &mut self.rng);
        match SessionHandle::open(
            &mut self.connector,
            identity.clone(),
            self.events_tx.clone(),
            now,
        ) {
            Ok(handle) => {
                info!("Session created: identity={}, id={}", identity, handle.id());
                self.state.current = Some(handle);
                self.state.last_activity_at = now;
                true
            }
            Err(err) => {
                warn!("Failed to create session: identity={}, {}", identity, err);
                self.record_failure(FailureKind::ConnectFailure);
                self.schedule_reconnect(now, self.settings.retry_delay());
                false
            }
        }
    }

    fn record_failure(&mut self, kind: FailureKind) -> FailureRecord {
        let record = self.state.failures.record_failure();
        warn!(
            "Session failure: {}, consecutive={}",
            kind, record.consecutive
        );
        if record.alert {
            error!(
                "ALERT: session failed {} times in a row",
                record.consecutive
            );
        }
        record
    }

    fn schedule_reconnect(&mut self, now: Instant, delay: Duration) {
        info!("Reconnecting in {}s", delay.as_secs_f32());
        self.reconnect_timer.arm(now, delay);
    }

    fn schedule_rotation(&mut self, now: Instant) {
        let interval = self.rotation.next_interval(&mut self.rng);
        debug!("Next identity rotation in {} minutes", interval.as_secs() / 60);
        self.rotation_timer.arm(now, interval);
    }

    /// Route an event to the session that produced it.
    ///
    /// Events from sessions that were already retired are dropped.
    pub fn handle_event(&mut self, envelope: SessionEnvelope, now: Instant) {
        let SessionEnvelope { session, event } = envelope;
        if self.state.current.as_ref().map(|h| h.id()) == Some(session) {
            self.apply_current(&event, now);
        } else if self.state.outgoing.as_ref().map(|h| h.id()) == Some(session) {
            self.apply_outgoing(&event, now);
        } else {
            debug!("Ignoring event from retired session: id={}, {:?}", session, event);
        }
    }

    fn apply_current(&mut self, event: &SessionEvent, now: Instant) {
        let Some(handle) = self.state.current.as_mut() else {
            return;
        };
        let step = handle.apply(event);
        let mut failure = None;

        for effect in step.effects {
            match effect {
                Effect::Log(message) => info!("[{}] {}", handle.identity(), message),
                Effect::Touch => {
                    handle.touch(now);
                    self.state.last_activity_at = now;
                }
                Effect::ResetFailures => self.state.failures.reset(),
                Effect::RunOnActive => {
                    for behavior in self.behaviors.iter_mut() {
                        behavior.on_active(handle.connection_mut());
                    }
                }
                Effect::RunOnTick(tick) => {
                    for behavior in self.behaviors.iter_mut() {
                        behavior.on_tick(handle.connection_mut(), &tick);
                    }
                }
                Effect::Respawn => handle.connection_mut().respawn(),
                Effect::Terminate(kind) => failure = Some(kind),
            }
        }

        if let Some(kind) = failure {
            if let Some(mut handle) = self.state.current.take() {
                handle.close();
            }
            self.record_failure(kind);
            if let Some(outgoing) = self.state.outgoing.take() {
                info!(
                    "Incoming session failed during handoff, keeping {}",
                    outgoing.identity()
                );
                self.state.current = Some(outgoing);
                self.handoff_timer.clear();
            }
            self.schedule_reconnect(now, self.settings.reconnect_delay());
        }
    }

    fn apply_outgoing(&mut self, event: &SessionEvent, now: Instant) {
        let Some(handle) = self.state.outgoing.as_mut() else {
            return;
        };
        let step = handle.apply(event);
        for effect in &step.effects {
            match effect {
                Effect::Touch => handle.touch(now),
                Effect::Respawn => handle.connection_mut().respawn(),
                _ => {}
            }
        }
        if step.failure().is_some() {
            info!(
                "Outgoing session ended during handoff: identity={}",
                handle.identity()
            );
            if let Some(mut handle) = self.state.outgoing.take() {
                handle.close();
            }
            self.handoff_timer.clear();
        }
    }

    /// Liveness poll. Returns whether a stale session was replaced.
    pub fn watchdog_tick(&mut self, now: Instant) -> bool {
        if self.state.current.is_none() {
            return false;
        }
        if !self.watchdog.is_stale(self.state.last_activity_at, now) {
            return false;
        }
        let silence = self.watchdog.silence(self.state.last_activity_at, now);
        warn!(
            "Watchdog: no activity for {}s, forcing reconnect",
            silence.as_secs()
        );
        if let Some(mut stale) = self.state.current.take() {
            stale.close();
        }
        self.record_failure(FailureKind::LivenessTimeout);
        self.open_session(now);
        true
    }

    /// Presence poll.
    pub fn presence_tick(&mut self, now: Instant) -> PresenceVerdict {
        let Some(handle) = self.state.current.as_ref() else {
            return PresenceVerdict::Idle;
        };
        let healthy = handle.is_healthy(now, self.settings.connect_timeout());
        let roster = handle.connection().roster();
        let ours: Vec<&Identity> = std::iter::once(handle.identity())
            .chain(self.state.outgoing.as_ref().map(|h| h.identity()))
            .collect();
        let verdict = self.presence.evaluate(&roster, &ours, healthy);

        match &verdict {
            PresenceVerdict::Yield(humans) => {
                info!(
                    "Human occupant detected ({}), yielding",
                    humans.join(", ")
                );
                self.retire_current(RetireReason::HumanPresent);
                if let Some(outgoing) = self.state.outgoing.take() {
                    outgoing.retire(RetireReason::HumanPresent);
                    self.handoff_timer.clear();
                }
                self.schedule_reconnect(now, self.settings.reconnect_delay());
            }
            PresenceVerdict::Reconnect => {
                info!("No human occupants and session not playing, ensuring session");
                self.ensure_session(now);
            }
            PresenceVerdict::Idle => {}
        }
        verdict
    }

    /// Heartbeat log line.
    pub fn heartbeat(&self, now: Instant) {
        let silence = now.saturating_duration_since(self.state.last_activity_at);
        match self.state.current() {
            Some(handle) => info!(
                "Heartbeat: supervisor alive, identity={}, state={:?}, last activity {}s ago",
                handle.identity(),
                handle.state(),
                silence.as_secs()
            ),
            None => info!(
                "Heartbeat: supervisor alive, no session, last activity {}s ago",
                silence.as_secs()
            ),
        }
    }

    /// Start an overlapped identity rotation.
    pub fn rotate(&mut self, now: Instant) {
        self.schedule_rotation(now);
        self.state.last_rotation_at = now;

        if let Some(previous) = self.state.outgoing.take() {
            previous.retire(RetireReason::RotationHandoff);
            self.handoff_timer.clear();
        }

        let Some(old) = self.state.current.take() else {
            info!("Rotation due with no session, ensuring one");
            self.open_session(now);
            return;
        };

        info!("Rotating identity away from {}", old.identity());
        self.state.outgoing = Some(old);
        if self.open_session(now) {
            let overlap = self.rotation.overlap(&mut self.rng);
            debug!("Handoff in {}s", overlap.as_secs_f32());
            self.handoff_timer.arm(now, overlap);
        } else {
            warn!("Rotation aborted, keeping current identity");
            self.state.current = self.state.outgoing.take();
            self.reconnect_timer.clear();
        }
    }

    /// Retire the outgoing session once the overlap window closes.
    pub fn finish_handoff(&mut self) {
        if let Some(outgoing) = self.state.outgoing.take() {
            outgoing.retire(RetireReason::RotationHandoff);
            match self.state.current() {
                Some(current) => info!("Rotation complete: now {}", current.identity()),
                None => info!("Rotation complete"),
            }
        }
    }

    /// Run the action for a one-shot timer.
    pub fn on_timer(&mut self, kind: TimerKind, now: Instant) {
        self.timer_mut(kind).clear();
        match kind {
            TimerKind::Reconnect => {
                self.ensure_session(now);
            }
            TimerKind::Rotation => self.rotate(now),
            TimerKind::Handoff => self.finish_handoff(),
        }
    }

    /// Fire every one-shot timer due at `now`. Returns the timers fired.
    pub fn fire_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        for kind in [TimerKind::Handoff, TimerKind::Reconnect, TimerKind::Rotation] {
            if self.timer_mut(kind).take_due(now) {
                self.on_timer(kind, now);
                fired.push(kind);
            }
        }
        fired
    }

    /// Run forever.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await;
    }

    /// Run until `shutdown` resolves, then retire all sessions.
    ///
    /// Returns the supervisor so its final state can be inspected. Branches
    /// are polled in order: queued events before any poll, and the watchdog
    /// before the presence check, so a hung connect that both would catch is
    /// always a counted `LivenessTimeout`.
    pub async fn run_until<F: Future<Output = ()>>(mut self, shutdown: F) -> Self {
        let Some(mut events) = self.events_rx.take() else {
            error!("Supervisor event channel already taken");
            return self;
        };
        tokio::pin!(shutdown);

        let start = Instant::now();
        self.start(start);

        let mut watchdog = periodic(start, self.settings.watchdog_interval());
        let mut presence = periodic(start, self.settings.presence_interval());
        let mut heartbeat = periodic(start, self.settings.heartbeat_interval());

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    self.shutdown();
                    return self;
                }
                Some(envelope) = events.recv() => self.handle_event(envelope, Instant::now()),
                _ = watchdog.tick() => {
                    self.watchdog_tick(Instant::now());
                }
                _ = presence.tick() => {
                    self.presence_tick(Instant::now());
                }
                _ = heartbeat.tick() => self.heartbeat(Instant::now()),
                _ = self.reconnect_timer.wait() => self.on_timer(TimerKind::Reconnect, Instant::now()),
                _ = self.rotation_timer.wait() => self.on_timer(TimerKind::Rotation, Instant::now()),
                _ = self.handoff_timer.wait() => self.on_timer(TimerKind::Handoff, Instant::now()),
            }
        }
    }
}

fn periodic(start: Instant, period: Duration) -> Interval {
    let mut interval = interval_at(start + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
