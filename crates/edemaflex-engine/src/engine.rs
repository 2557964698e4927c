//! Connection & session state machine.
//!
//! [`GloveEngine`] owns the transport handle, the session lifecycle
//! (`Disconnected → Connecting → Connected → Running`), and the three
//! session timers (telemetry polling, countdown, auto-stop watchdog).
//! Timers are spawned tasks whose callbacks re-check the current state
//! before acting: aborts are best-effort under cooperative scheduling, so
//! a stale tick after stop or disconnect must be a no-op on its own.
//!
//! Generation counters make those checks cheap: `connection_gen` changes
//! on every connect/disconnect (guards the reconciler), `session_gen` on
//! every start/stop/disconnect (guards the session timers). A task
//! captures the counter at spawn and bails as soon as it disagrees.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};

use edemaflex_core::events::EngineEvent;
use edemaflex_core::prelude::*;
use edemaflex_core::types::{
    ActivationMode, CharacteristicKey, ConnectionPhase, EngineStatus, SegmentReadings,
    MAX_DRIVE_LEVEL,
};

use crate::config::{GloveSettings, SettingsStore};
use crate::reader::{self, TelemetryReader};
use crate::reconciler;
use crate::transport::{BleTransport, MockTransport, Transport};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Therapy session length until a clinician overrides it.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::from_secs(30 * 60);

/// Period of the telemetry polling timer while a session runs.
pub(crate) const POLL_PERIOD: Duration = Duration::from_millis(100);

/// Countdown display refresh period.
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Auto-stop watchdog period. The watchdog compares wall-clock elapsed
/// time against the configured duration, so a missed tick only delays the
/// stop, never skips it.
const WATCHDOG_TICK: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// Mutable session fields behind the state lock. Guards are never held
/// across await points.
struct SessionState {
    phase: ConnectionPhase,
    status: String,
    error_message: Option<String>,
    mock_mode: bool,
    started_wall: Option<DateTime<Utc>>,
    remaining: String,
}

/// Handles for the cancellable tasks owned by the current session.
#[derive(Default)]
struct SessionTasks {
    poll: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
    reconcile: Option<JoinHandle<()>>,
}

impl SessionTasks {
    fn abort_session_timers(&mut self, include_watchdog: bool) {
        if let Some(handle) = self.poll.take() {
            handle.abort();
        }
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
        if include_watchdog {
            if let Some(handle) = self.watchdog.take() {
                handle.abort();
            }
        }
    }

    fn abort_all(&mut self) {
        self.abort_session_timers(true);
        if let Some(handle) = self.reconcile.take() {
            handle.abort();
        }
    }
}

pub(crate) struct EngineInner {
    state: RwLock<SessionState>,
    transport: Mutex<Option<Box<dyn Transport>>>,
    telemetry: RwLock<SegmentReadings>,
    pub(crate) reader: TelemetryReader,
    store: SettingsStore,
    settings: RwLock<GloveSettings>,
    events: mpsc::UnboundedSender<EngineEvent>,
    tasks: StdMutex<SessionTasks>,
    connection_gen: AtomicU64,
    session_gen: AtomicU64,
    duration: RwLock<Duration>,
}

// ---------------------------------------------------------------------------
// GloveEngine
// ---------------------------------------------------------------------------

/// The Device Connection & Session Engine.
///
/// One engine drives exactly one peripheral (real or mock). All public
/// operations are `async` and safe to call out of order: commands issued
/// while disconnected surface a benign error message instead of failing
/// hard.
#[derive(Clone)]
pub struct GloveEngine {
    inner: Arc<EngineInner>,
}

impl GloveEngine {
    /// Create an engine backed by `store` for persisted configuration.
    ///
    /// Returns the engine and the receiver for its [`EngineEvent`] stream.
    pub fn new(store: SettingsStore) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let settings = store.load();

        let telemetry = CharacteristicKey::SEGMENTS
            .iter()
            .map(|key| (*key, key.idle_value()))
            .collect();

        let inner = EngineInner {
            state: RwLock::new(SessionState {
                phase: ConnectionPhase::Disconnected,
                status: "Disconnected".to_string(),
                error_message: None,
                mock_mode: false,
                started_wall: None,
                remaining: format_remaining(DEFAULT_SESSION_DURATION.as_secs()),
            }),
            transport: Mutex::new(None),
            telemetry: RwLock::new(telemetry),
            reader: TelemetryReader::new(),
            store,
            settings: RwLock::new(settings),
            events,
            tasks: StdMutex::new(SessionTasks::default()),
            connection_gen: AtomicU64::new(0),
            session_gen: AtomicU64::new(0),
            duration: RwLock::new(DEFAULT_SESSION_DURATION),
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            events_rx,
        )
    }

    // ── Connection lifecycle ──────────────────────────────────────────────

    /// Connect to the physical glove over BLE.
    pub async fn connect(&self) -> Result<()> {
        self.connect_with(false).await
    }

    /// Connect to the in-memory simulator instead of real hardware.
    pub async fn mock_connect(&self) -> Result<()> {
        self.connect_with(true).await
    }

    async fn connect_with(&self, mock: bool) -> Result<()> {
        let already_connected = {
            let mut state = write_state(&self.inner);
            if state.phase != ConnectionPhase::Disconnected {
                true
            } else {
                state.phase = ConnectionPhase::Connecting;
                state.mock_mode = mock;
                false
            }
        };
        if already_connected {
            report_error(&self.inner, "Already connected".to_string());
            return Ok(());
        }

        // Forward staged status messages ("Getting service…") as they
        // arrive; the channel closes when the connect attempt resolves.
        let (status_tx, mut status_rx) = mpsc::unbounded_channel::<String>();
        let forwarder = {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                while let Some(message) = status_rx.recv().await {
                    set_status(&inner, &message);
                }
            })
        };

        let connected: Result<Box<dyn Transport>> = if mock {
            MockTransport::connect(status_tx)
                .await
                .map(|t| Box::new(t) as Box<dyn Transport>)
        } else {
            BleTransport::connect(status_tx)
                .await
                .map(|t| Box::new(t) as Box<dyn Transport>)
        };
        let _ = forwarder.await;

        match connected {
            Ok(transport) => {
                *self.inner.transport.lock().await = Some(transport);
                let gen = bump(&self.inner.connection_gen);
                {
                    let mut state = write_state(&self.inner);
                    state.phase = ConnectionPhase::Connected;
                    state.error_message = None;
                }
                set_status(&self.inner, "Connected. Ready to start.");

                // Replay persisted configuration onto the fresh connection.
                let handle = reconciler::spawn_apply(Arc::clone(&self.inner), gen);
                lock_tasks(&self.inner).reconcile = Some(handle);
                Ok(())
            }
            Err(e) => {
                {
                    let mut state = write_state(&self.inner);
                    state.phase = ConnectionPhase::Disconnected;
                    state.mock_mode = false;
                }
                report_error(&self.inner, format!("Error - {e}"));
                set_status(&self.inner, "Connection failed");
                Err(e)
            }
        }
    }

    /// Disconnect, stopping the session first when one is running.
    ///
    /// Returns the final telemetry snapshot when a connection was actually
    /// torn down, `None` when already disconnected.
    pub async fn disconnect(&self) -> Option<SegmentReadings> {
        do_disconnect(&self.inner).await
    }

    // ── Session control ───────────────────────────────────────────────────

    /// Start a therapy session: write the run flag and spawn the polling,
    /// countdown, and watchdog timers.
    pub async fn start_board(&self) -> Result<()> {
        {
            let state = read_state(&self.inner);
            if !state.phase.is_connected() {
                drop(state);
                report_error(&self.inner, "Not connected to the board".to_string());
                return Ok(());
            }
            if state.phase.is_running() {
                drop(state);
                report_error(&self.inner, "Board already started".to_string());
                return Ok(());
            }
        }

        if let Err(e) = write_value(&self.inner, CharacteristicKey::Start, "1").await {
            report_error(&self.inner, format!("Error starting board - {e}"));
            return Err(e);
        }

        let gen = bump(&self.inner.session_gen);
        let duration = *read_duration(&self.inner);
        let started_at = Instant::now();
        {
            let mut state = write_state(&self.inner);
            // The connection may have been torn down while the start flag
            // was in flight; a session cannot begin on a dead link.
            if !state.phase.is_connected() {
                return Ok(());
            }
            state.phase = ConnectionPhase::Running;
            state.started_wall = Some(Utc::now());
            state.remaining = format_remaining(duration.as_secs());
        }
        set_status(&self.inner, "Board started");

        let poll = tokio::spawn(poll_task(Arc::clone(&self.inner), gen));
        let countdown = tokio::spawn(countdown_task(
            Arc::clone(&self.inner),
            gen,
            started_at,
            duration,
        ));
        let watchdog = tokio::spawn(watchdog_task(
            Arc::clone(&self.inner),
            gen,
            started_at,
            duration,
        ));

        let mut tasks = lock_tasks(&self.inner);
        tasks.abort_session_timers(true);
        tasks.poll = Some(poll);
        tasks.countdown = Some(countdown);
        tasks.watchdog = Some(watchdog);
        Ok(())
    }

    /// Stop the running session and capture end-of-session telemetry.
    ///
    /// Stopping an already-idle board is a no-op returning `None`.
    pub async fn stop_board(&self) -> Result<Option<SegmentReadings>> {
        {
            let state = read_state(&self.inner);
            if !state.phase.is_connected() {
                drop(state);
                report_error(&self.inner, "Not connected to the board".to_string());
                return Ok(None);
            }
            if !state.phase.is_running() {
                return Ok(None);
            }
        }
        do_stop(&self.inner, true).await
    }

    // ── Configuration commands ────────────────────────────────────────────

    /// Set the drive level for one segment channel.
    ///
    /// Persists first, then attempts a live write when connected. Returns
    /// `true` when the configuration was accepted — a failed hardware
    /// write is reported as a warning but does not reject the update.
    pub async fn set_pwm_level(&self, key: CharacteristicKey, level: u8) -> bool {
        if !key.is_segment() {
            report_error(
                &self.inner,
                format!("'{key}' does not take a drive level"),
            );
            return false;
        }
        if level > MAX_DRIVE_LEVEL {
            report_error(
                &self.inner,
                "PWM level must be between 0 and 5".to_string(),
            );
            return false;
        }

        {
            let mut settings = write_settings(&self.inner);
            settings.set_level(key, level);
            if let Err(e) = self.inner.store.save(&settings) {
                warn!("Failed to persist drive level: {}", e);
            }
        }

        if read_state(&self.inner).phase.is_connected() {
            if let Err(e) = write_value(&self.inner, key, &level.to_string()).await {
                report_error(&self.inner, format!("Error setting PWM level: {e}"));
                return true;
            }
        }

        clear_error(&self.inner);
        set_status(
            &self.inner,
            &format!("{} PWM level set to {}", key.display_name(), level),
        );
        true
    }

    /// Change the global activation pattern (0 = Single, 1 = Dual,
    /// 2 = Triple). Same persist-then-apply semantics as
    /// [`set_pwm_level`](Self::set_pwm_level).
    pub async fn change_activation_mode(&self, mode: u8) -> bool {
        let Some(pattern) = ActivationMode::from_code(mode) else {
            report_error(
                &self.inner,
                "Activation mode must be between 0 and 2".to_string(),
            );
            return false;
        };

        {
            let mut settings = write_settings(&self.inner);
            settings.set_mode(pattern);
            if let Err(e) = self.inner.store.save(&settings) {
                warn!("Failed to persist activation mode: {}", e);
            }
        }

        if read_state(&self.inner).phase.is_connected() {
            let code = pattern.code().to_string();
            if let Err(e) = write_value(&self.inner, CharacteristicKey::Led, &code).await {
                report_error(&self.inner, format!("Error setting activation mode: {e}"));
                return true;
            }
        }

        clear_error(&self.inner);
        set_status(&self.inner, &format!("Activation pattern set to {pattern}"));
        true
    }

    /// Read one characteristic directly, bypassing the telemetry queue.
    pub async fn read_characteristic(&self, key: CharacteristicKey) -> Option<String> {
        match read_value(&self.inner, key).await {
            Ok(value) => Some(value),
            Err(Error::NotConnected) => {
                report_error(&self.inner, "Not connected to the board".to_string());
                None
            }
            Err(e) => {
                report_error(&self.inner, format!("Error reading {key}: {e}"));
                None
            }
        }
    }

    // ── Observable state ──────────────────────────────────────────────────

    /// Snapshot of the full observable surface.
    pub fn status(&self) -> EngineStatus {
        let state = read_state(&self.inner);
        EngineStatus {
            connection_status: state.status.clone(),
            error_message: state.error_message.clone(),
            is_connected: state.phase.is_connected(),
            is_running: state.phase.is_running(),
            is_mock_mode: state.mock_mode,
            started_at: state.started_wall,
            remaining: state.remaining.clone(),
        }
    }

    pub fn connection_status(&self) -> String {
        read_state(&self.inner).status.clone()
    }

    pub fn error_message(&self) -> Option<String> {
        read_state(&self.inner).error_message.clone()
    }

    pub fn is_connected(&self) -> bool {
        read_state(&self.inner).phase.is_connected()
    }

    pub fn is_running(&self) -> bool {
        read_state(&self.inner).phase.is_running()
    }

    pub fn is_mock_mode(&self) -> bool {
        read_state(&self.inner).mock_mode
    }

    /// Current drive levels, as persisted configuration sees them.
    pub fn pwm_levels(&self) -> BTreeMap<CharacteristicKey, u8> {
        read_settings(&self.inner).levels()
    }

    pub fn activation_mode(&self) -> ActivationMode {
        read_settings(&self.inner).mode()
    }

    /// Latest telemetry value per segment channel.
    pub fn telemetry(&self) -> SegmentReadings {
        self.inner
            .telemetry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Countdown display, `mm:ss` until auto-stop.
    pub fn remaining_time(&self) -> String {
        read_state(&self.inner).remaining.clone()
    }

    pub fn session_duration(&self) -> Duration {
        *read_duration(&self.inner)
    }

    /// Override the session duration. Takes effect at the next
    /// `start_board`; any running session keeps the duration it started
    /// with.
    pub fn set_session_duration(&self, duration: Duration) {
        *self
            .inner
            .duration
            .write()
            .unwrap_or_else(|e| e.into_inner()) = duration;
        if !read_state(&self.inner).phase.is_running() {
            let mut state = write_state(&self.inner);
            state.remaining = format_remaining(duration.as_secs());
        }
    }

    /// Depth of the pending telemetry read queue.
    pub fn pending_reads(&self) -> usize {
        self.inner.reader.len()
    }
}

// ---------------------------------------------------------------------------
// Session timer tasks
// ---------------------------------------------------------------------------

/// Telemetry polling: enqueue the six segment channels every period. The
/// reader drains them one at a time with its own pacing.
async fn poll_task(inner: Arc<EngineInner>, gen: u64) {
    let mut ticker = interval(POLL_PERIOD);
    loop {
        ticker.tick().await;
        if !session_active(&inner, gen) {
            break;
        }
        reader::enqueue_segments(&inner, gen);
    }
}

/// Countdown display: refresh `configured duration − elapsed` once per
/// second.
async fn countdown_task(inner: Arc<EngineInner>, gen: u64, started_at: Instant, duration: Duration) {
    let mut ticker = interval(COUNTDOWN_TICK);
    loop {
        ticker.tick().await;
        if !session_active(&inner, gen) {
            break;
        }
        let remaining_secs = duration.saturating_sub(started_at.elapsed()).as_secs();
        let remaining = format_remaining(remaining_secs);
        {
            let mut state = write_state(&inner);
            state.remaining = remaining.clone();
        }
        let _ = inner.events.send(EngineEvent::CountdownTick { remaining });
    }
}

/// Auto-stop watchdog: once elapsed wall-clock time reaches the configured
/// duration, run the stop-and-disconnect sequence and raise the single
/// session-ended notification.
async fn watchdog_task(inner: Arc<EngineInner>, gen: u64, started_at: Instant, duration: Duration) {
    let mut ticker = interval(WATCHDOG_TICK);
    loop {
        ticker.tick().await;
        if !session_active(&inner, gen) {
            break;
        }
        if started_at.elapsed() >= duration {
            auto_stop(&inner).await;
            break;
        }
    }
}

/// Stop-and-disconnect after the session duration elapsed. Idempotent:
/// only the caller that still observes a running session proceeds, so
/// repeated watchdog firings (or a race with a manual stop) emit at most
/// one `SessionEnded`.
async fn auto_stop(inner: &Arc<EngineInner>) {
    if !read_state(inner).phase.is_running() {
        return;
    }
    info!("Session duration elapsed, auto-stopping");

    // Drop our own handle first: do_disconnect aborts the session tasks,
    // and the watchdog must not cancel itself mid-sequence.
    lock_tasks(inner).watchdog.take();

    do_disconnect(inner).await;
    set_status(inner, "Session complete");
    let _ = inner.events.send(EngineEvent::SessionEnded);
}

// ---------------------------------------------------------------------------
// Internal operations (shared by public commands and the watchdog)
// ---------------------------------------------------------------------------

/// Write the stop flag, leave the running state, cancel session timers,
/// and take the end-of-session snapshot.
///
/// `abort_watchdog` is false on the auto-stop path, where the watchdog
/// task is driving the call and terminates on its own.
async fn do_stop(
    inner: &Arc<EngineInner>,
    abort_watchdog: bool,
) -> Result<Option<SegmentReadings>> {
    if !read_state(inner).phase.is_running() {
        return Ok(None);
    }

    if let Err(e) = write_value(inner, CharacteristicKey::Start, "0").await {
        report_error(inner, format!("Error stopping board - {e}"));
        return Err(e);
    }

    // Claim the transition; a concurrent stop lost the race and returns
    // None without touching the session fields again.
    {
        let mut state = write_state(inner);
        if !state.phase.is_running() {
            return Ok(None);
        }
        state.phase = ConnectionPhase::Connected;
        state.started_wall = None;
        state.remaining = format_remaining(read_duration(inner).as_secs());
    }
    bump(&inner.session_gen);

    lock_tasks(inner).abort_session_timers(abort_watchdog);
    inner.reader.clear();
    set_status(inner, "Board stopped");

    // One final full read, bypassing the queue suppression that applies
    // while not running.
    Ok(read_all_segments(inner).await)
}

/// Tear the connection down from any phase. No-op when already
/// disconnected.
async fn do_disconnect(inner: &Arc<EngineInner>) -> Option<SegmentReadings> {
    let phase = read_state(inner).phase;
    if !phase.is_connected() {
        return None;
    }

    let final_readings = if phase.is_running() {
        // A failed stop write still proceeds to release the transport.
        do_stop(inner, true).await.unwrap_or(None)
    } else {
        read_all_segments(inner).await
    };

    let transport = inner.transport.lock().await.take();
    if let Some(mut transport) = transport {
        transport.disconnect().await;
    }

    lock_tasks(inner).abort_all();
    inner.reader.clear();
    bump(&inner.connection_gen);
    bump(&inner.session_gen);

    {
        let mut state = write_state(inner);
        state.phase = ConnectionPhase::Disconnected;
        state.mock_mode = false;
        state.started_wall = None;
        state.remaining = format_remaining(read_duration(inner).as_secs());
    }
    set_status(inner, "Disconnected");

    final_readings
}

/// Read every segment channel once, publishing each value. Failed reads
/// are reported and skipped; the snapshot carries the successes.
async fn read_all_segments(inner: &Arc<EngineInner>) -> Option<SegmentReadings> {
    let mut readings = SegmentReadings::new();
    for key in CharacteristicKey::SEGMENTS {
        match read_value(inner, key).await {
            Ok(value) => {
                publish_telemetry(inner, key, value.clone());
                readings.insert(key, value);
            }
            Err(Error::NotConnected) => {
                report_error(inner, "Not connected to the board".to_string());
                return None;
            }
            Err(e) => {
                report_error(inner, format!("Error reading {key}: {e}"));
            }
        }
    }
    Some(readings)
}

// ---------------------------------------------------------------------------
// Shared helpers (used by the reader and reconciler modules)
// ---------------------------------------------------------------------------

/// One serialized characteristic read. The transport mutex is the
/// at-most-one-in-flight guarantee: reads and writes alike queue on it.
pub(crate) async fn read_value(inner: &EngineInner, key: CharacteristicKey) -> Result<String> {
    let mut guard = inner.transport.lock().await;
    match guard.as_mut() {
        Some(transport) => transport.read_value(key).await,
        None => Err(Error::NotConnected),
    }
}

/// One serialized characteristic write.
pub(crate) async fn write_value(
    inner: &EngineInner,
    key: CharacteristicKey,
    value: &str,
) -> Result<()> {
    let mut guard = inner.transport.lock().await;
    match guard.as_mut() {
        Some(transport) => transport.write_value(key, value).await,
        None => Err(Error::NotConnected),
    }
}

/// Whether the session that spawned a timer is still the live, running
/// one. Stale tasks use this as their first check on every tick.
pub(crate) fn session_active(inner: &EngineInner, gen: u64) -> bool {
    inner.session_gen.load(Ordering::SeqCst) == gen && read_state(inner).phase.is_running()
}

/// Whether the connection that spawned the reconciler is still live.
pub(crate) fn connection_active(inner: &EngineInner, gen: u64) -> bool {
    inner.connection_gen.load(Ordering::SeqCst) == gen && read_state(inner).phase.is_connected()
}

/// Snapshot of persisted configuration for the reconciler.
pub(crate) fn settings_snapshot(inner: &EngineInner) -> GloveSettings {
    read_settings(inner).clone()
}

pub(crate) fn publish_telemetry(inner: &EngineInner, key: CharacteristicKey, value: String) {
    {
        let mut telemetry = inner
            .telemetry
            .write()
            .unwrap_or_else(|e| e.into_inner());
        telemetry.insert(key, value.clone());
    }
    let _ = inner
        .events
        .send(EngineEvent::TelemetryUpdated { key, value });
}

/// Record a recoverable error. The latest error always overwrites the
/// previous one.
pub(crate) fn report_error(inner: &EngineInner, message: String) {
    warn!("{}", message);
    {
        let mut state = write_state(inner);
        state.error_message = Some(message.clone());
    }
    let _ = inner.events.send(EngineEvent::EngineError(message));
}

fn clear_error(inner: &EngineInner) {
    let mut state = write_state(inner);
    state.error_message = None;
}

fn set_status(inner: &EngineInner, status: &str) {
    debug!("status: {}", status);
    {
        let mut state = write_state(inner);
        state.status = status.to_string();
    }
    let _ = inner
        .events
        .send(EngineEvent::StatusChanged(status.to_string()));
}

/// Format whole seconds as the `mm:ss` countdown display.
pub(crate) fn format_remaining(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

fn bump(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

// Lock helpers: poisoning cannot leave the session fields inconsistent
// (every critical section is a plain field update), so recover the guard.

fn read_state(inner: &EngineInner) -> std::sync::RwLockReadGuard<'_, SessionState> {
    inner.state.read().unwrap_or_else(|e| e.into_inner())
}

fn write_state(inner: &EngineInner) -> std::sync::RwLockWriteGuard<'_, SessionState> {
    inner.state.write().unwrap_or_else(|e| e.into_inner())
}

fn read_settings(inner: &EngineInner) -> std::sync::RwLockReadGuard<'_, GloveSettings> {
    inner.settings.read().unwrap_or_else(|e| e.into_inner())
}

fn write_settings(inner: &EngineInner) -> std::sync::RwLockWriteGuard<'_, GloveSettings> {
    inner.settings.write().unwrap_or_else(|e| e.into_inner())
}

fn read_duration(inner: &EngineInner) -> std::sync::RwLockReadGuard<'_, Duration> {
    inner.duration.read().unwrap_or_else(|e| e.into_inner())
}

fn lock_tasks(inner: &EngineInner) -> std::sync::MutexGuard<'_, SessionTasks> {
    inner.tasks.lock().unwrap_or_else(|e| e.into_inner())
}
