//! Clock face producer and wall-clock plumbing.
//!
//! The clock face only changes once a minute, so the producer repaints on
//! the tick whose seconds field is zero and does nothing on every other
//! tick. A freshly entered clock mode paints immediately instead of waiting
//! for the next minute.
//!
//! Before the clock can be trusted, the wall time must have been set at
//! least once. A year before [`SYNC_EPOCH_YEAR`] means it never was; startup
//! then waits, with a hard deadline, for a [`TimeSync`] collaborator running
//! on its own thread.
//!
//! ## Rust concepts
//! - Traits for external collaborators (`TimeSource`, `TimeSync`)
//! - `std::sync::mpsc::Receiver::recv_timeout` for a bounded wait
//! - `thread::Builder` for named worker threads

use crate::actuator::Actuator;
use crate::engine::{CommitReport, UpdateEngine};
use crate::error::{Result, SignError};
use crate::font::{FontSize, render_text};
use crate::frame::Frame;
use chrono::{Datelike, Timelike};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Any year earlier than this means the wall clock was never set.
pub const SYNC_EPOCH_YEAR: i32 = 2019;

/// Top-left corner of the hours field.
pub const HOURS_ORIGIN: (i32, i32) = (1, 5);
/// Top-left corner of the minutes field.
pub const MINUTES_ORIGIN: (i32, i32) = (11, 5);
/// The two colon dots between hours and minutes.
pub const COLON_DOTS: [(i32, i32); 2] = [(9, 6), (9, 8)];

// ── Time source ──────────────────────────────────────────────────────

/// A sampled wall-clock reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallTime {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub year: i32,
}

impl WallTime {
    pub fn new(hours: u32, minutes: u32, seconds: u32, year: i32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            year,
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.year >= SYNC_EPOCH_YEAR
    }
}

pub trait TimeSource {
    fn current_wall_time(&self) -> WallTime;
}

/// Reads the host clock through chrono, in local time or UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock {
    utc: bool,
}

impl LocalClock {
    pub fn local() -> Self {
        Self { utc: false }
    }

    pub fn utc() -> Self {
        Self { utc: true }
    }
}

impl TimeSource for LocalClock {
    fn current_wall_time(&self) -> WallTime {
        if self.utc {
            let now = chrono::Utc::now();
            WallTime::new(now.hour(), now.minute(), now.second(), now.year())
        } else {
            let now = chrono::Local::now();
            WallTime::new(now.hour(), now.minute(), now.second(), now.year())
        }
    }
}

// ── Clock producer ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ClockProducer {
    armed: bool,
    minutes_shown: u64,
}

impl ClockProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paint on the next tick regardless of the seconds field.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Number of clock faces painted so far.
    pub fn minutes_shown(&self) -> u64 {
        self.minutes_shown
    }

    /// Repaint the face if `now` is the top of a minute (or the producer
    /// is armed). Returns `None` when nothing was committed.
    pub fn tick<A: Actuator>(
        &mut self,
        now: WallTime,
        frame: &mut Frame,
        engine: &mut UpdateEngine<A>,
    ) -> Result<Option<CommitReport>> {
        if now.seconds != 0 && !self.armed {
            return Ok(None);
        }
        self.armed = false;

        if now.seconds == 0 {
            self.minutes_shown += 1;
            tracing::info!(
                "New minute {:02}:{:02} (minutes counted: {})",
                now.hours,
                now.minutes,
                self.minutes_shown
            );
        }

        draw_clock_face(frame, now.hours, now.minutes);
        engine.commit(frame, false).map(Some)
    }
}

/// Clear `frame` and draw `HH:MM` with the small font.
pub fn draw_clock_face(frame: &mut Frame, hours: u32, minutes: u32) {
    frame.clear();
    let (hc, hr) = HOURS_ORIGIN;
    let (mc, mr) = MINUTES_ORIGIN;
    render_text(frame, hc, hr, &format!("{hours:02}"), FontSize::Small3x5);
    render_text(frame, mc, mr, &format!("{minutes:02}"), FontSize::Small3x5);
    for (col, row) in COLON_DOTS {
        frame.set_dot_clipped(col, row);
    }
}

// ── Time synchronization ─────────────────────────────────────────────

/// Something that can bring the wall clock into sync.
pub trait TimeSync {
    /// Try up to `max_retries` times, waiting `timeout` between attempts.
    fn synchronize(&mut self, timeout: Duration, max_retries: u32) -> Result<()>;
}

/// Waits for the host OS to set its clock (e.g. via its NTP daemon).
pub struct HostClockSync<T> {
    source: T,
}

impl<T: TimeSource> HostClockSync<T> {
    pub fn new(source: T) -> Self {
        Self { source }
    }
}

impl<T: TimeSource> TimeSync for HostClockSync<T> {
    fn synchronize(&mut self, timeout: Duration, max_retries: u32) -> Result<()> {
        for attempt in 1..=max_retries {
            if self.source.current_wall_time().is_synchronized() {
                tracing::info!("System time is set");
                return Ok(());
            }
            tracing::info!(
                "Waiting for system time to be set... ({}/{})",
                attempt,
                max_retries
            );
            thread::sleep(timeout);
        }
        if self.source.current_wall_time().is_synchronized() {
            return Ok(());
        }
        Err(SignError::TimeSync {
            attempts: max_retries,
        })
    }
}

/// Retry budget for the startup time sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl SyncPolicy {
    /// Longest the caller will wait before giving up on the sync thread.
    ///
    /// Saturates at `Duration::MAX` for budgets too large to represent.
    pub fn deadline(&self) -> Duration {
        self.timeout.saturating_mul(self.max_retries.saturating_add(1))
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            max_retries: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The clock was already set; no sync was needed.
    AlreadySet,
    /// The sync collaborator reported success.
    Synchronized,
    /// Sync failed or ran out of time; the clock shows whatever it has.
    Degraded,
}

/// Run `sync` on its own thread and wait for it, at most `policy.deadline()`.
pub fn await_time_sync<S>(mut sync: S, policy: SyncPolicy) -> SyncOutcome
where
    S: TimeSync + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("time-sync".to_string())
        .spawn(move || {
            // The receiver may have given up already; nothing to do then.
            let _ = tx.send(sync.synchronize(policy.timeout, policy.max_retries));
        });

    if let Err(e) = spawned {
        tracing::warn!("Could not start time sync thread: {}", e);
        return SyncOutcome::Degraded;
    }

    match rx.recv_timeout(policy.deadline()) {
        Ok(Ok(())) => SyncOutcome::Synchronized,
        Ok(Err(e)) => {
            tracing::warn!("{}; continuing with unsynchronized local time", e);
            SyncOutcome::Degraded
        }
        Err(_) => {
            tracing::warn!(
                "Time sync did not finish within {:?}; continuing with unsynchronized local time",
                policy.deadline()
            );
            SyncOutcome::Degraded
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::tests::RecordingActuator;
    use crate::frame::DotState;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::BTreeSet;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    /// A clock tests can move by hand. Clones share the same reading.
    #[derive(Clone)]
    pub(crate) struct ManualClock(pub Arc<Mutex<WallTime>>);

    impl ManualClock {
        pub fn at(time: WallTime) -> Self {
            Self(Arc::new(Mutex::new(time)))
        }

        pub fn set(&self, time: WallTime) {
            *self.0.lock().unwrap() = time;
        }
    }

    impl TimeSource for ManualClock {
        fn current_wall_time(&self) -> WallTime {
            *self.0.lock().unwrap()
        }
    }

    fn settled_engine(columns: usize, rows: usize) -> UpdateEngine<RecordingActuator> {
        let mut engine = UpdateEngine::new(RecordingActuator::default(), columns, rows);
        engine.commit(&Frame::new(columns, rows), false).unwrap();
        engine.actuator_mut().calls.clear();
        engine
    }

    #[rstest]
    #[case(2019, true)]
    #[case(2026, true)]
    #[case(2018, false)]
    #[case(1970, false)]
    fn synchronized_by_year(#[case] year: i32, #[case] expected: bool) {
        assert_eq!(WallTime::new(0, 0, 0, year).is_synchronized(), expected);
    }

    #[test]
    fn clock_face_on_16x9_sign() {
        let mut engine = UpdateEngine::new(RecordingActuator::default(), 16, 9);
        let mut frame = Frame::new(16, 9);
        draw_clock_face(&mut frame, 12, 5);

        let report = engine.commit(&frame, true).unwrap();
        assert_eq!(report.actuated, 16 * 9);

        let set: BTreeSet<(usize, usize)> = engine
            .actuator()
            .calls
            .iter()
            .filter(|(_, _, s)| *s == DotState::Set)
            .map(|(c, r, _)| (*c, *r))
            .collect();

        // Glyph rows 0..=3 land on sign rows 5..=8; row 9 is off the sign,
        // and only the first column of the trailing '5' fits.
        let expected: BTreeSet<(usize, usize)> = [
            // '1' at column 1
            (2, 5), (1, 6), (2, 6), (2, 7), (2, 8),
            // '2' at column 5
            (5, 5), (6, 5), (7, 5), (7, 6), (5, 7), (6, 7), (7, 7), (5, 8),
            // '0' at column 11
            (11, 5), (12, 5), (13, 5), (11, 6), (13, 6), (11, 7), (13, 7), (11, 8), (13, 8),
            // '5' at column 15
            (15, 5), (15, 6), (15, 7),
            // colon
            (9, 6), (9, 8),
        ]
        .into_iter()
        .collect();

        assert_eq!(set, expected);
    }

    #[test]
    fn repaints_only_at_top_of_minute() {
        let mut engine = settled_engine(20, 12);
        let mut frame = Frame::new(20, 12);
        let mut clock = ClockProducer::new();

        let quiet = clock
            .tick(WallTime::new(9, 41, 17, 2026), &mut frame, &mut engine)
            .unwrap();
        assert_eq!(quiet, None);
        assert!(engine.actuator().calls.is_empty());

        let painted = clock
            .tick(WallTime::new(9, 42, 0, 2026), &mut frame, &mut engine)
            .unwrap()
            .unwrap();
        assert!(painted.actuated > 0);
        assert_eq!(clock.minutes_shown(), 1);

        engine.actuator_mut().calls.clear();
        for seconds in [1, 2] {
            let outcome = clock
                .tick(WallTime::new(9, 42, seconds, 2026), &mut frame, &mut engine)
                .unwrap();
            assert_eq!(outcome, None);
        }
        assert!(engine.actuator().calls.is_empty());
    }

    #[test]
    fn armed_producer_paints_mid_minute_once() {
        let mut engine = settled_engine(20, 12);
        let mut frame = Frame::new(20, 12);
        let mut clock = ClockProducer::new();
        clock.arm();

        let first = clock
            .tick(WallTime::new(7, 3, 29, 2026), &mut frame, &mut engine)
            .unwrap();
        assert!(first.is_some());
        assert_eq!(clock.minutes_shown(), 0);

        let second = clock
            .tick(WallTime::new(7, 3, 30, 2026), &mut frame, &mut engine)
            .unwrap();
        assert_eq!(second, None);
    }

    #[test]
    fn minute_change_flips_only_changed_digit() {
        let mut engine = settled_engine(20, 12);
        let mut frame = Frame::new(20, 12);
        let mut clock = ClockProducer::new();
        clock
            .tick(WallTime::new(10, 10, 0, 2026), &mut frame, &mut engine)
            .unwrap();
        engine.actuator_mut().calls.clear();

        clock
            .tick(WallTime::new(10, 11, 0, 2026), &mut frame, &mut engine)
            .unwrap();
        // Only the last minute digit (columns 15..=17) changes from '0' to '1'.
        assert!(!engine.actuator().calls.is_empty());
        assert!(
            engine
                .actuator()
                .calls
                .iter()
                .all(|(c, _, _)| (15..=17).contains(c))
        );
    }

    #[test]
    fn host_sync_succeeds_when_clock_is_set() {
        let clock = ManualClock::at(WallTime::new(0, 0, 0, 2026));
        let mut sync = HostClockSync::new(clock);
        assert!(sync.synchronize(Duration::from_millis(1), 3).is_ok());
    }

    #[test]
    fn host_sync_gives_up_after_retries() {
        let clock = ManualClock::at(WallTime::new(0, 0, 0, 1970));
        let mut sync = HostClockSync::new(clock);
        let err = sync.synchronize(Duration::from_millis(1), 3).unwrap_err();
        assert_eq!(err, SignError::TimeSync { attempts: 3 });
    }

    #[test]
    fn await_reports_success() {
        let clock = ManualClock::at(WallTime::new(0, 0, 0, 2026));
        let policy = SyncPolicy {
            timeout: Duration::from_millis(5),
            max_retries: 2,
        };
        assert_eq!(
            await_time_sync(HostClockSync::new(clock), policy),
            SyncOutcome::Synchronized
        );
    }

    #[test]
    fn await_degrades_on_failure() {
        let clock = ManualClock::at(WallTime::new(0, 0, 0, 1970));
        let policy = SyncPolicy {
            timeout: Duration::from_millis(2),
            max_retries: 2,
        };
        assert_eq!(
            await_time_sync(HostClockSync::new(clock), policy),
            SyncOutcome::Degraded
        );
    }

    struct StuckSync;

    impl TimeSync for StuckSync {
        fn synchronize(&mut self, _timeout: Duration, _max_retries: u32) -> Result<()> {
            thread::sleep(Duration::from_secs(5));
            Ok(())
        }
    }

    #[test]
    fn await_is_bounded_by_deadline() {
        let policy = SyncPolicy {
            timeout: Duration::from_millis(20),
            max_retries: 2,
        };
        let started = Instant::now();
        assert_eq!(await_time_sync(StuckSync, policy), SyncOutcome::Degraded);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn default_policy_matches_startup_budget() {
        let policy = SyncPolicy::default();
        assert_eq!(policy.max_retries, 10);
        assert_eq!(policy.deadline(), Duration::from_secs(22));
    }

    #[rstest]
    #[case(Duration::from_secs(2), u32::MAX, Duration::from_secs(2 * (u32::MAX as u64)))]
    #[case(Duration::from_secs(u64::MAX / 4), 10, Duration::MAX)]
    #[case(Duration::MAX, u32::MAX, Duration::MAX)]
    fn oversized_budget_saturates(
        #[case] timeout: Duration,
        #[case] max_retries: u32,
        #[case] expected: Duration,
    ) {
        let policy = SyncPolicy {
            timeout,
            max_retries,
        };
        assert_eq!(policy.deadline(), expected);
    }
}
