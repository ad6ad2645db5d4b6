use crate::bridge::{self, Bridge, Operation};
use crate::event::{CoreEvent, PollOutcome};
use crate::snapshot;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

/// Runs polls one at a time. A tick that arrives while a poll is in flight
/// is dropped, not queued; forced and scheduled polls share the guard.
pub struct PollLoop {
    bridge: Arc<dyn Bridge>,
    events: Sender<CoreEvent>,
    launch_settle: Duration,
    busy: bool,
}

impl PollLoop {
    pub fn new(
        bridge: Arc<dyn Bridge>,
        events: Sender<CoreEvent>,
        launch_settle: Duration,
    ) -> Self {
        Self {
            bridge,
            events,
            launch_settle,
            busy: false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Starts a poll unless one is running. Returns whether a poll started.
    pub fn tick(&mut self) -> bool {
        if self.busy {
            log::trace!("poll dropped: previous poll still running");
            return false;
        }
        self.busy = true;

        let bridge = Arc::clone(&self.bridge);
        let events = self.events.clone();
        let settle = self.launch_settle;
        thread::spawn(move || {
            let outcome = poll_once(bridge.as_ref(), settle);
            let _ = events.send(CoreEvent::PollFinished(outcome));
        });
        true
    }

    /// Releases the guard once the poll's outcome has been handled.
    pub fn finish(&mut self) {
        self.busy = false;
    }
}

/// One poll: make sure the player is up, then take a snapshot. A panic
/// anywhere in the poll is reported as an unavailable player, so the
/// outcome always reaches the loop and the guard is released.
pub fn poll_once(bridge: &dyn Bridge, launch_settle: Duration) -> PollOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| poll_player(bridge, launch_settle)))
        .unwrap_or_else(|_| PollOutcome::Unavailable(String::from("player poll panicked")))
}

fn poll_player(bridge: &dyn Bridge, launch_settle: Duration) -> PollOutcome {
    let running = match bridge.run(&Operation::IsRunning) {
        Ok(raw) => bridge::parse_bool(&raw),
        Err(err) => return PollOutcome::Unavailable(format!("player unreachable: {err}")),
    };

    if !running {
        log::info!("player not running, launching it");
        if let Err(err) = bridge.run(&Operation::Launch) {
            return PollOutcome::Unavailable(format!("failed to launch player: {err}"));
        }
        thread::sleep(launch_settle);
    }

    PollOutcome::Snapshot(snapshot::build_snapshot(bridge))
}

/// Fixed-period timer, armed by the first completed poll.
#[derive(Debug)]
pub struct PollSchedule {
    period: Duration,
    next_at: Option<Instant>,
}

impl PollSchedule {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(50)),
            next_at: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.next_at.is_some()
    }

    pub fn arm(&mut self, now: Instant) {
        if self.next_at.is_none() {
            self.next_at = Some(now + self.period);
        }
    }

    /// True once per elapsed period. Missed periods are skipped rather than
    /// replayed.
    pub fn due(&mut self, now: Instant) -> bool {
        let Some(next_at) = self.next_at else {
            return false;
        };
        if now < next_at {
            return false;
        }
        let mut following = next_at + self.period;
        if following <= now {
            following = now + self.period;
        }
        self.next_at = Some(following);
        true
    }

    pub fn until_due(&self, now: Instant) -> Option<Duration> {
        self.next_at.map(|next_at| next_at.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeError;
    use crate::model::PlayState;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;

    struct LaunchBridge {
        running: Mutex<bool>,
        calls: Mutex<Vec<Operation>>,
    }

    impl Bridge for LaunchBridge {
        fn run(&self, operation: &Operation) -> Result<String, BridgeError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(operation.clone());
            }
            let mut running = self
                .running
                .lock()
                .map_err(|_| BridgeError::Script(String::from("poisoned")))?;
            match operation {
                Operation::IsRunning => Ok((*running).to_string()),
                Operation::Launch => {
                    *running = true;
                    Ok(String::new())
                }
                Operation::PlayerState => Ok(String::from("paused")),
                Operation::Volume => Ok(String::from("20")),
                _ => Err(BridgeError::Script(String::from("unsupported"))),
            }
        }
    }

    struct PanickingBridge;

    impl Bridge for PanickingBridge {
        fn run(&self, operation: &Operation) -> Result<String, BridgeError> {
            match operation {
                Operation::IsRunning => Ok(String::from("true")),
                _ => panic!("bridge exploded"),
            }
        }
    }

    /// Panics on the first `IsRunning` only, then answers like a paused player.
    #[derive(Default)]
    struct FlakyStartBridge {
        tripped: AtomicBool,
    }

    impl Bridge for FlakyStartBridge {
        fn run(&self, operation: &Operation) -> Result<String, BridgeError> {
            match operation {
                Operation::IsRunning if !self.tripped.swap(true, Ordering::SeqCst) => {
                    panic!("automation host crashed")
                }
                Operation::IsRunning => Ok(String::from("true")),
                Operation::PlayerState => Ok(String::from("paused")),
                Operation::Volume => Ok(String::from("35")),
                _ => Ok(String::new()),
            }
        }
    }

    #[test]
    fn launches_player_before_snapshot() {
        let bridge = LaunchBridge {
            running: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        };

        let outcome = poll_once(&bridge, Duration::from_millis(1));

        let PollOutcome::Snapshot(snapshot) = outcome else {
            panic!("expected snapshot");
        };
        assert_eq!(snapshot.play_state, PlayState::Paused);
        assert_eq!(snapshot.volume_percent, 20);
        let calls = bridge.calls.lock().expect("calls");
        assert_eq!(calls[0], Operation::IsRunning);
        assert_eq!(calls[1], Operation::Launch);
    }

    #[test]
    fn unreachable_player_is_reported() {
        let bridge = crate::bridge::NullBridge::new("no host");
        let outcome = poll_once(&bridge, Duration::ZERO);
        assert!(
            matches!(outcome, PollOutcome::Unavailable(message) if message.contains("no host"))
        );
    }

    #[test]
    fn builder_panic_becomes_unavailable() {
        let outcome = poll_once(&PanickingBridge, Duration::ZERO);
        assert_eq!(
            outcome,
            PollOutcome::Unavailable(String::from("player poll panicked"))
        );
    }

    #[test]
    fn panic_before_snapshot_still_releases_the_loop() {
        let (tx, rx) = mpsc::channel();
        let bridge: Arc<dyn Bridge> = Arc::new(FlakyStartBridge::default());
        let mut poller = PollLoop::new(bridge, tx, Duration::ZERO);

        assert!(poller.tick());
        let event = rx.recv_timeout(Duration::from_secs(2)).expect("poll event");
        assert!(matches!(
            event,
            CoreEvent::PollFinished(PollOutcome::Unavailable(message)) if message.contains("panicked")
        ));

        poller.finish();
        assert!(poller.tick());
        let event = rx.recv_timeout(Duration::from_secs(2)).expect("second poll");
        let CoreEvent::PollFinished(PollOutcome::Snapshot(snapshot)) = event else {
            panic!("expected snapshot, got {event:?}");
        };
        assert_eq!(snapshot.volume_percent, 35);
    }

    #[test]
    fn busy_loop_drops_ticks() {
        let (tx, rx) = mpsc::channel();
        let bridge: Arc<dyn Bridge> = Arc::new(crate::bridge::NullBridge::new("offline"));
        let mut poller = PollLoop::new(bridge, tx, Duration::ZERO);

        assert!(poller.tick());
        assert!(!poller.tick());
        assert!(poller.is_busy());

        let event = rx.recv_timeout(Duration::from_secs(2)).expect("poll event");
        assert!(matches!(event, CoreEvent::PollFinished(PollOutcome::Unavailable(_))));
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        poller.finish();
        assert!(poller.tick());
    }

    #[test]
    fn schedule_fires_once_per_period_after_arming() {
        let start = Instant::now();
        let mut schedule = PollSchedule::new(Duration::from_millis(1000));
        assert!(!schedule.due(start + Duration::from_secs(5)));

        schedule.arm(start);
        assert!(!schedule.due(start + Duration::from_millis(999)));
        assert!(schedule.due(start + Duration::from_millis(1000)));
        assert!(!schedule.due(start + Duration::from_millis(1500)));
        assert!(schedule.due(start + Duration::from_millis(2000)));

        assert!(schedule.due(start + Duration::from_millis(9000)));
        assert!(!schedule.due(start + Duration::from_millis(9500)));
        assert!(schedule.due(start + Duration::from_millis(10000)));
    }
}
