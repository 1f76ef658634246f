//! Disconnect monitoring and forfeits.

use std::sync::Arc;
use std::time::Duration;

use derive_getters::Getters;
use derive_new::new;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, instrument};

use crate::session::{GameSession, SessionHandle};

/// Timing of the liveness monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, new)]
pub struct LivenessPolicy {
    /// Time between checks.
    poll_interval: Duration,
    /// How long a participant may stay away.
    grace_period: Duration,
}

/// What one monitor tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Game is over or the identity has no seat.
    Stop,
    /// Participant is connected.
    Healthy,
    /// Disconnected, still within the grace period.
    Pending,
    /// Disconnected past the grace period.
    Forfeit,
}

/// Judges the seat of `identity` at `now`.
pub fn assess(session: &GameSession, identity: &str, now: Instant, grace: Duration) -> Verdict {
    if session.is_over() {
        return Verdict::Stop;
    }
    let Some(liveness) = session.liveness(identity) else {
        return Verdict::Stop;
    };
    if *liveness.connected() {
        return Verdict::Healthy;
    }
    match liveness.last_seen() {
        Some(seen) if now.saturating_duration_since(*seen) > grace => Verdict::Forfeit,
        _ => Verdict::Pending,
    }
}

/// Called once when a monitor forfeits a game.
pub trait ForfeitHook: Send + Sync {
    /// `forfeiting` lost `handle`'s game by staying away.
    fn on_forfeit(&self, handle: &SessionHandle, forfeiting: &str);
}

/// Background watcher of one human seat.
#[derive(Debug)]
pub struct LivenessMonitor;

impl LivenessMonitor {
    /// Spawns a monitor for `identity` unless one already runs for that seat.
    #[instrument(skip(handle, hook), fields(session_id = %handle.id()))]
    pub fn spawn(
        handle: SessionHandle,
        identity: String,
        policy: LivenessPolicy,
        hook: Arc<dyn ForfeitHook>,
    ) -> Option<JoinHandle<()>> {
        if !handle.with_mut(|s| s.claim_monitor(&identity)) {
            debug!("Monitor already running");
            return None;
        }
        debug!("Monitor started");
        Some(tokio::spawn(Self::watch(handle, identity, policy, hook)))
    }

    async fn watch(
        handle: SessionHandle,
        identity: String,
        policy: LivenessPolicy,
        hook: Arc<dyn ForfeitHook>,
    ) {
        let period = policy.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        loop {
            ticker.tick().await;
            let now = Instant::now();
            // Judge and forfeit under one session lock.
            let verdict = handle.with_mut(|s| {
                let verdict = match assess(s, &identity, now, policy.grace_period) {
                    Verdict::Forfeit if s.forfeit(&identity) != Ok(true) => Verdict::Stop,
                    verdict => verdict,
                };
                if matches!(verdict, Verdict::Stop | Verdict::Forfeit) {
                    s.release_monitor(&identity);
                }
                verdict
            });

            match verdict {
                Verdict::Healthy | Verdict::Pending => continue,
                Verdict::Stop => {
                    debug!(session_id = %handle.id(), identity = %identity, "Monitor stopped");
                    return;
                }
                Verdict::Forfeit => {
                    info!(session_id = %handle.id(), identity = %identity, "Player forfeited after disconnect");
                    hook.on_forfeit(&handle, &identity);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Participant, SessionId};
    use connect4_game::Winner;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ForfeitHook for Recorder {
        fn on_forfeit(&self, _handle: &SessionHandle, forfeiting: &str) {
            self.0.lock().expect("lock").push(forfeiting.to_string());
        }
    }

    fn session() -> GameSession {
        GameSession::new(
            SessionId::from("live"),
            Participant::Human("alice".into()),
            Participant::Human("bob".into()),
        )
    }

    fn policy() -> LivenessPolicy {
        LivenessPolicy::new(Duration::from_secs(5), Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn test_assess() {
        let grace = Duration::from_secs(30);
        let mut s = session();
        let start = Instant::now();
        assert_eq!(assess(&s, "alice", start, grace), Verdict::Healthy);
        assert_eq!(assess(&s, "carol", start, grace), Verdict::Stop);

        s.mark_disconnected("alice", start).expect("seat");
        assert_eq!(assess(&s, "alice", start + grace, grace), Verdict::Pending);
        assert_eq!(
            assess(&s, "alice", start + grace + Duration::from_millis(1), grace),
            Verdict::Forfeit
        );

        s.forfeit("alice").expect("seat");
        assert_eq!(assess(&s, "alice", start + grace * 2, grace), Verdict::Stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_forfeits_once() {
        let handle = SessionHandle::new(session());
        let recorder = Arc::new(Recorder::default());
        handle.with_mut(|s| s.mark_disconnected("bob", Instant::now())).expect("seat");

        let task = LivenessMonitor::spawn(handle.clone(), "bob".into(), policy(), recorder.clone())
            .expect("spawned");
        assert!(
            LivenessMonitor::spawn(handle.clone(), "bob".into(), policy(), recorder.clone())
                .is_none()
        );
        task.await.expect("monitor");

        assert_eq!(handle.with(GameSession::winner), Winner::PlayerOne);
        assert_eq!(*recorder.0.lock().expect("lock"), vec!["bob".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_within_grace_keeps_game() {
        let handle = SessionHandle::new(session());
        let recorder = Arc::new(Recorder::default());
        handle.with_mut(|s| s.mark_disconnected("alice", Instant::now())).expect("seat");
        let _task = LivenessMonitor::spawn(handle.clone(), "alice".into(), policy(), recorder.clone());

        tokio::time::sleep(Duration::from_secs(12)).await;
        handle.with_mut(|s| s.mark_reconnected("alice")).expect("seat");
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(!handle.is_over());
        assert!(recorder.0.lock().expect("lock").is_empty());
    }
}
