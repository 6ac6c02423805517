//! Background trajectory dispatch
//!
//! Playing a trajectory hands the goal to a worker runtime and returns at
//! once. The worker waits for the executor, the configured timeout, or a
//! cancel request, whichever comes first, and posts exactly one
//! [`PlayEvent`] to the dispatcher's queue. The UI thread drains the queue
//! with [`Dispatcher::try_event`] and never blocks.

use super::executor::{GoalState, TrajectoryExecutor};
use super::trajectory::build_goal;
use crate::waypoint::Waypoint;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::oneshot;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to start dispatcher runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Final result of one play request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The executor reported a final state
    Finished(GoalState),
    /// The timeout elapsed first; the goal may still be running remotely
    TimedOut,
    /// The play was cancelled locally
    Cancelled,
    /// The goal could not be submitted
    Failed(String),
}

/// Result posted back to the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayEvent {
    pub id: u64,
    pub outcome: PlayOutcome,
}

/// Handle to an in-flight play request
#[derive(Debug)]
pub struct PlayHandle {
    id: u64,
    cancel: Option<oneshot::Sender<()>>,
}

impl PlayHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop waiting for this play; a `Cancelled` event follows
    ///
    /// Has no effect once the play already finished.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

/// Convert a timeout in seconds; zero, negative or non-finite means no limit
pub fn timeout_from_secs(seconds: f64) -> Option<Duration> {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}

/// Runs play requests against an executor off the calling thread
pub struct Dispatcher {
    runtime: Runtime,
    executor: Arc<dyn TrajectoryExecutor>,
    events_tx: Sender<PlayEvent>,
    events_rx: Receiver<PlayEvent>,
    next_id: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher with a single worker thread
    pub fn new(executor: Arc<dyn TrajectoryExecutor>) -> Result<Self, DispatchError> {
        Self::with_worker_threads(executor, 1)
    }

    pub fn with_worker_threads(
        executor: Arc<dyn TrajectoryExecutor>,
        worker_threads: usize,
    ) -> Result<Self, DispatchError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("trajectory-dispatch")
            .enable_all()
            .build()?;
        let (events_tx, events_rx) = mpsc::channel();

        Ok(Dispatcher {
            runtime,
            executor,
            events_tx,
            events_rx,
            next_id: AtomicU64::new(1),
        })
    }

    /// Name of the action served by the executor
    pub fn action_name(&self) -> &str {
        self.executor.name()
    }

    /// Send the waypoints as one goal and wait for it in the background
    ///
    /// `timeout` of `None` waits until the executor reports a final state.
    pub fn play(&self, waypoints: &[Waypoint], timeout: Option<Duration>) -> PlayHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let goal = build_goal(waypoints);
        let executor = Arc::clone(&self.executor);
        let events = self.events_tx.clone();
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        info!(
            id,
            action = executor.name(),
            points = goal.trajectory.points.len(),
            timeout = ?timeout,
            "Sending goal"
        );

        self.runtime.spawn(async move {
            let execution = async {
                let result = match timeout {
                    Some(limit) => tokio::time::timeout(limit, executor.execute(goal)).await,
                    None => Ok(executor.execute(goal).await),
                };
                match result {
                    Ok(Ok(state)) => PlayOutcome::Finished(state),
                    Ok(Err(e)) => PlayOutcome::Failed(e.to_string()),
                    Err(_) => PlayOutcome::TimedOut,
                }
            };

            let outcome = tokio::select! {
                Ok(()) = cancel_rx => PlayOutcome::Cancelled,
                outcome = execution => outcome,
            };

            match &outcome {
                PlayOutcome::Finished(state) if !state.is_done() => {
                    warn!(id, %state, "Executor returned a state that is not final")
                }
                PlayOutcome::Finished(state) => info!(id, %state, "Action finished"),
                PlayOutcome::TimedOut => info!(id, "Action did not finish before the time out"),
                PlayOutcome::Cancelled => info!(id, "Action wait cancelled"),
                PlayOutcome::Failed(reason) => warn!(id, %reason, "Action could not be sent"),
            }

            // The receiver lives as long as the dispatcher
            let _ = events.send(PlayEvent { id, outcome });
        });

        PlayHandle {
            id,
            cancel: Some(cancel_tx),
        }
    }

    /// Take the next finished play without blocking
    pub fn try_event(&self) -> Option<PlayEvent> {
        match self.events_rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Block up to `timeout` for the next finished play
    pub fn wait_event(&self, timeout: Duration) -> Option<PlayEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::executor::ExecutorError;
    use crate::control::trajectory::FollowJointTrajectoryGoal;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records goals and answers after a delay
    struct ScriptedExecutor {
        delay: Duration,
        reply: Result<GoalState, ExecutorError>,
        goals: Mutex<Vec<FollowJointTrajectoryGoal>>,
    }

    impl ScriptedExecutor {
        fn new(delay: Duration, reply: Result<GoalState, ExecutorError>) -> Arc<Self> {
            Arc::new(ScriptedExecutor {
                delay,
                reply,
                goals: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TrajectoryExecutor for ScriptedExecutor {
        async fn execute(
            &self,
            goal: FollowJointTrajectoryGoal,
        ) -> Result<GoalState, ExecutorError> {
            self.goals.lock().unwrap().push(goal);
            tokio::time::sleep(self.delay).await;
            self.reply.clone()
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    fn waypoints() -> Vec<Waypoint> {
        vec![Waypoint::new([10.0, 20.0, 30.0, 40.0, 50.0, 60.0], 2.0)]
    }

    #[test]
    fn test_reports_executor_state() {
        let executor = ScriptedExecutor::new(Duration::ZERO, Ok(GoalState::Aborted));
        let dispatcher = Dispatcher::new(executor.clone()).unwrap();

        let handle = dispatcher.play(&waypoints(), Some(Duration::from_secs(10)));
        let event = dispatcher.wait_event(WAIT).unwrap();

        assert_eq!(event.id, handle.id());
        assert_eq!(event.outcome, PlayOutcome::Finished(GoalState::Aborted));
        assert_eq!(executor.goals.lock().unwrap()[0].trajectory.points.len(), 1);
    }

    #[test]
    fn test_non_final_state_is_passed_through() {
        let executor = ScriptedExecutor::new(Duration::ZERO, Ok(GoalState::Active));
        let dispatcher = Dispatcher::new(executor).unwrap();

        let _handle = dispatcher.play(&waypoints(), None);

        assert_eq!(
            dispatcher.wait_event(WAIT).unwrap().outcome,
            PlayOutcome::Finished(GoalState::Active)
        );
    }

    #[test]
    fn test_times_out() {
        let executor = ScriptedExecutor::new(Duration::from_secs(60), Ok(GoalState::Succeeded));
        let dispatcher = Dispatcher::new(executor).unwrap();

        let _handle = dispatcher.play(&waypoints(), Some(Duration::from_millis(20)));

        assert_eq!(
            dispatcher.wait_event(WAIT).unwrap().outcome,
            PlayOutcome::TimedOut
        );
    }

    #[test]
    fn test_no_timeout_waits_for_completion() {
        let executor =
            ScriptedExecutor::new(Duration::from_millis(50), Ok(GoalState::Succeeded));
        let dispatcher = Dispatcher::new(executor).unwrap();

        let _handle = dispatcher.play(&waypoints(), timeout_from_secs(0.0));

        assert_eq!(
            dispatcher.wait_event(WAIT).unwrap().outcome,
            PlayOutcome::Finished(GoalState::Succeeded)
        );
    }

    #[test]
    fn test_cancel_in_flight() {
        let executor = ScriptedExecutor::new(Duration::from_secs(60), Ok(GoalState::Succeeded));
        let dispatcher = Dispatcher::new(executor).unwrap();

        let mut handle = dispatcher.play(&waypoints(), None);
        assert_eq!(dispatcher.try_event(), None);
        handle.cancel();

        assert_eq!(
            dispatcher.wait_event(WAIT).unwrap().outcome,
            PlayOutcome::Cancelled
        );
    }

    #[test]
    fn test_dropped_handle_does_not_cancel() {
        let executor =
            ScriptedExecutor::new(Duration::from_millis(20), Ok(GoalState::Succeeded));
        let dispatcher = Dispatcher::new(executor).unwrap();

        drop(dispatcher.play(&waypoints(), None));

        assert_eq!(
            dispatcher.wait_event(WAIT).unwrap().outcome,
            PlayOutcome::Finished(GoalState::Succeeded)
        );
    }

    #[test]
    fn test_send_failure() {
        let executor = ScriptedExecutor::new(
            Duration::ZERO,
            Err(ExecutorError::ServerUnavailable("/arm".to_string())),
        );
        let dispatcher = Dispatcher::new(executor).unwrap();

        let _handle = dispatcher.play(&waypoints(), None);

        assert!(matches!(
            dispatcher.wait_event(WAIT).unwrap().outcome,
            PlayOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_timeout_conversion() {
        assert_eq!(timeout_from_secs(0.0), None);
        assert_eq!(timeout_from_secs(-1.0), None);
        assert_eq!(timeout_from_secs(f64::NAN), None);
        assert_eq!(timeout_from_secs(1.5), Some(Duration::from_millis(1500)));
    }
}
