//! Simulated trajectory controller
//!
//! Stands in for the arm's joint trajectory controller when no robot is
//! connected. Goals are validated the way the controller checks them, then
//! "executed" by waiting out the trajectory's duration.

use super::executor::{ExecutorError, GoalState, TrajectoryExecutor};
use super::trajectory::FollowJointTrajectoryGoal;
use crate::common::{JOINT_COUNT, JOINT_NAMES};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on a simulated playback
const MAX_PLAYBACK: Duration = Duration::from_secs(u32::MAX as u64);

#[derive(Debug)]
pub struct SimulatedExecutor {
    action_name: String,
    time_scale: f64,
    goals_received: AtomicUsize,
}

impl SimulatedExecutor {
    /// Create a simulated controller; `time_scale` stretches playback time
    pub fn new(action_name: impl Into<String>, time_scale: f64) -> Self {
        SimulatedExecutor {
            action_name: action_name.into(),
            time_scale: if time_scale.is_finite() && time_scale >= 0.0 {
                time_scale
            } else {
                1.0
            },
            goals_received: AtomicUsize::new(0),
        }
    }

    pub fn goals_received(&self) -> usize {
        self.goals_received.load(Ordering::Relaxed)
    }

    fn validate(goal: &FollowJointTrajectoryGoal) -> Result<(), GoalState> {
        let trajectory = &goal.trajectory;
        if trajectory.joint_names != JOINT_NAMES {
            warn!(names = ?trajectory.joint_names, "Joint names do not match the controller");
            return Err(GoalState::Rejected);
        }

        for (index, point) in trajectory.points.iter().enumerate() {
            if point.positions.len() != JOINT_COUNT || point.velocities.len() != JOINT_COUNT {
                warn!(index, "Trajectory point has the wrong dimension");
                return Err(GoalState::Rejected);
            }
        }

        let decreasing = trajectory
            .points
            .windows(2)
            .any(|pair| pair[1].time_from_start < pair[0].time_from_start);
        if decreasing {
            warn!("Trajectory time offsets are not increasing");
            return Err(GoalState::Aborted);
        }

        Ok(())
    }
}

#[async_trait]
impl TrajectoryExecutor for SimulatedExecutor {
    async fn execute(&self, goal: FollowJointTrajectoryGoal) -> Result<GoalState, ExecutorError> {
        self.goals_received.fetch_add(1, Ordering::Relaxed);

        if let Err(state) = Self::validate(&goal) {
            return Ok(state);
        }

        let playback = Duration::try_from_secs_f64(
            goal.total_duration().as_secs_f64() * self.time_scale,
        )
        .unwrap_or(MAX_PLAYBACK)
        .min(MAX_PLAYBACK);
        debug!(points = goal.trajectory.points.len(), playback = ?playback, "Simulating trajectory");
        tokio::time::sleep(playback).await;

        Ok(GoalState::Succeeded)
    }

    fn name(&self) -> &str {
        &self.action_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::trajectory::build_goal;
    use crate::waypoint::Waypoint;

    fn run(executor: &SimulatedExecutor, goal: FollowJointTrajectoryGoal) -> GoalState {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(executor.execute(goal))
            .unwrap()
    }

    #[test]
    fn test_succeeds_on_valid_goal() {
        let executor = SimulatedExecutor::new("sim", 0.0);
        let goal = build_goal(&[
            Waypoint::new([0.0; 6], 1.0),
            Waypoint::new([10.0; 6], 2.0),
        ]);
        assert_eq!(run(&executor, goal), GoalState::Succeeded);
        assert_eq!(executor.goals_received(), 1);
    }

    #[test]
    fn test_aborts_decreasing_times() {
        let executor = SimulatedExecutor::new("sim", 0.0);
        let goal = build_goal(&[
            Waypoint::new([0.0; 6], 3.0),
            Waypoint::new([10.0; 6], 1.0),
        ]);
        assert_eq!(run(&executor, goal), GoalState::Aborted);
    }

    #[test]
    fn test_rejects_wrong_joint_names() {
        let executor = SimulatedExecutor::new("sim", 0.0);
        let mut goal = build_goal(&[Waypoint::default()]);
        goal.trajectory.joint_names.pop();
        assert_eq!(run(&executor, goal), GoalState::Rejected);
    }

    #[test]
    fn test_rejects_wrong_dimension() {
        let executor = SimulatedExecutor::new("sim", 0.0);
        let mut goal = build_goal(&[Waypoint::default()]);
        goal.trajectory.points[0].positions.push(0.0);
        assert_eq!(run(&executor, goal), GoalState::Rejected);
    }
}
