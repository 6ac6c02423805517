//! Trajectory executor interface

use super::trajectory::FollowJointTrajectoryGoal;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// State of a submitted goal as reported by the action server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalState {
    Pending,
    Active,
    Recalled,
    Rejected,
    Preempted,
    Aborted,
    Succeeded,
    Lost,
}

impl GoalState {
    /// Whether the goal has stopped executing
    pub fn is_done(self) -> bool {
        !matches!(self, GoalState::Pending | GoalState::Active)
    }
}

impl fmt::Display for GoalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GoalState::Pending => "PENDING",
            GoalState::Active => "ACTIVE",
            GoalState::Recalled => "RECALLED",
            GoalState::Rejected => "REJECTED",
            GoalState::Preempted => "PREEMPTED",
            GoalState::Aborted => "ABORTED",
            GoalState::Succeeded => "SUCCEEDED",
            GoalState::Lost => "LOST",
        };
        f.write_str(name)
    }
}

/// Failure to hand a goal to the executor
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    #[error("action server {0} unavailable")]
    ServerUnavailable(String),

    #[error("failed to send goal: {0}")]
    Send(String),
}

/// An external service that executes joint trajectory goals
#[async_trait]
pub trait TrajectoryExecutor: Send + Sync {
    /// Submit `goal` and resolve once the executor reports a final state
    async fn execute(&self, goal: FollowJointTrajectoryGoal) -> Result<GoalState, ExecutorError>;

    /// Name of the action this executor serves
    fn name(&self) -> &str;
}
