//! Joint trajectory goal messages

use crate::common::{JOINT_COUNT, JOINT_NAMES};
use crate::waypoint::Waypoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One point of a joint trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointTrajectoryPoint {
    /// Joint positions in radians
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
    /// Offset from the start of the trajectory
    pub time_from_start: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointTrajectory {
    pub joint_names: Vec<String>,
    pub points: Vec<JointTrajectoryPoint>,
}

/// Goal of a `FollowJointTrajectory` action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowJointTrajectoryGoal {
    pub trajectory: JointTrajectory,
}

impl JointTrajectoryPoint {
    /// Convert a waypoint: degrees to radians, zero velocities, duration as offset
    pub fn from_waypoint(waypoint: &Waypoint) -> Self {
        JointTrajectoryPoint {
            positions: waypoint.joints_radians().iter().copied().collect(),
            velocities: vec![0.0; JOINT_COUNT],
            time_from_start: Duration::try_from_secs_f64(waypoint.duration())
                .unwrap_or(Duration::MAX),
        }
    }
}

impl FollowJointTrajectoryGoal {
    /// Time offset of the final point
    pub fn total_duration(&self) -> Duration {
        self.trajectory
            .points
            .last()
            .map(|point| point.time_from_start)
            .unwrap_or_default()
    }
}

/// Build a goal moving through `waypoints` in order
pub fn build_goal(waypoints: &[Waypoint]) -> FollowJointTrajectoryGoal {
    FollowJointTrajectoryGoal {
        trajectory: JointTrajectory {
            joint_names: JOINT_NAMES.iter().map(|name| name.to_string()).collect(),
            points: waypoints
                .iter()
                .map(JointTrajectoryPoint::from_waypoint)
                .collect(),
        },
    }
}
