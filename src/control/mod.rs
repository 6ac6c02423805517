//! Trajectory dispatch for the UR arm
pub mod dispatcher;
pub mod executor;
pub mod simulated;
pub mod trajectory;

pub use self::dispatcher::{timeout_from_secs, DispatchError, Dispatcher, PlayEvent, PlayHandle, PlayOutcome};
pub use self::executor::{ExecutorError, GoalState, TrajectoryExecutor};
pub use self::simulated::SimulatedExecutor;
pub use self::trajectory::{build_goal, FollowJointTrajectoryGoal, JointTrajectory, JointTrajectoryPoint};

/// Default namespace of the UR scaled position trajectory controller
pub const DEFAULT_CONTROLLER_NAMESPACE: &str = "/scaled_pos_joint_traj_controller";

/// Action name served under a controller namespace
pub fn action_name(controller_namespace: &str) -> String {
    format!(
        "{}/follow_joint_trajectory",
        controller_namespace.trim_end_matches('/')
    )
}
