//! Common constants and types for the UR waypoint panel

/// Common types and utilities used across the codebase
pub mod types {
    use nalgebra::Vector6;

    /// Six joint values, ordered base to tool flange
    pub type JointVector = Vector6<f64>;
}

/// Number of arm joints
pub const JOINT_COUNT: usize = 6;

/// Joint angles plus the duration column
pub const FIELD_COUNT: usize = JOINT_COUNT + 1;

/// Joint names expected by the UR trajectory controller, in goal order
pub const JOINT_NAMES: [&str; JOINT_COUNT] = [
    "shoulder_pan_joint",
    "shoulder_lift_joint",
    "elbow_joint",
    "wrist_1_joint",
    "wrist_2_joint",
    "wrist_3_joint",
];

/// Header labels of the waypoint table
pub const COLUMN_LABELS: [&str; FIELD_COUNT] = [
    "joint 1 [deg]",
    "joint 2 [deg]",
    "joint 3 [deg]",
    "joint 4 [deg]",
    "joint 5 [deg]",
    "joint 6 [deg]",
    "duration [s]",
];

/// Symmetric joint limit in degrees
pub const JOINT_LIMIT_DEG: f64 = 363.0;

/// Duration assigned to a freshly added waypoint
pub const DEFAULT_WAYPOINT_DURATION: f64 = 5.0;

/// Dispatch timeout used when a document does not carry one
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
