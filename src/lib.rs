//! Waypoint authoring and playback for Universal Robots arms
//!
//! The crate holds everything of the operator panel except the widgets:
//! the JSON trajectory archive, the editable waypoint list, the trajectory
//! dispatcher and the shell that wires toolbar actions to them. A toolkit
//! front-end implements [`panel::PanelHost`]; a middleware bridge implements
//! [`control::TrajectoryExecutor`].

pub mod archive;
pub mod common;
pub mod config;
pub mod control;
pub mod lifecycle;
pub mod panel;
pub mod waypoint;

pub use crate::archive::{ArchiveError, Document};
pub use crate::config::PanelConfig;
pub use crate::control::{Dispatcher, GoalState, PlayOutcome, TrajectoryExecutor};
pub use crate::panel::{Panel, PanelAction, PanelError, PanelHost};
pub use crate::waypoint::document::TrajectoryDocument;
pub use crate::waypoint::{Waypoint, WaypointList};
