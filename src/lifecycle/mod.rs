//! Lifecycle of a panel instance inside its plugin host
//!
//! The host configures and activates a panel when the plugin is loaded and
//! deactivates and cleans it up on shutdown.

use thiserror::Error;
use tracing::debug;

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode {
    /// Configure the node
    fn on_configure(&mut self) -> Result<(), LifecycleError>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<(), LifecycleError>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<(), LifecycleError>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<(), LifecycleError>;

    /// Current lifecycle state
    fn state(&self) -> State;
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

/// Transitions requested by the plugin host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Configure,
    Activate,
    Deactivate,
    Cleanup,
    Shutdown,
}

impl Transition {
    /// Target state when taken from `from`, `None` if not allowed there
    pub fn target(self, from: State) -> Option<State> {
        match (self, from) {
            (Transition::Configure, State::Unconfigured) => Some(State::Inactive),
            (Transition::Activate, State::Inactive) => Some(State::Active),
            (Transition::Deactivate, State::Active) => Some(State::Inactive),
            (Transition::Cleanup, State::Inactive) => Some(State::Unconfigured),
            (Transition::Shutdown, State::Finalized) => None,
            (Transition::Shutdown, _) => Some(State::Finalized),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("{node}: cannot {transition:?} from {from:?}")]
    InvalidTransition {
        node: String,
        transition: Transition,
        from: State,
    },
}

/// Name and state shared by lifecycle implementations
#[derive(Debug, Clone)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> State {
        self.state
    }

    /// Take `transition` if it is allowed from the current state
    pub fn transition(&mut self, transition: Transition) -> Result<State, LifecycleError> {
        let to = transition
            .target(self.state)
            .ok_or_else(|| LifecycleError::InvalidTransition {
                node: self.name.clone(),
                transition,
                from: self.state,
            })?;
        debug!(node = %self.name, from = ?self.state, to = ?to, "Lifecycle transition");
        self.state = to;
        Ok(to)
    }
}
