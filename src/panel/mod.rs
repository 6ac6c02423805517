//! Waypoint panel shell
//!
//! Glue between the toolbar of the host toolkit and the waypoint model,
//! the trajectory archive and the dispatcher. Every toolbar action maps to
//! exactly one operation. The toolkit supplies the modal dialogs through
//! [`PanelHost`].

pub mod dialog;

use self::dialog::{ActionConfigDialog, DialogSession, FILE_FILTER};
use crate::archive::ArchiveError;
use crate::config::PanelConfig;
use crate::control::{
    timeout_from_secs, DispatchError, Dispatcher, PlayEvent, PlayHandle, PlayOutcome,
    TrajectoryExecutor,
};
use crate::lifecycle::{LifecycleError, LifecycleNode, LifecycleNodeBase, State, Transition};
use crate::waypoint::document::{load_trajectory, save_trajectory, TrajectoryDocument};
use crate::waypoint::{ModelError, WaypointList};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Title of the panel window
pub const WINDOW_TITLE: &str = "Universal Robots";

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("play {0} is still in flight")]
    PlayInFlight(u64),

    #[error("panel is not active")]
    Inactive,
}

/// Toolbar actions of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelAction {
    Open,
    Save,
    Add,
    Remove,
    Play,
    Config,
    CancelPlay,
}

impl PanelAction {
    /// Toolbar order
    pub const ALL: [PanelAction; 7] = [
        PanelAction::Open,
        PanelAction::Save,
        PanelAction::Add,
        PanelAction::Remove,
        PanelAction::Play,
        PanelAction::CancelPlay,
        PanelAction::Config,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PanelAction::Open => "&Open...",
            PanelAction::Save => "&Save",
            PanelAction::Add => "&Add",
            PanelAction::Remove => "&Remove",
            PanelAction::Play => "&Play",
            PanelAction::Config => "&Config",
            PanelAction::CancelPlay => "S&top",
        }
    }

    pub fn status_tip(self) -> &'static str {
        match self {
            PanelAction::Open => "Open an existing file",
            PanelAction::Save => "Save the document to disk",
            PanelAction::Add => "Add a waypoint",
            PanelAction::Remove => "Remove the waypoint",
            PanelAction::Play => "Play the action",
            PanelAction::Config => "Show the config dialog",
            PanelAction::CancelPlay => "Stop waiting for the action",
        }
    }

    /// Freedesktop icon theme name
    pub fn icon_name(self) -> &'static str {
        match self {
            PanelAction::Open => "document-open",
            PanelAction::Save => "document-save",
            PanelAction::Add => "list-add",
            PanelAction::Remove => "list-remove",
            PanelAction::Play => "media-playback-start",
            PanelAction::Config => "preferences-system",
            PanelAction::CancelPlay => "media-playback-stop",
        }
    }
}

/// Modal dialogs provided by the host toolkit
pub trait PanelHost {
    /// Ask for an existing file; `None` when the user cancels
    fn open_file_name(&mut self, title: &str, dir: &Path, filter: &str) -> Option<PathBuf>;

    /// Ask for a file to write; `None` when the user cancels
    fn save_file_name(&mut self, title: &str, dir: &Path, filter: &str) -> Option<PathBuf>;

    /// Run the config dialog; `true` when accepted
    fn exec_config_dialog(&mut self, dialog: &mut ActionConfigDialog) -> bool;
}

/// The waypoint panel
pub struct Panel {
    base: LifecycleNodeBase,
    title: String,
    waypoints: WaypointList,
    duration: f64,
    session: DialogSession,
    dispatcher: Dispatcher,
    in_flight: Option<PlayHandle>,
    last_outcome: Option<PlayOutcome>,
}

impl Panel {
    /// Create a panel dispatching to `executor`
    pub fn new(
        config: &PanelConfig,
        executor: Arc<dyn TrajectoryExecutor>,
    ) -> Result<Self, PanelError> {
        let dispatcher = Dispatcher::with_worker_threads(executor, config.dispatcher.worker_threads)?;
        Ok(Panel {
            base: LifecycleNodeBase::new("waypoint_panel"),
            title: WINDOW_TITLE.to_string(),
            waypoints: WaypointList::new(),
            duration: config.default_timeout,
            session: DialogSession::new(config.start_directory.clone()),
            dispatcher,
            in_flight: None,
            last_outcome: None,
        })
    }

    /// Number the window title when the host runs several panels
    pub fn with_serial_number(mut self, serial_number: u32) -> Self {
        self.title = if serial_number > 1 {
            format!("{} ({})", WINDOW_TITLE, serial_number)
        } else {
            WINDOW_TITLE.to_string()
        };
        self
    }

    /// Configure and activate, as the plugin host does on load
    pub fn init_plugin(&mut self) -> Result<(), PanelError> {
        self.on_configure()?;
        self.on_activate()?;
        Ok(())
    }

    /// Deactivate and clean up, as the plugin host does on unload
    pub fn shutdown_plugin(&mut self) -> Result<(), PanelError> {
        self.on_deactivate()?;
        self.on_cleanup()?;
        Ok(())
    }

    pub fn window_title(&self) -> &str {
        &self.title
    }

    pub fn waypoints(&self) -> &WaypointList {
        &self.waypoints
    }

    /// Mutable access for selection changes made in the table widget
    pub fn waypoints_mut(&mut self) -> &mut WaypointList {
        &mut self.waypoints
    }

    /// Commit a cell edit and return the text the cell should now show
    pub fn edit_field(&mut self, row: usize, column: usize, raw: &str) -> Result<String, PanelError> {
        self.waypoints.edit_field(row, column, raw)?;
        Ok(self.waypoints.text(row, column)?)
    }

    /// Dispatch timeout in seconds
    pub fn timeout(&self) -> f64 {
        self.duration
    }

    pub fn session(&self) -> &DialogSession {
        &self.session
    }

    pub fn is_playing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_outcome(&self) -> Option<&PlayOutcome> {
        self.last_outcome.as_ref()
    }

    /// Snapshot of the panel contents in persisted form
    pub fn document(&self) -> TrajectoryDocument {
        TrajectoryDocument {
            duration: self.duration,
            waypoints: self.waypoints.rows().to_vec(),
        }
    }

    /// Run one toolbar action
    pub fn trigger<H: PanelHost + ?Sized>(
        &mut self,
        action: PanelAction,
        host: &mut H,
    ) -> Result<(), PanelError> {
        debug!(action = action.label(), "Toolbar action triggered");
        match action {
            PanelAction::Open => self.open(host),
            PanelAction::Save => self.save(host),
            PanelAction::Add => {
                self.waypoints.add();
                Ok(())
            }
            PanelAction::Remove => {
                self.waypoints.remove_selected();
                Ok(())
            }
            PanelAction::Play => self.play().map(|_| ()),
            PanelAction::Config => {
                self.config(host);
                Ok(())
            }
            PanelAction::CancelPlay => {
                self.cancel_play();
                Ok(())
            }
        }
    }

    fn open<H: PanelHost + ?Sized>(&mut self, host: &mut H) -> Result<(), PanelError> {
        let Some(path) = host.open_file_name("Open File", self.session.open_dir(), FILE_FILTER)
        else {
            return Ok(());
        };
        self.session.remember_open(&path);
        self.open_file(&path)
    }

    fn save<H: PanelHost + ?Sized>(&mut self, host: &mut H) -> Result<(), PanelError> {
        let Some(path) = host.save_file_name("Save File", self.session.save_dir(), FILE_FILTER)
        else {
            return Ok(());
        };
        self.session.remember_save(&path);
        self.save_file(&path)
    }

    fn config<H: PanelHost + ?Sized>(&mut self, host: &mut H) {
        let mut dialog = ActionConfigDialog::new(self.duration);
        if host.exec_config_dialog(&mut dialog) {
            self.duration = dialog.duration();
            info!(timeout = self.duration, "Updated action timeout");
        }
    }

    /// Replace the panel contents with a trajectory file
    ///
    /// Nothing changes when the file cannot be opened.
    pub fn open_file(&mut self, path: &Path) -> Result<(), PanelError> {
        let trajectory = load_trajectory(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Open failed");
            e
        })?;
        self.duration = trajectory.duration;
        self.waypoints.replace(trajectory.waypoints);
        Ok(())
    }

    /// Write the panel contents to a trajectory file
    pub fn save_file(&self, path: &Path) -> Result<(), PanelError> {
        save_trajectory(path, &self.document()).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Save failed");
            e
        })?;
        Ok(())
    }

    /// Send the current waypoints to the executor
    ///
    /// Returns the play id; the result arrives through [`Panel::poll`].
    pub fn play(&mut self) -> Result<u64, PanelError> {
        if self.base.get_state() != State::Active {
            return Err(PanelError::Inactive);
        }
        if let Some(handle) = &self.in_flight {
            return Err(PanelError::PlayInFlight(handle.id()));
        }

        let handle = self
            .dispatcher
            .play(self.waypoints.rows(), timeout_from_secs(self.duration));
        let id = handle.id();
        self.in_flight = Some(handle);
        Ok(id)
    }

    /// Stop waiting for the in-flight play; returns whether one was running
    pub fn cancel_play(&mut self) -> bool {
        match self.in_flight.as_mut() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Drain finished plays posted by the dispatcher
    pub fn poll(&mut self) -> Vec<PlayEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.dispatcher.try_event() {
            self.finish(&event);
            events.push(event);
        }
        events
    }

    /// Block up to `timeout` for the in-flight play to finish
    ///
    /// For front-ends without an event loop.
    pub fn wait_for_play(&mut self, timeout: std::time::Duration) -> Option<PlayEvent> {
        let event = self.dispatcher.wait_event(timeout)?;
        self.finish(&event);
        Some(event)
    }

    fn finish(&mut self, event: &PlayEvent) {
        if self.in_flight.as_ref().map(PlayHandle::id) == Some(event.id) {
            self.in_flight = None;
        }
        self.last_outcome = Some(event.outcome.clone());
    }
}

impl LifecycleNode for Panel {
    fn on_configure(&mut self) -> Result<(), LifecycleError> {
        info!(title = %self.title, "Configuring waypoint panel");
        self.base.transition(Transition::Configure).map(|_| ())
    }

    fn on_activate(&mut self) -> Result<(), LifecycleError> {
        info!(action = self.dispatcher.action_name(), "Activating waypoint panel");
        self.base.transition(Transition::Activate).map(|_| ())
    }

    fn on_deactivate(&mut self) -> Result<(), LifecycleError> {
        info!("Deactivating waypoint panel");
        self.base.transition(Transition::Deactivate)?;
        self.cancel_play();
        Ok(())
    }

    fn on_cleanup(&mut self) -> Result<(), LifecycleError> {
        info!("Cleaning up waypoint panel");
        self.base.transition(Transition::Cleanup).map(|_| ())
    }

    fn state(&self) -> State {
        self.base.get_state()
    }
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.cancel_play();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::SimulatedExecutor;

    #[derive(Default)]
    struct FakeHost {
        open: Option<PathBuf>,
        save: Option<PathBuf>,
        accept_with: Option<f64>,
        seen_dirs: Vec<PathBuf>,
    }

    impl PanelHost for FakeHost {
        fn open_file_name(&mut self, _title: &str, dir: &Path, filter: &str) -> Option<PathBuf> {
            assert_eq!(filter, FILE_FILTER);
            self.seen_dirs.push(dir.to_path_buf());
            self.open.clone()
        }

        fn save_file_name(&mut self, _title: &str, dir: &Path, _filter: &str) -> Option<PathBuf> {
            self.seen_dirs.push(dir.to_path_buf());
            self.save.clone()
        }

        fn exec_config_dialog(&mut self, dialog: &mut ActionConfigDialog) -> bool {
            match self.accept_with {
                Some(value) => {
                    dialog.set_duration(value);
                    true
                }
                None => {
                    dialog.set_duration(1.0);
                    false
                }
            }
        }
    }

    fn panel() -> Panel {
        let executor = Arc::new(SimulatedExecutor::new("sim", 0.0));
        Panel::new(&PanelConfig::default(), executor).unwrap()
    }

    #[test]
    fn test_window_title() {
        assert_eq!(panel().window_title(), "Universal Robots");
        assert_eq!(
            panel().with_serial_number(2).window_title(),
            "Universal Robots (2)"
        );
    }

    #[test]
    fn test_add_and_remove_actions() {
        let mut panel = panel();
        let mut host = FakeHost::default();

        panel.trigger(PanelAction::Add, &mut host).unwrap();
        panel.trigger(PanelAction::Add, &mut host).unwrap();
        assert_eq!(panel.waypoints().len(), 2);

        panel.trigger(PanelAction::Remove, &mut host).unwrap();
        assert_eq!(panel.waypoints().len(), 1);
    }

    #[test]
    fn test_edit_returns_canonical_text() {
        let mut panel = panel();
        panel.waypoints_mut().add();
        assert_eq!(panel.edit_field(0, 2, "400").unwrap(), "363");
        assert_eq!(panel.edit_field(0, 6, "abc").unwrap(), "0");
        assert!(matches!(
            panel.edit_field(3, 0, "1"),
            Err(PanelError::Model(_))
        ));
    }

    #[test]
    fn test_config_accept_and_cancel() {
        let mut panel = panel();
        let mut host = FakeHost {
            accept_with: Some(12.0),
            ..FakeHost::default()
        };
        panel.trigger(PanelAction::Config, &mut host).unwrap();
        assert_eq!(panel.timeout(), 12.0);

        host.accept_with = None;
        panel.trigger(PanelAction::Config, &mut host).unwrap();
        assert_eq!(panel.timeout(), 12.0);
    }

    #[test]
    fn test_cancelled_dialogs_do_nothing() {
        let mut panel = panel();
        let mut host = FakeHost::default();

        panel.trigger(PanelAction::Open, &mut host).unwrap();
        panel.trigger(PanelAction::Save, &mut host).unwrap();

        assert!(panel.waypoints().is_empty());
        assert_eq!(panel.session().open_dir(), Path::new("/home"));
        assert_eq!(host.seen_dirs, vec![PathBuf::from("/home"), PathBuf::from("/home")]);
    }

    #[test]
    fn test_play_requires_active_panel() {
        let mut panel = panel();
        assert!(matches!(panel.play(), Err(PanelError::Inactive)));
    }

    #[test]
    fn test_shutdown_requires_initialized_panel() {
        let mut panel = panel();
        assert!(matches!(
            panel.shutdown_plugin(),
            Err(PanelError::Lifecycle(_))
        ));
        assert_eq!(panel.state(), State::Unconfigured);

        panel.init_plugin().unwrap();
        assert!(panel.init_plugin().is_err());
        panel.shutdown_plugin().unwrap();
        assert!(panel.shutdown_plugin().is_err());
        assert_eq!(panel.state(), State::Unconfigured);
    }

    #[test]
    fn test_failed_open_keeps_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut panel = panel();
        panel.waypoints_mut().add();

        let result = panel.open_file(&dir.path().join("missing.json"));

        assert!(matches!(result, Err(PanelError::Archive(_))));
        assert_eq!(panel.waypoints().len(), 1);
        assert_eq!(panel.timeout(), 30.0);
    }

    #[test]
    fn test_action_metadata() {
        assert_eq!(PanelAction::ALL.len(), 7);
        assert_eq!(PanelAction::Open.label(), "&Open...");
        assert_eq!(PanelAction::CancelPlay.label(), "S&top");
        assert_eq!(PanelAction::Play.icon_name(), "media-playback-start");
        assert_eq!(PanelAction::Open.status_tip(), "Open an existing file");
    }
}
