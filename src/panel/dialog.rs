//! Dialog state owned by a panel

use std::path::{Path, PathBuf};

/// Name filter passed to the file dialogs
pub const FILE_FILTER: &str = "JSON Files (*.json);;All Files (*)";

/// Last-used directories of the open and save dialogs
///
/// Lives as long as the panel; nothing is written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogSession {
    open_dir: PathBuf,
    save_dir: PathBuf,
}

impl DialogSession {
    pub fn new(start_directory: impl Into<PathBuf>) -> Self {
        let start_directory = start_directory.into();
        DialogSession {
            open_dir: start_directory.clone(),
            save_dir: start_directory,
        }
    }

    pub fn open_dir(&self) -> &Path {
        &self.open_dir
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Remember the directory of a file picked in the open dialog
    pub fn remember_open(&mut self, file: &Path) {
        if let Some(dir) = parent_dir(file) {
            self.open_dir = dir;
        }
    }

    /// Remember the directory of a file picked in the save dialog
    pub fn remember_save(&mut self, file: &Path) {
        if let Some(dir) = parent_dir(file) {
            self.save_dir = dir;
        }
    }
}

fn parent_dir(file: &Path) -> Option<PathBuf> {
    let absolute = if file.is_absolute() {
        file.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(file)
    };
    absolute.parent().map(Path::to_path_buf)
}

/// The "Action Config" dialog: a single spin box for the dispatch timeout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionConfigDialog {
    duration: f64,
}

impl ActionConfigDialog {
    pub const TITLE: &'static str = "Action Config";
    pub const LABEL: &'static str = "Duration [s]";
    pub const MINIMUM: f64 = 0.0;
    pub const MAXIMUM: f64 = 99.99;
    pub const DECIMALS: i32 = 2;

    pub fn new(duration: f64) -> Self {
        let mut dialog = ActionConfigDialog {
            duration: Self::MINIMUM,
        };
        dialog.set_duration(duration);
        dialog
    }

    /// Set the spin box value, bounded and rounded like the widget does
    pub fn set_duration(&mut self, duration: f64) {
        let scale = 10f64.powi(Self::DECIMALS);
        let rounded = (duration * scale).round() / scale;
        self.duration = if rounded.is_nan() {
            Self::MINIMUM
        } else {
            rounded.clamp(Self::MINIMUM, Self::MAXIMUM)
        };
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}
