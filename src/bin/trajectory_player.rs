//! Headless front-end of the waypoint panel.
//!
//! Opens a trajectory file through the panel, plays it against the
//! simulated trajectory controller and reports the final state.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};
use ur_waypoints::control::{build_goal, SimulatedExecutor};
use ur_waypoints::panel::dialog::ActionConfigDialog;
use ur_waypoints::{GoalState, Panel, PanelAction, PanelConfig, PanelHost, PlayOutcome};

#[derive(Parser)]
#[command(name = "trajectory_player")]
#[command(about = "Play a UR waypoint trajectory file", version)]
struct Cli {
    /// Trajectory file (JSON)
    file: PathBuf,

    /// Panel parameter file
    #[arg(short, long, default_value = "config/panel_params.yaml")]
    config: PathBuf,

    /// Override the timeout stored in the file, in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Override the simulated playback time scale
    #[arg(long)]
    time_scale: Option<f64>,

    /// Write the normalized trajectory to this file before playing
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print the goal as JSON instead of playing it
    #[arg(long)]
    dump_goal: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Answers the panel's dialogs from the command line
struct CommandLineHost {
    open: PathBuf,
    save: Option<PathBuf>,
    timeout: Option<f64>,
}

impl PanelHost for CommandLineHost {
    fn open_file_name(&mut self, _title: &str, _dir: &Path, _filter: &str) -> Option<PathBuf> {
        Some(self.open.clone())
    }

    fn save_file_name(&mut self, _title: &str, _dir: &Path, _filter: &str) -> Option<PathBuf> {
        self.save.clone()
    }

    fn exec_config_dialog(&mut self, dialog: &mut ActionConfigDialog) -> bool {
        match self.timeout {
            Some(timeout) => {
                dialog.set_duration(timeout);
                tracing::info!(
                    dialog = ActionConfigDialog::TITLE,
                    field = ActionConfigDialog::LABEL,
                    value = dialog.duration(),
                    "Accepted dialog from the command line"
                );
                true
            }
            None => false,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let mut config = PanelConfig::load_or_default(&cli.config)?;
    if let Some(time_scale) = cli.time_scale {
        config.simulation.time_scale = time_scale;
    }

    let executor = Arc::new(SimulatedExecutor::new(
        config.action_name(),
        config.simulation.time_scale,
    ));
    let mut panel = Panel::new(&config, executor).context("Failed to create panel")?;
    panel.init_plugin()?;

    let mut host = CommandLineHost {
        open: cli.file.clone(),
        save: cli.save.clone(),
        timeout: cli.timeout,
    };

    panel
        .trigger(PanelAction::Open, &mut host)
        .with_context(|| format!("Failed to open {}", cli.file.display()))?;
    panel.trigger(PanelAction::Config, &mut host)?;
    if cli.save.is_some() {
        panel.trigger(PanelAction::Save, &mut host)?;
    }

    if cli.dump_goal {
        let goal = build_goal(panel.waypoints().rows());
        println!("{}", serde_json::to_string_pretty(&goal)?);
        panel.shutdown_plugin()?;
        return Ok(());
    }

    tracing::info!(
        waypoints = panel.waypoints().len(),
        timeout = panel.timeout(),
        "Playing trajectory"
    );
    panel.trigger(PanelAction::Play, &mut host)?;

    let outcome = loop {
        if let Some(event) = panel.wait_for_play(Duration::from_millis(250)) {
            break event.outcome;
        }
    };
    panel.shutdown_plugin()?;

    match outcome {
        PlayOutcome::Finished(GoalState::Succeeded) => {
            println!("Action finished: {}", GoalState::Succeeded);
            Ok(())
        }
        PlayOutcome::Finished(state) => bail!("Action finished: {}", state),
        PlayOutcome::TimedOut => bail!("Action did not finish before the time out"),
        PlayOutcome::Cancelled => bail!("Action wait cancelled"),
        PlayOutcome::Failed(reason) => bail!("Action could not be sent: {}", reason),
    }
}
