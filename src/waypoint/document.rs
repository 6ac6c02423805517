//! Persisted trajectory document
//!
//! ```json
//! { "duration": 30.0, "size": 2, "positions_0": [j1, .., j6, t], "positions_1": [..] }
//! ```

use super::Waypoint;
use crate::archive::{ArchiveError, Document};
use crate::common::DEFAULT_TIMEOUT_SECS;
use std::path::Path;
use tracing::{debug, info, warn};

const DURATION_KEY: &str = "duration";
const SIZE_KEY: &str = "size";

fn positions_key(index: usize) -> String {
    format!("positions_{}", index)
}

/// Index of a `positions_<i>` key, accepting only the canonical spelling
fn entry_index(key: &str) -> Option<usize> {
    let index = key.strip_prefix("positions_")?.parse::<usize>().ok()?;
    (positions_key(index) == key).then_some(index)
}

/// Dispatch timeout plus the ordered waypoints
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryDocument {
    /// Seconds to wait for the executor before giving up locally
    pub duration: f64,
    pub waypoints: Vec<Waypoint>,
}

impl Default for TrajectoryDocument {
    fn default() -> Self {
        TrajectoryDocument {
            duration: DEFAULT_TIMEOUT_SECS,
            waypoints: Vec::new(),
        }
    }
}

/// Serialize a trajectory into an archive document
pub fn to_document(trajectory: &TrajectoryDocument) -> Document {
    let mut document = Document::new();
    document.set(DURATION_KEY, trajectory.duration);
    document.set(SIZE_KEY, trajectory.waypoints.len());
    for (index, waypoint) in trajectory.waypoints.iter().enumerate() {
        document.set(positions_key(index), waypoint.to_values().to_vec());
    }
    document
}

/// Read a trajectory out of an archive document
///
/// Entries that are missing, not arrays, or shorter than seven values are
/// skipped.
pub fn from_document(document: &Document) -> TrajectoryDocument {
    if !document.contains(DURATION_KEY) {
        debug!(timeout = DEFAULT_TIMEOUT_SECS, "Document has no timeout, using the default");
    }
    let duration = document.get_double(DURATION_KEY, DEFAULT_TIMEOUT_SECS);
    let size = document.get_int(SIZE_KEY, 0).max(0) as usize;

    let mut indices: Vec<usize> = document
        .as_map()
        .keys()
        .filter_map(|key| entry_index(key))
        .filter(|&index| index < size)
        .collect();
    indices.sort_unstable();

    let mut waypoints = Vec::with_capacity(indices.len());
    for index in indices {
        let key = positions_key(index);
        let Some(values) = document.get_array::<f64>(&key) else {
            warn!(key = %key, "Skipping waypoint entry that is not an array");
            continue;
        };
        match Waypoint::from_values(&values) {
            Some(waypoint) => waypoints.push(waypoint),
            None => warn!(key = %key, len = values.len(), "Skipping short waypoint entry"),
        }
    }

    if waypoints.len() < size {
        warn!(size, loaded = waypoints.len(), "Document is missing waypoint entries");
    }

    TrajectoryDocument {
        duration,
        waypoints,
    }
}

/// Load a trajectory file
pub fn load_trajectory(path: impl AsRef<Path>) -> Result<TrajectoryDocument, ArchiveError> {
    let path = path.as_ref();
    let trajectory = from_document(&Document::load(path)?);
    info!(
        path = %path.display(),
        waypoints = trajectory.waypoints.len(),
        timeout = trajectory.duration,
        "Loaded trajectory"
    );
    Ok(trajectory)
}

/// Save a trajectory file
pub fn save_trajectory(
    path: impl AsRef<Path>,
    trajectory: &TrajectoryDocument,
) -> Result<(), ArchiveError> {
    let path = path.as_ref();
    to_document(trajectory).save(path)?;
    info!(
        path = %path.display(),
        waypoints = trajectory.waypoints.len(),
        "Saved trajectory"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Document {
        Document::from_slice(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_reads_scenario_document() {
        let document = parse(json!({
            "duration": 10,
            "size": 1,
            "positions_0": [10, 20, 30, 40, 50, 60, 2]
        }));

        let trajectory = from_document(&document);

        assert_eq!(trajectory.duration, 10.0);
        assert_eq!(
            trajectory.waypoints,
            vec![Waypoint::new([10.0, 20.0, 30.0, 40.0, 50.0, 60.0], 2.0)]
        );
    }

    #[test]
    fn test_defaults_for_empty_document() {
        assert_eq!(from_document(&Document::new()), TrajectoryDocument::default());
    }

    #[test]
    fn test_skips_malformed_entries() {
        let document = parse(json!({
            "size": 4,
            "positions_0": [1, 1, 1, 1, 1, 1, 1],
            "positions_1": "oops",
            "positions_2": [2, 2, 2],
            "positions_4": [9, 9, 9, 9, 9, 9, 9]
        }));

        let trajectory = from_document(&document);

        assert_eq!(
            trajectory.waypoints,
            vec![Waypoint::new([1.0; 6], 1.0)]
        );
    }

    #[test]
    fn test_oversized_count_only_reads_present_entries() {
        let document = parse(json!({
            "size": i32::MAX,
            "positions_01": [5, 5, 5, 5, 5, 5, 5],
            "positions_3": [3, 3, 3, 3, 3, 3, 3],
            "positions_1": [1, 1, 1, 1, 1, 1, 1]
        }));

        let trajectory = from_document(&document);

        assert_eq!(
            trajectory.waypoints,
            vec![Waypoint::new([1.0; 6], 1.0), Waypoint::new([3.0; 6], 3.0)]
        );
    }

    #[test]
    fn test_loaded_values_are_clamped() {
        let document = parse(json!({
            "size": 1,
            "positions_0": [500, -500, 0, 0, 0, 0, -3]
        }));

        let waypoint = from_document(&document).waypoints[0];
        assert_eq!(waypoint.to_values(), [363.0, -363.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_writes_size_and_rows_in_order() {
        let trajectory = TrajectoryDocument {
            duration: 12.5,
            waypoints: vec![
                Waypoint::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 1.0),
                Waypoint::new([-1.0; 6], 3.0),
            ],
        };

        let document = to_document(&trajectory);

        assert_eq!(document.get_double("duration", 0.0), 12.5);
        assert_eq!(document.get_int("size", 0), 2);
        assert_eq!(
            document.get_array::<f64>("positions_0"),
            Some(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 1.0])
        );
        assert_eq!(
            document.get_array::<f64>("positions_1"),
            Some(vec![-1.0, -1.0, -1.0, -1.0, -1.0, -1.0, 3.0])
        );
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trajectory.json");
        let trajectory = TrajectoryDocument {
            duration: 45.0,
            waypoints: vec![
                Waypoint::new([0.5, 90.0, -45.25, 10.0, 0.0, 363.0], 2.0),
                Waypoint::default(),
            ],
        };

        save_trajectory(&path, &trajectory).unwrap();
        assert_eq!(load_trajectory(&path).unwrap(), trajectory);
    }
}
