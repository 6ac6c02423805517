//! Waypoint list model
//!
//! Rows are edited in place through their textual cells. Every edit is
//! projected back onto the valid range before it is stored, so a row always
//! holds clamped values and the displayed text is the canonical form of the
//! stored value.

pub mod document;

use crate::common::types::JointVector;
use crate::common::{DEFAULT_WAYPOINT_DURATION, FIELD_COUNT, JOINT_COUNT, JOINT_LIMIT_DEG};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Addressing errors of the list model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("row {row} out of range (list has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("column {0} out of range")]
    ColumnOutOfRange(usize),
}

/// Index of one arm joint, always below `JOINT_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointIndex(usize);

impl JointIndex {
    pub fn new(index: usize) -> Option<Self> {
        (index < JOINT_COUNT).then_some(JointIndex(index))
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn all() -> impl Iterator<Item = JointIndex> {
        (0..JOINT_COUNT).map(JointIndex)
    }
}

/// An editable column of a waypoint row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Joint angle in degrees
    Joint(JointIndex),
    /// Time from trajectory start in seconds
    Duration,
}

impl Field {
    /// Map a table column to its field
    pub fn from_column(column: usize) -> Option<Field> {
        match column {
            JOINT_COUNT => Some(Field::Duration),
            c => JointIndex::new(c).map(Field::Joint),
        }
    }

    /// Joint field for `index`, `None` past the last joint
    pub fn joint(index: usize) -> Option<Field> {
        JointIndex::new(index).map(Field::Joint)
    }

    pub fn column(self) -> usize {
        match self {
            Field::Joint(index) => index.get(),
            Field::Duration => JOINT_COUNT,
        }
    }

    /// Project a value onto the valid range of this field
    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        match self {
            Field::Joint(_) => value.clamp(-JOINT_LIMIT_DEG, JOINT_LIMIT_DEG),
            Field::Duration if value.is_finite() => value.max(0.0),
            Field::Duration => 0.0,
        }
    }
}

/// Parse cell text; anything unparsable or non-finite reads as zero
pub fn parse_field_text(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Canonical display text of a stored value
pub fn format_field(value: f64) -> String {
    // Shortest representation that parses back to the same value
    format!("{}", value)
}

/// One target arm pose plus its time offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    joints: JointVector,
    duration: f64,
}

impl Default for Waypoint {
    fn default() -> Self {
        Waypoint {
            joints: JointVector::zeros(),
            duration: DEFAULT_WAYPOINT_DURATION,
        }
    }
}

impl Waypoint {
    /// Create a waypoint, clamping every field
    pub fn new(joints: [f64; JOINT_COUNT], duration: f64) -> Self {
        let mut waypoint = Waypoint::default();
        for (index, value) in JointIndex::all().zip(joints) {
            waypoint.set_field(Field::Joint(index), value);
        }
        waypoint.set_field(Field::Duration, duration);
        waypoint
    }

    /// Build a waypoint from the first seven values of a persisted row
    ///
    /// Returns `None` when fewer than seven values are present.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.len() < FIELD_COUNT {
            return None;
        }
        let mut joints = [0.0; JOINT_COUNT];
        joints.copy_from_slice(&values[..JOINT_COUNT]);
        Some(Waypoint::new(joints, values[JOINT_COUNT]))
    }

    /// Joint angles in degrees
    pub fn joints(&self) -> &JointVector {
        &self.joints
    }

    /// Joint angles in radians
    pub fn joints_radians(&self) -> JointVector {
        self.joints.map(f64::to_radians)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn field(&self, field: Field) -> f64 {
        match field {
            Field::Joint(index) => self.joints[index.get()],
            Field::Duration => self.duration,
        }
    }

    /// Store a clamped value and return what was stored
    pub fn set_field(&mut self, field: Field, value: f64) -> f64 {
        let value = field.clamp(value);
        match field {
            Field::Joint(index) => self.joints[index.get()] = value,
            Field::Duration => self.duration = value,
        }
        value
    }

    /// All seven fields in column order
    pub fn to_values(&self) -> [f64; FIELD_COUNT] {
        let mut values = [0.0; FIELD_COUNT];
        values[..JOINT_COUNT].copy_from_slice(self.joints.as_slice());
        values[JOINT_COUNT] = self.duration;
        values
    }
}

/// Ordered, editable list of waypoints with an extended selection
#[derive(Debug, Clone, Default)]
pub struct WaypointList {
    rows: Vec<Waypoint>,
    selected: BTreeSet<usize>,
    current: Option<usize>,
}

impl WaypointList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list holding `rows` with nothing selected
    pub fn from_rows(rows: Vec<Waypoint>) -> Self {
        WaypointList {
            rows,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Waypoint] {
        &self.rows
    }

    pub fn get(&self, row: usize) -> Option<&Waypoint> {
        self.rows.get(row)
    }

    /// Replace every row, dropping the selection
    pub fn replace(&mut self, rows: Vec<Waypoint>) {
        self.rows = rows;
        self.selected.clear();
        self.current = None;
    }

    /// Insert a default waypoint and focus it
    ///
    /// Appends when nothing is selected, otherwise inserts before the
    /// focused row. Returns the index of the new row.
    pub fn add(&mut self) -> usize {
        let index = match self.current {
            Some(current) if !self.selected.is_empty() => current.min(self.rows.len()),
            _ => self.rows.len(),
        };
        self.rows.insert(index, Waypoint::default());
        self.selected.clear();
        self.selected.insert(index);
        self.current = Some(index);
        debug!(row = index, rows = self.rows.len(), "Added waypoint");
        index
    }

    /// Remove every selected row and return how many were removed
    pub fn remove_selected(&mut self) -> usize {
        if self.selected.is_empty() {
            return 0;
        }
        let before = self.rows.len();
        let selected = std::mem::take(&mut self.selected);
        let mut index = 0;
        self.rows.retain(|_| {
            let keep = !selected.contains(&index);
            index += 1;
            keep
        });
        self.current = None;
        let removed = before - self.rows.len();
        debug!(removed, rows = self.rows.len(), "Removed waypoints");
        removed
    }

    /// Apply an edit to one cell and return the clamped value that was stored
    pub fn edit_field(&mut self, row: usize, column: usize, raw: &str) -> Result<f64, ModelError> {
        let field = Field::from_column(column).ok_or(ModelError::ColumnOutOfRange(column))?;
        let len = self.rows.len();
        let waypoint = self
            .rows
            .get_mut(row)
            .ok_or(ModelError::RowOutOfRange { row, len })?;
        let value = waypoint.set_field(field, parse_field_text(raw));
        debug!(row, column, raw, value, "Edited waypoint field");
        Ok(value)
    }

    /// Display text of one cell
    pub fn text(&self, row: usize, column: usize) -> Result<String, ModelError> {
        let field = Field::from_column(column).ok_or(ModelError::ColumnOutOfRange(column))?;
        let waypoint = self.rows.get(row).ok_or(ModelError::RowOutOfRange {
            row,
            len: self.rows.len(),
        })?;
        Ok(format_field(waypoint.field(field)))
    }

    /// Select only `row` and focus it
    pub fn select(&mut self, row: usize) -> Result<(), ModelError> {
        self.check_row(row)?;
        self.selected.clear();
        self.selected.insert(row);
        self.current = Some(row);
        Ok(())
    }

    /// Toggle `row` in the selection and focus it
    pub fn toggle_selection(&mut self, row: usize) -> Result<(), ModelError> {
        self.check_row(row)?;
        if !self.selected.remove(&row) {
            self.selected.insert(row);
        }
        self.current = Some(row);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Selected rows in ascending order
    pub fn selected_rows(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    /// The focused row, if any
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    fn check_row(&self, row: usize) -> Result<(), ModelError> {
        if row < self.rows.len() {
            Ok(())
        } else {
            Err(ModelError::RowOutOfRange {
                row,
                len: self.rows.len(),
            })
        }
    }
}
