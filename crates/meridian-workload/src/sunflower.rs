//! Time-varying regional access skew.
//!
//! A stepwise schedule is a CSV table of rows `t, w_0, ..., w_{R-1}`:
//! while the elapsed fraction of the run is below `t_i` (and at or past
//! `t_{i-1}`), multi-home picks draw their region from the discrete
//! distribution `w_i`. Times must be strictly increasing and the final
//! row must reach `t >= 1.0` so the whole run is covered.
//!
//! ```text
//! 0.1,.5,.5
//! 0.5,.2,.8
//! 1.0,.5,.5
//! ```

use std::fs;
use std::path::Path;

use meridian_common::{MeridianError, MeridianResult};

/// A parsed stepwise sunflower schedule.
#[derive(Debug, Clone)]
pub struct SunflowerSchedule {
    rows: Vec<(f64, Vec<f64>)>,
}

impl SunflowerSchedule {
    /// Parses the CSV text; `num_regions` fixes the weight arity.
    pub fn from_csv(text: &str, num_regions: u32) -> MeridianResult<Self> {
        let mut rows: Vec<(f64, Vec<f64>)> = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != num_regions as usize + 1 {
                return Err(MeridianError::InvalidSunflower(format!(
                    "line {}: expected {} fields, got {}",
                    line_no + 1,
                    num_regions + 1,
                    fields.len()
                )));
            }
            let mut values = Vec::with_capacity(fields.len());
            for field in &fields {
                values.push(field.parse::<f64>().map_err(|_| {
                    MeridianError::InvalidSunflower(format!(
                        "line {}: bad number \"{field}\"",
                        line_no + 1
                    ))
                })?);
            }
            let time = values[0];
            if let Some(&(prev_time, _)) = rows.last() {
                if time <= prev_time {
                    return Err(MeridianError::InvalidSunflower(format!(
                        "line {}: times must be strictly increasing",
                        line_no + 1
                    )));
                }
            }
            rows.push((time, values[1..].to_vec()));
        }
        if rows.is_empty() {
            return Err(MeridianError::InvalidSunflower("empty schedule".into()));
        }
        if rows.last().map_or(true, |&(t, _)| t < 1.0) {
            return Err(MeridianError::InvalidSunflower(
                "final row must have t >= 1.0".into(),
            ));
        }
        Ok(Self { rows })
    }

    /// Loads and parses a schedule file.
    pub fn from_file(path: impl AsRef<Path>, num_regions: u32) -> MeridianResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_csv(&text, num_regions)
    }

    /// Index of the row active at the given elapsed fraction: the first
    /// row whose time is still ahead of `fraction`.
    #[must_use]
    pub fn active_index(&self, fraction: f64) -> usize {
        self.rows
            .iter()
            .position(|&(t, _)| fraction < t)
            .unwrap_or(self.rows.len() - 1)
    }

    /// Region weights of the row active at `fraction`.
    #[must_use]
    pub fn weights_at(&self, fraction: f64) -> &[f64] {
        &self.rows[self.active_index(fraction)].1
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the schedule has no rows. Parsed schedules never are.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_boundaries() {
        let schedule = SunflowerSchedule::from_csv("0.3,1,0\n1.0,0,1\n", 2).unwrap();
        // First 30% of the run uses the first row, the rest the second:
        // with duration 1000, transaction 299 still draws from row 0 and
        // transaction 300 already draws from row 1.
        assert_eq!(schedule.active_index(299.0 / 1000.0), 0);
        assert_eq!(schedule.active_index(300.0 / 1000.0), 1);
        assert_eq!(schedule.weights_at(0.0), &[1.0, 0.0]);
        assert_eq!(schedule.weights_at(0.9), &[0.0, 1.0]);
        // Fractions past the end stick to the last row.
        assert_eq!(schedule.active_index(1.5), 1);
    }

    #[test]
    fn test_rejects_non_increasing_times() {
        assert!(SunflowerSchedule::from_csv("0.5,1,0\n0.5,0,1\n", 2).is_err());
    }

    #[test]
    fn test_rejects_missing_trailing_row() {
        assert!(SunflowerSchedule::from_csv("0.3,1,0\n0.9,0,1\n", 2).is_err());
    }

    #[test]
    fn test_rejects_wrong_arity() {
        assert!(SunflowerSchedule::from_csv("1.0,1,0,0\n", 2).is_err());
    }
}
