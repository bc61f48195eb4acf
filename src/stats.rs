//! Pure attendance arithmetic shared by the dashboard handlers.
//!
//! Percentages stay unrounded internally; `round_percent` is applied only
//! when a value crosses the response boundary.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl AttendanceBand {
    pub fn label(self) -> &'static str {
        match self {
            AttendanceBand::Excellent => "Excellent",
            AttendanceBand::Good => "Good",
            AttendanceBand::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// present / total as a 0..=100 percentage; 0 when there is nothing to count.
pub fn attendance_percent(present: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (present as f64 / total as f64) * 100.0
    }
}

/// Band thresholds compare the unrounded percentage.
pub fn attendance_band(percent: f64) -> AttendanceBand {
    if percent >= 80.0 {
        AttendanceBand::Excellent
    } else if percent >= 70.0 {
        AttendanceBand::Good
    } else {
        AttendanceBand::NeedsImprovement
    }
}

pub fn round_percent(percent: f64) -> i64 {
    percent.round() as i64
}

/// Unweighted mean of per-student percentages; 0 for an empty roster.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_yields_zero_not_nan() {
        assert_eq!(attendance_percent(0, 0), 0.0);
    }

    #[test]
    fn percent_is_fraction_of_total() {
        assert_eq!(attendance_percent(3, 4), 75.0);
        assert_eq!(attendance_percent(4, 4), 100.0);
    }

    #[test]
    fn band_boundaries_use_unrounded_value() {
        assert_eq!(attendance_band(80.0), AttendanceBand::Excellent);
        // 79.6 rounds to 80 for display but still bands as Good.
        assert_eq!(attendance_band(79.6), AttendanceBand::Good);
        assert_eq!(attendance_band(70.0), AttendanceBand::Good);
        assert_eq!(attendance_band(69.99), AttendanceBand::NeedsImprovement);
        assert_eq!(attendance_band(0.0), AttendanceBand::NeedsImprovement);
    }

    #[test]
    fn rounding_is_nearest_whole() {
        assert_eq!(round_percent(79.5), 80);
        assert_eq!(round_percent(79.4), 79);
        assert_eq!(round_percent(0.0), 0);
    }

    #[test]
    fn mean_of_empty_roster_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[100.0, 50.0]), 75.0);
    }
}
