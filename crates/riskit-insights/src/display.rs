//! Presentation math
//!
//! Numbers the dashboard derives from results before drawing them:
//! comparison bar widths, the health gauge, trend sparklines, and the
//! category an error overlay falls into.

use serde::{Deserialize, Serialize};

use crate::error::InsightError;

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// Bar widths for a scorecard row, normalized to the pair's own sum.
///
/// Returns `(50, 50)` when both sides are zero.
pub fn bar_split(s1_percent: f64, s2_percent: f64) -> (f64, f64) {
    let s1 = non_negative(s1_percent);
    let s2 = non_negative(s2_percent);
    let total = s1 + s2;
    if total <= 0.0 {
        return (50.0, 50.0);
    }
    (s1 / total * 100.0, s2 / total * 100.0)
}

/// Health as a fraction in `[0, 1]`; values above 1 are read as percentages
pub fn normalized_health(health: f64) -> f64 {
    if !health.is_finite() {
        return 0.0;
    }
    let fraction = if health > 1.0 { health / 100.0 } else { health };
    fraction.clamp(0.0, 1.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn health_percent(health: f64) -> u8 {
    // clamped to [0, 100] so the cast cannot truncate
    (normalized_health(health) * 100.0).round() as u8
}

/// A point on a 100x100 sparkline canvas, y growing downward
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Sparkline points for a trend series.
///
/// A flat series sits on the baseline; a single value is drawn at x = 0.
#[allow(clippy::cast_precision_loss)]
pub fn sparkline(trend: &[f64]) -> Vec<Point> {
    let values: Vec<f64> = trend.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);
    let range = if max - min > 0.0 { max - min } else { 1.0 };
    let step = if values.len() > 1 { 100.0 / (values.len() - 1) as f64 } else { 0.0 };

    values
        .iter()
        .enumerate()
        .map(|(i, v)| Point {
            x: i as f64 * step,
            y: 100.0 - (v - min) / range * 100.0,
        })
        .collect()
}

/// SVG `points` attribute for a sparkline
pub fn sparkline_path(trend: &[f64]) -> String {
    sparkline(trend)
        .iter()
        .map(|p| format!("{:.1},{:.1}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// How the dashboard should react to a failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Out of quota; waiting helps
    Quota,
    /// Key missing, malformed or rejected; reconnecting helps
    Credential,
    Other,
}

impl ErrorCategory {
    pub fn of(error: &InsightError) -> Self {
        match error {
            InsightError::Generation(e) if e.is_quota_exhausted() => Self::Quota,
            InsightError::Generation(e) if e.is_credential_problem() => Self::Credential,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quota => "quota",
            Self::Credential => "credential",
            Self::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskit_core::{GenerationError, UseCase};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_bar_split_normalizes_to_pair_sum() {
        let (a, b) = bar_split(30.0, 10.0);
        assert!(close(a, 75.0));
        assert!(close(b, 25.0));

        let (a, b) = bar_split(80.0, 80.0);
        assert!(close(a, 50.0));
        assert!(close(b, 50.0));
    }

    #[test]
    fn test_bar_split_guards_zero_and_garbage() {
        assert_eq!(bar_split(0.0, 0.0), (50.0, 50.0));
        assert_eq!(bar_split(-5.0, f64::NAN), (50.0, 50.0));
        assert_eq!(bar_split(-5.0, 20.0), (0.0, 100.0));
    }

    #[test]
    fn test_health_normalization() {
        assert!(close(normalized_health(0.82), 0.82));
        assert!(close(normalized_health(82.0), 0.82));
        assert!(close(normalized_health(1.0), 1.0));
        assert!(close(normalized_health(250.0), 1.0));
        assert!(close(normalized_health(-0.3), 0.0));
        assert_eq!(health_percent(0.826), 83);
        assert_eq!(health_percent(74.0), 74);
        assert_eq!(health_percent(f64::INFINITY), 0);
    }

    #[test]
    fn test_sparkline_points() {
        let points = sparkline(&[10.0, 20.0, 30.0]);
        assert_eq!(
            points,
            vec![
                Point { x: 0.0, y: 100.0 },
                Point { x: 50.0, y: 50.0 },
                Point { x: 100.0, y: 0.0 },
            ]
        );
        assert_eq!(sparkline_path(&[10.0, 20.0, 30.0]), "0.0,100.0 50.0,50.0 100.0,0.0");
    }

    #[test]
    fn test_sparkline_degenerate_series() {
        assert!(sparkline(&[]).is_empty());
        assert_eq!(sparkline(&[42.0]), vec![Point { x: 0.0, y: 100.0 }]);
        assert!(sparkline(&[5.0, 5.0]).iter().all(|p| close(p.y, 100.0)));
    }

    #[test]
    fn test_error_categories() {
        let quota = InsightError::Generation(GenerationError::RateLimited {
            provider: "Gemini".into(),
            message: "Resource has been exhausted".into(),
        });
        assert_eq!(ErrorCategory::of(&quota), ErrorCategory::Quota);

        let auth = InsightError::Generation(GenerationError::Auth {
            provider: "Gemini".into(),
            message: "API key not valid".into(),
        });
        assert_eq!(ErrorCategory::of(&auth), ErrorCategory::Credential);

        let missing = InsightError::Generation(GenerationError::Config("API_KEY is not set".into()));
        assert_eq!(ErrorCategory::of(&missing), ErrorCategory::Credential);

        let synthesis = InsightError::synthesis(UseCase::Pulse, "no JSON");
        assert_eq!(ErrorCategory::of(&synthesis), ErrorCategory::Other);
    }
}
