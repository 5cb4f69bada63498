//! Usage forecasting.
//!
//! Fits an ordinary least-squares line to a customer's full usage history
//! (gb_used against day index) and extrapolates it over a horizon. The fit
//! needs at least [`MIN_SAMPLES`] logged days; below that, or when the
//! history has no day-to-day variance to regress on, there is no forecast.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::UsageLog;

/// Minimum logged days before a forecast is attempted.
pub const MIN_SAMPLES: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageForecast {
    /// First predicted day, the day after the last observed log.
    pub starts_on: NaiveDate,
    pub horizon_days: i64,
    /// Sum of predicted daily usage over the horizon, each day floored at 0.
    pub total_predicted_gb: f64,
    /// Total spread evenly over the horizon.
    pub daily_average_gb: f64,
    pub trend: Trend,
    pub slope_gb_per_day: f64,
    pub intercept_gb: f64,
    /// Logged days the fit was computed from.
    pub samples: usize,
}

/// Fit and extrapolate a customer's usage history.
///
/// `logs` must be ordered by day ascending with one row per day, which is
/// what the usage table yields. Returns None when the history is too short
/// to fit a line.
pub fn forecast_usage(logs: &[UsageLog], horizon_days: i64) -> Option<UsageForecast> {
    if logs.len() < MIN_SAMPLES {
        return None;
    }
    let horizon_days = horizon_days.max(1);

    let first_day = logs[0].day;
    let points: Vec<(f64, f64)> = logs
        .iter()
        .map(|log| (((log.day - first_day).num_days()) as f64, log.gb_used))
        .collect();

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (x, y) in &points {
        covariance += (x - mean_x) * (y - mean_y);
        variance += (x - mean_x) * (x - mean_x);
    }
    // One row per day makes the x values distinct, but a degenerate input
    // still must not divide by zero.
    if variance == 0.0 {
        return None;
    }

    let slope = covariance / variance;
    let intercept = mean_y - slope * mean_x;

    let last_x = points[points.len() - 1].0;
    let mut total = 0.0;
    for offset in 1..=horizon_days {
        let predicted = intercept + slope * (last_x + offset as f64);
        total += predicted.max(0.0);
    }

    let last_day = logs[logs.len() - 1].day;
    Some(UsageForecast {
        starts_on: last_day + Duration::days(1),
        horizon_days,
        total_predicted_gb: total,
        daily_average_gb: total / horizon_days as f64,
        trend: if slope > 0.0 {
            Trend::Increasing
        } else {
            Trend::Decreasing
        },
        slope_gb_per_day: slope,
        intercept_gb: intercept,
        samples: logs.len(),
    })
}
