use chrono::{Datelike, NaiveDate};
use egui_plot::{Bar, BarChart, Line, PlotPoints};

use crate::BodyweightEntry;
use crate::analysis::ExerciseProgress;

/// X value of a date on the time axis.
pub fn date_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Axis label for an x value produced by [`date_x`].
pub fn format_date_axis(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("{x:.0}"))
}

/// Heaviest weight per date for one exercise.
pub fn weight_progress_points(progress: &ExerciseProgress) -> Vec<[f64; 2]> {
    progress
        .weight_by_date
        .iter()
        .map(|(d, w)| [date_x(*d), *w as f64])
        .collect()
}

pub fn weight_progress_line(progress: &ExerciseProgress, exercise: &str) -> Line {
    Line::new(PlotPoints::from(weight_progress_points(progress))).name(exercise)
}

/// First point at which the personal record was reached.
pub fn record_point(progress: &ExerciseProgress) -> Option<[f64; 2]> {
    let pr = progress.personal_record?;
    progress
        .weight_by_date
        .iter()
        .find(|(_, w)| *w >= pr)
        .map(|(d, w)| [date_x(*d), *w as f64])
}

pub fn bodyweight_points(history: &[BodyweightEntry]) -> Vec<[f64; 2]> {
    history
        .iter()
        .map(|e| [date_x(e.date), e.bodyweight_kg as f64])
        .collect()
}

/// Bodyweight over time, with an optional moving average line.
pub fn bodyweight_lines(history: &[BodyweightEntry], ma_window: Option<usize>) -> Vec<Line> {
    let points = bodyweight_points(history);
    let mut lines = vec![Line::new(PlotPoints::from(points.clone())).name("Bodyweight")];
    if let Some(w) = ma_window.filter(|w| *w > 1) {
        if points.len() > 1 {
            let smooth = moving_average_points(&points, w);
            lines.push(Line::new(PlotPoints::from(smooth)).name(format!("{w}-entry average")));
        }
    }
    lines
}

/// Calculate a simple moving average of the y-values in `points`.
fn moving_average_points(points: &[[f64; 2]], window: usize) -> Vec<[f64; 2]> {
    if window == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(points.len());
    let mut sum = 0.0;
    for i in 0..points.len() {
        sum += points[i][1];
        if i >= window {
            sum -= points[i - window][1];
        }
        let count = window.min(i + 1) as f64;
        out.push([points[i][0], sum / count]);
    }
    out
}

/// Least-squares line through `points`, returned as its two end points.
/// Fewer than two distinct x values produce no line.
pub fn trend_line_points(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    if points.len() < 2 {
        return Vec::new();
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p[1]).sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for p in points {
        num += (p[0] - mean_x) * (p[1] - mean_y);
        den += (p[0] - mean_x).powi(2);
    }
    if den == 0.0 {
        return Vec::new();
    }
    let slope = num / den;
    let intercept = mean_y - slope * mean_x;
    let first = points[0][0];
    let last = points[points.len() - 1][0];
    vec![
        [first, slope * first + intercept],
        [last, slope * last + intercept],
    ]
}

/// Workouts per month as bars at x = 0, 1, 2, ...
pub fn monthly_workouts_bars(trend: &[(String, usize)]) -> BarChart {
    let bars: Vec<Bar> = trend
        .iter()
        .enumerate()
        .map(|(idx, (label, count))| Bar::new(idx as f64, *count as f64).name(label))
        .collect();
    BarChart::new(bars).name("Workouts")
}

/// Axis label of a bar produced by [`monthly_workouts_bars`].
pub fn month_bar_label(trend: &[(String, usize)], x: f64) -> String {
    if x < 0.0 || (x - x.round()).abs() > 1e-6 {
        return String::new();
    }
    trend
        .get(x.round() as usize)
        .map(|(label, _)| label.clone())
        .unwrap_or_default()
}
