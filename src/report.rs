use crate::analysis::{BodyweightSummary, CardioSummary, MonthlyStats, OverviewStats};
use maud::{Markup, html};
use plotters::prelude::*;
use std::path::Path;

trait FormatOption {
    fn fmt_opt(self) -> String;
}

impl FormatOption for Option<f32> {
    fn fmt_opt(self) -> String {
        self.map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "-".into())
    }
}

impl FormatOption for f64 {
    fn fmt_opt(self) -> String {
        format!("{:.1}", self)
    }
}

/// Round to a whole number and group thousands, e.g. `12,346`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// Everything shown in the HTML report for one profile.
pub struct ReportData<'a> {
    pub profile: &'a str,
    pub overview: &'a OverviewStats,
    pub months: &'a [MonthlyStats],
    pub top_exercises: &'a [(String, usize)],
    pub cardio: &'a CardioSummary,
    pub bodyweight: Option<&'a BodyweightSummary>,
}

pub fn export_html_report<P: AsRef<Path>>(path: P, data: &ReportData) -> std::io::Result<()> {
    let path = path.as_ref();
    let chart_path = path.with_extension("png");
    let chart_file = match generate_monthly_chart(data.months, &chart_path) {
        Ok(_) => chart_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("")),
        Err(e) => {
            log::error!("Failed to generate chart: {}", e);
            std::ffi::OsStr::new("")
        }
    };
    let markup = build_html(data, chart_file);
    std::fs::write(path, markup.into_string())
}

fn generate_monthly_chart(
    months: &[MonthlyStats],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    // oldest first
    let ordered: Vec<&MonthlyStats> = months.iter().rev().collect();
    let root = BitMapBackend::new(path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;
    if ordered.is_empty() {
        root.present()?;
        return Ok(());
    }
    let max = ordered
        .iter()
        .map(|m| m.total_volume)
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let labels: Vec<String> = ordered.iter().map(|m| m.period.to_string()).collect();
    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Volume", ("sans-serif", 25))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0..ordered.len(), 0f64..max * 1.1)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Month")
        .y_desc("Volume (kg)")
        .x_label_formatter(&|idx| labels.get(*idx).cloned().unwrap_or_default())
        .draw()?;
    chart.draw_series(ordered.iter().enumerate().map(|(i, m)| {
        Rectangle::new([(i, 0.0), (i + 1, m.total_volume)], BLUE.mix(0.6).filled())
    }))?;
    root.present()?;
    Ok(())
}

fn build_html(data: &ReportData, chart_file: &std::ffi::OsStr) -> Markup {
    html! {
        html {
            head { meta charset="utf-8"; title { "Workout Report - " (data.profile) } }
            body {
                h1 { "Summary for " (data.profile) }
                table border="1" {
                    tr { th { "Workouts" } td { (data.overview.workouts) } }
                    tr { th { "Sets" } td { (data.overview.total_sets) } }
                    tr { th { "Volume (kg)" } td { (format_thousands(data.overview.total_volume)) } }
                    tr { th { "Exercises" } td { (data.overview.unique_exercises) } }
                }
                h1 { "Cardio" }
                table border="1" {
                    tr { th { "Sessions" } td { (data.cardio.sessions) } }
                    tr { th { "Minutes" } td { (data.cardio.total_duration_min.fmt_opt()) } }
                    tr { th { "Distance (km)" } td { (data.cardio.total_distance_km.fmt_opt()) } }
                    tr { th { "Calories" } td { (format_thousands(data.cardio.total_calories)) } }
                }
                h1 { "Top Exercises" }
                table border="1" {
                    tr { th { "Exercise" } th { "Entries" } }
                    @for (ex, count) in data.top_exercises {
                        tr { td { (ex) } td { (count) } }
                    }
                }
                h1 { "Monthly Progress" }
                table border="1" {
                    tr { th { "Month" } th { "Workouts" } th { "Per Week" } th { "Sets" } th { "Volume (kg)" } th { "Exercises" } }
                    @for m in data.months {
                        tr {
                            td { (m.month_name) }
                            td { (m.workouts) }
                            td { (m.avg_workouts_per_week.fmt_opt()) }
                            td { (m.total_sets) }
                            td { (format_thousands(m.total_volume)) }
                            td { (m.unique_exercises) }
                        }
                    }
                }
                h1 { "Bodyweight" }
                table border="1" {
                    tr { th { "Latest" } td { (data.bodyweight.map(|b| b.latest).fmt_opt()) } }
                    tr { th { "Change" } td { (data.bodyweight.map(|b| b.change_since_first).fmt_opt()) } }
                    tr { th { "Min" } td { (data.bodyweight.map(|b| b.min).fmt_opt()) } }
                    tr { th { "Max" } td { (data.bodyweight.map(|b| b.max).fmt_opt()) } }
                }
                h1 { "Monthly Volume" }
                @if chart_file.is_empty() {
                    p { "Chart unavailable" }
                } @else {
                    img src=(chart_file.to_string_lossy());
                }
            }
        }
    }
}
