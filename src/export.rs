use crate::WorkoutEntry;
use crate::analysis::{MonthlyStats, OverviewStats};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").expect("file name pattern"));

/// Output format picked from a file extension; anything but `.csv` is JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn for_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
        {
            Some(ext) if ext == "csv" => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

/// Suggested name for a history download, e.g. `workouts_rohan_20240105.csv`.
pub fn history_file_name(profile: &str, today: NaiveDate) -> String {
    let profile = UNSAFE_FILE_CHARS.replace_all(profile.trim(), "_");
    format!("workouts_{}_{}.csv", profile, today.format("%Y%m%d"))
}

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

pub fn write_csv<T: Serialize>(writer: impl Write, records: &[T]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(Into::into)
}

/// The filtered history view as CSV text, header included.
pub fn entries_csv_string(entries: &[WorkoutEntry]) -> csv::Result<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, entries)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn save_entries_csv<P: AsRef<Path>>(path: P, entries: &[WorkoutEntry]) -> csv::Result<()> {
    write_csv(std::fs::File::create(path)?, entries)
}

pub fn save_entries_json<P: AsRef<Path>>(path: P, entries: &[WorkoutEntry]) -> std::io::Result<()> {
    write_json(entries, path)
}

pub fn save_monthly_csv<P: AsRef<Path>>(path: P, months: &[MonthlyStats]) -> csv::Result<()> {
    write_csv(std::fs::File::create(path)?, months)
}

#[derive(Serialize)]
pub struct StatsExport<'a> {
    pub profile: &'a str,
    pub summary: &'a OverviewStats,
    pub months: &'a [MonthlyStats],
}

pub fn save_stats_json<P: AsRef<Path>>(
    path: P,
    profile: &str,
    summary: &OverviewStats,
    months: &[MonthlyStats],
) -> std::io::Result<()> {
    let export = StatsExport {
        profile,
        summary,
        months,
    };
    write_json(&export, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkoutType;
    use crate::analysis::monthly_stats;
    use crate::storage::{WORKOUT_HEADER, read_records};
    use tempfile::tempdir;

    fn entries() -> Vec<WorkoutEntry> {
        vec![WorkoutEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            time: Some("18:15".into()),
            profile_id: "rohan".into(),
            workout_type: WorkoutType::Strength,
            muscle_group: "Chest".into(),
            exercise: "Bench Press".into(),
            sets: 4,
            reps: 8,
            weight: 62.5,
            duration_min: 0.0,
            distance_km: 0.0,
            calories: 0.0,
            intensity: None,
            elevation: 0.0,
            notes: "paused \"reps\"".into(),
        }]
    }

    #[test]
    fn history_file_name_is_sanitized() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(history_file_name("rohan", today), "workouts_rohan_20240105.csv");
        assert_eq!(
            history_file_name("rohan / gym", today),
            "workouts_rohan_gym_20240105.csv"
        );
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::for_path(Path::new("a.CSV")), ExportFormat::Csv);
        assert_eq!(ExportFormat::for_path(Path::new("a.json")), ExportFormat::Json);
        assert_eq!(ExportFormat::for_path(Path::new("a")), ExportFormat::Json);
    }

    #[test]
    fn entries_csv_reads_back() {
        let text = entries_csv_string(&entries()).unwrap();
        assert_eq!(text.lines().next(), Some(WORKOUT_HEADER.join(",").as_str()));
        let back: Vec<WorkoutEntry> = read_records(text.as_bytes(), "export").unwrap();
        assert_eq!(back, entries());
    }

    #[test]
    fn monthly_csv_has_month_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("months.csv");
        save_monthly_csv(&path, &monthly_stats(&entries(), None)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("period,month_name,workouts,total_sets,total_volume,unique_exercises,avg_workouts_per_week")
        );
        assert!(lines.next().unwrap().starts_with("2024-03,March 2024,1,4,2000.0,1,"));
    }

    #[test]
    fn stats_json_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let months = monthly_stats(&entries(), Some("rohan"));
        let summary = crate::analysis::overview(&entries());
        save_stats_json(&path, "rohan", &summary, &months).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["profile"], "rohan");
        assert_eq!(json["summary"]["workouts"], 1);
        assert_eq!(json["months"][0]["period"], "2024-03");
    }
}
