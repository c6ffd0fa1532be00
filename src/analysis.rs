// Module for analyzing workout data
use crate::{BodyweightEntry, WorkoutEntry, WorkoutType};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fixed number of weeks per month used for the weekly average.
pub const WEEKS_PER_MONTH: f64 = 4.33;
pub const TOP_EXERCISE_COUNT: usize = 5;
pub const RECENT_SET_COUNT: usize = 5;
pub const RECENT_BODYWEIGHT_COUNT: usize = 10;
pub const HISTORY_DISPLAY_LIMIT: usize = 50;
pub const TREND_MONTHS: usize = 6;

/// `sets × reps × weight` for one entry.
pub fn entry_volume(e: &WorkoutEntry) -> f64 {
    e.sets as f64 * e.reps as f64 * e.weight as f64
}

/// Entries that belong to `profile`. Matching is exact.
pub fn for_profile<'a>(entries: &'a [WorkoutEntry], profile: &str) -> Vec<&'a WorkoutEntry> {
    entries.iter().filter(|e| e.profile_id == profile).collect()
}

/// Calendar month of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Full name, e.g. `January 2024`.
    pub fn name(self) -> String {
        self.first_day()
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| self.to_string())
    }

    /// Abbreviated month name, e.g. `Jan`.
    pub fn short_name(self) -> String {
        self.first_day()
            .map(|d| d.format("%b").to_string())
            .unwrap_or_else(|| self.to_string())
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Totals over a set of workout entries.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct OverviewStats {
    pub workouts: usize,
    pub total_sets: u64,
    pub total_volume: f64,
    pub unique_exercises: usize,
}

pub fn overview<'a, I>(entries: I) -> OverviewStats
where
    I: IntoIterator<Item = &'a WorkoutEntry>,
{
    let mut stats = OverviewStats::default();
    let mut exercises: BTreeSet<&str> = BTreeSet::new();
    for e in entries {
        stats.workouts += 1;
        stats.total_sets += e.sets as u64;
        stats.total_volume += entry_volume(e);
        exercises.insert(e.exercise.as_str());
    }
    stats.unique_exercises = exercises.len();
    stats
}

/// Aggregated figures for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStats {
    pub period: YearMonth,
    pub month_name: String,
    pub workouts: usize,
    pub total_sets: u64,
    pub total_volume: f64,
    pub unique_exercises: usize,
    pub avg_workouts_per_week: f64,
}

/// Group entries by calendar month, newest month first.
///
/// With `profile` set only that profile's rows are counted. Every row counts
/// as one workout.
pub fn monthly_stats(entries: &[WorkoutEntry], profile: Option<&str>) -> Vec<MonthlyStats> {
    let mut months: BTreeMap<YearMonth, Vec<&WorkoutEntry>> = BTreeMap::new();
    for e in entries {
        if profile.is_some_and(|p| e.profile_id != p) {
            continue;
        }
        months.entry(YearMonth::of(e.date)).or_default().push(e);
    }

    months
        .into_iter()
        .rev()
        .map(|(period, rows)| {
            let totals = overview(rows.iter().copied());
            MonthlyStats {
                period,
                month_name: period.name(),
                workouts: totals.workouts,
                total_sets: totals.total_sets,
                total_volume: totals.total_volume,
                unique_exercises: totals.unique_exercises,
                avg_workouts_per_week: totals.workouts as f64 / WEEKS_PER_MONTH,
            }
        })
        .collect()
}

/// Workout counts of the most recent `months` months, oldest first, labelled
/// with the abbreviated month name.
///
/// `stats` is newest first, so the window is its head. Older months beyond the
/// window are left out rather than the newest ones.
pub fn monthly_trend(stats: &[MonthlyStats], months: usize) -> Vec<(String, usize)> {
    stats
        .iter()
        .take(months)
        .rev()
        .map(|m| (m.period.short_name(), m.workouts))
        .collect()
}

/// The most frequently logged exercises with their counts.
pub fn top_exercises<'a, I>(entries: I, n: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a WorkoutEntry>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for e in entries {
        *counts.entry(e.exercise.as_str()).or_insert(0) += 1;
    }
    let mut list: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(ex, c)| (ex.to_string(), c))
        .collect();
    list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    list.truncate(n);
    list
}

/// Distinct exercise names, sorted.
pub fn exercise_names<'a, I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a WorkoutEntry>,
{
    entries
        .into_iter()
        .map(|e| e.exercise.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Exercises offered by the progress chooser: every distinct exercise of
/// `profile`, strength and cardio alike, sorted by name.
pub fn progress_choices(entries: &[WorkoutEntry], profile: &str) -> Vec<String> {
    exercise_names(entries.iter().filter(|e| e.profile_id == profile))
}

/// Progress of a single exercise.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExerciseProgress {
    /// Heaviest weight per date, oldest first.
    pub weight_by_date: Vec<(NaiveDate, f32)>,
    pub personal_record: Option<f32>,
    /// Latest entries, newest first.
    pub recent: Vec<WorkoutEntry>,
}

pub fn exercise_progress<'a, I>(entries: I, exercise: &str) -> ExerciseProgress
where
    I: IntoIterator<Item = &'a WorkoutEntry>,
{
    let mut rows: Vec<&WorkoutEntry> = entries
        .into_iter()
        .filter(|e| e.exercise == exercise)
        .collect();
    rows.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));

    let mut by_date: BTreeMap<NaiveDate, f32> = BTreeMap::new();
    let mut record: Option<f32> = None;
    for e in &rows {
        let best = by_date.entry(e.date).or_insert(e.weight);
        if e.weight > *best {
            *best = e.weight;
        }
        record = match record {
            Some(r) if r >= e.weight => Some(r),
            _ => Some(e.weight),
        };
    }

    let recent = rows
        .iter()
        .rev()
        .take(RECENT_SET_COUNT)
        .map(|e| (*e).clone())
        .collect();

    ExerciseProgress {
        weight_by_date: by_date.into_iter().collect(),
        personal_record: record,
        recent,
    }
}

/// Look-back window of the history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[default]
    Week,
    Month,
    Quarter,
    All,
}

pub const ALL_HISTORY_PERIODS: [HistoryPeriod; 4] = [
    HistoryPeriod::Week,
    HistoryPeriod::Month,
    HistoryPeriod::Quarter,
    HistoryPeriod::All,
];

impl HistoryPeriod {
    pub fn days(self) -> Option<i64> {
        match self {
            HistoryPeriod::Week => Some(7),
            HistoryPeriod::Month => Some(30),
            HistoryPeriod::Quarter => Some(90),
            HistoryPeriod::All => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HistoryPeriod::Week => "7 Days",
            HistoryPeriod::Month => "30 Days",
            HistoryPeriod::Quarter => "90 Days",
            HistoryPeriod::All => "All",
        }
    }
}

/// The profile's entries filtered by muscle group and period, newest first.
///
/// `muscle` of `None` keeps every group. A period of N days keeps entries
/// dated strictly after `today - N days`.
pub fn filter_history(
    entries: &[WorkoutEntry],
    profile: &str,
    muscle: Option<&str>,
    period: HistoryPeriod,
    today: NaiveDate,
) -> Vec<WorkoutEntry> {
    let cutoff = period.days().map(|d| today - Duration::days(d));
    let mut rows: Vec<WorkoutEntry> = entries
        .iter()
        .filter(|e| e.profile_id == profile)
        .filter(|e| muscle.map_or(true, |m| e.muscle_group == m))
        .filter(|e| cutoff.map_or(true, |c| e.date > c))
        .cloned()
        .collect();
    rows.sort_by(|a, b| (b.date, &b.time).cmp(&(a.date, &a.time)));
    rows
}

/// The rows of a newest-first history view that fit on the page, together
/// with the size of the whole view.
pub fn history_page_rows(rows: &[WorkoutEntry]) -> (&[WorkoutEntry], usize) {
    (&rows[..rows.len().min(HISTORY_DISPLAY_LIMIT)], rows.len())
}

/// Totals of the cardio entries.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CardioSummary {
    pub sessions: usize,
    pub total_duration_min: f64,
    pub total_distance_km: f64,
    pub total_calories: f64,
}

pub fn cardio_summary<'a, I>(entries: I) -> CardioSummary
where
    I: IntoIterator<Item = &'a WorkoutEntry>,
{
    let mut s = CardioSummary::default();
    for e in entries {
        if e.workout_type != WorkoutType::Cardio {
            continue;
        }
        s.sessions += 1;
        s.total_duration_min += e.duration_min as f64;
        s.total_distance_km += e.distance_km as f64;
        s.total_calories += e.calories as f64;
    }
    s
}

/// The profile's bodyweight entries, oldest first.
pub fn bodyweight_history(entries: &[BodyweightEntry], profile: &str) -> Vec<BodyweightEntry> {
    let mut rows: Vec<BodyweightEntry> = entries
        .iter()
        .filter(|e| e.profile_id == profile)
        .cloned()
        .collect();
    rows.sort_by_key(|e| e.date);
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyweightSummary {
    pub latest: f32,
    pub change_since_first: f32,
    pub min: f32,
    pub max: f32,
}

/// Summary of a date-ordered bodyweight history. `None` when it is empty.
pub fn bodyweight_summary(history: &[BodyweightEntry]) -> Option<BodyweightSummary> {
    let first = history.first()?;
    let last = history.last()?;
    let (min, max) = history
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), e| {
            (lo.min(e.bodyweight_kg), hi.max(e.bodyweight_kg))
        });
    Some(BodyweightSummary {
        latest: last.bodyweight_kg,
        change_since_first: last.bodyweight_kg - first.bodyweight_kg,
        min,
        max,
    })
}

/// Format a user facing message after loading the data directory.
pub fn format_load_message(workouts: usize, bodyweight: usize, dir: &str) -> String {
    format!("Loaded {workouts} workouts and {bodyweight} bodyweight entries from {dir}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn strength(
        date: NaiveDate,
        profile: &str,
        exercise: &str,
        sets: u32,
        reps: u32,
        weight: f32,
    ) -> WorkoutEntry {
        WorkoutEntry {
            date,
            time: Some("08:00".into()),
            profile_id: profile.into(),
            workout_type: WorkoutType::Strength,
            muscle_group: "Legs".into(),
            exercise: exercise.into(),
            sets,
            reps,
            weight,
            duration_min: 0.0,
            distance_km: 0.0,
            calories: 0.0,
            intensity: None,
            elevation: 0.0,
            notes: String::new(),
        }
    }

    fn run(date: NaiveDate, profile: &str, minutes: f32, km: f32, kcal: f32) -> WorkoutEntry {
        WorkoutEntry {
            workout_type: WorkoutType::Cardio,
            muscle_group: "Cardio".into(),
            duration_min: minutes,
            distance_km: km,
            calories: kcal,
            ..strength(date, profile, "Running", 0, 0, 0.0)
        }
    }

    fn sample_entries() -> Vec<WorkoutEntry> {
        vec![
            strength(day(2024, 1, 2), "rohan", "Squat", 3, 5, 100.0),
            strength(day(2024, 1, 9), "rohan", "Squat", 3, 5, 105.0),
            strength(day(2024, 1, 9), "rohan", "Bench Press", 4, 8, 60.0),
            run(day(2024, 1, 20), "rohan", 30.0, 5.0, 300.0),
            strength(day(2024, 2, 3), "rohan", "Squat", 5, 5, 110.0),
            strength(day(2024, 2, 3), "amy", "Squat", 3, 10, 40.0),
            strength(day(2023, 12, 28), "rohan", "Row", 3, 10, 50.0),
        ]
    }

    #[test]
    fn monthly_stats_for_profile() {
        let stats = monthly_stats(&sample_entries(), Some("rohan"));
        let periods: Vec<String> = stats.iter().map(|m| m.period.to_string()).collect();
        assert_eq!(periods, vec!["2024-02", "2024-01", "2023-12"]);

        let jan = &stats[1];
        assert_eq!(jan.month_name, "January 2024");
        assert_eq!(jan.workouts, 4);
        assert_eq!(jan.total_sets, 10);
        // 3*5*100 + 3*5*105 + 4*8*60 + 0
        assert!((jan.total_volume - 4995.0).abs() < 1e-9);
        assert_eq!(jan.unique_exercises, 3);
        assert!((jan.avg_workouts_per_week - 4.0 / 4.33).abs() < 1e-9);

        let feb = &stats[0];
        assert_eq!(feb.workouts, 1);
        assert!((feb.total_volume - 2750.0).abs() < 1e-9);
    }

    #[test]
    fn monthly_stats_without_filter_counts_everyone() {
        let stats = monthly_stats(&sample_entries(), None);
        assert_eq!(stats[0].workouts, 2);
        assert!((stats[0].total_volume - (2750.0 + 1200.0)).abs() < 1e-9);
        assert_eq!(stats[0].unique_exercises, 1);
    }

    #[test]
    fn monthly_stats_empty_inputs() {
        assert!(monthly_stats(&[], None).is_empty());
        assert!(monthly_stats(&sample_entries(), Some("nobody")).is_empty());
        assert!(monthly_stats(&sample_entries(), Some("Rohan")).is_empty());
    }

    #[test]
    fn monthly_trend_is_latest_months_oldest_first() {
        let entries: Vec<WorkoutEntry> = (1..=8)
            .map(|m| strength(day(2024, m, 1), "rohan", "Squat", 1, 1, 1.0))
            .collect();
        let stats = monthly_stats(&entries, Some("rohan"));
        let trend = monthly_trend(&stats, TREND_MONTHS);
        let labels: Vec<&str> = trend.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Mar", "Apr", "May", "Jun", "Jul", "Aug"]);
        assert!(trend.iter().all(|(_, c)| *c == 1));
    }

    #[test]
    fn overview_totals() {
        let entries = sample_entries();
        let mine = for_profile(&entries, "rohan");
        let o = overview(mine.iter().copied());
        assert_eq!(o.workouts, 6);
        assert_eq!(o.total_sets, 3 + 3 + 4 + 0 + 5 + 3);
        assert!((o.total_volume - (1500.0 + 1575.0 + 1920.0 + 2750.0 + 1500.0)).abs() < 1e-9);
        assert_eq!(o.unique_exercises, 4);
    }

    #[test]
    fn top_exercises_breaks_ties_by_name() {
        let entries = sample_entries();
        let mine = for_profile(&entries, "rohan");
        let top = top_exercises(mine.iter().copied(), TOP_EXERCISE_COUNT);
        assert_eq!(top[0], ("Squat".to_string(), 3));
        assert_eq!(top[1], ("Bench Press".to_string(), 1));
        assert_eq!(top.len(), 4);
        assert_eq!(top_exercises(mine.iter().copied(), 1).len(), 1);
    }

    #[test]
    fn exercise_names_sorted_unique() {
        let entries = sample_entries();
        let names = exercise_names(&entries);
        assert_eq!(names, vec!["Bench Press", "Row", "Running", "Squat"]);
    }

    #[test]
    fn progress_choices_include_cardio() {
        let entries = sample_entries();
        assert_eq!(
            progress_choices(&entries, "rohan"),
            vec!["Bench Press", "Row", "Running", "Squat"]
        );
        assert_eq!(progress_choices(&entries, "amy"), vec!["Squat"]);
        assert!(progress_choices(&entries, "nobody").is_empty());
    }

    #[test]
    fn history_page_keeps_newest_rows_and_full_count() {
        let today = day(2024, 6, 30);
        let entries: Vec<WorkoutEntry> = (0..60)
            .map(|i| {
                strength(
                    today - Duration::days(i),
                    "rohan",
                    "Squat",
                    3,
                    5,
                    100.0 + i as f32,
                )
            })
            .collect();
        let rows = filter_history(&entries, "rohan", None, HistoryPeriod::All, today);
        let (shown, total) = history_page_rows(&rows);
        assert_eq!(total, 60);
        assert_eq!(shown.len(), HISTORY_DISPLAY_LIMIT);
        assert_eq!(shown[0].date, today);
        assert_eq!(shown[HISTORY_DISPLAY_LIMIT - 1].date, today - Duration::days(49));

        let few = &rows[..3];
        let (shown, total) = history_page_rows(few);
        assert_eq!((shown.len(), total), (3, 3));
    }

    #[test]
    fn exercise_progress_series_and_record() {
        let mut entries = sample_entries();
        entries.push(strength(day(2024, 1, 9), "rohan", "Squat", 1, 1, 120.0));
        let mine = for_profile(&entries, "rohan");
        let p = exercise_progress(mine.iter().copied(), "Squat");
        assert_eq!(
            p.weight_by_date,
            vec![
                (day(2024, 1, 2), 100.0),
                (day(2024, 1, 9), 120.0),
                (day(2024, 2, 3), 110.0)
            ]
        );
        assert_eq!(p.personal_record, Some(120.0));
        assert_eq!(p.recent.len(), 4);
        assert_eq!(p.recent[0].date, day(2024, 2, 3));
        assert_eq!(p.recent[3].date, day(2024, 1, 2));
    }

    #[test]
    fn exercise_progress_limits_recent() {
        let entries: Vec<WorkoutEntry> = (1..=9)
            .map(|d| strength(day(2024, 3, d), "rohan", "Squat", 3, 5, 50.0 + d as f32))
            .collect();
        let p = exercise_progress(&entries, "Squat");
        assert_eq!(p.recent.len(), RECENT_SET_COUNT);
        assert_eq!(p.recent[0].date, day(2024, 3, 9));
        assert_eq!(p.personal_record, Some(59.0));
        assert!(exercise_progress(&entries, "Bench Press").personal_record.is_none());
    }

    #[test]
    fn history_filters_period_and_group() {
        let entries = sample_entries();
        let today = day(2024, 2, 9);

        let all = filter_history(&entries, "rohan", None, HistoryPeriod::All, today);
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].date, day(2024, 2, 3));
        assert_eq!(all[5].date, day(2023, 12, 28));

        // cutoff 2024-01-10: the 9th is excluded
        let month = filter_history(&entries, "rohan", None, HistoryPeriod::Month, today);
        assert_eq!(month.len(), 2);

        let week = filter_history(&entries, "rohan", None, HistoryPeriod::Week, today);
        assert_eq!(week.len(), 1);

        let cardio = filter_history(&entries, "rohan", Some("Cardio"), HistoryPeriod::All, today);
        assert_eq!(cardio.len(), 1);
        assert_eq!(cardio[0].exercise, "Running");

        assert!(filter_history(&entries, "nobody", None, HistoryPeriod::All, today).is_empty());
    }

    #[test]
    fn history_period_labels() {
        let labels: Vec<&str> = ALL_HISTORY_PERIODS.iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["7 Days", "30 Days", "90 Days", "All"]);
        assert_eq!(HistoryPeriod::Quarter.days(), Some(90));
    }

    #[test]
    fn cardio_summary_ignores_strength() {
        let mut entries = sample_entries();
        entries.push(run(day(2024, 2, 5), "rohan", 45.0, 8.5, 500.0));
        let mine = for_profile(&entries, "rohan");
        let s = cardio_summary(mine.iter().copied());
        assert_eq!(s.sessions, 2);
        assert!((s.total_duration_min - 75.0).abs() < 1e-9);
        assert!((s.total_distance_km - 13.5).abs() < 1e-9);
        assert!((s.total_calories - 800.0).abs() < 1e-9);
    }

    #[test]
    fn bodyweight_history_and_summary() {
        let entries = vec![
            BodyweightEntry {
                date: day(2024, 1, 15),
                profile_id: "rohan".into(),
                bodyweight_kg: 79.0,
            },
            BodyweightEntry {
                date: day(2024, 1, 1),
                profile_id: "rohan".into(),
                bodyweight_kg: 81.0,
            },
            BodyweightEntry {
                date: day(2024, 1, 8),
                profile_id: "amy".into(),
                bodyweight_kg: 60.0,
            },
            BodyweightEntry {
                date: day(2024, 1, 8),
                profile_id: "rohan".into(),
                bodyweight_kg: 82.0,
            },
        ];
        let hist = bodyweight_history(&entries, "rohan");
        let dates: Vec<NaiveDate> = hist.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(2024, 1, 1), day(2024, 1, 8), day(2024, 1, 15)]);

        let s = bodyweight_summary(&hist).unwrap();
        assert_eq!(s.latest, 79.0);
        assert_eq!(s.change_since_first, -2.0);
        assert_eq!(s.min, 79.0);
        assert_eq!(s.max, 82.0);
        assert!(bodyweight_summary(&[]).is_none());
    }

    #[test]
    fn test_format_load_message() {
        let msg = format_load_message(10, 2, "/data");
        assert_eq!(msg, "Loaded 10 workouts and 2 bodyweight entries from /data");
    }
}
