//! Workout tracker: strength and cardio log, bodyweight journal and
//! per-profile statistics in a single desktop window.

use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use egui_extras::DatePickerButton;
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, Points};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use log::info;

mod analysis;
use analysis::{
    HistoryPeriod, MonthlyStats, RECENT_BODYWEIGHT_COUNT, TOP_EXERCISE_COUNT, TREND_MONTHS,
    bodyweight_history, bodyweight_summary, cardio_summary, exercise_progress, filter_history,
    for_profile, format_load_message, history_page_rows, monthly_stats, monthly_trend, overview,
    progress_choices, top_exercises,
};
mod plotting;
use plotting::{
    bodyweight_lines, bodyweight_points, format_date_axis, month_bar_label, monthly_workouts_bars,
    record_point, trend_line_points, weight_progress_line,
};
mod export;
use export::{
    ExportFormat, entries_csv_string, history_file_name, save_entries_csv, save_entries_json,
    save_monthly_csv, save_stats_json,
};
mod report;
use report::{ReportData, export_html_report, format_thousands};
mod cardio;
mod credentials;
use credentials::CredentialStore;
mod error;
use error::{FormError, StoreError};
mod exercise_library;
use exercise_library::ExerciseLibrary;
mod forms;
use forms::{
    BODYWEIGHT_RANGE, BodyweightForm, CALORIES_RANGE, DISTANCE_RANGE, DURATION_RANGE,
    ELEVATION_RANGE, MAX_WEIGHT, REPS_RANGE, SETS_RANGE, WEIGHT_STEP, WorkoutForm,
};
mod identity;
use identity::{ALL_IDENTITY_MODES, IdentityMode, Session, SignInForm};
mod storage;
use storage::DataStore;

/// Strength or cardio. Stored lowercase; capitalized values from older
/// files are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkoutType {
    #[default]
    #[serde(rename = "strength", alias = "Strength")]
    Strength,
    #[serde(rename = "cardio", alias = "Cardio")]
    Cardio,
}

impl WorkoutType {
    fn label(self) -> &'static str {
        match self {
            WorkoutType::Strength => "Strength",
            WorkoutType::Cardio => "Cardio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Intensity {
    Easy,
    #[default]
    Moderate,
    Hard,
}

const ALL_INTENSITIES: [Intensity; 3] = [Intensity::Easy, Intensity::Moderate, Intensity::Hard];

impl Intensity {
    fn label(self) -> &'static str {
        match self {
            Intensity::Easy => "Easy",
            Intensity::Moderate => "Moderate",
            Intensity::Hard => "Hard",
        }
    }
}

/// One row of `workouts_log.csv`. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    #[serde(deserialize_with = "storage::de_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(alias = "username", alias = "user")]
    pub profile_id: String,
    #[serde(default, deserialize_with = "storage::de_or_default")]
    pub workout_type: WorkoutType,
    #[serde(default)]
    pub muscle_group: String,
    pub exercise: String,
    #[serde(default, deserialize_with = "storage::de_u32")]
    pub sets: u32,
    #[serde(default, deserialize_with = "storage::de_u32")]
    pub reps: u32,
    #[serde(default, deserialize_with = "storage::de_f32")]
    pub weight: f32,
    #[serde(default, deserialize_with = "storage::de_f32")]
    pub duration_min: f32,
    #[serde(default, deserialize_with = "storage::de_f32")]
    pub distance_km: f32,
    #[serde(default, deserialize_with = "storage::de_f32")]
    pub calories: f32,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub intensity: Option<Intensity>,
    #[serde(default, deserialize_with = "storage::de_f32")]
    pub elevation: f32,
    #[serde(default)]
    pub notes: String,
}

/// One row of `bodyweight_log.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyweightEntry {
    #[serde(deserialize_with = "storage::de_date")]
    pub date: NaiveDate,
    #[serde(alias = "username", alias = "user")]
    pub profile_id: String,
    #[serde(alias = "weight", deserialize_with = "storage::de_f32")]
    pub bodyweight_kg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum Page {
    #[default]
    Log,
    History,
    Stats,
    Monthly,
    Bodyweight,
    Exercises,
}

const ALL_PAGES: [Page; 6] = [
    Page::Log,
    Page::History,
    Page::Stats,
    Page::Monthly,
    Page::Bodyweight,
    Page::Exercises,
];

impl Page {
    fn label(self) -> &'static str {
        match self {
            Page::Log => "Log Workout",
            Page::History => "History",
            Page::Stats => "Statistics",
            Page::Monthly => "Monthly",
            Page::Bodyweight => "Bodyweight",
            Page::Exercises => "Exercises",
        }
    }
}

const DATA_DIR_ENV: &str = "WORKOUT_TRACKER_DATA_DIR";
const SHARED_PASSWORD_ENV: &str = "WORKOUT_TRACKER_SHARED_PASSWORD";
const DATA_DIR_NAME: &str = "workout_tracker";
const ALL_GROUPS: &str = "All";

/// Non-empty value of an environment variable.
fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Persistent user settings.
///
/// Stored as JSON in the platform config directory. Every field falls back
/// to its default when missing from the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
struct Settings {
    identity_mode: IdentityMode,
    data_dir: Option<String>,
    shared_password: Option<String>,
    remember_profile: bool,
    last_profile: Option<String>,
    page: Page,
    history_muscle: Option<String>,
    history_period: HistoryPeriod,
    show_bodyweight_average: bool,
    bodyweight_ma_window: usize,
    show_bodyweight_trend: bool,
    open_report_after_export: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identity_mode: IdentityMode::ProfileId,
            data_dir: None,
            shared_password: None,
            remember_profile: false,
            last_profile: None,
            page: Page::Log,
            history_muscle: None,
            history_period: HistoryPeriod::Week,
            show_bodyweight_average: false,
            bodyweight_ma_window: 7,
            show_bodyweight_trend: true,
            open_report_after_export: true,
        }
    }
}

impl Settings {
    const FILE: &'static str = "workout_tracker_settings.json";

    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring invalid settings in {}: {e}", path.display()),
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        let Some(path) = Self::path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, data) {
                    log::warn!("Failed to write {}: {e}", path.display());
                }
            }
            Err(e) => log::warn!("Failed to serialize settings: {e}"),
        }
    }

    /// Data directory: environment, then settings, then the platform data dir.
    fn resolved_data_dir(&self) -> PathBuf {
        env_override(DATA_DIR_ENV)
            .or_else(|| self.data_dir.clone().filter(|d| !d.trim().is_empty()))
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|p| p.join(DATA_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
    }

    fn resolved_shared_password(&self) -> Option<String> {
        env_override(SHARED_PASSWORD_ENV)
            .or_else(|| self.shared_password.clone().filter(|p| !p.is_empty()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Success,
    Info,
    Warning,
    Error,
}

impl StatusKind {
    fn color(self) -> egui::Color32 {
        match self {
            StatusKind::Success => egui::Color32::LIGHT_GREEN,
            StatusKind::Info => egui::Color32::LIGHT_BLUE,
            StatusKind::Warning => egui::Color32::YELLOW,
            StatusKind::Error => egui::Color32::LIGHT_RED,
        }
    }

    fn duration(self) -> Duration {
        match self {
            StatusKind::Error => Duration::from_secs(8),
            _ => Duration::from_secs(4),
        }
    }
}

struct Status {
    kind: StatusKind,
    text: String,
    since: Instant,
}

/// Table cells of one history row. Fields that do not apply to the
/// workout type are left blank.
fn history_cells(e: &WorkoutEntry) -> [String; 14] {
    let num = |v: f32| {
        if v == 0.0 {
            String::new()
        } else {
            format!("{v:.1}")
        }
    };
    let strength = e.workout_type == WorkoutType::Strength;
    [
        e.date.format("%Y-%m-%d").to_string(),
        e.time.clone().unwrap_or_default(),
        e.workout_type.label().to_string(),
        e.muscle_group.clone(),
        e.exercise.clone(),
        if strength { e.sets.to_string() } else { String::new() },
        if strength { e.reps.to_string() } else { String::new() },
        if strength { num(e.weight) } else { String::new() },
        num(e.duration_min),
        num(e.distance_km),
        num(e.calories),
        e.intensity.map(|i| i.label().to_string()).unwrap_or_default(),
        num(e.elevation),
        e.notes.clone(),
    ]
}

const HISTORY_COLUMNS: [&str; 14] = [
    "Date",
    "Time",
    "Type",
    "Muscle Group",
    "Exercise",
    "Sets",
    "Reps",
    "Weight (kg)",
    "Duration (min)",
    "Distance (km)",
    "Calories",
    "Intensity",
    "Elevation (%)",
    "Notes",
];

fn history_table(ui: &mut egui::Ui, rows: &[WorkoutEntry]) {
    let row_height = ui.text_style_height(&egui::TextStyle::Body);
    egui_extras::TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .vscroll(false)
        .columns(egui_extras::Column::auto(), HISTORY_COLUMNS.len())
        .header(row_height, |mut header| {
            for title in HISTORY_COLUMNS {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for e in rows {
                body.row(row_height, |mut row| {
                    for cell in history_cells(e) {
                        row.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            }
        });
}

/// Text lines of one card on the monthly page.
fn month_card_lines(m: &MonthlyStats) -> [String; 3] {
    [
        format!(
            "Workouts: {} ({:.1}/week)",
            m.workouts, m.avg_workouts_per_week
        ),
        format!(
            "Sets: {} | Volume: {} kg",
            m.total_sets,
            format_thousands(m.total_volume)
        ),
        format!("Exercises: {}", m.unique_exercises),
    ]
}

/// Headline figures of the current month.
fn current_month_metrics(m: &MonthlyStats) -> [(&'static str, String); 5] {
    [
        ("Workouts", m.workouts.to_string()),
        ("Per Week", format!("{:.1}", m.avg_workouts_per_week)),
        ("Sets", m.total_sets.to_string()),
        ("Volume", format!("{} kg", format_thousands(m.total_volume))),
        ("Exercises", m.unique_exercises.to_string()),
    ]
}

fn metric(ui: &mut egui::Ui, label: &str, value: String) {
    ui.vertical(|ui| {
        ui.label(label);
        ui.heading(value);
    });
}

struct TrackerApp {
    settings: Settings,
    settings_dirty: bool,
    store: DataStore,
    workouts: Vec<WorkoutEntry>,
    bodyweight: Vec<BodyweightEntry>,
    library: ExerciseLibrary,
    credentials: CredentialStore,
    session: Option<Session>,
    sign_in: SignInForm,
    workout_form: WorkoutForm,
    bodyweight_form: BodyweightForm,
    library_group: String,
    add_new_group: bool,
    new_group_name: String,
    new_exercise: String,
    progress_exercise: Option<String>,
    data_dir_input: String,
    show_settings: bool,
    status: Option<Status>,
}

impl Default for TrackerApp {
    fn default() -> Self {
        Self::with_settings(Settings::load())
    }
}

impl TrackerApp {
    fn with_settings(settings: Settings) -> Self {
        let now = Local::now().naive_local();
        let data_dir = settings.resolved_data_dir();
        let mut app = Self {
            data_dir_input: settings.data_dir.clone().unwrap_or_default(),
            settings,
            settings_dirty: false,
            store: DataStore::new(data_dir),
            workouts: Vec::new(),
            bodyweight: Vec::new(),
            library: ExerciseLibrary::default(),
            credentials: CredentialStore::default(),
            session: None,
            sign_in: SignInForm::default(),
            workout_form: WorkoutForm::new(now),
            bodyweight_form: BodyweightForm::new(now.date()),
            library_group: String::new(),
            add_new_group: false,
            new_group_name: String::new(),
            new_exercise: String::new(),
            progress_exercise: None,
            show_settings: false,
            status: None,
        };
        app.open_store();

        if let Some(last) = app.settings.last_profile.clone() {
            app.sign_in.profile_id = last.clone();
            if app.settings.remember_profile
                && app.settings.identity_mode == IdentityMode::ProfileId
            {
                info!("Resuming session for {last}");
                app.session = Some(Session {
                    user: last,
                    mode: IdentityMode::ProfileId,
                });
            }
        }
        app
    }

    fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(Status {
            kind,
            text: text.into(),
            since: Instant::now(),
        });
    }

    fn report_store_error(&mut self, action: &str, err: StoreError) {
        log::error!("Failed to {action}: {err}");
        self.set_status(StatusKind::Error, format!("Failed to {action}: {err}"));
    }

    fn reload(&mut self) -> Result<(), StoreError> {
        self.workouts = self.store.load_workouts()?;
        self.bodyweight = self.store.load_bodyweight()?;
        self.library = ExerciseLibrary::load_or_create(self.store.exercises_path())?;
        self.credentials = CredentialStore::load(self.store.users_path())?;
        Ok(())
    }

    /// Point the app at the resolved data directory, creating missing files.
    fn open_store(&mut self) {
        self.store = DataStore::new(self.settings.resolved_data_dir());
        if let Err(e) = self.store.initialize() {
            self.report_store_error("prepare the data directory", e);
            return;
        }
        match self.reload() {
            Ok(()) => {
                let msg = format_load_message(
                    self.workouts.len(),
                    self.bodyweight.len(),
                    &self.store.dir().display().to_string(),
                );
                info!("{msg}");
                self.set_status(StatusKind::Info, msg);
            }
            Err(e) => self.report_store_error("load data", e),
        }
    }

    /// Re-read the stores after a write so every view shows the new row.
    fn after_write(&mut self, message: String) {
        match self.reload() {
            Ok(()) => self.set_status(StatusKind::Success, message),
            Err(e) => self.report_store_error("reload data", e),
        }
    }

    fn start_session(&mut self, session: Session) {
        if session.mode == IdentityMode::ProfileId {
            self.settings.last_profile = Some(session.user.clone());
            self.settings_dirty = true;
        }
        self.sign_in.password.clear();
        self.progress_exercise = None;
        self.session = Some(session);
    }

    fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            info!("Signed out {}", session.user);
        }
        self.sign_in.password.clear();
        self.set_status(StatusKind::Info, "Signed out");
    }

    fn try_sign_in(&mut self) {
        let shared = self.settings.resolved_shared_password();
        match identity::sign_in(
            self.settings.identity_mode,
            &self.sign_in,
            shared.as_deref(),
            &self.credentials,
        ) {
            Ok(session) => self.start_session(session),
            Err(e) => self.set_status(StatusKind::Error, e.to_string()),
        }
    }

    fn try_register(&mut self) {
        let mut store = self.credentials.clone();
        match identity::register(&self.sign_in, &mut store) {
            Ok(session) => match store.save(self.store.users_path()) {
                Ok(()) => {
                    self.credentials = store;
                    self.set_status(
                        StatusKind::Success,
                        format!("Account created for {}", session.user),
                    );
                    self.start_session(session);
                }
                Err(e) => self.report_store_error("save accounts", e),
            },
            Err(e) => self.set_status(StatusKind::Error, e.to_string()),
        }
    }

    fn save_workout(&mut self, user: &str) {
        match self.workout_form.to_entry(user) {
            Ok(entry) => match self.store.append_workout(&entry) {
                Ok(()) => {
                    info!("Saved {} workout for {user}", entry.exercise);
                    self.workout_form.reset_after_save();
                    self.after_write(format!("Saved {}", entry.exercise));
                }
                Err(e) => self.report_store_error("save workout", e),
            },
            Err(e) => self.set_status(StatusKind::Warning, e.to_string()),
        }
    }

    fn save_bodyweight(&mut self, user: &str) {
        match self.bodyweight_form.to_entry(user) {
            Ok(entry) => match self.store.append_bodyweight(&entry) {
                Ok(()) => {
                    info!("Saved bodyweight {:.1} kg for {user}", entry.bodyweight_kg);
                    self.after_write(format!("Saved bodyweight {:.1} kg", entry.bodyweight_kg));
                }
                Err(e) => self.report_store_error("save bodyweight", e),
            },
            Err(e) => self.set_status(StatusKind::Warning, e.to_string()),
        }
    }

    fn add_exercise(&mut self) {
        let group = if self.add_new_group {
            self.new_group_name.trim().to_string()
        } else {
            self.library_group.clone()
        };
        let exercise = self.new_exercise.trim().to_string();
        match self.library.add_exercise(&group, &exercise) {
            Ok(()) => match self.library.save(self.store.exercises_path()) {
                Ok(()) => {
                    info!("Added {exercise} to {group}");
                    self.new_exercise.clear();
                    if self.add_new_group {
                        self.add_new_group = false;
                        self.new_group_name.clear();
                        self.library_group = group.clone();
                    }
                    self.after_write(format!("Added {exercise} to {group}"));
                }
                Err(e) => self.report_store_error("save the exercise library", e),
            },
            Err(e @ FormError::DuplicateExercise(_)) => {
                self.set_status(StatusKind::Warning, e.to_string())
            }
            Err(e) => self.set_status(StatusKind::Error, e.to_string()),
        }
    }

    fn download_history(&mut self, rows: &[WorkoutEntry], user: &str) {
        let today = Local::now().date_naive();
        if let Some(path) = FileDialog::new()
            .set_file_name(history_file_name(user, today))
            .add_filter("CSV", &["csv"])
            .add_filter("JSON", &["json"])
            .save_file()
        {
            let result = match ExportFormat::for_path(&path) {
                ExportFormat::Csv => save_entries_csv(&path, rows).map_err(StoreError::from),
                ExportFormat::Json => save_entries_json(&path, rows).map_err(StoreError::from),
            };
            match result {
                Ok(()) => {
                    info!("Exported {} workouts to {}", rows.len(), path.display());
                    self.set_status(
                        StatusKind::Success,
                        format!("Exported {} workouts", rows.len()),
                    );
                }
                Err(e) => self.report_store_error("export history", e),
            }
        }
    }

    fn copy_history(&mut self, ctx: &egui::Context, rows: &[WorkoutEntry]) {
        match entries_csv_string(rows) {
            Ok(text) => {
                ctx.output_mut(|o| o.copied_text = text);
                self.set_status(StatusKind::Info, format!("Copied {} rows", rows.len()));
            }
            Err(e) => self.report_store_error("copy history", e.into()),
        }
    }

    fn export_stats(&mut self, user: &str) {
        if let Some(path) = FileDialog::new()
            .set_file_name(format!("stats_{}.json", user))
            .add_filter("JSON", &["json"])
            .add_filter("CSV", &["csv"])
            .save_file()
        {
            let mine = for_profile(&self.workouts, user);
            let summary = overview(mine.iter().copied());
            let months = monthly_stats(&self.workouts, Some(user));
            let result = match ExportFormat::for_path(&path) {
                ExportFormat::Csv => save_monthly_csv(&path, &months).map_err(StoreError::from),
                ExportFormat::Json => {
                    save_stats_json(&path, user, &summary, &months).map_err(StoreError::from)
                }
            };
            match result {
                Ok(()) => {
                    info!("Exported statistics to {}", path.display());
                    self.set_status(StatusKind::Success, "Statistics exported");
                }
                Err(e) => self.report_store_error("export statistics", e),
            }
        }
    }

    fn export_report(&mut self, user: &str) {
        let Some(path) = FileDialog::new()
            .set_file_name(format!("report_{}.html", user))
            .add_filter("HTML", &["html"])
            .save_file()
        else {
            return;
        };
        let mine = for_profile(&self.workouts, user);
        let summary = overview(mine.iter().copied());
        let months = monthly_stats(&self.workouts, Some(user));
        let top = top_exercises(mine.iter().copied(), TOP_EXERCISE_COUNT);
        let cardio = cardio_summary(mine.iter().copied());
        let history = bodyweight_history(&self.bodyweight, user);
        let bodyweight = bodyweight_summary(&history);
        let data = ReportData {
            profile: user,
            overview: &summary,
            months: &months,
            top_exercises: &top,
            cardio: &cardio,
            bodyweight: bodyweight.as_ref(),
        };
        match export_html_report(&path, &data) {
            Ok(()) => {
                info!("Wrote report to {}", path.display());
                self.set_status(StatusKind::Success, "Report exported");
                if self.settings.open_report_after_export {
                    if let Err(e) = open::that(&path) {
                        log::warn!("Failed to open {}: {e}", path.display());
                    }
                }
            }
            Err(e) => self.report_store_error("write report", e.into()),
        }
    }

    fn sign_in_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Workout Tracker");
        ui.label("Sign in to log and review your workouts.");
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            for mode in ALL_IDENTITY_MODES {
                if ui
                    .radio_value(&mut self.settings.identity_mode, mode, mode.label())
                    .changed()
                {
                    self.settings_dirty = true;
                }
            }
        });
        ui.add_space(8.0);
        let mode = self.settings.identity_mode;
        egui::Grid::new("sign_in_form").num_columns(2).show(ui, |ui| {
            match mode {
                IdentityMode::ProfileId => {
                    ui.label("Profile ID");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.sign_in.profile_id)
                            .hint_text("e.g. rohan123"),
                    );
                    ui.end_row();
                }
                IdentityMode::SharedPassword => {
                    ui.label("Name");
                    ui.text_edit_singleline(&mut self.sign_in.name);
                    ui.end_row();
                    ui.label("Password");
                    ui.add(egui::TextEdit::singleline(&mut self.sign_in.password).password(true));
                    ui.end_row();
                }
                IdentityMode::Account => {
                    ui.label("Username");
                    ui.text_edit_singleline(&mut self.sign_in.username);
                    ui.end_row();
                    ui.label("Password");
                    ui.add(egui::TextEdit::singleline(&mut self.sign_in.password).password(true));
                    ui.end_row();
                }
            }
        });

        match mode {
            IdentityMode::ProfileId => {
                if ui
                    .checkbox(&mut self.settings.remember_profile, "Remember this profile")
                    .changed()
                {
                    self.settings_dirty = true;
                }
            }
            IdentityMode::SharedPassword => {
                if self.settings.resolved_shared_password().is_none() {
                    ui.colored_label(
                        StatusKind::Warning.color(),
                        format!(
                            "No shared password is configured. Set one in Settings or {SHARED_PASSWORD_ENV}."
                        ),
                    );
                }
            }
            IdentityMode::Account => {
                ui.label(format!("{} registered accounts", self.credentials.len()));
            }
        }

        ui.horizontal(|ui| {
            if ui.button("Sign In").clicked() {
                self.try_sign_in();
            }
            if mode == IdentityMode::Account && ui.button("Register").clicked() {
                self.try_register();
            }
            if ui.button("Settings").clicked() {
                self.show_settings = true;
            }
        });
    }

    fn menu_bar(&mut self, ctx: &egui::Context, user: &str) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Settings").clicked() {
                        self.show_settings = true;
                        ui.close_menu();
                    }
                    if ui.button("Reload Data").clicked() {
                        self.open_store();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Export Stats").clicked() {
                        self.export_stats(user);
                        ui.close_menu();
                    }
                    if ui.button("HTML Report").clicked() {
                        self.export_report(user);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Sign Out").clicked() {
                        self.sign_out();
                        ui.close_menu();
                    }
                });
                ui.separator();
                for page in ALL_PAGES {
                    if ui
                        .selectable_value(&mut self.settings.page, page, page.label())
                        .changed()
                    {
                        self.settings_dirty = true;
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Signed in as {user}"));
                });
            });
        });
    }

    /// Keep the strength selection pointing at an existing group and
    /// exercise after the library changed.
    fn sync_strength_selection(&mut self) {
        let groups = self.library.group_names();
        if !groups.contains(&self.workout_form.muscle_group) {
            self.workout_form.muscle_group = groups.first().cloned().unwrap_or_default();
        }
        let exercises = self.library.exercises(&self.workout_form.muscle_group);
        if !exercises.contains(&self.workout_form.exercise) {
            self.workout_form.exercise = exercises.first().cloned().unwrap_or_default();
        }
    }

    fn strength_fields(&mut self, ui: &mut egui::Ui) {
        let groups = self.library.group_names();
        let exercises = self
            .library
            .exercises(&self.workout_form.muscle_group)
            .to_vec();
        let form = &mut self.workout_form;
        ui.label("Muscle Group");
        egui::ComboBox::from_id_source("muscle_group")
            .selected_text(form.muscle_group.clone())
            .show_ui(ui, |ui| {
                for g in &groups {
                    ui.selectable_value(&mut form.muscle_group, g.clone(), g.as_str());
                }
            });
        ui.end_row();
        ui.label("Exercise");
        egui::ComboBox::from_id_source("exercise")
            .selected_text(form.exercise.clone())
            .show_ui(ui, |ui| {
                for ex in &exercises {
                    ui.selectable_value(&mut form.exercise, ex.clone(), ex.as_str());
                }
            });
        ui.end_row();
        ui.label("Sets");
        ui.add(egui::DragValue::new(&mut form.sets).clamp_range(SETS_RANGE));
        ui.end_row();
        ui.label("Reps");
        ui.add(egui::DragValue::new(&mut form.reps).clamp_range(REPS_RANGE));
        ui.end_row();
        ui.label("Weight");
        ui.add(
            egui::DragValue::new(&mut form.weight)
                .speed(WEIGHT_STEP)
                .clamp_range(0.0..=MAX_WEIGHT)
                .suffix(" kg"),
        );
        ui.end_row();
    }

    fn cardio_fields(&mut self, ui: &mut egui::Ui) {
        let form = &mut self.workout_form;
        ui.label("Activity");
        egui::ComboBox::from_id_source("cardio_exercise")
            .selected_text(form.cardio_exercise.clone())
            .show_ui(ui, |ui| {
                for name in cardio::cardio_names() {
                    ui.selectable_value(&mut form.cardio_exercise, name.to_string(), name);
                }
            });
        ui.end_row();
        ui.label("Duration");
        ui.add(
            egui::DragValue::new(&mut form.duration_min)
                .clamp_range(DURATION_RANGE)
                .suffix(" min"),
        );
        ui.end_row();
        ui.label("Distance");
        ui.add(
            egui::DragValue::new(&mut form.distance_km)
                .speed(0.1)
                .clamp_range(DISTANCE_RANGE)
                .suffix(" km"),
        );
        ui.end_row();
        ui.label("Calories");
        ui.add(
            egui::DragValue::new(&mut form.calories)
                .speed(5.0)
                .clamp_range(CALORIES_RANGE),
        );
        ui.end_row();
        ui.label("Intensity");
        ui.horizontal(|ui| {
            for level in ALL_INTENSITIES {
                ui.radio_value(&mut form.intensity, level, level.label());
            }
        });
        ui.end_row();
        if cardio::tracks_elevation(&form.cardio_exercise) {
            ui.label("Incline");
            ui.add(
                egui::DragValue::new(&mut form.elevation)
                    .speed(0.5)
                    .clamp_range(ELEVATION_RANGE)
                    .suffix(" %"),
            );
            ui.end_row();
        }
    }

    fn log_page(&mut self, ui: &mut egui::Ui, user: &str) {
        ui.heading("Log Workout");
        self.sync_strength_selection();
        ui.horizontal(|ui| {
            for kind in [WorkoutType::Strength, WorkoutType::Cardio] {
                ui.radio_value(&mut self.workout_form.workout_type, kind, kind.label());
            }
        });
        egui::Grid::new("log_form").num_columns(2).show(ui, |ui| {
            ui.label("Date");
            ui.add(DatePickerButton::new(&mut self.workout_form.date).id_source("workout_date"));
            ui.end_row();
            ui.label("Time");
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut self.workout_form.hour).clamp_range(0..=23));
                ui.label(":");
                ui.add(egui::DragValue::new(&mut self.workout_form.minute).clamp_range(0..=59));
            });
            ui.end_row();
            match self.workout_form.workout_type {
                WorkoutType::Strength => self.strength_fields(ui),
                WorkoutType::Cardio => self.cardio_fields(ui),
            }
            ui.label("Notes");
            ui.add(
                egui::TextEdit::multiline(&mut self.workout_form.notes)
                    .desired_rows(2)
                    .hint_text("Optional"),
            );
            ui.end_row();
        });
        if self.workout_form.workout_type == WorkoutType::Cardio
            && cardio::is_outdoor(&self.workout_form.cardio_exercise)
        {
            ui.small("Outdoor activity: distance is usually tracked by your watch.");
        }
        if ui.button("Save Workout").clicked() {
            self.save_workout(user);
        }
    }

    fn history_page(&mut self, ui: &mut egui::Ui, user: &str) {
        ui.heading("Workout History");
        let mut options = vec![ALL_GROUPS.to_string()];
        options.extend(self.library.group_names());
        if !options.iter().any(|o| o == cardio::CARDIO_GROUP) {
            options.push(cardio::CARDIO_GROUP.to_string());
        }
        ui.horizontal(|ui| {
            ui.label("Muscle Group");
            let selected = self
                .settings
                .history_muscle
                .clone()
                .unwrap_or_else(|| ALL_GROUPS.to_string());
            egui::ComboBox::from_id_source("history_muscle")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for opt in &options {
                        let value = (opt != ALL_GROUPS).then(|| opt.clone());
                        if ui
                            .selectable_value(&mut self.settings.history_muscle, value, opt.as_str())
                            .changed()
                        {
                            self.settings_dirty = true;
                        }
                    }
                });
            ui.label("Period");
            egui::ComboBox::from_id_source("history_period")
                .selected_text(self.settings.history_period.label())
                .show_ui(ui, |ui| {
                    for period in analysis::ALL_HISTORY_PERIODS {
                        if ui
                            .selectable_value(
                                &mut self.settings.history_period,
                                period,
                                period.label(),
                            )
                            .changed()
                        {
                            self.settings_dirty = true;
                        }
                    }
                });
        });

        let rows = filter_history(
            &self.workouts,
            user,
            self.settings.history_muscle.as_deref(),
            self.settings.history_period,
            Local::now().date_naive(),
        );
        ui.label(format!("{} workouts", rows.len()));
        if rows.is_empty() {
            ui.label("No workouts match this filter.");
            return;
        }
        ui.horizontal(|ui| {
            if ui.button("Download CSV").clicked() {
                self.download_history(&rows, user);
            }
            if ui.button("Copy CSV").clicked() {
                self.copy_history(ui.ctx(), &rows);
            }
        });
        let (shown, total) = history_page_rows(&rows);
        history_table(ui, shown);
        if total > shown.len() {
            ui.small(format!("Showing the latest {} of {total}", shown.len()));
        }
    }

    fn stats_page(&mut self, ui: &mut egui::Ui, user: &str) {
        ui.heading("Statistics");
        let mine = for_profile(&self.workouts, user);
        if mine.is_empty() {
            ui.label("No workouts logged yet.");
            return;
        }
        let summary = overview(mine.iter().copied());
        ui.horizontal(|ui| {
            metric(ui, "Total Workouts", summary.workouts.to_string());
            metric(ui, "Total Sets", summary.total_sets.to_string());
            metric(
                ui,
                "Total Volume",
                format!("{} kg", format_thousands(summary.total_volume)),
            );
            metric(ui, "Unique Exercises", summary.unique_exercises.to_string());
        });

        ui.separator();
        ui.heading("Top Exercises");
        egui::Grid::new("top_exercises").striped(true).show(ui, |ui| {
            for (rank, (name, count)) in top_exercises(mine.iter().copied(), TOP_EXERCISE_COUNT)
                .iter()
                .enumerate()
            {
                ui.label(format!("{}.", rank + 1));
                ui.label(name.as_str());
                ui.label(format!("{count} entries"));
                ui.end_row();
            }
        });

        let cardio = cardio_summary(mine.iter().copied());
        if cardio.sessions > 0 {
            ui.separator();
            ui.heading("Cardio");
            ui.horizontal(|ui| {
                metric(ui, "Sessions", cardio.sessions.to_string());
                metric(ui, "Minutes", format!("{:.0}", cardio.total_duration_min));
                metric(ui, "Distance", format!("{:.1} km", cardio.total_distance_km));
                metric(ui, "Calories", format_thousands(cardio.total_calories));
            });
        }

        ui.separator();
        ui.heading("Exercise Progress");
        let names = progress_choices(&self.workouts, user);
        let Some(first) = names.first() else {
            return;
        };
        let selected = match &self.progress_exercise {
            Some(n) if names.contains(n) => n.clone(),
            _ => first.clone(),
        };
        let mut choice = selected.clone();
        egui::ComboBox::from_id_source("progress_exercise")
            .selected_text(choice.clone())
            .show_ui(ui, |ui| {
                for n in &names {
                    ui.selectable_value(&mut choice, n.clone(), n.as_str());
                }
            });
        self.progress_exercise = Some(choice);

        let progress = exercise_progress(mine.iter().copied(), &selected);
        if let Some(pr) = progress.personal_record {
            ui.label(format!("Personal record: {pr:.1} kg"));
        }
        Plot::new("progress_plot")
            .height(240.0)
            .legend(Legend::default())
            .x_axis_formatter(|mark, _chars, _range| format_date_axis(mark.value))
            .show(ui, |plot_ui| {
                plot_ui.line(weight_progress_line(&progress, &selected));
                if let Some(point) = record_point(&progress) {
                    plot_ui.points(
                        Points::new(vec![point])
                            .shape(MarkerShape::Diamond)
                            .radius(6.0)
                            .color(egui::Color32::RED)
                            .name("PR"),
                    );
                }
            });
        ui.label("Recent sets");
        egui::Grid::new("recent_sets").striped(true).show(ui, |ui| {
            for title in ["Date", "Sets", "Reps", "Weight"] {
                ui.strong(title);
            }
            ui.end_row();
            for e in &progress.recent {
                ui.label(e.date.format("%Y-%m-%d").to_string());
                ui.label(e.sets.to_string());
                ui.label(e.reps.to_string());
                ui.label(format!("{:.1} kg", e.weight));
                ui.end_row();
            }
        });
    }

    fn monthly_page(&mut self, ui: &mut egui::Ui, user: &str) {
        ui.heading("Monthly Summary");
        let months = monthly_stats(&self.workouts, Some(user));
        let Some(current) = months.first() else {
            ui.label("No workouts logged yet.");
            return;
        };
        ui.label(format!("Current month: {}", current.month_name));
        ui.horizontal(|ui| {
            for (label, value) in current_month_metrics(current) {
                metric(ui, label, value);
            }
        });

        let trend = monthly_trend(&months, TREND_MONTHS);
        let labels = trend.clone();
        Plot::new("monthly_trend")
            .height(200.0)
            .allow_drag(false)
            .allow_zoom(false)
            .x_axis_formatter(move |mark, _chars, _range| month_bar_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(monthly_workouts_bars(&trend));
            });

        for m in &months {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.strong(m.month_name.as_str());
                for line in month_card_lines(m) {
                    ui.label(line);
                }
            });
        }
    }

    fn bodyweight_page(&mut self, ui: &mut egui::Ui, user: &str) {
        ui.heading("Bodyweight");
        ui.horizontal(|ui| {
            ui.add(DatePickerButton::new(&mut self.bodyweight_form.date).id_source("bodyweight_date"));
            ui.add(
                egui::DragValue::new(&mut self.bodyweight_form.weight_kg)
                    .speed(0.1)
                    .clamp_range(BODYWEIGHT_RANGE)
                    .suffix(" kg"),
            );
            if ui.button("Save").clicked() {
                self.save_bodyweight(user);
            }
        });
        ui.small("Weigh in at the same time of day for a steadier trend.");

        let history = bodyweight_history(&self.bodyweight, user);
        let Some(summary) = bodyweight_summary(&history) else {
            ui.label("No bodyweight entries yet.");
            return;
        };
        ui.horizontal(|ui| {
            metric(ui, "Latest", format!("{:.1} kg", summary.latest));
            metric(ui, "Change", format!("{:+.1} kg", summary.change_since_first));
            metric(ui, "Min", format!("{:.1} kg", summary.min));
            metric(ui, "Max", format!("{:.1} kg", summary.max));
        });

        ui.horizontal(|ui| {
            if ui
                .checkbox(&mut self.settings.show_bodyweight_average, "Moving average")
                .changed()
            {
                self.settings_dirty = true;
            }
            if ui
                .add(
                    egui::DragValue::new(&mut self.settings.bodyweight_ma_window)
                        .clamp_range(2..=30)
                        .suffix(" entries"),
                )
                .changed()
            {
                self.settings_dirty = true;
            }
            if ui
                .checkbox(&mut self.settings.show_bodyweight_trend, "Trend line")
                .changed()
            {
                self.settings_dirty = true;
            }
        });

        let window = self
            .settings
            .show_bodyweight_average
            .then_some(self.settings.bodyweight_ma_window);
        let mut lines = bodyweight_lines(&history, window);
        if self.settings.show_bodyweight_trend {
            let trend = trend_line_points(&bodyweight_points(&history));
            if !trend.is_empty() {
                lines.push(Line::new(PlotPoints::from(trend)).name("Trend"));
            }
        }
        Plot::new("bodyweight_plot")
            .height(220.0)
            .legend(Legend::default())
            .x_axis_formatter(|mark, _chars, _range| format_date_axis(mark.value))
            .show(ui, |plot_ui| {
                for line in lines {
                    plot_ui.line(line);
                }
            });

        ui.label("Recent entries");
        egui::Grid::new("recent_bodyweight").striped(true).show(ui, |ui| {
            for e in history.iter().rev().take(RECENT_BODYWEIGHT_COUNT) {
                ui.label(e.date.format("%Y-%m-%d").to_string());
                ui.label(format!("{:.1} kg", e.bodyweight_kg));
                ui.end_row();
            }
        });
    }

    fn exercises_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Exercise Library");
        for (group, exercises) in self.library.groups() {
            egui::CollapsingHeader::new(format!("{} ({})", group, exercises.len()))
                .id_source(("library", group))
                .show(ui, |ui| {
                    for ex in exercises {
                        ui.label(format!("\u{2022} {ex}"));
                    }
                });
        }
        let cardio_count = cardio::CARDIO_EXERCISES.len();
        egui::CollapsingHeader::new(format!("{} ({cardio_count})", cardio::CARDIO_GROUP))
            .id_source("library_cardio")
            .show(ui, |ui| {
                for name in cardio::cardio_names() {
                    let suffix = if cardio::is_outdoor(name) { " (outdoor)" } else { "" };
                    ui.label(format!("\u{2022} {name}{suffix}"));
                }
            });

        ui.separator();
        ui.heading("Add Exercise");
        let groups = self.library.group_names();
        if !groups.contains(&self.library_group) {
            self.library_group = groups.first().cloned().unwrap_or_default();
        }
        ui.checkbox(&mut self.add_new_group, "Create a new muscle group");
        egui::Grid::new("add_exercise").num_columns(2).show(ui, |ui| {
            ui.label("Muscle Group");
            if self.add_new_group {
                ui.add(
                    egui::TextEdit::singleline(&mut self.new_group_name)
                        .hint_text("New group name"),
                );
            } else {
                egui::ComboBox::from_id_source("library_group")
                    .selected_text(self.library_group.clone())
                    .show_ui(ui, |ui| {
                        for g in &groups {
                            ui.selectable_value(&mut self.library_group, g.clone(), g.as_str());
                        }
                    });
            }
            ui.end_row();
            ui.label("Exercise");
            ui.add(egui::TextEdit::singleline(&mut self.new_exercise).hint_text("Exercise name"));
            ui.end_row();
        });

        let similar = self.library.similar_exercises(&self.new_exercise);
        if !similar.is_empty() {
            let list: Vec<String> = similar
                .iter()
                .map(|(group, ex)| format!("{ex} ({group})"))
                .collect();
            ui.colored_label(
                StatusKind::Info.color(),
                format!("Similar exercises already exist: {}", list.join(", ")),
            );
        }
        if ui.button("Add Exercise").clicked() {
            self.add_exercise();
        }
    }

    fn settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.show_settings;
        egui::Window::new("Settings").open(&mut open).show(ctx, |ui| {
            ui.label("Data directory");
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.data_dir_input)
                        .hint_text("Default location"),
                );
                if ui.button("Browse").clicked() {
                    if let Some(dir) = FileDialog::new().pick_folder() {
                        self.data_dir_input = dir.display().to_string();
                    }
                }
                if ui.button("Apply").clicked() {
                    let input = self.data_dir_input.trim();
                    self.settings.data_dir = (!input.is_empty()).then(|| input.to_string());
                    self.settings_dirty = true;
                    self.open_store();
                }
            });
            ui.small(format!("In use: {}", self.store.dir().display()));
            if env_override(DATA_DIR_ENV).is_some() {
                ui.small(format!("{DATA_DIR_ENV} is set and takes precedence."));
            }

            ui.separator();
            ui.label("Shared password");
            let mut password = self.settings.shared_password.clone().unwrap_or_default();
            if ui
                .add(egui::TextEdit::singleline(&mut password).password(true))
                .changed()
            {
                self.settings.shared_password = (!password.is_empty()).then_some(password);
                self.settings_dirty = true;
            }
            if env_override(SHARED_PASSWORD_ENV).is_some() {
                ui.small(format!("{SHARED_PASSWORD_ENV} is set and takes precedence."));
            }

            ui.separator();
            if ui
                .checkbox(&mut self.settings.remember_profile, "Remember profile ID")
                .changed()
            {
                self.settings_dirty = true;
            }
            if ui
                .checkbox(
                    &mut self.settings.open_report_after_export,
                    "Open HTML report after export",
                )
                .changed()
            {
                self.settings_dirty = true;
            }
        });
        self.show_settings = open;
    }

    fn status_toast(&mut self, ctx: &egui::Context) {
        let Some(status) = &self.status else {
            return;
        };
        let remaining = status.kind.duration().saturating_sub(status.since.elapsed());
        if remaining.is_zero() {
            self.status = None;
            return;
        }
        egui::Area::new(egui::Id::new("status_toast"))
            .anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -10.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.colored_label(status.kind.color(), status.text.as_str());
                });
            });
        ctx.request_repaint_after(remaining);
    }
}

impl App for TrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        match self.session.clone() {
            None => {
                egui::CentralPanel::default().show(ctx, |ui| self.sign_in_page(ui));
            }
            Some(session) => {
                let user = session.user;
                self.menu_bar(ctx, &user);
                egui::CentralPanel::default().show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| match self.settings.page {
                        Page::Log => self.log_page(ui, &user),
                        Page::History => self.history_page(ui, &user),
                        Page::Stats => self.stats_page(ui, &user),
                        Page::Monthly => self.monthly_page(ui, &user),
                        Page::Bodyweight => self.bodyweight_page(ui, &user),
                        Page::Exercises => self.exercises_page(ui),
                    });
                });
            }
        }

        self.settings_window(ctx);
        self.status_toast(ctx);

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let options = NativeOptions::default();
    eframe::run_native(
        "Workout Tracker",
        options,
        Box::new(|_cc| Box::new(TrackerApp::default())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::env;
    use std::ffi::{OsStr, OsString};
    use std::sync::Mutex;

    static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    /// Restores an environment variable when dropped.
    struct EnvGuard {
        name: &'static str,
        prev: Option<OsString>,
    }

    impl EnvGuard {
        fn set(name: &'static str, value: Option<&OsStr>) -> Self {
            let prev = env::var_os(name);
            unsafe {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
            Self { name, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            unsafe {
                match &self.prev {
                    Some(v) => env::set_var(self.name, v),
                    None => env::remove_var(self.name),
                }
            }
        }
    }

    fn test_app(dir: &std::path::Path) -> TrackerApp {
        let settings = Settings {
            data_dir: Some(dir.display().to_string()),
            ..Settings::default()
        };
        TrackerApp::with_settings(settings)
    }

    #[test]
    fn settings_roundtrip() {
        let s = Settings {
            identity_mode: IdentityMode::Account,
            data_dir: Some("/tmp/gym".into()),
            shared_password: Some("secret".into()),
            remember_profile: true,
            last_profile: Some("rohan".into()),
            page: Page::Monthly,
            history_muscle: Some("Legs".into()),
            history_period: HistoryPeriod::Quarter,
            show_bodyweight_average: true,
            bodyweight_ma_window: 3,
            show_bodyweight_trend: false,
            open_report_after_export: false,
        };
        let json = serde_json::to_string(&s).unwrap();
        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, loaded);
    }

    #[test]
    fn settings_persistence() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let _config = EnvGuard::set("XDG_CONFIG_HOME", Some(dir.path().as_os_str()));

        let s = Settings {
            remember_profile: true,
            last_profile: Some("amy".into()),
            ..Settings::default()
        };
        s.save();
        let loaded = Settings::load();
        assert!(loaded.remember_profile);
        assert_eq!(loaded.last_profile.as_deref(), Some("amy"));

        let path = Settings::path().unwrap();
        std::fs::write(&path, r#"{"page":"History"}"#).unwrap();
        let partial = Settings::load();
        assert_eq!(partial.page, Page::History);
        assert_eq!(partial.bodyweight_ma_window, 7);
        assert!(!partial.remember_profile);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load(), Settings::default());
    }

    #[test]
    fn environment_overrides_settings() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let s = Settings {
            data_dir: Some("/srv/from-settings".into()),
            shared_password: Some("file".into()),
            ..Settings::default()
        };

        {
            let _dir = EnvGuard::set(DATA_DIR_ENV, Some(OsStr::new("/srv/from-env")));
            let _pw = EnvGuard::set(SHARED_PASSWORD_ENV, Some(OsStr::new("env")));
            assert_eq!(s.resolved_data_dir(), PathBuf::from("/srv/from-env"));
            assert_eq!(s.resolved_shared_password().as_deref(), Some("env"));
        }

        let _dir = EnvGuard::set(DATA_DIR_ENV, None);
        let _pw = EnvGuard::set(SHARED_PASSWORD_ENV, Some(OsStr::new("  ")));
        assert_eq!(s.resolved_data_dir(), PathBuf::from("/srv/from-settings"));
        assert_eq!(s.resolved_shared_password().as_deref(), Some("file"));
        let empty = Settings::default();
        assert_eq!(empty.resolved_shared_password(), None);
        assert!(empty.resolved_data_dir().ends_with(DATA_DIR_NAME));
    }

    #[test]
    fn workout_type_parses_both_cases() {
        let data = "date,profile_id,workout_type,exercise\n\
2024-01-01,amy,Cardio,Rowing\n\
2024-01-02,amy,strength,Squat\n";
        let rows: Vec<WorkoutEntry> = storage::read_records(data.as_bytes(), "workout").unwrap();
        assert_eq!(rows[0].workout_type, WorkoutType::Cardio);
        assert_eq!(rows[1].workout_type, WorkoutType::Strength);

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(&rows[0]).unwrap();
        let text = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert!(text.lines().nth(1).unwrap().contains(",cardio,"));
    }

    #[test]
    fn unknown_intensity_reads_as_none() {
        let data = "date,profile_id,exercise,intensity\n\
2024-01-01,amy,Rowing,Brutal\n\
2024-01-02,amy,Rowing,Hard\n";
        let rows: Vec<WorkoutEntry> = storage::read_records(data.as_bytes(), "workout").unwrap();
        assert_eq!(rows[0].intensity, None);
        assert_eq!(rows[1].intensity, Some(Intensity::Hard));
    }

    #[test]
    fn history_cells_blank_other_type() {
        let strength = WorkoutEntry {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            time: Some("07:00".into()),
            profile_id: "amy".into(),
            workout_type: WorkoutType::Strength,
            muscle_group: "Legs".into(),
            exercise: "Squat".into(),
            sets: 3,
            reps: 5,
            weight: 100.0,
            duration_min: 0.0,
            distance_km: 0.0,
            calories: 0.0,
            intensity: None,
            elevation: 0.0,
            notes: "easy".into(),
        };
        let cells = history_cells(&strength);
        assert_eq!(cells[0], "2024-01-02");
        assert_eq!(cells[2], "Strength");
        assert_eq!(&cells[5..8], ["3", "5", "100.0"]);
        assert_eq!(cells[8], "");
        assert_eq!(cells[13], "easy");

        let run = WorkoutEntry {
            workout_type: WorkoutType::Cardio,
            muscle_group: "Cardio".into(),
            exercise: "Running".into(),
            sets: 0,
            reps: 0,
            weight: 0.0,
            duration_min: 30.0,
            distance_km: 5.0,
            intensity: Some(Intensity::Easy),
            ..strength
        };
        let cells = history_cells(&run);
        assert_eq!(&cells[5..8], ["", "", ""]);
        assert_eq!(cells[8], "30.0");
        assert_eq!(cells[11], "Easy");
    }

    #[test]
    fn month_card_text() {
        let m = MonthlyStats {
            period: analysis::YearMonth { year: 2024, month: 3 },
            month_name: "March 2024".into(),
            workouts: 13,
            total_sets: 40,
            total_volume: 12345.0,
            unique_exercises: 6,
            avg_workouts_per_week: 13.0 / 4.33,
        };
        assert_eq!(
            month_card_lines(&m),
            [
                "Workouts: 13 (3.0/week)".to_string(),
                "Sets: 40 | Volume: 12,345 kg".to_string(),
                "Exercises: 6".to_string(),
            ]
        );
        let metrics = current_month_metrics(&m);
        assert_eq!(metrics[3], ("Volume", "12,345 kg".to_string()));
        assert_eq!(metrics[4], ("Exercises", "6".to_string()));
    }

    #[test]
    fn app_saves_and_reloads_workouts() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _env = EnvGuard::set(DATA_DIR_ENV, None);
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        assert!(app.workouts.is_empty());
        assert!(!app.library.groups().is_empty());

        app.sync_strength_selection();
        app.save_workout("amy");
        assert_eq!(app.workouts.len(), 1);
        assert_eq!(app.workouts[0].profile_id, "amy");
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Success));

        app.save_workout("");
        assert_eq!(app.workouts.len(), 1);
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Warning));

        app.save_bodyweight("amy");
        assert_eq!(app.bodyweight.len(), 1);
    }

    #[test]
    fn app_rejects_duplicate_exercise() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _env = EnvGuard::set(DATA_DIR_ENV, None);
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());

        app.add_new_group = true;
        app.new_group_name = " Mobility ".into();
        app.new_exercise = "Hip Circle".into();
        app.add_exercise();
        assert_eq!(app.library.exercises("Mobility"), ["Hip Circle".to_string()]);
        assert_eq!(app.library_group, "Mobility");
        assert!(!app.add_new_group);

        app.new_exercise = "Hip Circle".into();
        app.add_exercise();
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Warning));
        let saved = ExerciseLibrary::load(app.store.exercises_path()).unwrap();
        assert_eq!(saved.exercises("Mobility").len(), 1);
    }

    #[test]
    fn app_account_register_and_sign_in() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _env = EnvGuard::set(DATA_DIR_ENV, None);
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.settings.identity_mode = IdentityMode::Account;
        app.sign_in.username = "amy".into();
        app.sign_in.password = "gym".into();
        app.try_register();
        assert_eq!(app.session.as_ref().map(|s| s.user.as_str()), Some("amy"));
        assert!(app.sign_in.password.is_empty());

        app.sign_out();
        assert!(app.session.is_none());

        let mut again = test_app(dir.path());
        again.settings.identity_mode = IdentityMode::Account;
        again.sign_in.username = "amy".into();
        again.sign_in.password = "wrong".into();
        again.try_sign_in();
        assert!(again.session.is_none());
        again.sign_in.password = "gym".into();
        again.try_sign_in();
        assert!(again.session.is_some());
    }

    #[test]
    fn remembered_profile_resumes_session() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _env = EnvGuard::set(DATA_DIR_ENV, None);
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            data_dir: Some(dir.path().display().to_string()),
            remember_profile: true,
            last_profile: Some("rohan".into()),
            ..Settings::default()
        };
        let app = TrackerApp::with_settings(settings.clone());
        assert_eq!(app.session.as_ref().map(|s| s.user.as_str()), Some("rohan"));

        let app = TrackerApp::with_settings(Settings {
            remember_profile: false,
            ..settings
        });
        assert!(app.session.is_none());
        assert_eq!(app.sign_in.profile_id, "rohan");
    }
}
