//! Flat-file persistence for workouts, bodyweight, the exercise library and
//! the credential store.

use crate::error::StoreError;
use crate::exercise_library::ExerciseLibrary;
use crate::{BodyweightEntry, WorkoutEntry};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::value::StrDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const WORKOUTS_FILE: &str = "workouts_log.csv";
pub const BODYWEIGHT_FILE: &str = "bodyweight_log.csv";
pub const EXERCISES_FILE: &str = "exercises_library.json";
pub const USERS_FILE: &str = "users.json";

/// Column order of the workout log. Must match the field order of
/// [`WorkoutEntry`].
pub const WORKOUT_HEADER: [&str; 15] = [
    "date",
    "time",
    "profile_id",
    "workout_type",
    "muscle_group",
    "exercise",
    "sets",
    "reps",
    "weight",
    "duration_min",
    "distance_km",
    "calories",
    "intensity",
    "elevation",
    "notes",
];

/// Column order of the bodyweight log.
pub const BODYWEIGHT_HEADER: [&str; 3] = ["date", "profile_id", "bodyweight_kg"];

/// Column names of older files, as `(old, current)`.
const WORKOUT_ALIASES: &[(&str, &str)] = &[("username", "profile_id"), ("user", "profile_id")];
const BODYWEIGHT_ALIASES: &[(&str, &str)] = &[
    ("username", "profile_id"),
    ("user", "profile_id"),
    ("weight", "bodyweight_kg"),
];

/// Parse a stored date. Both plain dates and midnight timestamps are accepted.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.date())
    })
}

pub(crate) fn de_date<'de, D>(de: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(de)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

fn de_number<'de, D>(de: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(0.0),
        Some(s) if s.eq_ignore_ascii_case("nan") => Ok(0.0),
        Some(s) => s.parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// Unit-variant enum reader where an empty cell means the default variant.
pub(crate) fn de_or_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Option::<String>::deserialize(de)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(T::default()),
        Some(s) => {
            let value: StrDeserializer<'_, D::Error> = s.into_deserializer();
            T::deserialize(value)
        }
    }
}

/// Lenient float reader: empty and `NaN` cells become zero.
pub(crate) fn de_f32<'de, D>(de: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    de_number(de).map(|v| v as f32)
}

/// Lenient count reader: accepts `3` as well as `3.0`.
pub(crate) fn de_u32<'de, D>(de: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = de_number(de)?;
    if v < 0.0 {
        return Err(serde::de::Error::custom(format!("negative count {v}")));
    }
    Ok(v.round() as u32)
}

/// Location of every data file. All stores live in one directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    dir: PathBuf,
}

impl DataStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn workouts_path(&self) -> PathBuf {
        self.dir.join(WORKOUTS_FILE)
    }

    pub fn bodyweight_path(&self) -> PathBuf {
        self.dir.join(BODYWEIGHT_FILE)
    }

    pub fn exercises_path(&self) -> PathBuf {
        self.dir.join(EXERCISES_FILE)
    }

    pub fn users_path(&self) -> PathBuf {
        self.dir.join(USERS_FILE)
    }

    /// Create the data directory and any missing file with its header or
    /// default content.
    pub fn initialize(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let workouts = self.workouts_path();
        if !workouts.exists() {
            log::info!("Creating {}", workouts.display());
            write_header(&workouts, &WORKOUT_HEADER)?;
        }
        let bodyweight = self.bodyweight_path();
        if !bodyweight.exists() {
            log::info!("Creating {}", bodyweight.display());
            write_header(&bodyweight, &BODYWEIGHT_HEADER)?;
        }
        ExerciseLibrary::load_or_create(self.exercises_path())?;
        Ok(())
    }

    pub fn load_workouts(&self) -> Result<Vec<WorkoutEntry>, StoreError> {
        load_records(&self.workouts_path(), "workout")
    }

    pub fn append_workout(&self, entry: &WorkoutEntry) -> Result<(), StoreError> {
        append_record(&self.workouts_path(), &WORKOUT_HEADER, WORKOUT_ALIASES, entry)
    }

    pub fn load_bodyweight(&self) -> Result<Vec<BodyweightEntry>, StoreError> {
        load_records(&self.bodyweight_path(), "bodyweight")
    }

    pub fn append_bodyweight(&self, entry: &BodyweightEntry) -> Result<(), StoreError> {
        append_record(&self.bodyweight_path(), &BODYWEIGHT_HEADER, BODYWEIGHT_ALIASES, entry)
    }
}

fn write_header(path: &Path, header: &[&str]) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(header)?;
    wtr.flush()?;
    Ok(())
}

/// Read every record from `reader`. Rows that fail to parse are skipped.
pub fn read_records<T, R>(reader: R, label: &str) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<T>().enumerate() {
        match result {
            Ok(r) => records.push(r),
            // +2: one-based line numbers and the header row
            Err(e) => log::warn!("Skipping {label} row {}: {e}", idx + 2),
        }
    }
    Ok(records)
}

fn load_records<T: DeserializeOwned>(path: &Path, label: &str) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let records = read_records(File::open(path)?, label)?;
    log::debug!("Loaded {} {label} rows from {}", records.len(), path.display());
    Ok(records)
}

fn header_matches(path: &Path, header: &[&str]) -> Result<bool, StoreError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let found = rdr.headers()?;
    Ok(found.len() == header.len() && found.iter().zip(header).all(|(a, b)| a.trim() == *b))
}

fn ends_with_newline(file: &mut File) -> Result<bool, StoreError> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Append one record. A file whose header differs from `header` is rewritten
/// in the current column order first.
fn append_record<T: Serialize>(
    path: &Path,
    header: &[&str],
    aliases: &[(&str, &str)],
    record: &T,
) -> Result<(), StoreError> {
    let empty = !path.exists() || std::fs::metadata(path)?.len() == 0;
    if empty {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.serialize(record)?;
        wtr.flush()?;
        return Ok(());
    }

    if !header_matches(path, header)? {
        return migrate_and_append(path, header, aliases, record);
    }

    let mut file = OpenOptions::new().read(true).append(true).open(path)?;
    if !ends_with_newline(&mut file)? {
        file.write_all(b"\n")?;
    }
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

/// Position in `found` of each column of `header`, by name or alias.
fn column_positions(
    found: &csv::StringRecord,
    header: &[&str],
    aliases: &[(&str, &str)],
) -> Vec<Option<usize>> {
    let names: Vec<&str> = found.iter().map(str::trim).collect();
    header
        .iter()
        .map(|col| {
            names.iter().position(|n| n == col).or_else(|| {
                names.iter().position(|n| {
                    aliases
                        .iter()
                        .any(|(old, current)| current == col && old == n)
                })
            })
        })
        .collect()
}

/// Rewrite `path` under `header` and append `record`.
///
/// Cells are moved by column name, so rows that do not parse are carried over
/// as they are. The file is replaced through a temporary file and a rename;
/// on error the original is left untouched.
fn migrate_and_append<T: Serialize>(
    path: &Path,
    header: &[&str],
    aliases: &[(&str, &str)],
    record: &T,
) -> Result<(), StoreError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let found = rdr.headers()?.clone();
    let positions = column_positions(&found, header, aliases);
    for name in found.iter().map(str::trim) {
        let kept = header.iter().any(|c| *c == name)
            || aliases.iter().any(|(old, _)| *old == name);
        if !kept {
            log::warn!("Dropping unknown column '{name}' from {}", path.display());
        }
    }
    log::info!("Rewriting {} with current columns", path.display());

    let tmp = path.with_extension("csv.tmp");
    let result = (|| -> Result<usize, StoreError> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)?;
        wtr.write_record(header)?;
        let mut rows = 0;
        for row in rdr.records() {
            let row = row?;
            let cells: csv::StringRecord = positions
                .iter()
                .map(|p| p.and_then(|i| row.get(i)).unwrap_or(""))
                .collect();
            wtr.write_record(&cells)?;
            rows += 1;
        }
        wtr.serialize(record)?;
        wtr.flush()?;
        Ok(rows)
    })();
    match result {
        Ok(rows) => {
            std::fs::rename(&tmp, path)?;
            log::debug!("Migrated {rows} rows in {}", path.display());
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}
