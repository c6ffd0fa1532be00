//! Input state of the log and bodyweight forms and its conversion to stored
//! entries.

use crate::cardio::{self, CARDIO_GROUP};
use crate::error::FormError;
use crate::{BodyweightEntry, Intensity, WorkoutEntry, WorkoutType};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::ops::RangeInclusive;

pub const SETS_RANGE: RangeInclusive<u32> = 1..=10;
pub const REPS_RANGE: RangeInclusive<u32> = 1..=100;
pub const WEIGHT_STEP: f64 = 2.5;
pub const MAX_WEIGHT: f32 = 1000.0;
pub const DURATION_RANGE: RangeInclusive<f32> = 1.0..=600.0;
pub const DISTANCE_RANGE: RangeInclusive<f32> = 0.0..=200.0;
pub const CALORIES_RANGE: RangeInclusive<f32> = 0.0..=8000.0;
pub const ELEVATION_RANGE: RangeInclusive<f32> = 0.0..=30.0;
pub const BODYWEIGHT_RANGE: RangeInclusive<f32> = 30.0..=300.0;

/// Trimmed `value`, or a missing-field error naming `field`.
pub(crate) fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, FormError> {
    let v = value.trim();
    if v.is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutForm {
    pub workout_type: WorkoutType,
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
    pub muscle_group: String,
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f32,
    pub cardio_exercise: String,
    pub duration_min: f32,
    pub distance_km: f32,
    pub calories: f32,
    pub intensity: Intensity,
    pub elevation: f32,
    pub notes: String,
}

impl WorkoutForm {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            workout_type: WorkoutType::Strength,
            date: now.date(),
            hour: now.hour(),
            minute: now.minute(),
            muscle_group: String::new(),
            exercise: String::new(),
            sets: 3,
            reps: 10,
            weight: 0.0,
            cardio_exercise: cardio::cardio_names().next().unwrap_or_default().to_string(),
            duration_min: 30.0,
            distance_km: 0.0,
            calories: 0.0,
            intensity: Intensity::Moderate,
            elevation: 0.0,
            notes: String::new(),
        }
    }

    pub fn time_label(&self) -> String {
        format!("{:02}:{:02}", self.hour.min(23), self.minute.min(59))
    }

    /// Build the row to append for `profile`. Numbers outside the form ranges
    /// are clamped; fields of the other workout type are stored as zero.
    pub fn to_entry(&self, profile: &str) -> Result<WorkoutEntry, FormError> {
        let profile = required(profile, "a profile ID")?;
        let mut entry = WorkoutEntry {
            date: self.date,
            time: Some(self.time_label()),
            profile_id: profile.to_string(),
            workout_type: self.workout_type,
            muscle_group: String::new(),
            exercise: String::new(),
            sets: 0,
            reps: 0,
            weight: 0.0,
            duration_min: 0.0,
            distance_km: 0.0,
            calories: 0.0,
            intensity: None,
            elevation: 0.0,
            notes: self.notes.trim().to_string(),
        };
        match self.workout_type {
            WorkoutType::Strength => {
                entry.muscle_group = required(&self.muscle_group, "a muscle group")?.to_string();
                entry.exercise = required(&self.exercise, "an exercise")?.to_string();
                entry.sets = self.sets.clamp(*SETS_RANGE.start(), *SETS_RANGE.end());
                entry.reps = self.reps.clamp(*REPS_RANGE.start(), *REPS_RANGE.end());
                entry.weight = self.weight.clamp(0.0, MAX_WEIGHT);
            }
            WorkoutType::Cardio => {
                let exercise = required(&self.cardio_exercise, "a cardio type")?;
                entry.muscle_group = CARDIO_GROUP.to_string();
                entry.exercise = exercise.to_string();
                entry.duration_min = self
                    .duration_min
                    .clamp(*DURATION_RANGE.start(), *DURATION_RANGE.end());
                entry.distance_km = self
                    .distance_km
                    .clamp(*DISTANCE_RANGE.start(), *DISTANCE_RANGE.end());
                entry.calories = self
                    .calories
                    .clamp(*CALORIES_RANGE.start(), *CALORIES_RANGE.end());
                entry.intensity = Some(self.intensity);
                if cardio::tracks_elevation(exercise) {
                    entry.elevation = self
                        .elevation
                        .clamp(*ELEVATION_RANGE.start(), *ELEVATION_RANGE.end());
                }
            }
        }
        Ok(entry)
    }

    /// Keep selections for the next entry but drop the free text.
    pub fn reset_after_save(&mut self) {
        self.notes.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyweightForm {
    pub date: NaiveDate,
    pub weight_kg: f32,
}

impl BodyweightForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            weight_kg: 70.0,
        }
    }

    pub fn to_entry(&self, profile: &str) -> Result<BodyweightEntry, FormError> {
        let profile = required(profile, "a profile ID")?;
        Ok(BodyweightEntry {
            date: self.date,
            profile_id: profile.to_string(),
            bodyweight_kg: self.weight_kg.clamp(*BODYWEIGHT_RANGE.start(), *BODYWEIGHT_RANGE.end()),
        })
    }
}
