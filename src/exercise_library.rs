use crate::error::{FormError, StoreError};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;

const DEFAULT_LIBRARY: &str = include_str!("../data/default_exercises.json");

/// Names at or above this normalized similarity are reported as near
/// duplicates when adding an exercise.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Muscle groups and their exercises, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExerciseLibrary {
    groups: Vec<(String, Vec<String>)>,
}

impl Serialize for ExerciseLibrary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (group, exercises) in &self.groups {
            map.serialize_entry(group, exercises)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExerciseLibrary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LibraryVisitor;

        impl<'de> Visitor<'de> for LibraryVisitor {
            type Value = ExerciseLibrary;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping muscle groups to exercise lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut groups: Vec<(String, Vec<String>)> = Vec::new();
                while let Some((group, exercises)) = access.next_entry::<String, Vec<String>>()? {
                    // later duplicates win, as with a plain JSON object
                    match groups.iter_mut().find(|(g, _)| *g == group) {
                        Some(slot) => slot.1 = exercises,
                        None => groups.push((group, exercises)),
                    }
                }
                Ok(ExerciseLibrary { groups })
            }
        }

        deserializer.deserialize_map(LibraryVisitor)
    }
}

impl ExerciseLibrary {
    /// The built-in starter library.
    pub fn defaults() -> Self {
        serde_json::from_str(DEFAULT_LIBRARY).unwrap_or_else(|e| {
            log::error!("Built-in exercise library is invalid: {e}");
            Self::default()
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Load the library, writing the defaults first when the file is missing.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("Writing default exercise library to {}", path.display());
            let lib = Self::defaults();
            lib.save(path)?;
            return Ok(lib);
        }
        Self::load(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn groups(&self) -> &[(String, Vec<String>)] {
        &self.groups
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|(g, _)| g.clone()).collect()
    }

    pub fn exercises(&self, group: &str) -> &[String] {
        self.groups
            .iter()
            .find(|(g, _)| g == group)
            .map(|(_, ex)| ex.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, group: &str, exercise: &str) -> bool {
        self.exercises(group).iter().any(|e| e == exercise)
    }

    /// Add `exercise` to `group`, creating the group when needed.
    ///
    /// Both names are trimmed. An exercise that already exists in the same
    /// group is rejected and the library is left untouched.
    pub fn add_exercise(&mut self, group: &str, exercise: &str) -> Result<(), FormError> {
        let group = group.trim();
        let exercise = exercise.trim();
        if group.is_empty() {
            return Err(FormError::MissingField("a muscle group"));
        }
        if exercise.is_empty() {
            return Err(FormError::MissingField("an exercise name"));
        }
        if self.contains(group, exercise) {
            return Err(FormError::DuplicateExercise(exercise.to_string()));
        }
        match self.groups.iter_mut().find(|(g, _)| g == group) {
            Some((_, list)) => list.push(exercise.to_string()),
            None => self
                .groups
                .push((group.to_string(), vec![exercise.to_string()])),
        }
        Ok(())
    }

    /// Existing exercises whose names closely resemble `name`, as
    /// `(group, exercise)` pairs. Exact matches are not reported.
    pub fn similar_exercises(&self, name: &str) -> Vec<(String, String)> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for (group, exercises) in &self.groups {
            for ex in exercises {
                let candidate = ex.to_lowercase();
                if candidate == needle {
                    continue;
                }
                if strsim::normalized_levenshtein(&candidate, &needle) >= SIMILARITY_THRESHOLD {
                    out.push((group.clone(), ex.clone()));
                }
            }
        }
        out
    }
}
