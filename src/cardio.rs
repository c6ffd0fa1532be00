use phf::phf_ordered_map;

/// Muscle group label stored on every cardio entry.
pub const CARDIO_GROUP: &str = "Cardio";

/// Static metadata for a cardio activity.
#[derive(Debug, Clone, Copy)]
pub struct CardioInfo {
    /// Whether the activity records an incline percentage.
    pub tracks_elevation: bool,
    pub outdoor: bool,
}

/// Cardio activities offered by the log form, in display order.
pub static CARDIO_EXERCISES: phf::OrderedMap<&'static str, CardioInfo> = phf_ordered_map! {
    "Treadmill" => CardioInfo { tracks_elevation: true, outdoor: false },
    "Walking (outdoor)" => CardioInfo { tracks_elevation: false, outdoor: true },
    "Jogging" => CardioInfo { tracks_elevation: false, outdoor: true },
    "Running" => CardioInfo { tracks_elevation: false, outdoor: true },
    "Marathon" => CardioInfo { tracks_elevation: false, outdoor: true },
    "Cycling" => CardioInfo { tracks_elevation: false, outdoor: false },
    "Cycling (outdoor)" => CardioInfo { tracks_elevation: false, outdoor: true },
    "Trekking" => CardioInfo { tracks_elevation: false, outdoor: true },
    "Elliptical" => CardioInfo { tracks_elevation: false, outdoor: false },
    "Rowing" => CardioInfo { tracks_elevation: false, outdoor: false },
};

pub fn cardio_names() -> impl Iterator<Item = &'static str> {
    CARDIO_EXERCISES.keys().copied()
}

pub fn info_for(exercise: &str) -> Option<&'static CardioInfo> {
    CARDIO_EXERCISES.get(exercise)
}

pub fn tracks_elevation(exercise: &str) -> bool {
    info_for(exercise).is_some_and(|i| i.tracks_elevation)
}

pub fn is_outdoor(exercise: &str) -> bool {
    info_for(exercise).is_some_and(|i| i.outdoor)
}
