use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    Date,
    Location,
    Scene,
    Camera,
    People,
    Custom,
}

impl std::fmt::Display for StrategyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Location => write!(f, "location"),
            Self::Scene => write!(f, "scene"),
            Self::Camera => write!(f, "camera"),
            Self::People => write!(f, "people"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

const DATE_KEYWORDS: &[&str] = &[
    "date",
    "time",
    "year",
    "month",
    "day",
    "when",
    "chronological",
    "timeline",
    "calendar",
    "period",
    "taken",
];

const LOCATION_KEYWORDS: &[&str] = &[
    "location",
    "place",
    "where",
    "gps",
    "coordinates",
    "geographic",
    "region",
    "area",
    "spot",
];

const SCENE_KEYWORDS: &[&str] = &[
    "scene",
    "indoor",
    "outdoor",
    "beach",
    "restaurant",
    "park",
    "home",
    "nature",
    "city",
    "event",
    "what",
    "content",
    "type",
];

const CAMERA_KEYWORDS: &[&str] = &["camera", "device", "phone", "model", "equipment"];

const PEOPLE_KEYWORDS: &[&str] = &["people", "person", "face", "who", "portrait", "selfie"];

/// Checked in order; the first set with a hit decides.
const PRIORITY: &[(StrategyType, &[&str])] = &[
    (StrategyType::Date, DATE_KEYWORDS),
    (StrategyType::Location, LOCATION_KEYWORDS),
    (StrategyType::Scene, SCENE_KEYWORDS),
    (StrategyType::Camera, CAMERA_KEYWORDS),
    (StrategyType::People, PEOPLE_KEYWORDS),
];

pub(crate) fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

pub fn classify_query(query: &str) -> StrategyType {
    let lower = query.to_lowercase();
    PRIORITY
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(strategy, _)| *strategy)
        .unwrap_or(StrategyType::Custom)
}
