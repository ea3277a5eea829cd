use std::collections::HashSet;

use serde::Serialize;

use crate::models::partition::Partition;
use crate::models::photo::PhotoMetadata;
use crate::services::query_classifier::{classify_query, StrategyType};
use crate::services::strategies;

pub const SUGGEST_DATE: &str = "Organize photos by date taken (year/month/day folder structure)";
pub const SUGGEST_LOCATION: &str = "Group photos by location based on GPS data";
pub const SUGGEST_CAMERA: &str = "Separate photos by camera model";
pub const SUGGEST_SCENE: &str = "Group photos by scene type (indoor/outdoor, beach, park, etc.)";
pub const SUGGEST_PEOPLE: &str = "Separate photos with people from scenery photos";
pub const SUGGEST_INTELLIGENT: &str = "Let AI intelligently group photos based on content and date";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationResult {
    pub strategy: StrategyType,
    pub partition: Partition,
}

pub fn run_strategy(strategy: StrategyType, query: &str, photos: &[PhotoMetadata]) -> Partition {
    match strategy {
        StrategyType::Date => strategies::by_date(photos, query),
        StrategyType::Location => strategies::by_location(photos),
        StrategyType::Scene => strategies::by_scene(photos),
        StrategyType::Camera => strategies::by_camera(photos),
        StrategyType::People => strategies::by_people(photos),
        StrategyType::Custom => strategies::intelligent(photos),
    }
}

pub fn organize_by_query(query: &str, photos: &[PhotoMetadata]) -> OrganizationResult {
    let strategy = classify_query(query);
    let partition = run_strategy(strategy, query, photos);
    log::info!(
        "organized {} photos into {} folders using {strategy} strategy",
        photos.len(),
        partition.folder_count()
    );
    OrganizationResult {
        strategy,
        partition,
    }
}

pub fn suggest_strategies(photos: &[PhotoMetadata]) -> Vec<String> {
    let mut suggestions = Vec::new();

    if photos.iter().any(|p| p.date_taken().is_some()) {
        suggestions.push(SUGGEST_DATE);
    }

    if photos.iter().any(|p| p.gps_location().is_some()) {
        suggestions.push(SUGGEST_LOCATION);
    }

    let cameras: HashSet<&str> = photos.iter().filter_map(PhotoMetadata::camera).collect();
    if cameras.len() > 1 {
        suggestions.push(SUGGEST_CAMERA);
    }

    if photos.iter().any(|p| p.ai_data.is_some()) {
        suggestions.push(SUGGEST_SCENE);
        if photos.iter().any(PhotoMetadata::has_person) {
            suggestions.push(SUGGEST_PEOPLE);
        }
    }

    suggestions.push(SUGGEST_INTELLIGENT);
    suggestions.into_iter().map(str::to_string).collect()
}
