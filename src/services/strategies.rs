//! Partition strategies.
//!
//! Every function here is total over its input: each photo lands in exactly
//! one folder and missing metadata falls into a named fallback bucket.

use chrono::{Datelike, NaiveDate};

use crate::models::partition::Partition;
use crate::models::photo::{GpsLocation, PhotoMetadata};
use crate::services::query_classifier::contains_any;

pub const UNKNOWN_LOCATION: &str = "Unknown_Location";
pub const UNKNOWN_SCENE: &str = "Unknown";
pub const UNKNOWN_CAMERA: &str = "Unknown_Camera";
pub const WITH_PEOPLE: &str = "With_People";
pub const WITHOUT_PEOPLE: &str = "Without_People";
pub const MISCELLANEOUS: &str = "Miscellaneous";
pub const REGROUP_PREFIX: &str = "AI_Group_";

/// Scene buckets above this size are split by month.
pub const SCENE_SPLIT_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGranularity {
    Day,
    Month,
    Year,
}

impl DateGranularity {
    pub fn from_query(query: &str) -> Self {
        let lower = query.to_lowercase();
        if contains_any(&lower, &["day", "date"]) {
            Self::Day
        } else if lower.contains("month") {
            Self::Month
        } else if lower.contains("year") {
            Self::Year
        } else {
            Self::Month
        }
    }
}

pub fn date_folder_name(date: NaiveDate, granularity: DateGranularity) -> String {
    match granularity {
        DateGranularity::Day => date.format("%Y-%m-%d").to_string(),
        DateGranularity::Month => month_key(date),
        DateGranularity::Year => format!("{:04}", date.year()),
    }
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Two decimals, halves rounded away from zero.
fn round_coordinate(value: f64) -> String {
    let rounded = format!("{:.2}", (value * 100.0).round() / 100.0);
    // -0.004 rounds to "-0.00"; keep the cell shared with +0.004.
    if rounded == "-0.00" {
        "0.00".to_string()
    } else {
        rounded
    }
}

pub fn location_folder_name(location: GpsLocation) -> String {
    format!(
        "Location_{}_{}",
        round_coordinate(location.latitude),
        round_coordinate(location.longitude)
    )
}

pub fn by_date(photos: &[PhotoMetadata], query: &str) -> Partition {
    let granularity = DateGranularity::from_query(query);
    let mut partition = Partition::new();
    for photo in photos {
        partition.push(
            date_folder_name(photo.effective_date(), granularity),
            photo.clone(),
        );
    }
    partition
}

pub fn by_location(photos: &[PhotoMetadata]) -> Partition {
    let mut partition = Partition::new();
    for photo in photos {
        let folder = photo
            .gps_location()
            .map(location_folder_name)
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
        partition.push(folder, photo.clone());
    }
    partition
}

pub fn by_scene(photos: &[PhotoMetadata]) -> Partition {
    let mut partition = Partition::new();
    for photo in photos {
        partition.push(photo.scene().unwrap_or(UNKNOWN_SCENE), photo.clone());
    }
    partition
}

pub fn by_camera(photos: &[PhotoMetadata]) -> Partition {
    let mut partition = Partition::new();
    for photo in photos {
        partition.push(photo.camera().unwrap_or(UNKNOWN_CAMERA), photo.clone());
    }
    partition
}

pub fn by_people(photos: &[PhotoMetadata]) -> Partition {
    let (with, without): (Vec<_>, Vec<_>) =
        photos.iter().cloned().partition(PhotoMetadata::has_person);

    [(WITH_PEOPLE, with), (WITHOUT_PEOPLE, without)]
        .into_iter()
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(name, bucket)| (name.to_string(), bucket))
        .collect()
}

/// Scene first; crowded scenes get `<scene>_<YYYY-MM>` sub-folders.
pub fn intelligent(photos: &[PhotoMetadata]) -> Partition {
    let mut scenes = Partition::new();
    for photo in photos {
        scenes.push(photo.scene().unwrap_or(MISCELLANEOUS), photo.clone());
    }

    let mut folders = Vec::new();
    for (scene, scene_photos) in scenes.iter() {
        if scene_photos.len() > SCENE_SPLIT_THRESHOLD {
            let mut months = Partition::new();
            for photo in scene_photos {
                months.push(month_key(photo.effective_date()), photo.clone());
            }
            for (month, month_photos) in months.iter() {
                folders.push((format!("{scene}_{month}"), month_photos.to_vec()));
            }
        } else {
            folders.push((scene.to_string(), scene_photos.to_vec()));
        }
    }
    folders.into_iter().collect()
}

/// Positional three-way split of the working set into `AI_Group_1..3`.
///
/// Group one takes the first ceil(n/3) photos, group two the next ceil(n/3),
/// group three the rest. Empty groups are dropped.
pub fn regroup_in_thirds(working_set: &[PhotoMetadata]) -> Partition {
    if working_set.is_empty() {
        return Partition::new();
    }
    let chunk = working_set.len().div_ceil(3);
    working_set
        .chunks(chunk)
        .enumerate()
        .map(|(i, photos)| (format!("{REGROUP_PREFIX}{}", i + 1), photos.to_vec()))
        .collect()
}
