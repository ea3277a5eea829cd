use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExifData {
    /// Camera-local capture time; EXIF carries no zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_location: Option<GpsLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub probability: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub score: f32,
    /// `[x, y, width, height]` in source pixels.
    #[serde(default)]
    pub bbox: [f32; 4],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    #[serde(default)]
    pub classifications: Vec<Classification>,
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    #[serde(default)]
    pub is_indoor: bool,
    #[serde(default)]
    pub is_outdoor: bool,
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AiAnalysis {
    pub fn has_person(&self) -> bool {
        self.objects.iter().any(|object| object.label == "person")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub modified_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif_data: Option<ExifData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_data: Option<AiAnalysis>,
}

impl PhotoMetadata {
    pub fn date_taken(&self) -> Option<NaiveDateTime> {
        self.exif_data.as_ref().and_then(|exif| exif.date_taken)
    }

    pub fn gps_location(&self) -> Option<GpsLocation> {
        self.exif_data.as_ref().and_then(|exif| exif.gps_location)
    }

    pub fn camera(&self) -> Option<&str> {
        self.exif_data
            .as_ref()
            .and_then(|exif| exif.camera.as_deref())
            .filter(|camera| !camera.trim().is_empty())
    }

    pub fn scene(&self) -> Option<&str> {
        self.ai_data
            .as_ref()
            .map(|ai| ai.scene.as_str())
            .filter(|scene| !scene.trim().is_empty())
    }

    pub fn has_person(&self) -> bool {
        self.ai_data.as_ref().is_some_and(AiAnalysis::has_person)
    }

    /// Capture date when EXIF has one, otherwise the file's modification date.
    pub fn effective_date(&self) -> NaiveDate {
        self.date_taken()
            .map(|taken| taken.date())
            .unwrap_or_else(|| self.modified_date.date_naive())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    pub fn photo(name: &str) -> PhotoMetadata {
        PhotoMetadata {
            name: name.to_string(),
            path: format!("/photos/{name}"),
            size: 1024,
            modified_date: Utc.with_ymd_and_hms(2023, 1, 10, 12, 0, 0).unwrap(),
            exif_data: None,
            ai_data: None,
        }
    }

    pub fn taken_on(name: &str, year: i32, month: u32, day: u32) -> PhotoMetadata {
        let mut p = photo(name);
        p.exif_data = Some(ExifData {
            date_taken: NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|d| d.and_hms_opt(9, 30, 0)),
            ..Default::default()
        });
        p
    }

    pub fn at(name: &str, latitude: f64, longitude: f64) -> PhotoMetadata {
        let mut p = photo(name);
        p.exif_data = Some(ExifData {
            gps_location: Some(GpsLocation {
                latitude,
                longitude,
            }),
            ..Default::default()
        });
        p
    }

    pub fn with_camera(name: &str, camera: &str) -> PhotoMetadata {
        let mut p = photo(name);
        p.exif_data = Some(ExifData {
            camera: Some(camera.to_string()),
            ..Default::default()
        });
        p
    }

    pub fn in_scene(name: &str, scene: &str) -> PhotoMetadata {
        let mut p = photo(name);
        p.ai_data = Some(AiAnalysis {
            scene: scene.to_string(),
            ..Default::default()
        });
        p
    }

    pub fn with_objects(name: &str, labels: &[&str]) -> PhotoMetadata {
        let mut p = photo(name);
        p.ai_data = Some(AiAnalysis {
            objects: labels
                .iter()
                .map(|label| DetectedObject {
                    label: label.to_string(),
                    score: 0.9,
                    bbox: [0.0, 0.0, 10.0, 10.0],
                })
                .collect(),
            ..Default::default()
        });
        p
    }
}
