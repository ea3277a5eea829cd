use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::photo::{ExifData, GpsLocation, PhotoMetadata};
use crate::models::progress::{ProgressReporter, ProgressStage};

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heic", "heif", "raw", "cr2",
    "nef", "arw", "dng",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderScanResult {
    pub folder_path: String,
    pub photo_count: usize,
    pub photos: Vec<PhotoMetadata>,
    pub errors: Vec<String>,
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

pub fn scan_photos(
    folder: &Path,
    config: &AppConfig,
    reporter: &mut ProgressReporter<'_>,
) -> Result<FolderScanResult, AppError> {
    if !folder.is_dir() {
        return Err(AppError::Scan(format!(
            "not a directory: {}",
            folder.display()
        )));
    }
    log::info!("scanning {}", folder.display());
    reporter.stage(ProgressStage::Scanning, 0, 0);

    let candidates = collect_candidates(folder);
    let total = candidates.len();
    reporter.stage(ProgressStage::Scanning, 0, total);

    let mut photos = Vec::with_capacity(total);
    let mut errors = Vec::new();
    for (i, path) in candidates.iter().enumerate() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        reporter.item(ProgressStage::Processing, i + 1, total, &name);

        match read_photo(path, &name, config.max_file_size_bytes) {
            Ok(photo) => photos.push(photo),
            Err(reason) => {
                log::warn!("skipping {}: {reason}", path.display());
                errors.push(format!("Skipping {name}: {reason}"));
            }
        }
    }

    reporter.stage(ProgressStage::Complete, total, total);
    log::info!(
        "scan of {} finished: {} photos, {} skipped",
        folder.display(),
        photos.len(),
        errors.len()
    );

    Ok(FolderScanResult {
        folder_path: folder.to_string_lossy().to_string(),
        photo_count: photos.len(),
        photos,
        errors,
    })
}

fn collect_candidates(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("cannot read entry under {}: {e}", folder.display());
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir() && is_image_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

fn read_photo(path: &Path, name: &str, max_size: u64) -> Result<PhotoMetadata, String> {
    let metadata = std::fs::metadata(path).map_err(|e| e.to_string())?;
    if !metadata.is_file() {
        return Err("not a regular file".to_string());
    }
    let size = metadata.len();
    if size > max_size {
        return Err(format!("file too large ({size} bytes)"));
    }

    // Only formats the decoder understands get a header check. RAW and HEIC
    // pass on extension alone.
    if let Ok(format) = image::ImageFormat::from_path(path) {
        if format.reading_enabled() {
            match image::image_dimensions(path) {
                Ok((w, h)) if w > 0 && h > 0 => {}
                Ok(_) => return Err("image has no pixels".to_string()),
                Err(e) => return Err(format!("invalid image: {e}")),
            }
        }
    }

    let modified_date = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(PhotoMetadata {
        name: name.to_string(),
        path: path.to_string_lossy().to_string(),
        size,
        modified_date,
        exif_data: read_exif(path),
        ai_data: None,
    })
}

pub fn read_exif(path: &Path) -> Option<ExifData> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;

    let date_taken = ascii_field(&exif, exif::Tag::DateTimeOriginal)
        .or_else(|| ascii_field(&exif, exif::Tag::DateTime))
        .and_then(|raw| parse_exif_datetime(&raw));

    let camera = match (
        ascii_field(&exif, exif::Tag::Make),
        ascii_field(&exif, exif::Tag::Model),
    ) {
        (Some(make), Some(model)) => Some(format!("{make} {model}")),
        _ => None,
    };

    let gps_location = gps_coordinate(&exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef)
        .zip(gps_coordinate(
            &exif,
            exif::Tag::GPSLongitude,
            exif::Tag::GPSLongitudeRef,
        ))
        .map(|(latitude, longitude)| GpsLocation {
            latitude,
            longitude,
        });

    Some(ExifData {
        date_taken,
        gps_location,
        camera,
    })
}

fn ascii_field(exif: &exif::Exif, tag: exif::Tag) -> Option<String> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    match &field.value {
        exif::Value::Ascii(parts) => {
            let text = parts
                .first()
                .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())?;
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

/// EXIF stamps look like `2024:03:15 10:30:00`.
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(raw, "%Y:%m:%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw.get(..10)?, "%Y:%m:%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn gps_coordinate(exif: &exif::Exif, value_tag: exif::Tag, ref_tag: exif::Tag) -> Option<f64> {
    let field = exif.get_field(value_tag, exif::In::PRIMARY)?;
    let parts: Vec<f64> = match &field.value {
        exif::Value::Rational(values) => values.iter().map(|r| r.to_f64()).collect(),
        _ => return None,
    };
    let reference = ascii_field(exif, ref_tag).unwrap_or_default();
    dms_to_decimal(&parts, &reference)
}

/// Degrees/minutes/seconds to signed decimal degrees. `S` and `W` are negative.
pub fn dms_to_decimal(parts: &[f64], reference: &str) -> Option<f64> {
    let degrees = *parts.first()?;
    let minutes = parts.get(1).copied().unwrap_or(0.0);
    let seconds = parts.get(2).copied().unwrap_or(0.0);
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    if !value.is_finite() {
        return None;
    }
    match reference.trim().to_ascii_uppercase().as_str() {
        "S" | "W" => Some(-value),
        _ => Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_png(path: &Path) {
        image::RgbImage::new(4, 3).save(path).unwrap();
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a.JPG")));
        assert!(is_image_file(Path::new("/x/y/z.dng")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("noext")));
    }

    #[test]
    fn test_scan_collects_valid_photos_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_png(&dir.path().join("b.png"));
        write_png(&dir.path().join("sub").join("a.png"));
        fs::write(dir.path().join("readme.txt"), b"not a photo").unwrap();

        let result = scan_photos(dir.path(), &AppConfig::default(), &mut ProgressReporter::silent()).unwrap();
        assert_eq!(result.photo_count, 2);
        assert!(result.errors.is_empty());
        let names: Vec<_> = result.photos.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b.png", "a.png"]);
        assert!(result.photos.iter().all(|p| p.size > 0 && p.ai_data.is_none()));
    }

    #[test]
    fn test_scan_records_corrupt_and_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.jpg"), b"definitely not jpeg").unwrap();
        write_png(&dir.path().join("ok.png"));

        let result = scan_photos(dir.path(), &AppConfig::default(), &mut ProgressReporter::silent()).unwrap();
        assert_eq!(result.photo_count, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Skipping broken.jpg"));

        let tight = AppConfig {
            max_file_size_bytes: 1,
            ..AppConfig::default()
        };
        let result = scan_photos(dir.path(), &tight, &mut ProgressReporter::silent()).unwrap();
        assert_eq!(result.photo_count, 0);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_raw_formats_are_accepted_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shot.cr2"), b"raw bytes").unwrap();
        let result = scan_photos(dir.path(), &AppConfig::default(), &mut ProgressReporter::silent()).unwrap();
        assert_eq!(result.photo_count, 1);
        assert!(result.photos[0].exif_data.is_none());
    }

    #[test]
    fn test_scan_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(scan_photos(&missing, &AppConfig::default(), &mut ProgressReporter::silent()).is_err());
    }

    #[test]
    fn test_scan_reports_progress_stages() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"));
        let mut stages = Vec::new();
        {
            let mut reporter = ProgressReporter::new(10, |p| stages.push(p.stage));
            scan_photos(dir.path(), &AppConfig::default(), &mut reporter).unwrap();
        }
        assert_eq!(stages.first(), Some(&ProgressStage::Scanning));
        assert!(stages.contains(&ProgressStage::Processing));
        assert_eq!(stages.last(), Some(&ProgressStage::Complete));
    }

    #[test]
    fn test_parse_exif_datetime() {
        let parsed = parse_exif_datetime("2024:03:15 10:30:00").unwrap();
        assert_eq!(parsed.to_string(), "2024-03-15 10:30:00");
        let date_only = parse_exif_datetime("2024:03:15 ??:??:??").unwrap();
        assert_eq!(date_only.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(parse_exif_datetime("garbage").is_none());
    }

    #[test]
    fn test_dms_to_decimal() {
        let north = dms_to_decimal(&[34.0, 3.0, 0.0], "N").unwrap();
        assert!((north - 34.05).abs() < 1e-9);
        let west = dms_to_decimal(&[118.0, 15.0, 0.0], "W").unwrap();
        assert!((west + 118.25).abs() < 1e-9);
        assert!(dms_to_decimal(&[], "N").is_none());
    }
}
