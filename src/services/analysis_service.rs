use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AppError;
use crate::models::photo::{AiAnalysis, PhotoMetadata};
use crate::models::progress::{ProgressReporter, ProgressStage};

pub const SIDECAR_SUFFIX: &str = ".ai.json";

/// Produces scene/object data for one image. Implementations wrap whatever
/// model runtime is available.
pub trait ImageAnalyzer {
    fn analyze(&self, path: &Path) -> Result<AiAnalysis, AppError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub analyzed: usize,
    pub failed: usize,
}

pub fn analyze_photos<A: ImageAnalyzer + ?Sized>(
    photos: &mut [PhotoMetadata],
    analyzer: &A,
    reporter: &mut ProgressReporter<'_>,
) -> AnalysisSummary {
    let total = photos.len();
    let mut summary = AnalysisSummary::default();
    for (i, photo) in photos.iter_mut().enumerate() {
        reporter.item(ProgressStage::Analyzing, i + 1, total, &photo.name);
        match analyzer.analyze(Path::new(&photo.path)) {
            Ok(analysis) => {
                photo.ai_data = Some(analysis);
                summary.analyzed += 1;
            }
            Err(e) => {
                log::warn!("analysis failed for {}: {e}", photo.path);
                summary.failed += 1;
            }
        }
    }
    log::info!(
        "analysis finished: {} analyzed, {} failed",
        summary.analyzed,
        summary.failed
    );
    summary
}

/// Reads `<image>.ai.json` written next to the image by an external model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarAnalyzer;

impl SidecarAnalyzer {
    pub fn sidecar_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }
}

impl ImageAnalyzer for SidecarAnalyzer {
    fn analyze(&self, path: &Path) -> Result<AiAnalysis, AppError> {
        let sidecar = Self::sidecar_path(path);
        let contents = fs::read_to_string(&sidecar).map_err(|e| {
            AppError::Analysis(format!("no analysis for {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}
