use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::error::DetectError;
use crate::model::Detection;
use crate::store::insert_detections;
use crate::text::log_safe;

pub const DEFAULT_CONF_THRESHOLD: f64 = 0.5;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub trait Detector {
    fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, DetectError>;
}

/// Detections computed offline by a model run, keyed by image path.
///
/// The file is a JSON object mapping each image path to a list of
/// `{"bounding_box": [x1, y1, x2, y2], "confidence": f, "class": n}` entries.
#[derive(Debug, Default)]
pub struct PrecomputedDetector {
    results: HashMap<String, Vec<Detection>>,
}

impl PrecomputedDetector {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let results = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        info!(path = %path.display(), "detection results loaded");
        Ok(Self { results })
    }
}

impl Detector for PrecomputedDetector {
    fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, DetectError> {
        if !image_path.is_file() {
            return Err(DetectError::UnreadableImage(image_path.to_path_buf()));
        }

        let key = image_path.display().to_string();
        let detections = self.results.get(&key).cloned().unwrap_or_default();
        if let Some(bad) = detections
            .iter()
            .find(|detection| !(0.0..=1.0).contains(&detection.confidence))
        {
            return Err(DetectError::Model(format!(
                "confidence {} out of range for {key}",
                bad.confidence
            )));
        }

        Ok(detections)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    pub images: usize,
    pub images_with_objects: usize,
    pub detections_saved: usize,
    pub failed_saves: usize,
}

pub struct DetectionRunner<D> {
    detector: D,
    conf_threshold: f64,
}

impl<D: Detector> DetectionRunner<D> {
    pub fn new(detector: D, conf_threshold: f64) -> Self {
        Self {
            detector,
            conf_threshold,
        }
    }

    /// Detections at or above the confidence threshold. Detector failures
    /// are logged and yield no detections.
    pub fn detect_objects(&self, image_path: &Path) -> Vec<Detection> {
        let shown = image_path.display().to_string();
        match self.detector.detect(image_path) {
            Ok(detections) => {
                let kept = detections
                    .into_iter()
                    .filter(|detection| detection.confidence >= self.conf_threshold)
                    .collect::<Vec<_>>();
                info!(
                    image = %log_safe(&shown),
                    objects = kept.len(),
                    "detection results"
                );
                kept
            }
            Err(err) => {
                warn!(image = %log_safe(&shown), error = %err, "error in detection");
                Vec::new()
            }
        }
    }

    pub fn process_images(
        &self,
        images: &[PathBuf],
        connection: &mut Connection,
    ) -> DetectionSummary {
        let mut summary = DetectionSummary::default();

        for image_path in images {
            summary.images += 1;
            let shown = image_path.display().to_string();
            let detections = self.detect_objects(image_path);
            if detections.is_empty() {
                info!(image = %log_safe(&shown), "no objects detected");
                continue;
            }

            summary.images_with_objects += 1;
            match insert_detections(connection, &shown, &detections) {
                Ok(saved) => {
                    summary.detections_saved += saved;
                    info!(image = %log_safe(&shown), saved, "detection results saved");
                }
                Err(err) => {
                    summary.failed_saves += 1;
                    error!(image = %log_safe(&shown), error = %err, "error saving results");
                }
            }
        }

        summary
    }
}

/// Image files directly inside `media_dir`, sorted by path.
pub fn discover_images(media_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    let entries = fs::read_dir(media_dir)
        .with_context(|| format!("failed to read {}", media_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", media_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);

        if is_image {
            images.push(path);
        }
    }

    images.sort();
    Ok(images)
}
