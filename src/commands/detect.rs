use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::info;

use crate::cli::DetectArgs;
use crate::config::Settings;
use crate::detection::{DetectionRunner, PrecomputedDetector, discover_images};
use crate::store::{ensure_detections_table, ensure_messages_table, open_store, stored_media_paths};

pub fn run(args: DetectArgs, settings: &Settings) -> Result<()> {
    if !(0.0..=1.0).contains(&args.conf_threshold) {
        bail!(
            "confidence threshold must be within [0, 1], got {}",
            args.conf_threshold
        );
    }

    let db_path = settings.db_path_or(args.db_path.as_ref());
    let mut connection = open_store(&db_path)?;
    ensure_detections_table(&connection)?;

    let images = match &args.media_dir {
        Some(media_dir) => discover_images(media_dir)?,
        None => {
            ensure_messages_table(&connection)?;
            stored_media_paths(&connection)?
                .into_iter()
                .map(PathBuf::from)
                .collect()
        }
    };

    info!(images = images.len(), conf_threshold = args.conf_threshold, "starting detection");

    let detector = PrecomputedDetector::load(&args.detections)?;
    let runner = DetectionRunner::new(detector, args.conf_threshold);
    let summary = runner.process_images(&images, &mut connection);

    info!(
        images = summary.images,
        images_with_objects = summary.images_with_objects,
        detections_saved = summary.detections_saved,
        failed_saves = summary.failed_saves,
        "detection completed"
    );
    Ok(())
}
