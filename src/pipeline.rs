//! Plate recognition pipeline
//!
//! load image -> OCR -> pick best region -> derive crop -> crop.
//! One call per user upload; nothing is carried between requests.

use image::RgbImage;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::vision::{crop, derive_crop_region, select_best_region, CropRegion, TextDetector};

/// The image could not be turned into a pixel buffer
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Failure of a recognition request
#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("OCR engine failed: {0:#}")]
    Ocr(#[source] anyhow::Error),
}

/// Outcome of one recognition request
#[derive(Debug, Clone, Default)]
pub struct RecognitionResult {
    /// File name (no directories) of the uploaded image
    pub image_name: String,
    /// Pixels of the best region, absent when nothing was found or the box was degenerate
    pub cropped: Option<RgbImage>,
    /// Text of the best region, absent only when nothing was found
    pub text: Option<String>,
    /// Clamped rectangle the crop was taken from
    pub region: Option<CropRegion>,
    /// Confidence of the best region
    pub confidence: Option<f32>,
    pub processing_time_ms: u64,
}

impl RecognitionResult {
    /// `(filename, text)` ready for the record store, if there is something worth saving
    pub fn savable_record(&self) -> Option<(&str, &str)> {
        match self.text.as_deref() {
            Some(text) if !text.is_empty() && !self.image_name.is_empty() => {
                Some((self.image_name.as_str(), text))
            }
            _ => None,
        }
    }
}

/// Decode an image file into an RGB buffer
pub fn load_image(path: &Path) -> Result<RgbImage, LoadError> {
    let display = path.display().to_string();

    let reader = image::ImageReader::open(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    let reader = reader.with_guessed_format().map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    let image = reader
        .decode()
        .map_err(|source| LoadError::Decode { path: display, source })?;

    Ok(image.to_rgb8())
}

/// Runs recognition requests against an OCR engine
pub struct Recognizer<D> {
    detector: D,
}

impl<D: TextDetector> Recognizer<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// Recognize the plate in the image at `path`
    pub fn recognize(&mut self, path: &Path) -> Result<RecognitionResult, RecognizeError> {
        let image = load_image(path)?;
        let mut result = self.recognize_image(&image)?;
        result.image_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!(
            "Recognized {:?}: {:?} ({} ms)",
            result.image_name, result.text, result.processing_time_ms
        );
        Ok(result)
    }

    /// Recognize the plate in an already decoded image
    pub fn recognize_image(&mut self, image: &RgbImage) -> Result<RecognitionResult, RecognizeError> {
        let start = Instant::now();

        let detections = self
            .detector
            .detect_and_recognize(image)
            .map_err(RecognizeError::Ocr)?;
        debug!("OCR returned {} detections", detections.len());

        let mut result = RecognitionResult::default();

        if let Some(best) = select_best_region(&detections) {
            let region = derive_crop_region(&best.quad, image.width(), image.height());
            if region.is_none() {
                debug!("Best region {:?} collapses inside the image bounds", best.quad);
            }

            result.cropped = region.map(|r| crop(image, r));
            result.region = region;
            result.text = Some(best.text.clone());
            result.confidence = Some(best.confidence);
        }

        result.processing_time_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{quad_from, Detection, DetectionSet};
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Returns a fixed detection set and counts calls
    struct FixedDetector {
        detections: DetectionSet,
        calls: Arc<AtomicUsize>,
    }

    impl FixedDetector {
        fn new(detections: DetectionSet) -> Self {
            Self {
                detections,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl TextDetector for FixedDetector {
        fn detect_and_recognize(&mut self, _image: &RgbImage) -> anyhow::Result<DetectionSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.detections.clone())
        }
    }

    struct FailingDetector;

    impl TextDetector for FailingDetector {
        fn detect_and_recognize(&mut self, _image: &RgbImage) -> anyhow::Result<DetectionSet> {
            anyhow::bail!("session crashed")
        }
    }

    fn sample_image() -> RgbImage {
        RgbImage::from_fn(100, 100, |x, y| Rgb([x as u8, y as u8, ((x * 7 + y * 3) % 256) as u8]))
    }

    fn two_plates() -> DetectionSet {
        vec![
            Detection::new(
                quad_from([(10.0, 10.0), (50.0, 10.0), (50.0, 30.0), (10.0, 30.0)]),
                "A1",
                0.4,
            ),
            Detection::new(
                quad_from([(5.0, 5.0), (15.0, 15.0), (15.0, 5.0), (5.0, 15.0)]),
                "B2",
                0.9,
            ),
        ]
    }

    #[test]
    fn test_best_region_is_cropped() {
        let image = sample_image();
        let mut recognizer = Recognizer::new(FixedDetector::new(two_plates()));

        let result = recognizer.recognize_image(&image).unwrap();

        assert_eq!(result.text.as_deref(), Some("B2"));
        assert_eq!(result.region, Some(CropRegion { x1: 5, y1: 5, x2: 15, y2: 15 }));
        let cropped = result.cropped.unwrap();
        assert_eq!(cropped.dimensions(), (10, 10));
        for (x, y, pixel) in cropped.enumerate_pixels() {
            assert_eq!(pixel, image.get_pixel(x + 5, y + 5));
        }
    }

    #[test]
    fn test_empty_detection_set() {
        let mut recognizer = Recognizer::new(FixedDetector::new(vec![]));

        let result = recognizer.recognize_image(&sample_image()).unwrap();

        assert!(result.cropped.is_none());
        assert!(result.text.is_none());
        assert!(result.savable_record().is_none());
    }

    #[test]
    fn test_degenerate_region_keeps_text() {
        let outside = Detection::new(
            quad_from([(-50.0, -50.0), (-10.0, -50.0), (-10.0, -10.0), (-50.0, -10.0)]),
            "GHOST",
            0.8,
        );
        let mut recognizer = Recognizer::new(FixedDetector::new(vec![outside]));

        let result = recognizer.recognize_image(&sample_image()).unwrap();

        assert!(result.cropped.is_none());
        assert!(result.region.is_none());
        assert_eq!(result.text.as_deref(), Some("GHOST"));
    }

    #[test]
    fn test_collaborator_called_once_per_request() {
        let detector = FixedDetector::new(two_plates());
        let calls = detector.calls.clone();
        let mut recognizer = Recognizer::new(detector);

        recognizer.recognize_image(&sample_image()).unwrap();
        recognizer.recognize_image(&sample_image()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_ocr_failure_is_reported() {
        let mut recognizer = Recognizer::new(FailingDetector);

        let err = recognizer.recognize_image(&sample_image()).unwrap_err();
        assert!(matches!(err, RecognizeError::Ocr(_)));
    }

    #[test]
    fn test_recognize_from_file_preserves_pixels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hull_plate.png");
        let image = sample_image();
        image.save(&path).unwrap();

        let mut recognizer = Recognizer::new(FixedDetector::new(two_plates()));
        let result = recognizer.recognize(&path).unwrap();

        assert_eq!(result.image_name, "hull_plate.png");
        assert_eq!(result.savable_record(), Some(("hull_plate.png", "B2")));
        let cropped = result.cropped.unwrap();
        assert_eq!(cropped, crop(&image, CropRegion { x1: 5, y1: 5, x2: 15, y2: 15 }));
    }

    #[test]
    fn test_saved_image_reaches_display_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hull_plate.png");
        let image = sample_image();
        image.save(&path).unwrap();

        let mut recognizer = Recognizer::new(FixedDetector::new(two_plates()));
        let cropped = recognizer.recognize(&path).unwrap().cropped.unwrap();
        let shown = crate::dashboard::state::to_color_image(&cropped);

        // B2 covers (5, 5)..(15, 15) of the source
        assert_eq!(shown.size, [10, 10]);
        for y in 0..10u32 {
            for x in 0..10u32 {
                let Rgb([r, g, b]) = *image.get_pixel(x + 5, y + 5);
                let displayed = shown.pixels[(y * 10 + x) as usize];
                assert_eq!(displayed, egui::Color32::from_rgb(r, g, b), "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let mut recognizer = Recognizer::new(FixedDetector::new(two_plates()));

        let err = recognizer.recognize(Path::new("/nonexistent/plate.jpg")).unwrap_err();
        assert!(matches!(err, RecognizeError::Load(LoadError::Io { .. })));
    }

    #[test]
    fn test_undecodable_file_is_load_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let detector = FixedDetector::new(two_plates());
        let calls = detector.calls.clone();
        let mut recognizer = Recognizer::new(detector);

        let err = recognizer.recognize(&path).unwrap_err();
        assert!(matches!(err, RecognizeError::Load(LoadError::Decode { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
