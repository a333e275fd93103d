//! OCR (Optical Character Recognition) module
//!
//! Uses PaddleOCR models via ONNX Runtime for text detection and recognition.

use anyhow::{Context, Result};
use image::{imageops, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::detection::{Detection, DetectionSet, Quad};
use super::models::{load_session, ModelManager, ModelType};
use super::postprocess::{boxes_from_probability_map, CharacterDictionary, DbPostProcessConfig, TextBox};
use super::preprocess::{preprocess_for_detection, preprocess_for_recognition, PreprocessConfig};
use super::region::{crop, derive_crop_region};
use crate::config::OcrSettings;

/// Anything that can find and read text in an image
pub trait TextDetector: Send {
    /// Return every text region found in `image`, in pixel coordinates of `image`
    fn detect_and_recognize(&mut self, image: &RgbImage) -> Result<DetectionSet>;
}

/// Crops taller than this multiple of their width are read rotated
const VERTICAL_TEXT_RATIO: f32 = 1.5;

/// OCR engine using PaddleOCR via ONNX Runtime
pub struct PaddleOcrEngine {
    detector: Session,
    recognizer: Session,
    dictionary: CharacterDictionary,
    preprocess: PreprocessConfig,
    db: DbPostProcessConfig,
    drop_score: f32,
}

impl PaddleOcrEngine {
    /// Initialize the engine from explicit model files
    pub fn new(det_model: &Path, rec_model: &Path, dict_path: &Path, settings: &OcrSettings) -> Result<Self> {
        let detector = load_session(det_model, settings.use_gpu)?;
        let recognizer = load_session(rec_model, settings.use_gpu)?;

        let dict_content = std::fs::read_to_string(dict_path)
            .with_context(|| format!("Failed to read character dictionary {:?}", dict_path))?;
        let dictionary = CharacterDictionary::from_lines(&dict_content);
        if dictionary.is_empty() {
            anyhow::bail!("Character dictionary {:?} is empty", dict_path);
        }
        info!("Loaded dictionary with {} classes", dictionary.len());

        Ok(Self {
            detector,
            recognizer,
            dictionary,
            preprocess: PreprocessConfig {
                det_limit_side_len: settings.det_limit_side_len,
                rec_target_height: settings.rec_image_height,
                rec_base_width: settings.rec_image_width,
                ..Default::default()
            },
            db: DbPostProcessConfig {
                thresh: settings.det_db_thresh,
                box_thresh: settings.det_db_box_thresh,
                unclip_ratio: settings.det_db_unclip_ratio,
                max_candidates: settings.max_candidates,
            },
            drop_score: settings.drop_score,
        })
    }

    /// Initialize the engine from the configured model directory, fetching
    /// missing models when allowed
    pub fn from_settings(settings: &OcrSettings) -> Result<Self> {
        let manager = match &settings.model_dir {
            Some(dir) => ModelManager::with_dir(dir.clone())?,
            None => ModelManager::new()?,
        };
        info!("Using OCR models from {:?}", manager.models_dir());

        if !manager.are_models_ready() {
            for (model_type, available, size) in manager.get_model_status() {
                info!("  {}: available={} size={:?}", model_type.display_name(), available, size);
            }
        }

        let det = manager.ensure_model(ModelType::Detection, settings.auto_download)?;
        let rec = manager.ensure_model(ModelType::Recognition, settings.auto_download)?;
        let dict = manager.ensure_model(ModelType::Dictionary, settings.auto_download)?;

        Self::new(&det, &rec, &dict, settings)
    }

    /// Run the detection network and return text quads in source coordinates
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<TextBox>> {
        let (tensor, input_size) = preprocess_for_detection(image, &self.preprocess);
        debug!("Detection input {:?} for image {:?}", input_size, image.dimensions());

        let input = Tensor::from_array(tensor)?;
        let outputs = self
            .detector
            .run(ort::inputs![input])
            .context("Detection inference failed")?;

        // Output shape: [1, 1, H, W]
        let map = outputs[0].try_extract_array::<f32>()?;
        let map = map
            .into_dimensionality::<ndarray::Ix4>()
            .context("Unexpected detection output shape")?;
        let map = map.index_axis(ndarray::Axis(0), 0);
        let map = map.index_axis(ndarray::Axis(0), 0);

        Ok(boxes_from_probability_map(map, image.dimensions(), &self.db))
    }

    /// Run the recognition network on one upright crop
    fn recognize_crop(&mut self, crop: &RgbImage) -> Result<(String, f32)> {
        let tensor = preprocess_for_recognition(crop, &self.preprocess);
        let input = Tensor::from_array(tensor)?;
        let outputs = self
            .recognizer
            .run(ort::inputs![input])
            .context("Recognition inference failed")?;

        // Output shape: [1, timesteps, classes]
        let probs = outputs[0].try_extract_array::<f32>()?;
        let probs = probs
            .into_dimensionality::<ndarray::Ix3>()
            .context("Unexpected recognition output shape")?;

        Ok(self.dictionary.decode(probs.index_axis(ndarray::Axis(0), 0)))
    }
}

impl TextDetector for PaddleOcrEngine {
    fn detect_and_recognize(&mut self, image: &RgbImage) -> Result<DetectionSet> {
        let start = Instant::now();
        let boxes = self.detect(image)?;

        let mut detections = Vec::with_capacity(boxes.len());
        for text_box in boxes {
            let Some(crop) = rectify_quad(image, &text_box.quad) else {
                continue;
            };

            let (text, confidence) = self.recognize_crop(&crop)?;
            if confidence < self.drop_score {
                debug!("Dropping '{}' (confidence {:.3})", text, confidence);
                continue;
            }
            detections.push(Detection::new(text_box.quad, text, confidence));
        }

        debug!(
            "OCR complete in {:?}: {} detections",
            start.elapsed(),
            detections.len()
        );
        Ok(detections)
    }
}

/// Perspective-correct the quad (ordered TL, TR, BR, BL) into an upright crop
pub fn rectify_quad(image: &RgbImage, quad: &Quad) -> Option<RgbImage> {
    let side = |a: usize, b: usize| (quad[a].x - quad[b].x).hypot(quad[a].y - quad[b].y);
    let width = side(0, 1).max(side(3, 2)).round() as u32;
    let height = side(0, 3).max(side(1, 2)).round() as u32;
    if width == 0 || height == 0 {
        return None;
    }

    let from = quad.map(|p| (p.x, p.y));
    let to = [
        (0.0, 0.0),
        (width as f32, 0.0),
        (width as f32, height as f32),
        (0.0, height as f32),
    ];

    let upright = match Projection::from_control_points(from, to) {
        Some(projection) => {
            let mut out = RgbImage::new(width, height);
            warp_into(image, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
            out
        }
        None => {
            let region = derive_crop_region(quad, image.width(), image.height())?;
            crop(image, region)
        }
    };

    if upright.height() as f32 >= upright.width() as f32 * VERTICAL_TEXT_RATIO {
        Some(imageops::rotate270(&upright))
    } else {
        Some(upright)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::detection::quad_from;

    #[test]
    fn test_rectify_axis_aligned_quad() {
        let image = RgbImage::from_fn(40, 30, |x, y| Rgb([x as u8 * 5, y as u8 * 5, 0]));
        let quad = quad_from([(10.0, 5.0), (30.0, 5.0), (30.0, 15.0), (10.0, 15.0)]);

        let upright = rectify_quad(&image, &quad).unwrap();

        assert_eq!(upright.dimensions(), (20, 10));
        assert_eq!(upright.get_pixel(0, 0), image.get_pixel(10, 5));
    }

    #[test]
    fn test_rectify_rotates_vertical_text() {
        let image = RgbImage::new(50, 50);
        let quad = quad_from([(10.0, 0.0), (20.0, 0.0), (20.0, 40.0), (10.0, 40.0)]);

        let upright = rectify_quad(&image, &quad).unwrap();

        assert_eq!(upright.dimensions(), (40, 10));
    }

    #[test]
    fn test_rectify_degenerate_quad() {
        let image = RgbImage::new(10, 10);
        let point = quad_from([(3.0, 3.0); 4]);

        assert!(rectify_quad(&image, &point).is_none());
    }
}
