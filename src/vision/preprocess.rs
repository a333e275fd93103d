//! Image preprocessing for OCR models
//!
//! Resizing, normalization, and tensor conversion for the PaddleOCR detection
//! and recognition networks. Both models were trained on BGR input, so tensors
//! are laid out B, G, R.

use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4};

/// Preprocessing configuration
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Longest side allowed for the detection input
    pub det_limit_side_len: u32,
    /// Target height for recognition model
    pub rec_target_height: u32,
    /// Recognition input width for crops no wider than this at the target height
    pub rec_base_width: u32,
    /// Detection mean values for normalization [B, G, R]
    pub det_mean: [f32; 3],
    /// Detection std values for normalization [B, G, R]
    pub det_std: [f32; 3],
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            det_limit_side_len: 960,
            rec_target_height: 48,
            rec_base_width: 320,
            // ImageNet statistics applied to BGR channels as-is
            det_mean: [0.485, 0.456, 0.406],
            det_std: [0.229, 0.224, 0.225],
        }
    }
}

/// Detection input size: scale down so the longest side fits the limit, then
/// snap each side to a multiple of 32 (minimum 32).
pub fn detection_input_size(width: u32, height: u32, limit_side_len: u32) -> (u32, u32) {
    let longest = width.max(height) as f32;
    let ratio = if longest > limit_side_len as f32 {
        limit_side_len as f32 / longest
    } else {
        1.0
    };

    let snap = |side: u32| -> u32 {
        let scaled = side as f32 * ratio;
        (((scaled / 32.0).round() as u32) * 32).max(32)
    };

    (snap(width), snap(height))
}

/// Convert an RGB image to a normalized BGR NCHW tensor (batch size 1)
pub fn to_bgr_nchw(image: &RgbImage, mean: &[f32; 3], std: &[f32; 3]) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        let bgr = [pixel[2], pixel[1], pixel[0]];
        for c in 0..3 {
            let value = bgr[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (value - mean[c]) / std[c];
        }
    }

    tensor
}

/// Full preprocessing pipeline for detection.
///
/// Returns the tensor and the (width, height) the network sees.
pub fn preprocess_for_detection(image: &RgbImage, config: &PreprocessConfig) -> (Array4<f32>, (u32, u32)) {
    let (width, height) = image.dimensions();
    let (in_w, in_h) = detection_input_size(width, height, config.det_limit_side_len);

    let tensor = if (in_w, in_h) == (width, height) {
        to_bgr_nchw(image, &config.det_mean, &config.det_std)
    } else {
        let resized = image::imageops::resize(image, in_w, in_h, FilterType::Triangle);
        to_bgr_nchw(&resized, &config.det_mean, &config.det_std)
    };

    (tensor, (in_w, in_h))
}

/// Recognition input widths for a crop, as (resized, padded).
///
/// The crop keeps its aspect ratio at `target_height`. The tensor is at least
/// `base_width` wide; wider crops widen the tensor instead of being squeezed.
pub fn recognition_input_width(width: u32, height: u32, target_height: u32, base_width: u32) -> (u32, u32) {
    if height == 0 || width == 0 {
        let padded = base_width.max(1);
        return (padded, padded);
    }
    let ratio = width as f32 / height as f32;
    let proportional = target_height as f32 * ratio;

    let padded = (proportional.floor() as u32).max(base_width).max(1);
    let resized = (proportional.ceil() as u32).clamp(1, padded);
    (resized, padded)
}

/// Full preprocessing pipeline for recognition: fixed height, pixels mapped
/// to [-1, 1], zero padding on the right up to the padded width
pub fn preprocess_for_recognition(crop: &RgbImage, config: &PreprocessConfig) -> Array4<f32> {
    let (width, height) = crop.dimensions();
    let (resized_w, padded_w) =
        recognition_input_width(width, height, config.rec_target_height, config.rec_base_width);
    let resized = image::imageops::resize(crop, resized_w, config.rec_target_height, FilterType::Triangle);
    let normalized = to_bgr_nchw(&resized, &[0.5; 3], &[0.5; 3]);

    if resized_w == padded_w {
        return normalized;
    }

    let mut tensor = Array4::<f32>::zeros((1, 3, config.rec_target_height as usize, padded_w as usize));
    tensor
        .slice_mut(s![.., .., .., ..resized_w as usize])
        .assign(&normalized);
    tensor
}
