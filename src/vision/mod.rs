//! Vision/OCR Layer
//!
//! Finds text regions in an uploaded photo and turns the best one into a crop.
//! Text detection and recognition use PaddleOCR models via ONNX Runtime; the
//! region selection and cropping are plain geometry on top of the detections.

pub mod detection;
pub mod models;
pub mod ocr;
pub mod postprocess;
pub mod preprocess;
pub mod region;

pub use detection::{quad_from, select_best_region, Detection, DetectionSet, Point, Quad};
pub use models::{ModelManager, ModelType};
pub use ocr::{PaddleOcrEngine, TextDetector};
pub use region::{crop, derive_crop_region, CropRegion};
