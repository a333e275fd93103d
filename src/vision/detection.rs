//! Detection values produced by the OCR engine and best-region selection

/// A point in source-image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Four vertices of a detected text region, in engine order
pub type Quad = [Point; 4];

/// Build a quad from `(x, y)` pairs
pub fn quad_from(points: [(f32, f32); 4]) -> Quad {
    points.map(|(x, y)| Point::new(x, y))
}

/// One OCR hit: where the text is, what it says, and how sure the engine is
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Region vertices in pixel coordinates
    pub quad: Quad,
    /// Recognized text
    pub text: String,
    /// Recognition confidence, nominally 0.0 - 1.0 (not enforced)
    pub confidence: f32,
}

impl Detection {
    pub fn new(quad: Quad, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            quad,
            text: text.into(),
            confidence,
        }
    }
}

/// All detections returned for one image
pub type DetectionSet = Vec<Detection>;

/// Pick the detection with the highest confidence.
///
/// Ties go to the earliest detection in input order. Returns `None` for an
/// empty set.
pub fn select_best_region(detections: &[Detection]) -> Option<&Detection> {
    let mut iter = detections.iter();
    let mut best = iter.next()?;

    for candidate in iter {
        if candidate.confidence > best.confidence {
            best = candidate;
        }
    }

    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(text: &str, confidence: f32) -> Detection {
        Detection::new(
            quad_from([(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (0.0, 5.0)]),
            text,
            confidence,
        )
    }

    #[test]
    fn test_empty_set_has_no_best() {
        assert!(select_best_region(&[]).is_none());
    }

    #[test]
    fn test_single_detection_is_best() {
        let set = vec![det("only", 0.1)];
        assert_eq!(select_best_region(&set).unwrap().text, "only");
    }

    #[test]
    fn test_highest_confidence_wins() {
        let set = vec![det("low", 0.4), det("high", 0.9), det("mid", 0.6)];
        let best = select_best_region(&set).unwrap();

        assert_eq!(best.text, "high");
        assert!(set.iter().all(|d| best.confidence >= d.confidence));
    }

    #[test]
    fn test_tie_goes_to_first_occurrence() {
        let set = vec![det("a", 0.3), det("first", 0.8), det("second", 0.8)];
        assert_eq!(select_best_region(&set).unwrap().text, "first");
    }

    #[test]
    fn test_out_of_range_confidence_is_trusted() {
        let set = vec![det("normal", 0.99), det("odd", 1.5), det("negative", -2.0)];
        assert_eq!(select_best_region(&set).unwrap().text, "odd");
    }
}
