//! Post-processing for the PaddleOCR networks
//!
//! Turns the DBNet probability map into text quadrilaterals and decodes CRNN
//! logits into strings with greedy CTC.

use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::drawing::draw_polygon_mut;
use imageproc::geometry::min_area_rect;
use imageproc::point::Point as PixelPoint;
use ndarray::ArrayView2;

use super::detection::{Point, Quad};

/// DBNet post-processing parameters
#[derive(Debug, Clone)]
pub struct DbPostProcessConfig {
    /// Pixel probability threshold for the binary mask
    pub thresh: f32,
    /// Minimum mean probability inside a box
    pub box_thresh: f32,
    /// Expansion ratio applied to shrunk text kernels
    pub unclip_ratio: f32,
    /// Maximum number of contours examined
    pub max_candidates: usize,
}

impl Default for DbPostProcessConfig {
    fn default() -> Self {
        Self {
            thresh: 0.3,
            box_thresh: 0.6,
            unclip_ratio: 1.5,
            max_candidates: 1000,
        }
    }
}

/// A text box found on the probability map, already in source coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// Vertices ordered top-left, top-right, bottom-right, bottom-left
    pub quad: Quad,
    /// Mean detection probability inside the box
    pub score: f32,
}

const MIN_BOX_SIDE: f32 = 3.0;
const MIN_UNCLIPPED_SIDE: f32 = 5.0;
/// Boxes whose top edges differ by less than this are treated as one line
const LINE_TOLERANCE: f32 = 10.0;

/// Extract text boxes from a `[H, W]` probability map.
///
/// `src_size` is the (width, height) of the original image; returned quads are
/// rescaled to it and clipped to its bounds.
pub fn boxes_from_probability_map(
    pred: ArrayView2<f32>,
    src_size: (u32, u32),
    config: &DbPostProcessConfig,
) -> Vec<TextBox> {
    let (map_h, map_w) = pred.dim();
    if map_h == 0 || map_w == 0 {
        return Vec::new();
    }

    let mut mask = GrayImage::new(map_w as u32, map_h as u32);
    for ((y, x), &p) in pred.indexed_iter() {
        if p > config.thresh {
            mask.put_pixel(x as u32, y as u32, Luma([255]));
        }
    }

    let (src_w, src_h) = src_size;
    let scale_x = src_w as f32 / map_w as f32;
    let scale_y = src_h as f32 / map_h as f32;

    let mut boxes = Vec::new();

    for contour in find_contours::<i32>(&mask).iter().take(config.max_candidates) {
        if contour.points.len() < 4 {
            continue;
        }

        let rect = order_points(&min_area_rect(&contour.points).map(to_point));
        if min_side(&rect) < MIN_BOX_SIDE {
            continue;
        }

        let score = box_score_fast(&pred, &rect);
        if score < config.box_thresh {
            continue;
        }

        let expanded = unclip(&rect, config.unclip_ratio);
        if min_side(&expanded) < MIN_UNCLIPPED_SIDE {
            continue;
        }

        let quad = expanded.map(|p| {
            Point::new(
                (p.x * scale_x).round().clamp(0.0, src_w.saturating_sub(1) as f32),
                (p.y * scale_y).round().clamp(0.0, src_h.saturating_sub(1) as f32),
            )
        });

        let quad = order_points(&quad);
        let width = distance(quad[0], quad[1]);
        let height = distance(quad[0], quad[3]);
        if width <= MIN_BOX_SIDE || height <= MIN_BOX_SIDE {
            continue;
        }

        boxes.push(TextBox { quad, score });
    }

    sort_reading_order(boxes)
}

fn to_point(p: PixelPoint<i32>) -> Point {
    Point::new(p.x as f32, p.y as f32)
}

fn distance(a: Point, b: Point) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn min_side(quad: &Quad) -> f32 {
    distance(quad[0], quad[1]).min(distance(quad[0], quad[3]))
}

/// Order four points as top-left, top-right, bottom-right, bottom-left
pub fn order_points(points: &Quad) -> Quad {
    let mut sorted = *points;
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

    let (top_left, bottom_left) = if sorted[0].y <= sorted[1].y {
        (sorted[0], sorted[1])
    } else {
        (sorted[1], sorted[0])
    };
    let (top_right, bottom_right) = if sorted[2].y <= sorted[3].y {
        (sorted[2], sorted[3])
    } else {
        (sorted[3], sorted[2])
    };

    [top_left, top_right, bottom_right, bottom_left]
}

/// Mean probability inside the box polygon
fn box_score_fast(pred: &ArrayView2<f32>, quad: &Quad) -> f32 {
    let (h, w) = pred.dim();

    let xmin = quad.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
    let xmax = quad.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil().max(0.0) as usize;
    let ymin = quad.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
    let ymax = quad.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil().max(0.0) as usize;

    let xmin = xmin.min(w - 1);
    let xmax = xmax.min(w - 1);
    let ymin = ymin.min(h - 1);
    let ymax = ymax.min(h - 1);

    // Polygon in coordinates local to the bounding rectangle
    let polygon: Vec<PixelPoint<i32>> = quad
        .iter()
        .map(|p| PixelPoint::new((p.x - xmin as f32) as i32, (p.y - ymin as f32) as i32))
        .collect();

    let mut mask = GrayImage::new((xmax - xmin + 1) as u32, (ymax - ymin + 1) as u32);
    if polygon.first() != polygon.last() {
        draw_polygon_mut(&mut mask, &polygon, Luma([255]));
    }

    let region = pred.slice(ndarray::s![ymin..=ymax, xmin..=xmax]);
    let (sum, count) = region
        .indexed_iter()
        .filter(|((y, x), _)| mask.get_pixel(*x as u32, *y as u32)[0] > 0)
        .fold((0.0f32, 0usize), |(sum, count), (_, &p)| (sum + p, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Grow a rectangle outward by `area * ratio / perimeter` on every side
pub fn unclip(rect: &Quad, ratio: f32) -> Quad {
    let mut area = 0.0f32;
    let mut perimeter = 0.0f32;
    for i in 0..4 {
        let a = rect[i];
        let b = rect[(i + 1) % 4];
        area += a.x * b.y - b.x * a.y;
        perimeter += distance(a, b);
    }
    let area = area.abs() / 2.0;
    if perimeter <= f32::EPSILON {
        return *rect;
    }
    let offset = area * ratio / perimeter;

    let cx = rect.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = rect.iter().map(|p| p.y).sum::<f32>() / 4.0;

    // Unit vectors along the two rectangle axes
    let axis = |from: Point, to: Point| -> (f32, f32) {
        let len = distance(from, to);
        if len <= f32::EPSILON {
            (0.0, 0.0)
        } else {
            ((to.x - from.x) / len, (to.y - from.y) / len)
        }
    };
    let u = axis(rect[0], rect[1]);
    let v = axis(rect[0], rect[3]);

    rect.map(|p| {
        let dx = p.x - cx;
        let dy = p.y - cy;
        let su = (dx * u.0 + dy * u.1).signum();
        let sv = (dx * v.0 + dy * v.1).signum();
        Point::new(
            p.x + offset * (su * u.0 + sv * v.0),
            p.y + offset * (su * u.1 + sv * v.1),
        )
    })
}

/// Sort boxes top-to-bottom, then left-to-right within a line
pub fn sort_reading_order(mut boxes: Vec<TextBox>) -> Vec<TextBox> {
    boxes.sort_by(|a, b| {
        a.quad[0]
            .y
            .total_cmp(&b.quad[0].y)
            .then(a.quad[0].x.total_cmp(&b.quad[0].x))
    });

    // Move each box back past same-line neighbours that sit to its right
    for i in 0..boxes.len().saturating_sub(1) {
        for j in (0..=i).rev() {
            let (cur, next) = (&boxes[j], &boxes[j + 1]);
            if (next.quad[0].y - cur.quad[0].y).abs() < LINE_TOLERANCE && next.quad[0].x < cur.quad[0].x {
                boxes.swap(j, j + 1);
            } else {
                break;
            }
        }
    }

    boxes
}

/// Character dictionary for CTC decoding: blank at 0, dictionary entries, then a space
#[derive(Debug, Clone)]
pub struct CharacterDictionary {
    keys: Vec<String>,
}

impl CharacterDictionary {
    /// Build from dictionary file contents, one character per line
    pub fn from_lines(content: &str) -> Self {
        let mut keys = vec![String::new()];
        keys.extend(
            content
                .lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
        keys.push(" ".to_string());
        Self { keys }
    }

    /// Number of classes including blank and space
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.len() <= 2
    }

    /// Greedy CTC decode of `[timesteps, classes]` probabilities.
    ///
    /// Returns the text and the mean probability of the emitted characters.
    pub fn decode(&self, probs: ArrayView2<f32>) -> (String, f32) {
        let mut text = String::new();
        let mut scores = Vec::new();
        let mut last_index = 0usize;

        for row in probs.rows() {
            let (index, prob) = row
                .iter()
                .copied()
                .enumerate()
                .fold((0usize, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });

            if index != 0 && index != last_index {
                if let Some(key) = self.keys.get(index) {
                    text.push_str(key);
                    scores.push(prob);
                }
            }
            last_index = index;
        }

        let confidence = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f32>() / scores.len() as f32
        };

        (text, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::detection::quad_from;
    use ndarray::Array2;

    fn one_hot(indices: &[usize], classes: usize, prob: f32) -> Array2<f32> {
        let mut probs = Array2::<f32>::zeros((indices.len(), classes));
        for (t, &i) in indices.iter().enumerate() {
            probs[[t, i]] = prob;
        }
        probs
    }

    #[test]
    fn test_dictionary_layout() {
        let dict = CharacterDictionary::from_lines("A\nB\r\nC\n");
        // blank + 3 characters + space
        assert_eq!(dict.len(), 5);
        assert!(!dict.is_empty());
    }

    #[test]
    fn test_ctc_collapses_repeats_and_blanks() {
        let dict = CharacterDictionary::from_lines("A\nB\n1\n");
        // A A _ A B _ _ 1 1
        let probs = one_hot(&[1, 1, 0, 1, 2, 0, 0, 3, 3], dict.len(), 0.9);

        let (text, confidence) = dict.decode(probs.view());

        assert_eq!(text, "AAB1");
        assert!((confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_ctc_space_token() {
        let dict = CharacterDictionary::from_lines("A\nB\n");
        let probs = one_hot(&[1, 3, 2], dict.len(), 0.8);

        assert_eq!(dict.decode(probs.view()).0, "A B");
    }

    #[test]
    fn test_ctc_all_blank_is_empty() {
        let dict = CharacterDictionary::from_lines("A\n");
        let probs = one_hot(&[0, 0, 0], dict.len(), 0.99);

        let (text, confidence) = dict.decode(probs.view());
        assert!(text.is_empty());
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_order_points() {
        let shuffled = quad_from([(10.0, 20.0), (0.0, 0.0), (10.0, 0.0), (0.0, 20.0)]);
        let ordered = order_points(&shuffled);

        assert_eq!(ordered, quad_from([(0.0, 0.0), (10.0, 0.0), (10.0, 20.0), (0.0, 20.0)]));
    }

    #[test]
    fn test_unclip_grows_rectangle_evenly() {
        let rect = quad_from([(10.0, 10.0), (30.0, 10.0), (30.0, 20.0), (10.0, 20.0)]);
        // area 200, perimeter 60, ratio 1.5 -> offset 5
        let grown = unclip(&rect, 1.5);

        let expected = quad_from([(5.0, 5.0), (35.0, 5.0), (35.0, 25.0), (5.0, 25.0)]);
        for (g, e) in grown.iter().zip(expected.iter()) {
            assert!((g.x - e.x).abs() < 1e-4 && (g.y - e.y).abs() < 1e-4, "{:?} vs {:?}", g, e);
        }
    }

    #[test]
    fn test_probability_map_yields_box() {
        // One bright block at rows 10..20, cols 20..60 on a 64x64 map
        let mut pred = Array2::<f32>::zeros((64, 64));
        for y in 10..20 {
            for x in 20..60 {
                pred[[y, x]] = 0.95;
            }
        }

        // Source image twice the map size
        let boxes = boxes_from_probability_map(pred.view(), (128, 128), &DbPostProcessConfig::default());

        assert_eq!(boxes.len(), 1);
        let quad = boxes[0].quad;
        assert!(boxes[0].score > 0.6);
        // Unclipped box covers the block scaled by 2
        assert!(quad[0].x <= 40.0 && quad[0].y <= 20.0);
        assert!(quad[2].x >= 118.0 && quad[2].y >= 38.0);
    }

    #[test]
    fn test_box_score_ignores_cells_outside_polygon() {
        // Diamond of probability 1.0 filling half of its bounding square
        let diamond = quad_from([(50.0, 10.0), (90.0, 50.0), (50.0, 90.0), (10.0, 50.0)]);
        let polygon: Vec<PixelPoint<i32>> = diamond.iter().map(|p| PixelPoint::new(p.x as i32, p.y as i32)).collect();
        let mut filled = GrayImage::new(100, 100);
        draw_polygon_mut(&mut filled, &polygon, Luma([255]));

        let pred = Array2::from_shape_fn((100, 100), |(y, x)| {
            if filled.get_pixel(x as u32, y as u32)[0] > 0 {
                1.0
            } else {
                0.0
            }
        });

        let score = box_score_fast(&pred.view(), &diamond);
        assert!((score - 1.0).abs() < 1e-6, "score {}", score);
    }

    #[test]
    fn test_tilted_text_keeps_its_box() {
        // 120x24 bar of probability 1.0 rotated 45 degrees around (100, 100)
        let pred = Array2::from_shape_fn((200, 200), |(y, x)| {
            let dx = x as f32 - 100.0;
            let dy = y as f32 - 100.0;
            let along = (dx + dy) / std::f32::consts::SQRT_2;
            let across = (dx - dy) / std::f32::consts::SQRT_2;
            if along.abs() <= 60.0 && across.abs() <= 12.0 {
                1.0
            } else {
                0.0
            }
        });

        let boxes = boxes_from_probability_map(pred.view(), (200, 200), &DbPostProcessConfig::default());

        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].score > 0.6, "score {}", boxes[0].score);
    }

    #[test]
    fn test_faint_map_yields_nothing() {
        let pred = Array2::<f32>::from_elem((32, 32), 0.1);
        let boxes = boxes_from_probability_map(pred.view(), (32, 32), &DbPostProcessConfig::default());
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_reading_order() {
        let make = |x: f32, y: f32| TextBox {
            quad: quad_from([(x, y), (x + 10.0, y), (x + 10.0, y + 5.0), (x, y + 5.0)]),
            score: 0.9,
        };

        let sorted = sort_reading_order(vec![make(50.0, 42.0), make(0.0, 100.0), make(5.0, 40.0)]);

        let origins: Vec<(f32, f32)> = sorted.iter().map(|b| (b.quad[0].x, b.quad[0].y)).collect();
        assert_eq!(origins, vec![(5.0, 40.0), (50.0, 42.0), (0.0, 100.0)]);
    }

    #[test]
    fn test_same_line_boxes_read_left_to_right() {
        let make = |x: f32, y: f32| TextBox {
            quad: quad_from([(x, y), (x + 30.0, y), (x + 30.0, y + 20.0), (x, y + 20.0)]),
            score: 0.9,
        };

        // Slight downward slope: each box further left sits a little lower
        let sorted = sort_reading_order(vec![make(100.0, 0.0), make(50.0, 5.0), make(0.0, 8.0)]);

        let xs: Vec<f32> = sorted.iter().map(|b| b.quad[0].x).collect();
        assert_eq!(xs, vec![0.0, 50.0, 100.0]);
    }
}
