//! Crop rectangle derivation and pixel slicing

use image::RgbImage;

use super::detection::Quad;

/// Axis-aligned crop rectangle, half-open: columns `x1..x2`, rows `y1..y2`.
///
/// Always satisfies `x1 < x2 <= width` and `y1 < y2 <= height` for the image
/// it was derived against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropRegion {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

/// Tight bounding box of `quad`, clamped to a `width` x `height` image.
///
/// Coordinates are truncated toward zero before min/max, not rounded.
/// Returns `None` when the clamped box has no area.
pub fn derive_crop_region(quad: &Quad, width: u32, height: u32) -> Option<CropRegion> {
    // `as` truncates toward zero and saturates non-finite values
    let xs = quad.map(|p| p.x as i64);
    let ys = quad.map(|p| p.y as i64);

    let x1 = xs.iter().copied().min()?.max(0);
    let x2 = xs.iter().copied().max()?.min(width as i64);
    let y1 = ys.iter().copied().min()?.max(0);
    let y2 = ys.iter().copied().max()?.min(height as i64);

    if x1 >= x2 || y1 >= y2 {
        return None;
    }

    Some(CropRegion {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x2 as u32,
        y2: y2 as u32,
    })
}

/// Copy the pixels inside `region` out of `image`
pub fn crop(image: &RgbImage, region: CropRegion) -> RgbImage {
    image::imageops::crop_imm(image, region.x1, region.y1, region.width(), region.height())
        .to_image()
}
