//! Binary reference masks on disk.

use crate::error::Result;
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use std::path::Path;

/// Threshold a grayscale image at its Otsu level: pixels above the level become 1, the rest 0.
pub fn binarize_otsu(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, p) in gray.enumerate_pixels() {
        if p[0] > level {
            out.put_pixel(x, y, Luma([1]));
        }
    }
    out
}

/// Load any supported image as a 0/1 mask.
pub fn load_binary_mask(path: impl AsRef<Path>) -> Result<GrayImage> {
    let gray = image::open(path.as_ref())?.to_luma8();
    Ok(binarize_otsu(&gray))
}

/// Save a 0/1 mask as a black/white image (format from the extension).
pub fn save_binary_mask(mask: &GrayImage, path: impl AsRef<Path>) -> Result<()> {
    let mut out = GrayImage::new(mask.width(), mask.height());
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] > 0 {
            out.put_pixel(x, y, Luma([255]));
        }
    }
    out.save(path.as_ref())?;
    Ok(())
}
