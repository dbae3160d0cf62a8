use std::path::Path;

use image::{Rgba, RgbaImage};

pub(crate) const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub(crate) const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub(crate) const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub(crate) const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub(crate) fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// A transparent image with a single opaque pixel at `(x, y)`.
pub(crate) fn dot(width: u32, height: u32, x: u32, y: u32, color: Rgba<u8>) -> RgbaImage {
    let mut image = solid(width, height, TRANSPARENT);
    image.put_pixel(x, y, color);
    image
}

pub(crate) fn write_png(dir: &Path, stem: &str, image: &RgbaImage) {
    image.save(dir.join(format!("{}.png", stem))).unwrap();
}
