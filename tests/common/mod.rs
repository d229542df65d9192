use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

/// Writes a flat single-color PNG.
pub fn write_flat_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    RgbImage::from_pixel(width, height, Rgb(color))
        .save(path)
        .expect("write png file");
}

/// Writes a bright, high-frequency PNG: a black/white step edge with a
/// checker pattern on top. Sharp (high Laplacian variance), well lit, and
/// with low-frequency content distinct from a flat image.
pub fn write_sharp_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }

    let mut img = RgbImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let base = if x < width / 2 { 60 } else { 220 };
        let v = if (x + y) % 2 == 0 {
            base
        } else {
            255 - base
        };
        *px = Rgb([v, v, v]);
    }
    img.save(path).expect("write png file");
}

/// Writes a file that starts as a valid PNG but is truncated mid-stream.
pub fn write_truncated_png(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }

    let img = RgbImage::from_pixel(32, 32, Rgb([10, 200, 10]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");

    bytes.truncate(bytes.len() / 2);
    fs::write(path, bytes).expect("write truncated png");
}
