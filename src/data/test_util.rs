// Fixture helpers shared by the data-layer tests.

use image::{Rgb, RgbImage};
use std::{fs, path::Path};

/// Write a square PNG filled with a single colour, creating parent dirs.
pub fn write_png(path: &Path, size: u32, rgb: [u8; 3]) {
    write_png_with(path, size, |_, _| rgb);
}

/// Write a square PNG whose pixel colour is computed per (x, y).
pub fn write_png_with(path: &Path, size: u32, f: impl Fn(u32, u32) -> [u8; 3]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(size, size, |x, y| Rgb(f(x, y)));
    img.save(path).unwrap();
}
