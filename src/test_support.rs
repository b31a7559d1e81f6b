//! Fixture helpers shared by unit tests.

use image::{Rgb, RgbImage};
use std::path::Path;

/// Write a small solid-colour PNG, creating parent directories.
pub fn write_image(path: &Path, rgb: [u8; 3]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_pixel(24, 32, Rgb(rgb)).save(path).unwrap();
}

/// Build `train/`, `valid/` and `test/` with `per_class` images for
/// every class. Each class gets its own colour so the classes are
/// separable.
pub fn write_card_fixture(root: &Path, classes: &[&str], per_class: usize) {
    for split in ["train", "valid", "test"] {
        for (c, class) in classes.iter().enumerate() {
            let base = (c as u8).wrapping_mul(97).wrapping_add(20);
            for i in 0..per_class {
                let shade = base.wrapping_add(i as u8 * 3);
                write_image(
                    &root.join(split).join(class).join(format!("{i}.png")),
                    [shade, 255 - shade, shade / 2],
                );
            }
        }
    }
}
