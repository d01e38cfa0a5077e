//! Image frame loading for one modality folder.
//!
//! Epistemic foundation:
//! - K_i: Frame order is the integer in the second-to-last `_` token of the file name
//! - B_i: Every entry of the folder decodes as an image → Result
//! - I^B: Decoder failures abort the episode

use crate::models::{ConvertError, Frame, PixelData, Pixels, Result};
use image::{DynamicImage, ImageReader};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parse the frame index out of a file name.
///
/// `rgb_000012_color.png` → 12. The full file name (extension included) is
/// split on `_` and the second-to-last token must be an integer.
pub fn frame_index(file_name: &str) -> Result<i64> {
    let tokens: Vec<&str> = file_name.split('_').collect();
    if tokens.len() < 2 {
        return Err(ConvertError::frame_index(
            file_name,
            "needs at least two '_'-separated segments",
        ));
    }

    let token = tokens[tokens.len() - 2].trim();
    token.parse::<i64>().map_err(|e| {
        ConvertError::frame_index(file_name, format!("'{token}' is not an integer: {e}"))
    })
}

/// List a modality folder in frame order.
pub fn sorted_frame_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ConvertError::io(format!("listing {}", dir.display()), e))?;

    let mut indexed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConvertError::io(format!("listing {}", dir.display()), e))?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let index = frame_index(&file_name)?;
        indexed.push((index, file_name, entry.path()));
    }

    // Equal indices fall back to the name so the order never depends on the filesystem
    indexed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    Ok(indexed.into_iter().map(|(_, _, path)| path).collect())
}

/// Decode one image file into a numpy-shaped sample buffer.
pub fn decode_frame(path: &Path) -> Result<Pixels> {
    let img = ImageReader::open(path)
        .map_err(|e| ConvertError::io(format!("opening {}", path.display()), e))?
        .with_guessed_format()
        .map_err(|e| ConvertError::io(format!("probing {}", path.display()), e))?
        .decode()
        .map_err(|e| ConvertError::ImageDecode {
            path: path.to_path_buf(),
            source: e,
        })?;

    let height = img.height() as usize;
    let width = img.width() as usize;
    let dims = |channels: usize| {
        if channels == 1 {
            vec![height, width]
        } else {
            vec![height, width, channels]
        }
    };

    // Paletted PNGs arrive expanded to RGB(A); palette indices are not kept
    match img {
        DynamicImage::ImageLuma8(buf) => Pixels::new(dims(1), PixelData::U8(buf.into_raw())),
        DynamicImage::ImageLumaA8(buf) => Pixels::new(dims(2), PixelData::U8(buf.into_raw())),
        DynamicImage::ImageRgb8(buf) => Pixels::new(dims(3), PixelData::U8(buf.into_raw())),
        DynamicImage::ImageRgba8(buf) => Pixels::new(dims(4), PixelData::U8(buf.into_raw())),
        DynamicImage::ImageLuma16(buf) => Pixels::new(dims(1), PixelData::U16(buf.into_raw())),
        DynamicImage::ImageLumaA16(buf) => Pixels::new(dims(2), PixelData::U16(buf.into_raw())),
        DynamicImage::ImageRgb16(buf) => Pixels::new(dims(3), PixelData::U16(buf.into_raw())),
        DynamicImage::ImageRgba16(buf) => Pixels::new(dims(4), PixelData::U16(buf.into_raw())),
        DynamicImage::ImageRgb32F(buf) => Pixels::new(dims(3), PixelData::F32(buf.into_raw())),
        DynamicImage::ImageRgba32F(buf) => Pixels::new(dims(4), PixelData::F32(buf.into_raw())),
        other => Err(ConvertError::UnsupportedPixelLayout {
            path: path.to_path_buf(),
            layout: format!("{:?}", other.color()),
        }),
    }
}

/// Load every frame of a modality folder, in frame order.
///
/// A folder that does not exist is an empty sequence.
pub fn load_frames(dir: &Path) -> Result<Vec<Frame>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let frames = sorted_frame_paths(dir)?
        .into_iter()
        .map(|path| {
            let pixels = decode_frame(&path)?;
            Ok(Frame { path, pixels })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(dir = %dir.display(), count = frames.len(), "Loaded frames");
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_frame_index_takes_second_to_last_token() {
        assert_eq!(frame_index("frame_10_x.png").unwrap(), 10);
        assert_eq!(frame_index("cam_01_000042_left.jpg").unwrap(), 42);
        assert_eq!(frame_index("7_end.png").unwrap(), 7);
    }

    #[test]
    fn test_frame_index_rejects_short_or_non_numeric_names() {
        assert!(matches!(
            frame_index("frame.png"),
            Err(ConvertError::FrameIndex { .. })
        ));
        // Extension stays on the last token, so this splits into ["frame", "3.png"]
        assert!(matches!(
            frame_index("frame_3.png"),
            Err(ConvertError::FrameIndex { .. })
        ));
        assert!(matches!(
            frame_index("frame_abc_x.png"),
            Err(ConvertError::FrameIndex { .. })
        ));
    }

    #[test]
    fn test_sorted_frame_paths_is_numeric() {
        let dir = TempDir::new().unwrap();
        for name in ["frame_0_x.png", "frame_10_x.png", "frame_2_x.png"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let names: Vec<String> = sorted_frame_paths(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["frame_0_x.png", "frame_2_x.png", "frame_10_x.png"]);
    }

    #[test]
    fn test_decode_rgb_and_depth_layouts() {
        let dir = TempDir::new().unwrap();

        let rgb_path = dir.path().join("rgb_0_c.png");
        RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 9]))
            .save(&rgb_path)
            .unwrap();
        let rgb = decode_frame(&rgb_path).unwrap();
        assert_eq!(rgb.shape(), &[2, 3, 3]);
        assert_eq!(rgb.to_u8_vec()[..3], [0, 0, 9]);

        let depth_path = dir.path().join("depth_0_d.png");
        ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(2, 2, vec![1, 500, 1000, 65535])
            .unwrap()
            .save(&depth_path)
            .unwrap();
        let depth = decode_frame(&depth_path).unwrap();
        assert_eq!(depth.shape(), &[2, 2]);
        assert_eq!(depth.to_u16_vec(), vec![1, 500, 1000, 65535]);
    }

    /// 2x1 8-bit paletted PNG: palette [(10, 20, 30), (200, 100, 50)], pixels [0, 1].
    const PALETTE_PNG: [u8; 86] = [
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x08, 0x03, 0x00, 0x00, 0x00, 0xc3,
        0xfc, 0x8f, 0xb8, 0x00, 0x00, 0x00, 0x06, 0x50, 0x4c, 0x54, 0x45, 0x0a, 0x14, 0x1e, 0xc8,
        0x64, 0x32, 0x77, 0xa0, 0xb3, 0x9c, 0x00, 0x00, 0x00, 0x0b, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9c, 0x63, 0x60, 0x64, 0x00, 0x00, 0x00, 0x05, 0x00, 0x02, 0xd1, 0x66, 0x33, 0x78, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn test_paletted_png_expands_to_rgb() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rgb_0_p.png");
        fs::write(&path, PALETTE_PNG).unwrap();

        let pixels = decode_frame(&path).unwrap();
        assert_eq!(pixels.shape(), &[1, 2, 3]);
        assert_eq!(pixels.to_u8_vec(), vec![10, 20, 30, 200, 100, 50]);
    }

    #[test]
    fn test_load_frames_missing_folder_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_frames(&dir.path().join("rgb")).unwrap().is_empty());
    }

    #[test]
    fn test_load_frames_fails_on_non_image() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes_1_a.txt"), b"not an image").unwrap();
        assert!(load_frames(dir.path()).is_err());
    }
}
