/// Image file decode/encode
///
/// Thin wrappers over the `image` crate that translate its errors into
/// pipeline error kinds. Encoding format is chosen from the file extension.

use std::path::{Path, PathBuf};

use image::ImageFormat;

use super::buffer::ImageBuffer;
use crate::pipeline::error::{PipelineError, PipelineResult};

/// Extensions offered by the open dialog
pub const OPEN_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Decode an image file into an RGB buffer
pub fn load_image(path: &Path) -> PipelineResult<ImageBuffer> {
    let label = path.display().to_string();
    let decoded = image::open(path).map_err(|e| PipelineError::decode(&label, e))?;
    let rgb = decoded.to_rgb8();
    log::info!("Decoded {} ({}×{})", label, rgb.width(), rgb.height());
    ImageBuffer::from_rgb_image(rgb).map_err(|e| PipelineError::decode(&label, e))
}

/// Decode an in-memory encoded image (PNG, JPEG, ...)
pub fn decode_bytes(bytes: &[u8], label: &str) -> PipelineResult<ImageBuffer> {
    if bytes.is_empty() {
        return Err(PipelineError::decode(label, "no data"));
    }
    let decoded = image::load_from_memory(bytes).map_err(|e| PipelineError::decode(label, e))?;
    ImageBuffer::from_rgb_image(decoded.to_rgb8()).map_err(|e| PipelineError::decode(label, e))
}

/// Encode `buffer` to `path`, picking the format from the extension
pub fn save_image(buffer: &ImageBuffer, path: &Path) -> PipelineResult<()> {
    let format = ImageFormat::from_path(path).map_err(|e| PipelineError::encode(path, e))?;
    let rgb = buffer
        .to_rgb_image()
        .ok_or_else(|| PipelineError::encode(path, "buffer does not match its dimensions"))?;
    rgb.save_with_format(path, format)
        .map_err(|e| PipelineError::encode(path, e))?;
    log::info!(
        "Saved {}×{} image to {} ({:?})",
        buffer.width(),
        buffer.height(),
        path.display(),
        format
    );
    Ok(())
}

/// Append `.png` when the user typed a name without an extension
pub fn with_default_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("png")
    }
}

/// Show file-open dialog for images
pub fn open_image_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open Image")
        .add_filter("Image files", OPEN_EXTENSIONS)
        .pick_file()
}

/// Show save dialog for the processed image
pub fn save_image_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Save Image As…")
        .add_filter("PNG file", &["png"])
        .add_filter("JPEG file", &["jpg", "jpeg"])
        .set_file_name("image.png")
        .save_file()
        .map(with_default_extension)
}

/// Show save dialog for the session log
pub fn save_log_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Export Session Log")
        .add_filter("Text File", &["txt"])
        .add_filter("JSON", &["json"])
        .save_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}.{}", uuid::Uuid::new_v4(), ext))
    }

    fn sample() -> ImageBuffer {
        let data = (0..6 * 4 * 3).map(|i| (i * 11 % 256) as u8).collect();
        ImageBuffer::new(6, 4, data).unwrap()
    }

    #[test]
    fn test_png_save_and_load() {
        let path = temp_path("png");
        let img = sample();
        save_image(&img, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, img);
    }

    #[test]
    fn test_jpeg_save_keeps_dimensions() {
        let path = temp_path("jpg");
        save_image(&sample(), &path).unwrap();
        let loaded = load_image(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.dimensions(), (6, 4));
    }

    #[test]
    fn test_unknown_extension_is_encode_failure() {
        let path = temp_path("notanimage");
        let err = save_image(&sample(), &path).unwrap_err();
        assert!(matches!(err, PipelineError::EncodeFailure { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_decode_failure() {
        let err = load_image(&temp_path("png")).unwrap_err();
        assert!(matches!(err, PipelineError::DecodeFailure { .. }));
    }

    #[test]
    fn test_garbage_is_decode_failure() {
        let path = temp_path("png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load_image(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, PipelineError::DecodeFailure { .. }));
        assert!(decode_bytes(&[], "empty").is_err());
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(
            with_default_extension(PathBuf::from("out")),
            PathBuf::from("out.png")
        );
        assert_eq!(
            with_default_extension(PathBuf::from("out.jpg")),
            PathBuf::from("out.jpg")
        );
    }
}
