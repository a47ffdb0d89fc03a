use image::ImageFormat;
use log::{debug, error, warn};
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use crate::error::{NNError, Result};

/// Turns encoded image bytes into text. Implemented by OCR back ends.
pub trait TextExtractor {
    fn extract_text(&self, image: &[u8]) -> Result<String>;
}

/// Runs the `tesseract` binary, feeding the image on stdin.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    pub command: String,
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
        }
    }
}

/// Decodes an upload and re-encodes it as a greyscale PNG for OCR.
pub fn to_greyscale_png(bytes: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes).map_err(|e| {
        warn!("cannot decode {} byte upload: {}", bytes.len(), e);
        NNError::InvalidImage("Invalid image format".to_string())
    })?;
    debug!("decoded {}x{} upload", decoded.width(), decoded.height());

    let mut png = Cursor::new(Vec::new());
    decoded
        .grayscale()
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| NNError::ExtractionFailed(format!("cannot re-encode image: {}", e)))?;
    Ok(png.into_inner())
}

impl TextExtractor for TesseractExtractor {
    fn extract_text(&self, image: &[u8]) -> Result<String> {
        let png = to_greyscale_png(image)?;

        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| NNError::ExtractionFailed(format!("cannot start {}: {}", self.command, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(&png) {
                drop(stdin);
                // Reap the child before bailing out.
                let _ = child.kill();
                let _ = child.wait();
                error!("OCR Error: cannot feed {}: {}", self.command, e);
                return Err(NNError::ExtractionFailed(e.to_string()));
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| NNError::ExtractionFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("OCR Error: {}", stderr.trim());
            return Err(NNError::ExtractionFailed(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Validates an upload and returns the trimmed text found in it.
pub fn extract_code<E: TextExtractor + ?Sized>(
    extractor: &E,
    content_type: &str,
    bytes: &[u8],
) -> Result<String> {
    if !content_type.starts_with("image/") {
        return Err(NNError::InvalidImage("File must be an image".to_string()));
    }
    if bytes.is_empty() {
        return Err(NNError::InvalidImage("Empty file".to_string()));
    }

    let text = extractor.extract_text(bytes)?;
    let text = text.trim();
    if text.is_empty() {
        warn!("no text extracted from {} byte upload", bytes.len());
        return Err(NNError::EmptyExtraction);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl TextExtractor for Fixed {
        fn extract_text(&self, _image: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Undecodable;

    impl TextExtractor for Undecodable {
        fn extract_text(&self, _image: &[u8]) -> Result<String> {
            Err(NNError::InvalidImage("Invalid image format".to_string()))
        }
    }

    #[test]
    fn returns_trimmed_text() {
        let text = extract_code(&Fixed("  print(1)\n\n"), "image/png", b"\x89PNG").unwrap();
        assert_eq!(text, "print(1)");
    }

    #[test]
    fn rejects_non_images() {
        let err = extract_code(&Fixed("x"), "text/plain", b"abc").unwrap_err();
        assert!(matches!(err, NNError::InvalidImage(ref m) if m == "File must be an image"));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn rejects_empty_upload() {
        let err = extract_code(&Fixed("x"), "image/jpeg", b"").unwrap_err();
        assert!(matches!(err, NNError::InvalidImage(ref m) if m == "Empty file"));
    }

    #[test]
    fn blank_ocr_result_is_a_client_error() {
        let err = extract_code(&Fixed(" \n\t "), "image/png", b"img").unwrap_err();
        assert!(matches!(err, NNError::EmptyExtraction));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn decoder_errors_pass_through() {
        let err = extract_code(&Undecodable, "image/png", b"garbage").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    fn encode(img: image::DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn small_png() -> Vec<u8> {
        encode(image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            4,
            3,
            image::Rgb([200, 30, 30]),
        )))
    }

    fn missing_binary() -> TesseractExtractor {
        TesseractExtractor {
            command: "definitely-not-an-ocr-binary".to_string(),
        }
    }

    #[test]
    fn undecodable_upload_is_a_client_error() {
        let err = extract_code(&missing_binary(), "image/png", b"this is not a png").unwrap_err();
        assert!(matches!(err, NNError::InvalidImage(ref m) if m == "Invalid image format"));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn uploads_are_converted_to_greyscale() {
        let png = to_greyscale_png(&small_png()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn missing_binary_is_an_extraction_failure() {
        let err = missing_binary().extract_text(&small_png()).unwrap_err();
        assert!(matches!(err, NNError::ExtractionFailed(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[cfg(unix)]
    #[test]
    fn child_that_ignores_stdin_is_reaped() {
        // Noise barely compresses, so the PNG overflows the pipe buffer.
        let mut state: u32 = 7;
        let noise = image::GrayImage::from_fn(400, 400, |_, _| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            image::Luma([(state >> 16) as u8])
        });
        let upload = encode(image::DynamicImage::ImageLuma8(noise));

        let extractor = TesseractExtractor {
            command: "true".to_string(),
        };
        assert!(matches!(
            extractor.extract_text(&upload),
            Err(NNError::ExtractionFailed(_))
        ));
    }
}
