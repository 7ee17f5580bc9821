use std::fmt;
use std::io::Cursor;

use image::ImageReader;

use crate::error::ValidationError;
use crate::payload::Subject;
use crate::target::Accepts;

use super::Validator;

/// Checks that a file payload is a decodable image of the configured size.
///
/// A dimension configured as `0` is not checked.
#[derive(Debug, Clone, Copy)]
pub struct ImageValidator {
    height: u32,
    width: u32,
}

impl ImageValidator {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    fn fail(&self, reason: impl Into<String>) -> ValidationError {
        ValidationError::new(self.name(), reason)
    }
}

impl Validator for ImageValidator {
    fn name(&self) -> &str {
        "img"
    }

    fn accepts(&self) -> Accepts {
        Accepts::DATA
    }

    fn validate(&self, subject: Subject<'_>) -> Result<(), ValidationError> {
        let file = subject
            .file()
            .ok_or_else(|| self.fail("payload is not a file"))?;

        let reader = ImageReader::new(Cursor::new(&file.bytes[..]))
            .with_guessed_format()
            .map_err(|e| self.fail(format!("Could not open the image: {}", e)))?;
        if reader.format().is_none() {
            return Err(self.fail("Could not open the image: unknown format"));
        }

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| self.fail(format!("Could not open the image: {}", e)))?;
        if (self.height != 0 && self.height != height) || (self.width != 0 && self.width != width) {
            return Err(self.fail(format!(
                "Image dimensions do not match: got {}x{}, expected {}x{}",
                height, width, self.height, self.width
            )));
        }

        // Full decode catches truncated or corrupt pixel data.
        ImageReader::new(Cursor::new(&file.bytes[..]))
            .with_guessed_format()
            .map_err(|e| self.fail(format!("Could not verify the image: {}", e)))?
            .decode()
            .map_err(|e| self.fail(format!("Could not verify the image: {}", e)))?;
        Ok(())
    }
}

impl fmt::Display for ImageValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageValidator with setup: h: {}, w: {}", self.height, self.width)
    }
}
