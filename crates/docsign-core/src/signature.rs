//! Captured signature images

use crate::error::SignError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared_pdf::image::PNG_MAGIC;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// A signature drawn by the user, kept both as the data URL shown in the
/// overlay and as the raw PNG that gets embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImage {
    data_url: String,
    png: Vec<u8>,
}

impl SignatureImage {
    /// Accept a `data:image/png;base64,...` URL from the signature pad
    pub fn from_data_url(data_url: &str) -> Result<Self, SignError> {
        let trimmed = data_url.trim();
        let payload = trimmed
            .get(..PNG_DATA_URL_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(PNG_DATA_URL_PREFIX))
            .map(|_| &trimmed[PNG_DATA_URL_PREFIX.len()..])
            .ok_or_else(|| {
                SignError::DecodeFailed("signature is not a base64 PNG data URL".to_string())
            })?;

        let png = STANDARD
            .decode(payload)
            .map_err(|e| SignError::DecodeFailed(format!("signature base64: {}", e)))?;
        Self::check_png(&png)?;

        Ok(Self {
            data_url: trimmed.to_string(),
            png,
        })
    }

    /// Wrap raw PNG bytes, deriving the data URL
    pub fn from_png_bytes(png: Vec<u8>) -> Result<Self, SignError> {
        Self::check_png(&png)?;
        Ok(Self {
            data_url: format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(&png)),
            png,
        })
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    fn check_png(bytes: &[u8]) -> Result<(), SignError> {
        if bytes.starts_with(&PNG_MAGIC) {
            Ok(())
        } else {
            Err(SignError::DecodeFailed(
                "signature image is not a PNG".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tiny_png;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_data_url_round_trip() {
        let from_bytes = SignatureImage::from_png_bytes(tiny_png()).unwrap();
        assert!(from_bytes.data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));

        let from_url = SignatureImage::from_data_url(from_bytes.data_url()).unwrap();
        assert_eq!(from_url, from_bytes);
        assert_eq!(from_url.png_bytes(), tiny_png().as_slice());
    }

    #[test]
    fn test_rejects_other_media_types() {
        assert!(matches!(
            SignatureImage::from_data_url("data:image/jpeg;base64,/9j/4AAQ"),
            Err(SignError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert!(matches!(
            SignatureImage::from_data_url("data:image/png;base64,***"),
            Err(SignError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_rejects_non_png_payload() {
        // "hello" in base64
        assert!(matches!(
            SignatureImage::from_data_url("data:image/png;base64,aGVsbG8="),
            Err(SignError::DecodeFailed(_))
        ));
        assert!(SignatureImage::from_png_bytes(b"GIF89a".to_vec()).is_err());
    }
}
