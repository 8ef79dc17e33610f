//! Signing configuration
//!
//! Every field has a default matching the hosted web client, so an empty
//! JSON object is a valid configuration.

use crate::error::SignError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use shared_types::PageSize;

/// Top-level configuration for a signing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Size of the stamped signature in PDF points
    pub signature_size_pt: PageSize,
    /// Size of the draggable overlay in screen pixels
    pub field_size_px: PageSize,
    /// 0-based page the signature is placed on
    pub page_index: usize,
    pub measure: MeasureConfig,
    pub endpoints: ServiceEndpoints,
    /// Prepended to the original file name for the signed copy
    pub signed_prefix: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            signature_size_pt: PageSize::new(150.0, 50.0),
            field_size_px: PageSize::new(150.0, 50.0),
            page_index: 0,
            measure: MeasureConfig::default(),
            endpoints: ServiceEndpoints::default(),
            signed_prefix: "signed-".to_string(),
        }
    }
}

impl SigningConfig {
    /// Parse and validate a JSON configuration
    ///
    /// # Errors
    ///
    /// Returns [`SignError::Config`] if the JSON is malformed or a value is
    /// out of range.
    pub fn from_json(s: &str) -> Result<Self, SignError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| SignError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SignError> {
        if !self.signature_size_pt.is_positive() {
            return Err(SignError::Config(
                "signature_size_pt must be positive".to_string(),
            ));
        }
        if !self.field_size_px.is_positive() {
            return Err(SignError::Config("field_size_px must be positive".to_string()));
        }
        if self.measure.retry.max_attempts == 0 {
            return Err(SignError::Config(
                "measure.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.measure.fallback.is_positive() {
            return Err(SignError::Config(
                "measure.fallback must be positive".to_string(),
            ));
        }
        if self.endpoints.base_url.trim().is_empty() {
            return Err(SignError::Config("endpoints.base_url is empty".to_string()));
        }
        Ok(())
    }

    /// File name for the signed copy of `original`
    pub fn signed_file_name(&self, original: &str) -> String {
        format!("{}{}", self.signed_prefix, original)
    }
}

/// Rendered-page measurement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub retry: RetryPolicy,
    /// Screen size assumed when the page never reports one
    pub fallback: PageSize,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            fallback: PageSize::new(600.0, 800.0),
        }
    }
}

/// Backend locations for fetching originals and storing signed copies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEndpoints {
    pub base_url: String,
    pub uploads_path: String,
    pub save_path: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            uploads_path: "/uploads".to_string(),
            save_path: "/signed-docs/save-signed-document".to_string(),
        }
    }
}

impl ServiceEndpoints {
    /// URL of an uploaded original, with the file name percent-encoded
    pub fn document_url(&self, file_name: &str) -> String {
        format!(
            "{}/{}",
            self.join(&self.uploads_path),
            urlencoding::encode(file_name)
        )
    }

    /// URL the signed document is posted to
    pub fn save_url(&self) -> String {
        self.join(&self.save_path)
    }

    fn join(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }
}
