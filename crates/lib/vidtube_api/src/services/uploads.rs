//! Multipart form collection for media-bearing endpoints.

use std::collections::HashMap;

use crate::error::ApiError;
use crate::extract::Multipart;

/// One uploaded file part.
#[derive(Debug)]
pub struct FilePart {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A fully drained multipart form: text fields plus file parts, keyed by
/// field name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, FilePart>,
}

impl MultipartForm {
    /// Drain a multipart stream into memory.
    pub async fn collect(multipart: Multipart) -> Result<Self, ApiError> {
        let Multipart(mut multipart) = multipart;
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("malformed multipart body: {e}")))?
        {
            let name = match field.name() {
                Some(n) => n.to_string(),
                None => continue,
            };
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::validation(format!("failed reading {name}: {e}")))?
                        .to_vec();
                    form.files.insert(name, FilePart { filename, bytes });
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(format!("failed reading {name}: {e}")))?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A required, non-blank text field.
    pub fn require_text(&self, name: &str) -> Result<&str, ApiError> {
        self.text(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::validation(format!("{name} is required")))
    }

    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.get(name)
    }

    /// A required, non-empty file part.
    pub fn require_file(&self, name: &str) -> Result<&FilePart, ApiError> {
        self.file(name)
            .filter(|f| !f.bytes.is_empty())
            .ok_or_else(|| ApiError::validation(format!("{name} file is required")))
    }
}
