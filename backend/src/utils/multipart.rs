//! Helper for collecting multipart form submissions.
//!
//! Registration and contact create/update accept profile fields plus an
//! optional `image` file part. This flattens an axum `Multipart` stream
//! into named text fields and the image bytes.

use axum::extract::Multipart;
use std::collections::HashMap;

use crate::errors::{ServiceError, ServiceResult};

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus the optional image part of a multipart submission.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    pub image: Option<UploadedFile>,
}

impl FormData {
    /// Drain a multipart stream into named fields.
    pub async fn read(mut multipart: Multipart) -> ServiceResult<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServiceError::validation(format!("Malformed multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::validation(format!("Failed to read image: {e}")))?;
                if !bytes.is_empty() {
                    form.image = Some(UploadedFile {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServiceError::validation(format!("Failed to read field: {e}")))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// A field that must be present and non-empty.
    pub fn required(&self, name: &str) -> ServiceResult<String> {
        match self.fields.get(name) {
            Some(value) if !value.trim().is_empty() => Ok(value.clone()),
            _ => Err(ServiceError::validation(format!("{name} is required"))),
        }
    }

    /// A field that may be absent.
    pub fn optional(&self, name: &str) -> Option<String> {
        self.fields.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with(fields: &[(&str, &str)]) -> FormData {
        let mut form = FormData::default();
        for (k, v) in fields {
            form.fields.insert((*k).to_string(), (*v).to_string());
        }
        form
    }

    #[test]
    fn test_required_field() {
        let form = form_with(&[("email", "a@x.com"), ("blank", "  ")]);
        assert_eq!(form.required("email").unwrap(), "a@x.com");
        assert!(form.required("blank").is_err());
        assert!(form.required("missing").is_err());
    }

    #[test]
    fn test_optional_field() {
        let form = form_with(&[("title", "Engineer"), ("empty", "")]);
        assert_eq!(form.optional("title").as_deref(), Some("Engineer"));
        assert_eq!(form.optional("empty"), None);
        assert_eq!(form.optional("missing"), None);
    }
}
