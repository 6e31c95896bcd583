use crate::error::{AppError, AppResult};
use axum::extract::Multipart;
use std::collections::HashMap;

/// One file pulled out of a multipart body, fully buffered.
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A multipart form collected into text fields and named files. The
/// register/update/course forms mix both, so the handlers read the whole
/// body up front instead of streaming field by field.
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut fields = HashMap::new();
        let mut files = HashMap::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
        {
            let name = match field.name() {
                Some(name) => name.to_string(),
                None => continue,
            };

            let file_name = field.file_name().map(|f| f.to_string());
            match file_name {
                Some(filename) => {
                    let content_type = field.content_type().map(|ct| ct.to_string());
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| {
                            AppError::Validation(format!("Failed to read file data: {}", e))
                        })?
                        .to_vec();
                    files.insert(
                        name,
                        UploadedFile {
                            filename,
                            content_type,
                            data,
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(|e| {
                        AppError::Validation(format!("Failed to read form field: {}", e))
                    })?;
                    fields.insert(name, value);
                }
            }
        }

        Ok(Self { fields, files })
    }

    /// A text field's trimmed value, with empty strings treated as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }
}
