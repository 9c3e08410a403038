pub mod auth;
pub mod health;
pub mod users;

pub use auth::*;
pub use health::*;
pub use users::*;

use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::StreamExt as _;

use crate::error::{AppError, Result};

/// Per-file cap for profile images.
const MAX_IMAGE_BYTES: usize = 5_242_880; // 5MB

/// A fully buffered multipart form: text fields plus (filename, bytes) file
/// fields, keyed by field name. Image uploads are small, so buffering is
/// fine here.
pub(crate) struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, (String, Vec<u8>)>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    pub fn file(&self, name: &str) -> Option<&(String, Vec<u8>)> {
        self.files.get(name)
    }
}

/// Drain a multipart payload into an [`UploadForm`].
pub(crate) async fn read_upload_form(mut payload: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm {
        fields: HashMap::new(),
        files: HashMap::new(),
    };

    while let Some(item) = payload.next().await {
        let mut field = item?;

        let disposition = field.content_disposition();
        let name = disposition
            .get_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("multipart field without a name".to_string()))?;
        let filename = disposition.get_filename().map(str::to_string);

        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let bytes = chunk?;
            if data.len() + bytes.len() > MAX_IMAGE_BYTES {
                return Err(AppError::Validation(format!(
                    "file '{}' exceeds the {} byte limit",
                    name, MAX_IMAGE_BYTES
                )));
            }
            data.extend_from_slice(&bytes);
        }

        match filename {
            Some(filename) => {
                form.files.insert(name, (filename, data));
            }
            None => {
                let value = String::from_utf8(data).map_err(|_| {
                    AppError::Validation(format!("field '{}' is not valid UTF-8", name))
                })?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}
