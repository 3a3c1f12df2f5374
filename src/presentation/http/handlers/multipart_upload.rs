use axum::extract::Multipart;

use crate::presentation::http::error::ApiError;

const DEFAULT_MIME: &str = "application/octet-stream";

/// The fields of an upload form: a required `file` part and an optional
/// `summary` text part. Other parts are ignored.
#[derive(Debug)]
pub struct UploadForm {
    pub data: Vec<u8>,
    pub filename: String,
    pub mime: String,
    pub summary: Option<String>,
}

pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut file = None;
    let mut summary = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(ApiError::from_multipart)?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mime = field
                    .content_type()
                    .map(|ct| ct.to_string())
                    .unwrap_or_else(|| DEFAULT_MIME.to_string());
                let data = field.bytes().await.map_err(ApiError::from_multipart)?;
                file = Some((data.to_vec(), filename, mime));
            }
            Some("summary") => {
                let text = field.text().await.map_err(ApiError::from_multipart)?;
                summary = Some(text).filter(|s| !s.trim().is_empty());
            }
            _ => {}
        }
    }

    let (data, filename, mime) =
        file.ok_or_else(|| ApiError::validation("multipart field \"file\" is required"))?;

    Ok(UploadForm {
        data,
        filename,
        mime,
        summary,
    })
}
