use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::ServiceError;

const PDF_MAGIC: &[u8] = b"%PDF";

pub fn item_label_file_name(item_id: &str) -> String {
    format!("label_{}.pdf", item_id)
}

pub fn task_labels_file_name(task_id: &str) -> String {
    format!("labels_{}.pdf", task_id)
}

/// Writes a rendered label document to `target`. A directory target gets
/// `default_name` appended.
pub fn save_label_pdf(
    document: &Bytes,
    target: &Path,
    default_name: &str,
) -> Result<PathBuf, ServiceError> {
    if !document.starts_with(PDF_MAGIC) {
        return Err(ServiceError::SerializationError(
            "伺服器回傳的標籤不是 PDF 檔案".to_string(),
        ));
    }

    let path = if target.is_dir() {
        target.join(default_name)
    } else {
        target.to_path_buf()
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, document)?;

    info!(path = %path.display(), bytes = document.len(), "Label PDF saved");
    Ok(path)
}
