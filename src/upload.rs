//! Image file uploads.
//!
//! Each selected file is read independently and turned into an embedded
//! `data:` reference. Completed reads land in an [`UploadQueue`] that the
//! admin panel drains into the store; sibling reads may complete in any
//! order and nothing here tries to restore selection order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::UploadError;
use crate::model::{DATA_URL_PREFIX, ImageEntry, ParameterKey};

/// Fallback MIME type when the format cannot be determined.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// A finished file read, successful or not.
#[derive(Debug)]
pub struct CompletedRead {
    /// Parameter the file was uploaded for
    pub key: ParameterKey,
    /// File name as selected
    pub name: String,
    pub result: Result<ImageEntry, UploadError>,
}

/// Completion queue shared between pending reads and the consumer.
/// Single-threaded: reads complete on the event loop.
#[derive(Debug, Clone, Default)]
pub struct UploadQueue {
    inner: Rc<RefCell<VecDeque<CompletedRead>>>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, read: CompletedRead) {
        self.inner.borrow_mut().push_back(read);
    }

    /// Take every completion queued so far, in completion order.
    pub fn drain(&self) -> Vec<CompletedRead> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

/// MIME type for an image, sniffed from its bytes, else from its name.
pub fn mime_for(name: &str, bytes: &[u8]) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }
    if name.to_ascii_lowercase().ends_with(".svg") {
        return "image/svg+xml";
    }
    image::ImageFormat::from_path(name)
        .map(|f| f.to_mime_type())
        .unwrap_or(UNKNOWN_MIME)
}

/// Encode bytes as an embedded `data:<mime>;base64,` reference.
pub fn encode_data_url(name: &str, bytes: &[u8]) -> Result<ImageEntry, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty {
            name: name.to_string(),
        });
    }
    let url = format!(
        "{DATA_URL_PREFIX}{};base64,{}",
        mime_for(name, bytes),
        BASE64.encode(bytes)
    );
    ImageEntry::new(&url).ok_or_else(|| UploadError::Empty {
        name: name.to_string(),
    })
}

/// Read a file from disk and encode it.
#[cfg(not(target_arch = "wasm32"))]
pub fn read_image_file(path: &std::path::Path) -> Result<ImageEntry, UploadError> {
    let bytes = std::fs::read(path).map_err(|source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    log::info!("📂 Read {} ({} bytes)", name, bytes.len());
    encode_data_url(&name, &bytes)
}
