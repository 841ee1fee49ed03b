//! Image store: keyed image lists, their document format and persistence.

pub mod document;
mod image_store;
pub mod storage;

pub use document::{EXPORT_FILENAME, ImageDocument};
pub use image_store::{DEFAULT_STORAGE_KEY, ImageStore, StoreChange};
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use storage::{MemoryStorage, Storage};
