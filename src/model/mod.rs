//! Data models shared by the store, the views and navigation.

mod entry;
mod key;

pub use entry::{DATA_URL_PREFIX, ImageEntry};
pub use key::{KEY_SEPARATOR, ParameterKey};
