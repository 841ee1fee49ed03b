//! Rawteous Docs - parameter reference browser core
//!
//! Deep-link navigation with bounded retries over an asynchronously
//! rendered page, and a per-parameter image store with carousel and admin
//! views kept in sync. Runs in the browser (WASM) and as a native admin
//! command-line tool.

pub mod admin;
pub mod carousel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod lightbox;
pub mod message;
pub mod model;
pub mod navigation;
pub mod notify;
pub mod page;
pub mod scheduler;
pub mod site;
pub mod store;
pub mod upload;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(test)]
mod tests;

pub use catalog::Catalog;
pub use config::SiteConfig;
pub use error::DocsError;
pub use message::{Message, Task};
pub use model::{ImageEntry, ParameterKey};
pub use site::DocsSite;
pub use store::{ImageStore, StoreChange};

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
