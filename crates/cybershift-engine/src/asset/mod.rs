//! Page assets (lookbook images) loaded from disk through the `image` crate.
//!
//! A missing or undecodable asset is not fatal: callers draw a placeholder.

mod store;

pub use store::{AssetError, AssetStore, ImageData};
