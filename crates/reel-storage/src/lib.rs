//! Durable asset store for Reel Studio.
//!
//! This crate provides:
//! - The `AssetStore` seam (upload with metadata, list by kind)
//! - A Cloudflare R2 implementation over the S3 API
//! - An in-memory store for local runs and tests

pub mod client;
pub mod error;
pub mod memory;
pub mod store;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryAssetStore;
pub use store::{
    asset_key, asset_name_from_key, AssetStore, AssetUpload, MAX_METADATA_VALUE_CHARS,
};
