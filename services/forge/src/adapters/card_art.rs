//! services/forge/src/adapters/card_art.rs
//!
//! This module contains the filesystem adapter for generated card artwork.
//! It implements the `CardArtStore` port from the `core` crate.

use async_trait::async_trait;
use cardforge_core::domain::{GeneratedImage, ImagePayload};
use cardforge_core::ports::{CardArtStore, PortError, PortResult};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Writes inline images as `<card_id>.<ext>` and remote images as a `<card_id>.url` pointer.
#[derive(Clone, Debug)]
pub struct FsCardArtStore {
    root: PathBuf,
}

impl FsCardArtStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn extension_for(mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

#[async_trait]
impl CardArtStore for FsCardArtStore {
    async fn store(&self, card_id: Uuid, image: GeneratedImage) -> PortResult<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to create {}: {}", self.root.display(), e)))?;

        let (path, contents) = match image.payload {
            ImagePayload::InlineBase64(bytes) => (
                self.root
                    .join(format!("{}.{}", card_id, Self::extension_for(&image.mime_type))),
                bytes,
            ),
            ImagePayload::RemoteUrl(url) => (
                self.root.join(format!("{}.url", card_id)),
                url.into_bytes(),
            ),
        };

        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write {}: {}", path.display(), e)))?;

        info!(card_id = %card_id, path = %path.display(), "Card art stored.");
        Ok(path.display().to_string())
    }
}
