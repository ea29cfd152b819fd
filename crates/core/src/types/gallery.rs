//! Ordered image gallery with a single-primary invariant.
//!
//! A product owns exactly one [`Gallery`]: an ordered sequence of
//! [`ImageAsset`]s where insertion order is display order. At most one asset
//! carries the primary flag, and a non-empty gallery always has exactly one.
//!
//! Every operation here is pure: it borrows the current gallery and returns
//! a new value. Callers (the editor session, the repositories) swap whole
//! values, so a task holding an old snapshot can never scribble over a newer
//! one - the concurrency story for in-flight uploads depends on this.
//!
//! The persisted wire shape is an ordered JSON array of
//! `{"url": "...", "is_primary": bool}` objects. Deserialization does not
//! re-validate the invariant; [`Gallery::display_asset`] tolerates imported
//! data where no asset was flagged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, publicly dereferenceable address of an asset's bytes.
///
/// Issued by the blob store once per upload and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetLocator(String);

impl AssetLocator {
    /// Wrap a locator issued by the blob store.
    #[must_use]
    pub const fn new(url: String) -> Self {
        Self(url)
    }

    /// The locator as a URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AssetLocator {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl From<&str> for AssetLocator {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

/// One image in a product gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// Retrieval URL, immutable once issued.
    #[serde(rename = "url")]
    pub locator: AssetLocator,
    /// Cover-image flag. Exactly one asset in a non-empty gallery has it.
    ///
    /// `default` so galleries imported from sources that never wrote the
    /// flag still deserialize; `display_asset` covers the fallback.
    #[serde(rename = "is_primary", default)]
    pub is_primary: bool,
}

/// Errors from gallery operations.
///
/// An out-of-range index is a programming defect in the caller, not user
/// input - route handlers map it to an internal error, never a user message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GalleryError {
    #[error("asset index {index} out of range (gallery has {len} assets)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Ordered collection of image assets for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gallery {
    assets: Vec<ImageAsset>,
}

impl Gallery {
    /// An empty gallery.
    #[must_use]
    pub const fn new() -> Self {
        Self { assets: Vec::new() }
    }

    /// Build a gallery from already-persisted assets.
    ///
    /// No normalization happens here: data from the record store is trusted
    /// as-is and malformed flag states are handled at read time by
    /// [`Self::display_asset`].
    #[must_use]
    pub const fn from_assets(assets: Vec<ImageAsset>) -> Self {
        Self { assets }
    }

    /// Assets in display order.
    #[must_use]
    pub fn assets(&self) -> &[ImageAsset] {
        &self.assets
    }

    /// Number of assets.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the gallery holds no assets.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Append a new asset.
    ///
    /// The first asset added to an empty gallery becomes primary; later
    /// additions are non-primary by default.
    #[must_use]
    pub fn with_asset(&self, locator: AssetLocator) -> Self {
        let mut assets = self.assets.clone();
        let is_primary = assets.is_empty();
        assets.push(ImageAsset {
            locator,
            is_primary,
        });
        Self { assets }
    }

    /// Remove the asset at `index`.
    ///
    /// If the removed asset was primary and assets remain, the asset now at
    /// index 0 is promoted, so a product never loses its cover image while
    /// any asset is left.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::IndexOutOfRange`] if `index` is invalid.
    pub fn without_asset(&self, index: usize) -> Result<Self, GalleryError> {
        let removed = self.assets.get(index).ok_or(GalleryError::IndexOutOfRange {
            index,
            len: self.assets.len(),
        })?;
        let was_primary = removed.is_primary;

        let mut assets = self.assets.clone();
        assets.remove(index);

        if was_primary && let Some(first) = assets.first_mut() {
            first.is_primary = true;
        }

        Ok(Self { assets })
    }

    /// Make the asset at `index` the single primary.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::IndexOutOfRange`] if `index` is invalid.
    pub fn with_primary(&self, index: usize) -> Result<Self, GalleryError> {
        if index >= self.assets.len() {
            return Err(GalleryError::IndexOutOfRange {
                index,
                len: self.assets.len(),
            });
        }

        let assets = self
            .assets
            .iter()
            .enumerate()
            .map(|(i, asset)| ImageAsset {
                locator: asset.locator.clone(),
                is_primary: i == index,
            })
            .collect();

        Ok(Self { assets })
    }

    /// Move the asset at `from` to position `to`, shifting the rest.
    ///
    /// The primary flag travels with its asset, so reordering never touches
    /// the invariant.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryError::IndexOutOfRange`] if either index is invalid.
    pub fn moved_asset(&self, from: usize, to: usize) -> Result<Self, GalleryError> {
        let len = self.assets.len();
        if from >= len {
            return Err(GalleryError::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(GalleryError::IndexOutOfRange { index: to, len });
        }

        let mut assets = self.assets.clone();
        let asset = assets.remove(from);
        assets.insert(to, asset);

        Ok(Self { assets })
    }

    /// Resolve the asset a viewer should show by default.
    ///
    /// Returns the primary asset; if no asset carries the flag (data
    /// imported from a source that never enforced the invariant), falls back
    /// to the first asset; returns `None` only for an empty gallery.
    #[must_use]
    pub fn display_asset(&self) -> Option<&ImageAsset> {
        self.assets
            .iter()
            .find(|asset| asset.is_primary)
            .or_else(|| self.assets.first())
    }

    /// Index of the asset [`Self::display_asset`] resolves to.
    #[must_use]
    pub fn display_index(&self) -> Option<usize> {
        self.assets
            .iter()
            .position(|asset| asset.is_primary)
            .or(if self.assets.is_empty() { None } else { Some(0) })
    }

    /// Count of assets flagged primary. The invariant demands 0 for an
    /// empty gallery and exactly 1 otherwise.
    #[must_use]
    pub fn primary_count(&self) -> usize {
        self.assets.iter().filter(|asset| asset.is_primary).count()
    }
}
