//! Per-product gallery editing sessions.
//!
//! A [`GalleryEditor`] holds the working copy of one product's gallery while
//! an administrator edits it. Gallery changes apply optimistically to the
//! working copy the moment they happen; nothing reaches the record store
//! until an explicit save.
//!
//! # Concurrent uploads
//!
//! Several uploads can be in flight for the same gallery and their
//! completions arrive in any order. Every completion goes through
//! [`GalleryEditor::complete_upload`], which takes the session lock, reads
//! the CURRENT gallery, appends, and writes the result back - a
//! read-modify-write against latest state. A completion handler never holds
//! a gallery snapshot of its own, so a slow first upload cannot be clobbered
//! by a fast second one.
//!
//! # Cancellation
//!
//! Closing the session (navigating away, discarding) flips a `closed` flag
//! under the same lock. Uploads that resolve afterwards are discarded, not
//! applied - no dangling mutation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, instrument};

use tandem_core::{AssetLocator, Gallery, GalleryError, Product, ProductId};

use crate::db::RepositoryError;

/// Errors from editor session operations.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The session was closed; the operation was discarded.
    #[error("editing session is closed")]
    Closed,

    /// A gallery operation was handed an invalid index.
    #[error(transparent)]
    Gallery(#[from] GalleryError),

    /// Persisting the gallery failed; the session stays dirty.
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}

/// Point-in-time view of a session for rendering.
#[derive(Debug, Clone)]
pub struct EditorSnapshot {
    pub gallery: Gallery,
    pub dirty: bool,
    pub uploads_in_flight: usize,
}

#[derive(Debug)]
struct EditorState {
    gallery: Gallery,
    dirty: bool,
    uploads_in_flight: usize,
    closed: bool,
}

/// Editing session for one product's gallery.
#[derive(Debug)]
pub struct GalleryEditor {
    product_id: ProductId,
    state: Mutex<EditorState>,
}

impl GalleryEditor {
    /// Open a session over the last persisted gallery value.
    #[must_use]
    pub fn new(product_id: ProductId, gallery: Gallery) -> Self {
        Self {
            product_id,
            state: Mutex::new(EditorState {
                gallery,
                dirty: false,
                uploads_in_flight: 0,
                closed: false,
            }),
        }
    }

    /// Product this session edits.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Current state for rendering the editor partial.
    pub async fn snapshot(&self) -> EditorSnapshot {
        let state = self.state.lock().await;
        EditorSnapshot {
            gallery: state.gallery.clone(),
            dirty: state.dirty,
            uploads_in_flight: state.uploads_in_flight,
        }
    }

    /// Register an upload before its transcode/store work starts.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Closed`] if the session is already closed.
    pub async fn begin_upload(&self) -> Result<(), EditorError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(EditorError::Closed);
        }
        state.uploads_in_flight += 1;
        Ok(())
    }

    /// Apply a resolved upload to the LATEST gallery state.
    ///
    /// Returns the gallery after the append, or `None` if the session was
    /// closed while the upload was in flight (the result is discarded; the
    /// stored asset stays orphaned in the blob store).
    #[instrument(skip(self), fields(product_id = %self.product_id))]
    pub async fn complete_upload(&self, locator: AssetLocator) -> Option<Gallery> {
        let mut state = self.state.lock().await;
        state.uploads_in_flight = state.uploads_in_flight.saturating_sub(1);

        if state.closed {
            debug!("discarding upload that resolved after session close");
            return None;
        }

        // Read-modify-write: append to whatever the gallery is NOW, not to
        // a snapshot captured when the upload started.
        state.gallery = state.gallery.with_asset(locator);
        state.dirty = true;
        Some(state.gallery.clone())
    }

    /// Drop an upload that failed before producing a locator.
    ///
    /// The gallery is untouched - an upload that never resolves never
    /// appends.
    pub async fn abort_upload(&self) {
        let mut state = self.state.lock().await;
        state.uploads_in_flight = state.uploads_in_flight.saturating_sub(1);
    }

    /// Remove the asset at `index`, re-promoting a primary if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Closed`] on a closed session or
    /// [`EditorError::Gallery`] for an invalid index.
    pub async fn remove_asset(&self, index: usize) -> Result<Gallery, EditorError> {
        self.mutate(|gallery| gallery.without_asset(index)).await
    }

    /// Make the asset at `index` the cover image.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Closed`] on a closed session or
    /// [`EditorError::Gallery`] for an invalid index.
    pub async fn set_primary(&self, index: usize) -> Result<Gallery, EditorError> {
        self.mutate(|gallery| gallery.with_primary(index)).await
    }

    /// Move the asset at `from` to position `to`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Closed`] on a closed session or
    /// [`EditorError::Gallery`] for an invalid index.
    pub async fn move_asset(&self, from: usize, to: usize) -> Result<Gallery, EditorError> {
        self.mutate(|gallery| gallery.moved_asset(from, to)).await
    }

    /// Persist the working gallery through the given write path.
    ///
    /// Holds the session lock across the write so the value that clears the
    /// dirty flag is exactly the value that was persisted. On failure the
    /// session stays dirty and every uploaded asset is still in the working
    /// copy, so the user retries the save without redoing uploads.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Closed`] on a closed session or
    /// [`EditorError::Persistence`] if the write fails.
    pub async fn save<F, Fut>(&self, persist: F) -> Result<Product, EditorError>
    where
        F: FnOnce(Gallery) -> Fut,
        Fut: Future<Output = Result<Product, RepositoryError>>,
    {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(EditorError::Closed);
        }

        let product = persist(state.gallery.clone()).await?;
        state.dirty = false;
        debug!(product_id = %self.product_id, "gallery saved");
        Ok(product)
    }

    /// Throw away unsaved edits and reset to a freshly loaded gallery.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Closed`] on a closed session.
    pub async fn reset(&self, persisted: Gallery) -> Result<Gallery, EditorError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(EditorError::Closed);
        }
        state.gallery = persisted;
        state.dirty = false;
        Ok(state.gallery.clone())
    }

    /// Close the session; in-flight uploads resolving later are discarded.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
    }

    async fn mutate(
        &self,
        op: impl FnOnce(&Gallery) -> Result<Gallery, GalleryError>,
    ) -> Result<Gallery, EditorError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(EditorError::Closed);
        }

        state.gallery = op(&state.gallery)?;
        state.dirty = true;
        Ok(state.gallery.clone())
    }
}

/// Registry of open editing sessions, one per product at most.
///
/// Re-entering a product's editor while a session is open resumes it with
/// its unsaved edits instead of silently dropping them.
#[derive(Debug, Clone, Default)]
pub struct EditorSessions {
    inner: Arc<Mutex<HashMap<ProductId, Arc<GalleryEditor>>>>,
}

impl EditorSessions {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the open session for a product, or open one over `persisted`.
    pub async fn open(&self, product_id: ProductId, persisted: Gallery) -> Arc<GalleryEditor> {
        let mut sessions = self.inner.lock().await;
        Arc::clone(
            sessions
                .entry(product_id)
                .or_insert_with(|| Arc::new(GalleryEditor::new(product_id, persisted))),
        )
    }

    /// Get the open session for a product, if any.
    pub async fn get(&self, product_id: ProductId) -> Option<Arc<GalleryEditor>> {
        self.inner.lock().await.get(&product_id).cloned()
    }

    /// Close and drop a product's session.
    ///
    /// The session is marked closed first, so a late upload completion
    /// holding the old `Arc` discards its result instead of mutating a
    /// gallery nobody is looking at.
    pub async fn close(&self, product_id: ProductId) {
        let session = self.inner.lock().await.remove(&product_id);
        if let Some(session) = session {
            session.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(gallery: Gallery) -> GalleryEditor {
        GalleryEditor::new(ProductId::new(1), gallery)
    }

    #[tokio::test]
    async fn test_upload_completions_append_to_latest_state() {
        // Two uploads start against the same empty gallery; the second
        // resolves first. Neither result may be lost.
        let editor = editor_with(Gallery::new());

        editor.begin_upload().await.expect("open session");
        editor.begin_upload().await.expect("open session");

        editor
            .complete_upload(AssetLocator::from("https://cdn.test/second.jpg"))
            .await
            .expect("session open");
        let after = editor
            .complete_upload(AssetLocator::from("https://cdn.test/first.jpg"))
            .await
            .expect("session open");

        assert_eq!(after.len(), 2);
        let locators: Vec<_> = after
            .assets()
            .iter()
            .map(|a| a.locator.as_str().to_string())
            .collect();
        assert!(locators.contains(&"https://cdn.test/first.jpg".to_string()));
        assert!(locators.contains(&"https://cdn.test/second.jpg".to_string()));

        // Whichever completed first is the primary, and only it.
        assert_eq!(after.primary_count(), 1);
        assert!(after.assets()[0].is_primary);
        assert_eq!(after.assets()[0].locator.as_str(), "https://cdn.test/second.jpg");
    }

    #[tokio::test]
    async fn test_completion_after_close_is_discarded() {
        let editor = editor_with(Gallery::new());
        editor.begin_upload().await.expect("open session");

        editor.close().await;

        let result = editor
            .complete_upload(AssetLocator::from("https://cdn.test/late.jpg"))
            .await;
        assert!(result.is_none());

        let snapshot = editor.snapshot().await;
        assert!(snapshot.gallery.is_empty());
        assert_eq!(snapshot.uploads_in_flight, 0);
    }

    #[tokio::test]
    async fn test_aborted_upload_never_appends() {
        let editor = editor_with(Gallery::new());
        editor.begin_upload().await.expect("open session");
        editor.abort_upload().await;

        let snapshot = editor.snapshot().await;
        assert!(snapshot.gallery.is_empty());
        assert!(!snapshot.dirty);
        assert_eq!(snapshot.uploads_in_flight, 0);
    }

    #[tokio::test]
    async fn test_mutations_mark_session_dirty() {
        let gallery = Gallery::new()
            .with_asset("a".into())
            .with_asset("b".into());
        let editor = editor_with(gallery);

        assert!(!editor.snapshot().await.dirty);

        editor.set_primary(1).await.expect("valid index");
        assert!(editor.snapshot().await.dirty);
    }

    #[tokio::test]
    async fn test_invalid_index_leaves_state_untouched() {
        let gallery = Gallery::new().with_asset("a".into());
        let editor = editor_with(gallery.clone());

        let result = editor.remove_asset(5).await;
        assert!(matches!(result, Err(EditorError::Gallery(_))));

        let snapshot = editor.snapshot().await;
        assert_eq!(snapshot.gallery, gallery);
        assert!(!snapshot.dirty);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_session_dirty() {
        let editor = editor_with(Gallery::new());
        editor.begin_upload().await.expect("open session");
        editor
            .complete_upload(AssetLocator::from("https://cdn.test/a.jpg"))
            .await
            .expect("session open");

        let result = editor
            .save(|_gallery| async { Err(RepositoryError::NotFound) })
            .await;
        assert!(matches!(result, Err(EditorError::Persistence(_))));

        // Still dirty, upload still present: retry without re-uploading.
        let snapshot = editor.snapshot().await;
        assert!(snapshot.dirty);
        assert_eq!(snapshot.gallery.len(), 1);
    }

    #[tokio::test]
    async fn test_successful_save_clears_dirty() {
        let editor = editor_with(Gallery::new());
        editor.begin_upload().await.expect("open session");
        editor
            .complete_upload(AssetLocator::from("https://cdn.test/a.jpg"))
            .await
            .expect("session open");

        let saved = editor
            .save(|gallery| async move {
                let mut product =
                    Product::draft("Tes".to_string(), tandem_core::Category::Casual);
                product.id = Some(ProductId::new(1));
                product.gallery = gallery;
                Ok(product)
            })
            .await
            .expect("save succeeds");

        assert_eq!(saved.gallery.len(), 1);
        assert!(!editor.snapshot().await.dirty);
    }

    #[tokio::test]
    async fn test_registry_resumes_open_sessions() {
        let sessions = EditorSessions::new();
        let id = ProductId::new(7);

        let first = sessions.open(id, Gallery::new()).await;
        first.begin_upload().await.expect("open session");
        first
            .complete_upload(AssetLocator::from("https://cdn.test/a.jpg"))
            .await
            .expect("session open");

        // Re-opening with a stale persisted gallery resumes the session
        // instead of discarding the unsaved upload.
        let second = sessions.open(id, Gallery::new()).await;
        assert_eq!(second.snapshot().await.gallery.len(), 1);
    }

    #[tokio::test]
    async fn test_registry_close_discards_late_completions() {
        let sessions = EditorSessions::new();
        let id = ProductId::new(7);

        let editor = sessions.open(id, Gallery::new()).await;
        editor.begin_upload().await.expect("open session");

        sessions.close(id).await;

        assert!(
            editor
                .complete_upload(AssetLocator::from("https://cdn.test/late.jpg"))
                .await
                .is_none()
        );
        assert!(sessions.get(id).await.is_none());
    }
}
