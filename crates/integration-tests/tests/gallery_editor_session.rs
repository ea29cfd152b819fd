//! Editing session behavior under concurrent and failing uploads.
//!
//! These tests drive `GalleryEditor` the way the upload route does:
//! register the upload, do slow work off the session, then apply the
//! completion - with completions arriving in an order the starts did not
//! predict.

use std::sync::Arc;
use std::time::Duration;

use tandem_core::{AssetLocator, Category, Gallery, Product, ProductId};

use tandem_admin::db::RepositoryError;
use tandem_admin::services::{EditorError, EditorSessions, GalleryEditor};

fn locator(name: &str) -> AssetLocator {
    AssetLocator::from(format!("https://cdn.test/{name}").as_str())
}

// =============================================================================
// Concurrent Uploads
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_slow_first_upload_is_not_lost_to_a_fast_second() {
    // Two uploads start against the same empty gallery. The first takes
    // 300ms of "network", the second 50ms, so the second completes first.
    let editor = Arc::new(GalleryEditor::new(ProductId::new(1), Gallery::new()));

    editor.begin_upload().await.expect("session open");
    editor.begin_upload().await.expect("session open");

    let slow = {
        let editor = Arc::clone(&editor);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            editor.complete_upload(locator("first-started.jpg")).await
        })
    };
    let fast = {
        let editor = Arc::clone(&editor);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            editor.complete_upload(locator("second-started.jpg")).await
        })
    };

    fast.await.expect("task").expect("session open");
    slow.await.expect("task").expect("session open");

    let gallery = editor.snapshot().await.gallery;

    // Both uploads landed: the late completion appended to the LATEST
    // state rather than overwriting it with a stale empty snapshot.
    assert_eq!(gallery.len(), 2);
    let urls: Vec<_> = gallery
        .assets()
        .iter()
        .map(|a| a.locator.as_str().to_string())
        .collect();
    assert!(urls.contains(&"https://cdn.test/first-started.jpg".to_string()));
    assert!(urls.contains(&"https://cdn.test/second-started.jpg".to_string()));

    // Exactly one primary: whichever completed first.
    assert_eq!(gallery.primary_count(), 1);
    assert_eq!(
        gallery.assets()[0].locator.as_str(),
        "https://cdn.test/second-started.jpg"
    );
    assert!(gallery.assets()[0].is_primary);
}

#[tokio::test]
async fn test_many_concurrent_uploads_all_land_with_one_primary() {
    let editor = Arc::new(GalleryEditor::new(ProductId::new(2), Gallery::new()));

    let mut handles = Vec::new();
    for i in 0..16 {
        editor.begin_upload().await.expect("session open");
        let editor = Arc::clone(&editor);
        handles.push(tokio::spawn(async move {
            editor.complete_upload(locator(&format!("{i}.jpg"))).await
        }));
    }
    for handle in handles {
        handle.await.expect("task").expect("session open");
    }

    let gallery = editor.snapshot().await.gallery;
    assert_eq!(gallery.len(), 16);
    assert_eq!(gallery.primary_count(), 1);
    assert!(gallery.assets()[0].is_primary);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_navigating_away_discards_in_flight_uploads() {
    let sessions = EditorSessions::new();
    let id = ProductId::new(3);

    let editor = sessions.open(id, Gallery::new()).await;
    editor.begin_upload().await.expect("session open");

    let late = {
        let editor = Arc::clone(&editor);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            editor.complete_upload(locator("late.jpg")).await
        })
    };

    // The admin navigates away before the upload resolves.
    sessions.close(id).await;

    assert!(late.await.expect("task").is_none());
    assert!(sessions.get(id).await.is_none());

    // Further gestures against the closed session fail loudly.
    assert!(matches!(
        editor.remove_asset(0).await,
        Err(EditorError::Closed)
    ));
}

// =============================================================================
// Save / Retry
// =============================================================================

fn saved_product(id: ProductId, gallery: Gallery) -> Product {
    let mut product = Product::draft("Weekend Duo".to_string(), Category::Casual);
    product.id = Some(id);
    product.gallery = gallery;
    product
}

#[tokio::test]
async fn test_failed_save_preserves_uploads_for_retry() {
    let id = ProductId::new(4);
    let editor = GalleryEditor::new(id, Gallery::new());

    editor.begin_upload().await.expect("session open");
    editor
        .complete_upload(locator("keep-me.jpg"))
        .await
        .expect("session open");
    editor.begin_upload().await.expect("session open");
    editor
        .complete_upload(locator("me-too.jpg"))
        .await
        .expect("session open");

    // Backend rejects the save.
    let result = editor
        .save(|_gallery| async {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        })
        .await;
    assert!(matches!(result, Err(EditorError::Persistence(_))));

    // The session is still dirty and both uploads survive, so retrying the
    // save needs no re-upload.
    let snapshot = editor.snapshot().await;
    assert!(snapshot.dirty);
    assert_eq!(snapshot.gallery.len(), 2);

    // Retry succeeds and clears the dirty flag.
    editor
        .save(|gallery| async move { Ok(saved_product(id, gallery)) })
        .await
        .expect("retry succeeds");
    assert!(!editor.snapshot().await.dirty);
}

#[tokio::test]
async fn test_save_persists_exactly_the_working_gallery() {
    let id = ProductId::new(5);
    let editor = GalleryEditor::new(id, Gallery::new());

    editor.begin_upload().await.expect("session open");
    editor
        .complete_upload(locator("a.jpg"))
        .await
        .expect("session open");
    editor.begin_upload().await.expect("session open");
    editor
        .complete_upload(locator("b.jpg"))
        .await
        .expect("session open");
    editor.set_primary(1).await.expect("valid index");

    let saved = editor
        .save(|gallery| async move { Ok(saved_product(id, gallery)) })
        .await
        .expect("save succeeds");

    assert_eq!(saved.gallery.len(), 2);
    assert!(saved.gallery.assets()[1].is_primary);
    assert_eq!(saved.gallery, editor.snapshot().await.gallery);
}

#[tokio::test]
async fn test_discarding_resets_to_the_persisted_gallery() {
    let persisted = Gallery::new().with_asset(locator("persisted.jpg"));
    let editor = GalleryEditor::new(ProductId::new(6), persisted.clone());

    editor.begin_upload().await.expect("session open");
    editor
        .complete_upload(locator("unsaved.jpg"))
        .await
        .expect("session open");
    assert!(editor.snapshot().await.dirty);

    editor.reset(persisted.clone()).await.expect("session open");

    let snapshot = editor.snapshot().await;
    assert!(!snapshot.dirty);
    assert_eq!(snapshot.gallery, persisted);
}
