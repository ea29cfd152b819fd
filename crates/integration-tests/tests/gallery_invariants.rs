//! Gallery invariant tests over longer operation sequences and the
//! persisted wire shape.

use tandem_core::{Gallery, GalleryError};

/// After any operation, a non-empty gallery has exactly one primary asset.
fn assert_invariant(gallery: &Gallery) {
    let expected = usize::from(!gallery.is_empty());
    assert_eq!(
        gallery.primary_count(),
        expected,
        "invariant violated: {gallery:?}"
    );
}

// =============================================================================
// Operation Sequences
// =============================================================================

#[test]
fn test_invariant_survives_a_long_editing_session() {
    let mut gallery = Gallery::new();
    assert_invariant(&gallery);

    // Build up a five-asset gallery.
    for i in 0..5 {
        gallery = gallery.with_asset(format!("https://cdn.test/{i}.jpg").into());
        assert_invariant(&gallery);
    }

    // Shuffle the cover around, reorder, remove from both ends.
    gallery = gallery.with_primary(3).expect("valid index");
    assert_invariant(&gallery);

    gallery = gallery.moved_asset(3, 0).expect("valid indices");
    assert_invariant(&gallery);
    assert!(gallery.assets()[0].is_primary);

    gallery = gallery.without_asset(4).expect("valid index");
    assert_invariant(&gallery);

    gallery = gallery.without_asset(0).expect("valid index");
    assert_invariant(&gallery);

    // Drain to empty.
    while !gallery.is_empty() {
        gallery = gallery.without_asset(0).expect("valid index");
        assert_invariant(&gallery);
    }
    assert_eq!(gallery.display_asset(), None);
}

#[test]
fn test_removing_primary_always_promotes_the_new_first() {
    // Whatever position the primary holds, removing it leaves the remaining
    // front asset as the cover.
    for primary_at in 0..3 {
        let mut gallery = Gallery::new()
            .with_asset("a".into())
            .with_asset("b".into())
            .with_asset("c".into());
        gallery = gallery.with_primary(primary_at).expect("valid index");

        let after = gallery.without_asset(primary_at).expect("valid index");
        assert_invariant(&after);
        assert!(after.assets()[0].is_primary, "primary_at = {primary_at}");
    }
}

#[test]
fn test_removing_non_primary_never_moves_the_cover() {
    let gallery = Gallery::new()
        .with_asset("a".into())
        .with_asset("b".into())
        .with_asset("c".into());

    let after = gallery.without_asset(2).expect("valid index");
    assert_eq!(
        after.display_asset().expect("non-empty").locator.as_str(),
        "a"
    );
}

#[test]
fn test_failed_operations_leave_no_trace() {
    let gallery = Gallery::new().with_asset("a".into()).with_asset("b".into());
    let before = gallery.clone();

    assert!(matches!(
        gallery.without_asset(2),
        Err(GalleryError::IndexOutOfRange { .. })
    ));
    assert!(matches!(
        gallery.with_primary(7),
        Err(GalleryError::IndexOutOfRange { .. })
    ));

    assert_eq!(gallery, before);
    assert_invariant(&gallery);
}

// =============================================================================
// Wire Shape
// =============================================================================

#[test]
fn test_persisted_shape_is_an_ordered_url_flag_array() {
    let gallery = Gallery::new()
        .with_asset("https://cdn.test/cover.png".into())
        .with_asset("https://cdn.test/alt.jpg".into());

    let json = serde_json::to_value(&gallery).expect("serialize");
    let entries = json.as_array().expect("array wire shape");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["url"], "https://cdn.test/cover.png");
    assert_eq!(entries[0]["is_primary"], true);
    assert_eq!(entries[1]["is_primary"], false);
}

#[test]
fn test_order_survives_a_persistence_roundtrip() {
    let mut gallery = Gallery::new();
    for i in 0..4 {
        gallery = gallery.with_asset(format!("https://cdn.test/{i}.jpg").into());
    }
    let gallery = gallery.moved_asset(0, 3).expect("valid indices");

    let json = serde_json::to_string(&gallery).expect("serialize");
    let restored: Gallery = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(restored, gallery);
    let order: Vec<_> = restored
        .assets()
        .iter()
        .map(|a| a.locator.as_str().to_string())
        .collect();
    assert_eq!(
        order,
        vec![
            "https://cdn.test/1.jpg",
            "https://cdn.test/2.jpg",
            "https://cdn.test/3.jpg",
            "https://cdn.test/0.jpg",
        ]
    );
}

#[test]
fn test_malformed_import_still_resolves_a_cover() {
    // Data from a source that never wrote primary flags.
    let gallery: Gallery = serde_json::from_str(
        r#"[{"url": "https://cdn.test/old-1.jpg"}, {"url": "https://cdn.test/old-2.jpg"}]"#,
    )
    .expect("deserialize");

    let cover = gallery.display_asset().expect("first-asset fallback");
    assert_eq!(cover.locator.as_str(), "https://cdn.test/old-1.jpg");
}
