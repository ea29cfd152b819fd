//! Catalog seeding command.
//!
//! Inserts a handful of sample products through the same repository the
//! admin panel uses, so seeded data is shaped exactly like hand-entered
//! data (including the gallery invariant).

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;

use tandem_core::{Category, Gallery};

use tandem_admin::db::{ProductDraft, ProductRepository};

use super::{CommandError, database_url};

/// Seed the catalog with sample products.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to catalog database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;
    let repo = ProductRepository::new(&pool);

    for (draft, image_urls) in sample_products() {
        let product = repo.insert(&draft).await?;
        let id = product.id.expect("insert assigns an id");

        // Build the gallery through the model so the first image becomes
        // primary, exactly as uploads would.
        let mut gallery = Gallery::new();
        for url in image_urls {
            gallery = gallery.with_asset(url.into());
        }
        if !gallery.is_empty() {
            repo.save_gallery(id, &gallery).await?;
        }

        tracing::info!(product_id = %id, title = %draft.title, "seeded product");
    }

    tracing::info!("Catalog seeding complete!");
    Ok(())
}

fn sample_products() -> Vec<(ProductDraft, Vec<&'static str>)> {
    vec![
        (
            ProductDraft {
                title: "Casual Harmony".to_string(),
                category: Category::Casual,
                description: Some("Relaxed weekend set in warm sand tones.".to_string()),
                materials: Some("100% combed cotton, 180 gsm".to_string()),
                sizing: Some("True to size. Him S-XXL, her XS-XL.".to_string()),
                care_instructions: Some("Machine wash cold, hang dry.".to_string()),
                for_him: Some("Relaxed Fit Shirt".to_string()),
                for_her: Some("Comfort Blouse".to_string()),
                price: Some(Decimal::new(385_000, 0)),
                purchase_link: None,
            },
            vec![
                "https://picsum.photos/seed/tandem-casual-1/1200",
                "https://picsum.photos/seed/tandem-casual-2/1200",
            ],
        ),
        (
            ProductDraft {
                title: "Classic Duet".to_string(),
                category: Category::Classic,
                description: Some("Tailored pairing for dinners and photographs.".to_string()),
                materials: Some("Linen-cotton blend".to_string()),
                sizing: None,
                care_instructions: Some("Dry clean recommended.".to_string()),
                for_him: Some("Band Collar Shirt".to_string()),
                for_her: Some("Midi Wrap Dress".to_string()),
                price: Some(Decimal::new(520_000, 0)),
                purchase_link: None,
            },
            vec!["https://picsum.photos/seed/tandem-classic-1/1200"],
        ),
        (
            ProductDraft {
                title: "Limited: Archipelago".to_string(),
                category: Category::Limited,
                description: Some("Numbered batik run of fifty sets.".to_string()),
                materials: Some("Hand-stamped batik cap".to_string()),
                sizing: None,
                care_instructions: Some("Hand wash separately in cold water.".to_string()),
                for_him: None,
                for_her: None,
                price: None,
                purchase_link: None,
            },
            vec![],
        ),
    ]
}
