//! Gallery editing route handlers (HTMX partials).
//!
//! Every mutation answers with the re-rendered editor partial so the page
//! always reflects the session's latest state - including uploads that
//! finished while the user was doing something else.

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use tandem_core::{Product, ProductId};

use crate::{
    db::{ProductRepository, RepositoryError},
    error::AppError,
    media,
    middleware::auth::RequireCatalogWrite,
    services::{EditorSnapshot, GalleryEditor},
    state::AppState,
};

/// Bucket folder for product gallery uploads.
const UPLOAD_FOLDER: &str = "products";

/// Multipart field that carries the image.
const IMAGE_FIELD: &str = "image";

/// One asset tile in the editor grid.
#[derive(Debug, Clone)]
pub struct AssetView {
    pub index: usize,
    pub url: String,
    pub is_primary: bool,
}

/// Gallery editor state for the partial template.
#[derive(Debug, Clone)]
pub struct GalleryEditorView {
    pub product_id: i32,
    pub assets: Vec<AssetView>,
    pub dirty: bool,
    pub uploads_in_flight: usize,
}

impl GalleryEditorView {
    /// Build the view from a session snapshot.
    #[must_use]
    pub fn new(product_id: ProductId, snapshot: &EditorSnapshot) -> Self {
        Self {
            product_id: product_id.as_i32(),
            assets: snapshot
                .gallery
                .assets()
                .iter()
                .enumerate()
                .map(|(index, asset)| AssetView {
                    index,
                    url: asset.locator.as_str().to_string(),
                    is_primary: asset.is_primary,
                })
                .collect(),
            dirty: snapshot.dirty,
            uploads_in_flight: snapshot.uploads_in_flight,
        }
    }
}

/// Gallery editor partial template.
#[derive(Template)]
#[template(path = "partials/gallery_editor.html")]
pub struct GalleryEditorTemplate {
    pub gallery: GalleryEditorView,
}

/// Reorder form body.
#[derive(Debug, Deserialize)]
pub struct MoveForm {
    pub from: usize,
    pub to: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// Upload one image: transcode, store, append to the latest gallery state.
///
/// A failure anywhere in this pipeline affects only this asset; the rest of
/// the editing session continues untouched.
#[instrument(skip(state, multipart))]
pub async fn upload(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let id = ProductId::new(id);
    let editor = open_session(&state, id).await?;

    let (bytes, declared_mime) = read_image_field(&mut multipart).await?;

    editor.begin_upload().await?;

    // Transcoding is CPU work; keep it off the async workers.
    let transcoded = match tokio::task::spawn_blocking(move || {
        media::transcode(&bytes, &declared_mime)
    })
    .await
    {
        Ok(Ok(transcoded)) => transcoded,
        Ok(Err(e)) => {
            editor.abort_upload().await;
            return Err(e.into());
        }
        Err(e) => {
            editor.abort_upload().await;
            return Err(AppError::Internal(format!("transcode task failed: {e}")));
        }
    };

    let locator = match state
        .blob()
        .store(
            transcoded.bytes,
            transcoded.mime_type,
            transcoded.extension,
            UPLOAD_FOLDER,
        )
        .await
    {
        Ok(locator) => locator,
        Err(e) => {
            editor.abort_upload().await;
            return Err(e.into());
        }
    };

    // Read-modify-write against the session's CURRENT gallery; a None here
    // means the session closed mid-upload and the result is discarded.
    if editor.complete_upload(locator).await.is_none() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(render_partial(id, &editor).await.into_response())
}

/// Mark the asset at `index` as the cover image.
#[instrument(skip(state))]
pub async fn set_primary(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    Path((id, index)): Path<(i32, usize)>,
) -> Result<Html<String>, AppError> {
    let id = ProductId::new(id);
    let editor = open_session(&state, id).await?;

    editor.set_primary(index).await?;
    Ok(render_partial(id, &editor).await)
}

/// Remove the asset at `index`.
#[instrument(skip(state))]
pub async fn remove(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    Path((id, index)): Path<(i32, usize)>,
) -> Result<Html<String>, AppError> {
    let id = ProductId::new(id);
    let editor = open_session(&state, id).await?;

    editor.remove_asset(index).await?;
    Ok(render_partial(id, &editor).await)
}

/// Move an asset to a new position.
#[instrument(skip(state))]
pub async fn move_asset(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    axum::Form(form): axum::Form<MoveForm>,
) -> Result<Html<String>, AppError> {
    let id = ProductId::new(id);
    let editor = open_session(&state, id).await?;

    editor.move_asset(form.from, form.to).await?;
    Ok(render_partial(id, &editor).await)
}

/// Persist the working gallery.
///
/// On failure the session stays dirty; the user retries without redoing any
/// uploads.
#[instrument(skip(state))]
pub async fn save(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let id = ProductId::new(id);
    let editor = open_session(&state, id).await?;

    let pool = state.pool().clone();
    let _: Product = editor
        .save(move |gallery| async move {
            ProductRepository::new(&pool).save_gallery(id, &gallery).await
        })
        .await?;

    Ok(render_partial(id, &editor).await)
}

/// Throw away unsaved edits, resetting to the persisted gallery.
#[instrument(skip(state))]
pub async fn discard(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let id = ProductId::new(id);
    let editor = open_session(&state, id).await?;

    let persisted = load(&state, id).await?.gallery;
    editor.reset(persisted).await?;

    Ok(render_partial(id, &editor).await)
}

// =============================================================================
// Helpers
// =============================================================================

/// Resume the product's open session, or open one over the persisted gallery.
async fn open_session(
    state: &AppState,
    id: ProductId,
) -> Result<std::sync::Arc<GalleryEditor>, AppError> {
    if let Some(editor) = state.editors().get(id).await {
        return Ok(editor);
    }

    let product = load(state, id).await?;
    Ok(state.editors().open(id, product.gallery).await)
}

async fn load(state: &AppState, id: ProductId) -> Result<Product, AppError> {
    match ProductRepository::new(state.pool()).load(id).await {
        Ok(product) => Ok(product),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("product {id}"))),
        Err(e) => Err(e.into()),
    }
}

/// Pull the image field out of the multipart body.
async fn read_image_field(multipart: &mut Multipart) -> Result<(Vec<u8>, String), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let declared_mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("could not read upload: {e}")))?;

        return Ok((bytes.to_vec(), declared_mime));
    }

    Err(AppError::BadRequest(format!(
        "missing multipart field '{IMAGE_FIELD}'"
    )))
}

async fn render_partial(id: ProductId, editor: &GalleryEditor) -> Html<String> {
    let snapshot = editor.snapshot().await;
    let template = GalleryEditorTemplate {
        gallery: GalleryEditorView::new(id, &snapshot),
    };

    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}
