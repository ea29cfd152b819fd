//! Service layer for the admin panel.

pub mod gallery_editor;

pub use gallery_editor::{EditorError, EditorSessions, EditorSnapshot, GalleryEditor};
