//! Gallery media pipeline: transcode, then upload.
//!
//! [`transcode`] is the pure half (bytes in, normalized bytes out) and
//! [`blob`] is the I/O half (normalized bytes up to the object store). The
//! upload route wires them together; nothing in here touches the gallery
//! itself.

pub mod blob;
pub mod transcode;

pub use blob::{BlobStoreClient, StoreError};
pub use transcode::{TranscodeError, TranscodedImage, transcode};
