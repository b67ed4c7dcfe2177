//! Image assets.
//!
//! Responsibilities:
//! - validate user-selected image files (MIME allow-list, size cap)
//! - decode them into shareable RGBA8 handles that nodes can carry as textures

mod acquire;
mod error;
mod handle;

pub use acquire::{
    acquire, check_file, mime_for_path, name_without_extension, AcquiredImage, ACCEPTED_MIME_TYPES,
    MAX_FILE_SIZE,
};
pub use error::ImageError;
pub use handle::ImageHandle;
