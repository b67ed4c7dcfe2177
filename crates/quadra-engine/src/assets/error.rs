use thiserror::Error;

/// Reasons an image file could not be turned into a texture.
///
/// Every variant renders as a message suitable for showing to the user.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image file {name} was not imported: unsupported type {mime}")]
    UnsupportedType { name: String, mime: String },

    #[error("image file {name} was not imported: file is too large ({size} bytes, limit {limit})")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("image file {name} could not be read: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("image file {name} could not be decoded: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}
