//! Error types for annotator operations.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while loading, annotating or exporting an image.
#[derive(Error, Debug)]
pub enum AnnotatorError {
    /// The uploaded bytes could not be decoded as an image
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The decoded image has zero width or height
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage {
        /// Decoded width
        width: u32,
        /// Decoded height
        height: u32,
    },

    /// An operation needed a loaded image but none is present
    #[error("No image loaded")]
    NoImage,

    /// Export was requested with no box covering the image
    #[error("Nothing to export: draw at least one box on the image first")]
    NothingToExport,

    /// A crop could not be encoded
    #[error("Failed to encode crop #{index}: {source}")]
    Encode {
        /// 1-based box index
        index: usize,
        /// Underlying encoder error
        #[source]
        source: image::ImageError,
    },

    /// An encoder thread could not be started
    #[error("Failed to start encoder thread: {0}")]
    Worker(#[source] std::io::Error),

    /// A rendered frame could not be saved
    #[error("Failed to write preview: {0}")]
    Preview(#[source] image::ImageError),

    /// The archive could not be written
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or saved
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A control script could not be parsed or replayed
    #[error("Invalid control script: {0}")]
    Script(String),

    /// A command-line value could not be parsed
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// The host environment refused an operation (browser only)
    #[error("Host error: {0}")]
    Host(String),
}

impl AnnotatorError {
    /// Create an encode error for the 1-based box `index`.
    pub fn encode(index: usize, source: image::ImageError) -> Self {
        Self::Encode { index, source }
    }

    /// Create a script error with a message.
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script(message.into())
    }

    /// Create an argument error with a message.
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// Create a host error with a message.
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host(message.into())
    }
}

/// Result alias for annotator operations.
pub type Result<T> = std::result::Result<T, AnnotatorError>;
