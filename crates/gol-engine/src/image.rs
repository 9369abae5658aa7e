//! Input/output collaborator for world images.
//!
//! Images are `height × width` bytes in row-major order, `0` for a dead
//! cell and `255` for an alive one. The engine names images
//! `"{height}x{width}"` on input and `"{width}x{height}x{turn}"` on output
//! (see [`RunConfig`](crate::RunConfig)); how a name maps to storage is up
//! to the store.

use thiserror::Error;

/// Failure reading or writing an image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// No image exists under the requested name.
    #[error("image {name} not found")]
    NotFound {
        /// Requested image name.
        name: String,
    },
    /// The stored image does not have the expected size.
    #[error("image {name} has {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Image name.
        name: String,
        /// `height * width`.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
    /// The stored image could not be parsed.
    #[error("image {name} is malformed: {reason}")]
    Malformed {
        /// Image name.
        name: String,
        /// Description of the problem.
        reason: String,
    },
    /// Underlying I/O failure.
    #[error("image I/O failed for {name}")]
    Io {
        /// Image name.
        name: String,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Loads the initial world and saves snapshots.
///
/// Shared between the coordinator and the control loop, so implementations
/// must tolerate concurrent calls. [`save`](Self::save) returning `Ok`
/// means the image is fully written.
pub trait ImageStore: Send + Sync {
    /// Read the image `name`, which must hold `height * width` bytes.
    fn load(&self, name: &str, height: usize, width: usize) -> Result<Vec<u8>, ImageError>;

    /// Write `bytes` as the image `name`, returning once the write is done.
    fn save(&self, name: &str, height: usize, width: usize, bytes: &[u8])
        -> Result<(), ImageError>;
}
