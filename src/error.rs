//! Error type shared by scene loading, texture loading and pixel conversion

use thiserror::Error;

use crate::device::PixelFormat;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// The requested raw pixel layout cannot be produced from this buffer
    #[error("Cannot convert {source_buffer} buffer into {format:?} pixels")]
    UnsupportedPixelConversion {
        source_buffer: &'static str,
        format: PixelFormat,
    },
    #[error("Scene output size {width}x{height} has no pixels")]
    EmptyOutput { width: usize, height: usize },
    /// The destination slice is too small for the requested layout
    #[error("Destination holds {actual} bytes but the layout needs {required}")]
    DestinationTooSmall { required: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
