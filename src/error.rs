use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Failed to load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("No contour with an acceptable area was found")]
    NoHoleFound,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to write annotation {path:?}: {source}")]
    AnnotationWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, LocateError>;
