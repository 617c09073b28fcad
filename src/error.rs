use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Sample table format error at line {line}: {message}")]
    SampleFormat { line: usize, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sample index {index} does not follow previous index {previous}")]
    OutOfOrder { index: usize, previous: usize },

    #[error("Invalid landmarks: {0}")]
    InvalidLandmarks(String),
}

pub type Result<T> = std::result::Result<T, Error>;
