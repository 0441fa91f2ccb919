pub mod error;
pub mod format;
pub mod models;

pub use error::{Error, FailureKind, FetchFailure};
pub type Result<T> = std::result::Result<T, Error>;
