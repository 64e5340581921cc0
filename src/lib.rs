pub mod config;
pub mod fingerprint;
pub mod scanner;
pub mod delta;
pub mod store;
pub mod error;
pub mod engine;
pub mod report;

pub use error::ChangeTrackError;
pub type Result<T> = std::result::Result<T, ChangeTrackError>;
