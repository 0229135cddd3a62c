pub mod config;
pub mod desktop;
pub mod errors;
pub mod mime;
pub mod presentation;
pub mod security;
pub mod uploader;

pub use errors::{AppError, AppResult};
pub use uploader::{ErrorKind, UploadOutcome, UploadPipeline, UploadRequest};
