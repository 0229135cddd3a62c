// Upload pipeline for CodiMD-compatible servers
//
// Spools the shared image to a local file, posts it as multipart form data
// and maps every exit path onto exactly one UploadOutcome.

pub mod codimd_client;
pub mod outcome;
pub mod pipeline;
pub mod spool;

pub use codimd_client::CodimdClient;
pub use outcome::{ErrorKind, UploadOutcome};
pub use pipeline::{UploadPipeline, UploadRequest};
pub use spool::{BytesSource, FileSource, ImageSource, SpooledFile, StdinSource};
