use serde::Serialize;
use std::fmt;

use super::spool::SpooledFile;

/// Why an upload did not produce a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BaseUrlUndefined,
    FileNotFound,
    TransportError,
    BadStatusCode,
    MalformedResponse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BaseUrlUndefined => "base_url_undefined",
            ErrorKind::FileNotFound => "file_not_found",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::BadStatusCode => "bad_status_code",
            ErrorKind::MalformedResponse => "malformed_response",
        }
    }

    /// Whether a spooled copy of the image can exist for this failure.
    pub fn happens_after_spooling(&self) -> bool {
        matches!(
            self,
            ErrorKind::TransportError | ErrorKind::BadStatusCode | ErrorKind::MalformedResponse
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single terminal result of one upload request.
///
/// Dropping an outcome removes the spooled file it carries.
#[derive(Debug)]
pub enum UploadOutcome {
    Success {
        link: String,
        spooled_file: SpooledFile,
    },
    Failure {
        kind: ErrorKind,
        spooled_file: Option<SpooledFile>,
        underlying_error: Option<String>,
        http_status: Option<u16>,
    },
}

impl UploadOutcome {
    pub(crate) fn failure(kind: ErrorKind) -> Self {
        UploadOutcome::Failure {
            kind,
            spooled_file: None,
            underlying_error: None,
            http_status: None,
        }
    }

    pub(crate) fn with_error(mut self, error: impl fmt::Display) -> Self {
        if let UploadOutcome::Failure {
            underlying_error, ..
        } = &mut self
        {
            *underlying_error = Some(error.to_string());
        }
        self
    }

    pub(crate) fn with_status(mut self, status: u16) -> Self {
        if let UploadOutcome::Failure { http_status, .. } = &mut self {
            *http_status = Some(status);
        }
        self
    }

    /// Attach the spool to a failure that happened after spooling. For
    /// earlier kinds the file is dropped, and so removed, instead.
    pub(crate) fn with_spool(mut self, spooled: SpooledFile) -> Self {
        if let UploadOutcome::Failure {
            kind, spooled_file, ..
        } = &mut self
        {
            if kind.happens_after_spooling() {
                *spooled_file = Some(spooled);
            } else {
                log::warn!("Discarding spool file for {} failure", kind);
            }
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            UploadOutcome::Success { link, .. } => Some(link),
            UploadOutcome::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            UploadOutcome::Success { .. } => None,
            UploadOutcome::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            UploadOutcome::Success { .. } => None,
            UploadOutcome::Failure { http_status, .. } => *http_status,
        }
    }

    pub fn underlying_error(&self) -> Option<&str> {
        match self {
            UploadOutcome::Success { .. } => None,
            UploadOutcome::Failure {
                underlying_error, ..
            } => underlying_error.as_deref(),
        }
    }

    pub fn spooled_file(&self) -> Option<&SpooledFile> {
        match self {
            UploadOutcome::Success { spooled_file, .. } => Some(spooled_file),
            UploadOutcome::Failure { spooled_file, .. } => spooled_file.as_ref(),
        }
    }
}
