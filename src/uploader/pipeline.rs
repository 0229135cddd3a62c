use std::path::PathBuf;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::security::InputValidator;

use super::codimd_client::{ClientError, CodimdClient};
use super::outcome::{ErrorKind, UploadOutcome};
use super::spool::{spool_source, ImageSource};

/// One share event: where the bytes come from and where they go.
pub struct UploadRequest {
    source: Box<dyn ImageSource>,
    mime_type: String,
    base_url: Option<String>,
}

impl UploadRequest {
    pub fn new(
        source: impl ImageSource + 'static,
        mime_type: impl Into<String>,
        base_url: Option<String>,
    ) -> Self {
        Self {
            source: Box::new(source),
            mime_type: mime_type.into(),
            base_url,
        }
    }
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("source", &self.source.describe())
            .field("mime_type", &self.mime_type)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Stateless upload pipeline; clones share the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct UploadPipeline {
    client: CodimdClient,
    spool_dir: PathBuf,
}

impl UploadPipeline {
    pub fn new(spool_dir: impl Into<PathBuf>) -> Self {
        Self::with_client(CodimdClient::new(), spool_dir)
    }

    pub fn with_client(client: CodimdClient, spool_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            spool_dir: spool_dir.into(),
        }
    }

    pub async fn execute(&self, request: UploadRequest) -> UploadOutcome {
        let outcome = self.run(&request).await;

        match &outcome {
            UploadOutcome::Success { link, .. } => {
                log::info!("Uploaded {} to {}", request.source.describe(), link)
            }
            UploadOutcome::Failure {
                kind,
                underlying_error,
                http_status,
                ..
            } => log::error!(
                "Upload of {} failed: {} (status: {:?}, detail: {})",
                request.source.describe(),
                kind,
                http_status,
                underlying_error.as_deref().unwrap_or("none")
            ),
        }

        outcome
    }

    async fn run(&self, request: &UploadRequest) -> UploadOutcome {
        let base_url = match request.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/'),
            _ => {
                log::error!("Base URL not set");
                return UploadOutcome::failure(ErrorKind::BaseUrlUndefined);
            }
        };

        if let Err(e) = InputValidator::validate_base_url(base_url) {
            return UploadOutcome::failure(ErrorKind::BaseUrlUndefined).with_error(e);
        }
        log::debug!("Base URL: {}", base_url);

        let spooled =
            match spool_source(request.source.as_ref(), &request.mime_type, &self.spool_dir).await
            {
                Ok(spooled) => spooled,
                Err(e) => {
                    return UploadOutcome::failure(ErrorKind::FileNotFound).with_error(e);
                }
            };

        match self
            .client
            .upload_image(base_url, &spooled, &request.mime_type)
            .await
        {
            Ok(response) => UploadOutcome::Success {
                link: response.link,
                spooled_file: spooled,
            },
            Err(ClientError::BadStatus { status }) => {
                UploadOutcome::failure(ErrorKind::BadStatusCode)
                    .with_status(status)
                    .with_spool(spooled)
            }
            Err(ClientError::Malformed { status, reason }) => {
                UploadOutcome::failure(ErrorKind::MalformedResponse)
                    .with_status(status)
                    .with_error(reason)
                    .with_spool(spooled)
            }
            Err(e @ (ClientError::Transport(_) | ClientError::Spool(_))) => {
                UploadOutcome::failure(ErrorKind::TransportError)
                    .with_error(e)
                    .with_spool(spooled)
            }
        }
    }

    /// Run the request on its own task; the receiver yields exactly one outcome.
    pub fn spawn(&self, request: UploadRequest) -> oneshot::Receiver<UploadOutcome> {
        let (tx, rx) = oneshot::channel();
        self.spawn_with(request, move |outcome| {
            if tx.send(outcome).is_err() {
                log::warn!("Upload finished but nobody is waiting for the outcome");
            }
        });
        rx
    }

    /// Run the request on its own task and hand the outcome to `sink`.
    pub fn spawn_with<F>(&self, request: UploadRequest, sink: F) -> JoinHandle<()>
    where
        F: FnOnce(UploadOutcome) + Send + 'static,
    {
        let pipeline = self.clone();
        tokio::spawn(async move {
            let outcome = pipeline.execute(request).await;
            sink(outcome);
        })
    }
}
