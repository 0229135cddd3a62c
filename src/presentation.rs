use std::path::PathBuf;

use crate::config::Config;
use crate::errors::AppResult;
use crate::uploader::{ErrorKind, UploadOutcome};

/// Somewhere a link can be copied to.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> AppResult<()>;
}

/// Something that can show a notification to the user.
pub trait Notifier {
    fn notify(&mut self, notification: &Notification) -> AppResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAction {
    CopyLink(String),
    OpenLink(String),
    OpenSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<PathBuf>,
    pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationFlags {
    pub copy_to_clipboard: bool,
    pub show_notification: bool,
}

impl From<&Config> for PresentationFlags {
    fn from(config: &Config) -> Self {
        Self {
            copy_to_clipboard: config.copy_to_clipboard,
            show_notification: config.show_notification,
        }
    }
}

/// What the presenter ended up doing with an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationReport {
    pub message: String,
    pub copied: bool,
    pub notified: bool,
}

/// User facing text for a failed upload.
pub fn failure_message(kind: ErrorKind, http_status: Option<u16>) -> String {
    match kind {
        ErrorKind::BaseUrlUndefined => {
            "Base URL not configured. Run `codimd-share config set-base-url <URL>`.".to_string()
        }
        ErrorKind::FileNotFound => "The shared image could not be read.".to_string(),
        ErrorKind::TransportError => "Could not reach the CodiMD server.".to_string(),
        ErrorKind::BadStatusCode => match http_status {
            Some(status) => format!("Upload failed: server returned status {}.", status),
            None => "Upload failed: server returned an error status.".to_string(),
        },
        ErrorKind::MalformedResponse => {
            "Upload failed: the server sent an unexpected response.".to_string()
        }
    }
}

pub struct Presenter<C, N> {
    clipboard: C,
    notifier: N,
    flags: PresentationFlags,
}

impl<C: Clipboard, N: Notifier> Presenter<C, N> {
    pub fn new(clipboard: C, notifier: N, flags: PresentationFlags) -> Self {
        Self {
            clipboard,
            notifier,
            flags,
        }
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Clipboard and notification failures are logged, never fatal.
    pub fn present(&mut self, outcome: &UploadOutcome) -> PresentationReport {
        match outcome {
            UploadOutcome::Success { link, spooled_file } => {
                let copied = self.flags.copy_to_clipboard && self.copy(link);

                let notification = Notification {
                    title: "Image uploaded".to_string(),
                    body: link.clone(),
                    icon: Some(spooled_file.path().to_path_buf()),
                    actions: vec![
                        NotificationAction::CopyLink(link.clone()),
                        NotificationAction::OpenLink(link.clone()),
                    ],
                };
                let notified = self.flags.show_notification && self.show(&notification);

                let message = if copied {
                    "Link copied to clipboard".to_string()
                } else {
                    link.clone()
                };

                PresentationReport {
                    message,
                    copied,
                    notified,
                }
            }
            UploadOutcome::Failure {
                kind,
                spooled_file,
                http_status,
                ..
            } => {
                let message = failure_message(*kind, *http_status);

                let mut actions = Vec::new();
                if *kind == ErrorKind::BaseUrlUndefined {
                    actions.push(NotificationAction::OpenSettings);
                }
                let notification = Notification {
                    title: "Image upload failed".to_string(),
                    body: message.clone(),
                    icon: spooled_file.as_ref().map(|s| s.path().to_path_buf()),
                    actions,
                };
                let notified = self.flags.show_notification && self.show(&notification);

                PresentationReport {
                    message,
                    copied: false,
                    notified,
                }
            }
        }
    }

    /// Handle an action picked from a notification.
    pub fn copy_link_action(&mut self, action: &NotificationAction) -> bool {
        match action {
            NotificationAction::CopyLink(link) => self.copy(link),
            _ => false,
        }
    }

    fn copy(&mut self, link: &str) -> bool {
        match self.clipboard.set_text(link) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to copy link to clipboard (non-critical): {}", e);
                false
            }
        }
    }

    fn show(&mut self, notification: &Notification) -> bool {
        match self.notifier.notify(notification) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to show notification (non-critical): {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[derive(Default)]
    struct RecordingClipboard {
        contents: Vec<String>,
        fail: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn set_text(&mut self, text: &str) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Clipboard("no display".to_string()));
            }
            self.contents.push(text.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        shown: Vec<Notification>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, notification: &Notification) -> AppResult<()> {
            self.shown.push(notification.clone());
            Ok(())
        }
    }

    fn presenter(
        copy_to_clipboard: bool,
        show_notification: bool,
    ) -> Presenter<RecordingClipboard, RecordingNotifier> {
        Presenter::new(
            RecordingClipboard::default(),
            RecordingNotifier::default(),
            PresentationFlags {
                copy_to_clipboard,
                show_notification,
            },
        )
    }

    #[test]
    fn test_failure_copies_nothing() {
        let mut presenter = presenter(true, true);
        let outcome = UploadOutcome::failure(ErrorKind::BaseUrlUndefined);

        let report = presenter.present(&outcome);
        assert!(!report.copied);
        assert!(report.notified);
        assert!(report.message.contains("Base URL not configured"));
        assert!(presenter.clipboard().contents.is_empty());
        assert_eq!(
            presenter.notifier().shown[0].actions,
            vec![NotificationAction::OpenSettings]
        );
    }

    #[test]
    fn test_failure_without_notification_flag() {
        let mut presenter = presenter(true, false);
        let outcome = UploadOutcome::failure(ErrorKind::BadStatusCode).with_status(500);

        let report = presenter.present(&outcome);
        assert_eq!(report.message, "Upload failed: server returned status 500.");
        assert!(!report.notified);
        assert!(presenter.notifier().shown.is_empty());
    }

    #[test]
    fn test_every_kind_has_a_message() {
        for kind in [
            ErrorKind::BaseUrlUndefined,
            ErrorKind::FileNotFound,
            ErrorKind::TransportError,
            ErrorKind::BadStatusCode,
            ErrorKind::MalformedResponse,
        ] {
            assert!(!failure_message(kind, None).is_empty());
        }
    }

    #[test]
    fn test_copy_link_action() {
        let mut presenter = presenter(false, false);
        assert!(presenter.copy_link_action(&NotificationAction::CopyLink("https://x/y.png".into())));
        assert!(!presenter.copy_link_action(&NotificationAction::OpenSettings));
        assert_eq!(presenter.clipboard().contents, vec!["https://x/y.png"]);
    }

    #[test]
    fn test_clipboard_failure_is_not_fatal() {
        let mut presenter = Presenter::new(
            RecordingClipboard {
                fail: true,
                ..Default::default()
            },
            RecordingNotifier::default(),
            PresentationFlags {
                copy_to_clipboard: true,
                show_notification: false,
            },
        );
        assert!(!presenter.copy_link_action(&NotificationAction::CopyLink("l".into())));
    }
}
