use crate::errors::{AppError, AppResult};
use crate::presentation::{Clipboard, Notification, NotificationAction, Notifier};

/// System clipboard via `arboard`, opened lazily on first use.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> AppResult<()> {
        if self.inner.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
            self.inner = Some(clipboard);
        }

        match self.inner.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_string())
                .map_err(|e| AppError::Clipboard(e.to_string())),
            None => Err(AppError::Clipboard("clipboard unavailable".to_string())),
        }
    }
}

/// Prints notifications to stderr so the link stays alone on stdout.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notification: &Notification) -> AppResult<()> {
        eprintln!("{}: {}", notification.title, notification.body);

        for action in &notification.actions {
            if let NotificationAction::OpenSettings = action {
                eprintln!("  settings: codimd-share config show");
            }
        }

        log::debug!("Notification shown: {:?}", notification);
        Ok(())
    }
}
