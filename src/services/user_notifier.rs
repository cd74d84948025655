use tracing::{error, info};

/// Severity of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    /// Neutral information.
    Info,
    /// A flow completed.
    Success,
    /// A flow failed.
    Error,
}

/// Short message shown to the user by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Severity.
    pub level: ToastLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Toast {
    /// Neutral toast.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    /// Success toast.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    /// Error toast.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

/// UI sink for toasts raised by coordinator flows and the dispatch policy.
pub trait UserNotifier: Send + Sync {
    /// Show `toast` to the user.
    fn notify(&self, toast: Toast);
}

/// Notifier that writes toasts to the log, used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl UserNotifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => error!(message = %toast.message, "toast"),
            ToastLevel::Info | ToastLevel::Success => {
                info!(level = ?toast.level, message = %toast.message, "toast")
            }
        }
    }
}
