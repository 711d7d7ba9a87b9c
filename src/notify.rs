use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;

use crate::render::escape_html;
use crate::surface::BannerHost;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Unknown names fall back to `Info`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "success" => Self::Success,
            "error" => Self::Error,
            "warning" => Self::Warning,
            _ => Self::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Success => "#4CAF50",
            Self::Error => "#f44336",
            Self::Warning => "#FF9800",
            Self::Info => "#2196F3",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "fa-check-circle",
            Self::Error => "fa-exclamation-circle",
            Self::Warning => "fa-exclamation-triangle",
            Self::Info => "fa-info-circle",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="notification notification-{kind}" data-id="{id}" style="position: fixed; top: 20px; right: 20px; background: {color}; color: white; padding: 1rem 1.5rem; border-radius: 10px; box-shadow: 0 5px 15px rgba(0,0,0,0.2); z-index: 10000; max-width: 400px;">
    <div style="display: flex; align-items: center; gap: 0.5rem;">
        <i class="fas {icon}"></i>
        <span>{message}</span>
        <button class="notification-close" style="background: none; border: none; color: white; margin-left: auto; cursor: pointer; font-size: 1.2rem;">&times;</button>
    </div>
</div>"#,
            kind = self.severity.as_str(),
            id = self.id,
            color = self.severity.color(),
            icon = self.severity.icon(),
            message = escape_html(&self.message),
        )
    }
}

struct ActiveBanner {
    id: u64,
    timer: AbortHandle,
}

#[derive(Default)]
struct NotifierState {
    next_id: u64,
    current: Option<ActiveBanner>,
}

/// At most one banner at a time; each one removes itself after the TTL.
///
/// `show` spawns the dismiss timer, so it must run inside a tokio runtime.
#[derive(Clone)]
pub struct Notifier {
    host: Arc<dyn BannerHost>,
    ttl: Duration,
    state: Arc<Mutex<NotifierState>>,
}

impl Notifier {
    pub fn new(host: Arc<dyn BannerHost>, ttl: Duration) -> Self {
        Self {
            host,
            ttl,
            state: Arc::new(Mutex::new(NotifierState::default())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn show(&self, message: impl Into<String>, severity: Severity) -> u64 {
        let mut state = self.state.lock();
        if let Some(previous) = state.current.take() {
            previous.timer.abort();
            self.host.unmount(previous.id);
        }

        state.next_id += 1;
        let notification = Notification {
            id: state.next_id,
            severity,
            message: message.into(),
        };
        self.host.mount(&notification);

        let id = notification.id;
        let host = self.host.clone();
        let shared = self.state.clone();
        let ttl = self.ttl;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut state = shared.lock();
            if state.current.as_ref().map(|c| c.id) == Some(id) {
                state.current = None;
                host.unmount(id);
            }
        })
        .abort_handle();

        state.current = Some(ActiveBanner { id, timer });
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.show(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.show(message, Severity::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.show(message, Severity::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.show(message, Severity::Info)
    }

    /// The banner's close control. Returns false if `id` is no longer shown.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.state.lock();
        match state.current.as_ref() {
            Some(active) if active.id == id => {
                if let Some(active) = state.current.take() {
                    active.timer.abort();
                }
                self.host.unmount(id);
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<u64> {
        self.state.lock().current.as_ref().map(|c| c.id)
    }
}
