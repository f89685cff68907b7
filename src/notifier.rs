use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;

pub const PERMISSION_GRANTED_TAG: &str = "permission-granted";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Notifications sharing a tag replace each other instead of stacking.
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationHandle {
    pub id: Uuid,
    pub tag: String,
}

/// Local notification facility.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn permission_granted(&self) -> bool;
    /// Returns the previous permission state.
    fn set_permission_granted(&self, granted: bool) -> bool;
    async fn show(&self, notification: &Notification) -> Result<NotificationHandle, AppError>;
}

/// Grants permission and confirms it with a notification the first time.
pub async fn request_permission(notifier: &dyn Notifier) -> bool {
    if notifier.set_permission_granted(true) {
        info!("Notification permission already granted");
        return true;
    }

    info!("Notification permission granted");
    let confirmation = Notification {
        title: "Notifications Enabled!".to_string(),
        body: "You'll now receive reminders for your classes".to_string(),
        tag: PERMISSION_GRANTED_TAG.to_string(),
    };
    if let Err(e) = notifier.show(&confirmation).await {
        warn!("Failed to show permission confirmation: {}", e);
    }
    true
}

/// Writes notifications to stdout.
pub struct ConsoleNotifier {
    granted: AtomicBool,
    visible: Mutex<HashMap<String, NotificationHandle>>,
}

impl ConsoleNotifier {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            visible: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn permission_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn set_permission_granted(&self, granted: bool) -> bool {
        self.granted.swap(granted, Ordering::SeqCst)
    }

    async fn show(&self, notification: &Notification) -> Result<NotificationHandle, AppError> {
        let handle = NotificationHandle {
            id: Uuid::new_v4(),
            tag: notification.tag.clone(),
        };

        let replaced = self
            .visible
            .lock()
            .map_err(|_| AppError::Notify("notification registry poisoned".to_string()))?
            .insert(notification.tag.clone(), handle.clone());
        if let Some(old) = replaced {
            info!("Replacing notification {} (tag {})", old.id, old.tag);
        }

        println!("[{}] {}", notification.title, notification.body);
        info!(tag = %notification.tag, "Notification shown: {}", notification.body);
        Ok(handle)
    }
}

/// Keeps every notification it is asked to show.
#[derive(Default)]
pub struct RecordingNotifier {
    granted: AtomicBool,
    failing: AtomicBool,
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn shown_count(&self) -> usize {
        self.shown.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn permission_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn set_permission_granted(&self, granted: bool) -> bool {
        self.granted.swap(granted, Ordering::SeqCst)
    }

    async fn show(&self, notification: &Notification) -> Result<NotificationHandle, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Notify("notifications unavailable".to_string()));
        }
        self.shown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        Ok(NotificationHandle {
            id: Uuid::new_v4(),
            tag: notification.tag.clone(),
        })
    }
}
