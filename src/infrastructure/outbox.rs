use crate::domain::ports::{Email, Mailer, Notifier};
use crate::error::{RegistrationError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Mailer that records sent emails instead of delivering them.
///
/// The transport can be flipped to broken to exercise the
/// commit-then-best-effort-notify policy.
#[derive(Default, Clone)]
pub struct InMemoryMailer {
    sent: Arc<RwLock<Vec<Email>>>,
    broken: Arc<AtomicBool>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::Relaxed);
    }

    pub async fn sent(&self) -> Vec<Email> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: Email) -> Result<()> {
        if self.broken.load(Ordering::Relaxed) {
            return Err(RegistrationError::NotificationDispatchFailed(
                "mail transport unavailable".to_string(),
            ));
        }
        let mut sent = self.sent.write().await;
        sent.push(email);
        Ok(())
    }
}

/// One entry in a student's append-only notification feed.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Notification {
    pub user: u64,
    pub message: String,
    pub link: String,
}

/// Notifier that appends to an in-memory feed.
#[derive(Default, Clone)]
pub struct InMemoryNotifier {
    entries: Arc<RwLock<Vec<Notification>>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, user: u64, message: &str, link: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.push(Notification {
            user,
            message: message.to_string(),
            link: link.to_string(),
        });
        Ok(())
    }
}
