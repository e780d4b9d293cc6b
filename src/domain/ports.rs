use super::exam::Exam;
use super::registration::Registration;
use super::student::Student;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub type RegistrationStoreRef = Arc<dyn RegistrationStore>;
pub type ExamStoreRef = Arc<dyn ExamStore>;
pub type StudentStoreRef = Arc<dyn StudentStore>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
pub type MailerRef = Arc<dyn Mailer>;
pub type NotifierRef = Arc<dyn Notifier>;
pub type QrRendererRef = Arc<dyn QrRenderer>;

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn get(&self, id: u64) -> Result<Option<Registration>>;
    async fn find_by_pair(&self, student: u64, exam: u64) -> Result<Option<Registration>>;
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Registration>>;
    /// Create-or-update under the (student, exam) unique key. Implementations
    /// must serialize concurrent calls for the same pair and reject the
    /// upsert with `AlreadyPaid` when the existing row is paid.
    async fn upsert_document(&self, student: u64, exam: u64, document: &str)
    -> Result<Registration>;
    async fn update(&self, registration: Registration) -> Result<()>;
    async fn delete(&self, id: u64) -> Result<()>;
    async fn list_by_exam(&self, exam: u64) -> Result<Vec<Registration>>;
    async fn all(&self) -> Result<Vec<Registration>>;
    async fn number_exists(&self, number: &str) -> Result<bool>;
}

#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn store(&self, exam: Exam) -> Result<()>;
    async fn get(&self, id: u64) -> Result<Option<Exam>>;
}

#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn store(&self, student: Student) -> Result<()>;
    async fn get(&self, id: u64) -> Result<Option<Student>>;
}

/// An order handle returned by the payment processor.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Order {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    /// Traceability token (`reg_<id>`); never used for lookup.
    pub receipt: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key identifier handed to the client-side checkout.
    fn key_id(&self) -> &str;
    async fn create_order(&self, amount: u64, currency: &str, receipt: &str) -> Result<Order>;
    /// `Ok(false)` means the signature did not match; `Err` means the
    /// gateway could not be consulted at all.
    async fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool>;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EmailTemplate {
    HallTicket,
    Rejection,
    Hold,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Attachment {
    pub filename: String,
    /// Content-ID for inline references from the HTML body.
    pub content_id: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Email {
    pub template: EmailTemplate,
    pub subject: String,
    pub recipient: String,
    pub context: Value,
    pub attachment: Option<Attachment>,
}

/// Outbound email boundary. Delivery mechanics (SMTP, templating) live
/// outside the core.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<()>;
}

/// In-app notification boundary: fire-and-forget, append-only per user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: u64, message: &str, link: &str) -> Result<()>;
}

/// Opaque byte-producing QR image service.
pub trait QrRenderer: Send + Sync {
    fn render(&self, payload: &str) -> Result<Vec<u8>>;
}
