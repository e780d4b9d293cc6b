use chrono::{DateTime, Utc};
use std::fmt;

/// Administrative status of a registration. Only the adjudication workflow
/// moves this; student actions affect `PaymentStatus` alone.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Status {
    #[default]
    Pending,
    Approved,
    Rejected,
    Hold,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Hold => "Hold",
        };
        f.write_str(label)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::Success => "Success",
            Self::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// An administrator's decision on a registration. `Pending` is the initial
/// state only and is never assigned through adjudication.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Decision {
    Approve,
    Reject,
    Hold,
}

impl Decision {
    pub fn status(self) -> Status {
        match self {
            Self::Approve => Status::Approved,
            Self::Reject => Status::Rejected,
            Self::Hold => Status::Hold,
        }
    }
}

/// One student's claim on one exam slot, tracked from submission through
/// payment capture to administrative adjudication.
///
/// At most one row exists per (student, exam) pair; re-submitting before a
/// successful payment mutates the existing row.
#[derive(Debug, PartialEq, Clone)]
pub struct Registration {
    pub id: u64,
    pub student: u64,
    pub exam: u64,
    /// Opaque reference to the uploaded supporting document.
    pub document: String,
    pub registered_at: DateTime<Utc>,
    pub status: Status,
    /// Assigned at most once, on first approval, then never cleared.
    pub registration_number: Option<String>,
    pub rejection_reason: Option<String>,
    pub hold_reason: Option<String>,
    pub payment_status: PaymentStatus,
    /// Gateway order id; the only key used to reconcile callbacks.
    pub payment_order_id: Option<String>,
    pub payment_transaction_id: Option<String>,
    pub payment_signature: Option<String>,
}

impl Registration {
    pub fn new(id: u64, student: u64, exam: u64, document: &str, registered_at: DateTime<Utc>) -> Self {
        Self {
            id,
            student,
            exam,
            document: document.to_string(),
            registered_at,
            status: Status::default(),
            registration_number: None,
            rejection_reason: None,
            hold_reason: None,
            payment_status: PaymentStatus::default(),
            payment_order_id: None,
            payment_transaction_id: None,
            payment_signature: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Success
    }

    /// Records a verified payment capture. Returns `false` when the
    /// registration was already paid, leaving it untouched (duplicate
    /// callbacks are a no-op).
    pub fn confirm_payment(&mut self, payment_id: &str, signature: &str) -> bool {
        if self.is_paid() {
            return false;
        }
        self.payment_status = PaymentStatus::Success;
        self.payment_transaction_id = Some(payment_id.to_string());
        self.payment_signature = Some(signature.to_string());
        true
    }

    /// Applies an administrative decision with overwrite semantics: reason
    /// fields are replaced, re-applying the same decision is allowed.
    pub fn apply_decision(&mut self, decision: Decision, reason: &str) {
        self.status = decision.status();
        match decision {
            Decision::Approve => {}
            Decision::Reject => self.rejection_reason = Some(reason.to_string()),
            Decision::Hold => self.hold_reason = Some(reason.to_string()),
        }
    }
}
