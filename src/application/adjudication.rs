use super::{hall_ticket, number};
use crate::domain::exam::Exam;
use crate::domain::ports::{
    Attachment, Email, EmailTemplate, ExamStore, ExamStoreRef, Mailer, MailerRef, Notifier,
    NotifierRef, QrRendererRef, RegistrationStore, RegistrationStoreRef, StudentStore,
    StudentStoreRef,
};
use crate::domain::registration::{Decision, Registration, Status};
use crate::domain::student::Student;
use crate::error::{RegistrationError, Result};
use serde_json::json;
use tracing::{info, warn};

const PROFILE_LINK: &str = "/accounts/profile/";

/// Outcome of one adjudicated decision. The status change always committed;
/// `notification` reports whether the accompanying dispatch got through.
#[derive(Debug)]
pub struct Adjudication {
    pub registration: Registration,
    pub notification: Result<()>,
}

/// Administrative transition of registrations between Pending, Approved,
/// Rejected and Hold.
///
/// Dispatch is commit-then-best-effort: the mutation persists first, and a
/// flaky mail transport surfaces as a warning on the outcome rather than a
/// rolled-back decision.
pub struct AdjudicationWorkflow {
    registrations: RegistrationStoreRef,
    exams: ExamStoreRef,
    students: StudentStoreRef,
    mailer: MailerRef,
    notifier: NotifierRef,
    qr: QrRendererRef,
}

impl AdjudicationWorkflow {
    pub fn new(
        registrations: RegistrationStoreRef,
        exams: ExamStoreRef,
        students: StudentStoreRef,
        mailer: MailerRef,
        notifier: NotifierRef,
        qr: QrRendererRef,
    ) -> Self {
        Self {
            registrations,
            exams,
            students,
            mailer,
            notifier,
            qr,
        }
    }

    /// Applies a decision to one registration.
    ///
    /// Re-entrant with overwrite semantics; the registration number is
    /// generated only on first approval and persisted before the hall-ticket
    /// email is built, so the email can embed it.
    pub async fn set_status(
        &self,
        registration_id: u64,
        decision: Decision,
        reason: &str,
    ) -> Result<Adjudication> {
        let mut registration = self
            .registrations
            .get(registration_id)
            .await?
            .ok_or(RegistrationError::NotFound("registration"))?;
        let exam = self
            .exams
            .get(registration.exam)
            .await?
            .ok_or(RegistrationError::NotFound("exam"))?;
        let student = self
            .students
            .get(registration.student)
            .await?
            .ok_or(RegistrationError::NotFound("student"))?;

        registration.apply_decision(decision, reason);
        if decision == Decision::Approve && registration.registration_number.is_none() {
            let number =
                number::generate(self.registrations.as_ref(), &registration, &exam).await?;
            registration.registration_number = Some(number);
        }
        self.registrations.update(registration.clone()).await?;
        info!(
            registration = registration.id,
            status = %registration.status,
            "registration adjudicated"
        );

        let notification = self
            .dispatch(&registration, &student, &exam, decision, reason)
            .await;
        if let Err(err) = &notification {
            warn!(
                registration = registration.id,
                %err,
                "status committed but notification failed"
            );
        }
        Ok(Adjudication {
            registration,
            notification,
        })
    }

    /// Applies one decision to an exam's registrations, returning the number
    /// processed.
    ///
    /// Approve and Reject only touch currently-Pending rows; Hold applies
    /// across the board. Dispatch failures are swallowed per row.
    pub async fn bulk_set_status(
        &self,
        exam_id: u64,
        decision: Decision,
        reason: &str,
    ) -> Result<usize> {
        if self.exams.get(exam_id).await?.is_none() {
            return Err(RegistrationError::NotFound("exam"));
        }

        let mut count = 0;
        for registration in self.registrations.list_by_exam(exam_id).await? {
            let pending_only = matches!(decision, Decision::Approve | Decision::Reject);
            if pending_only && registration.status != Status::Pending {
                continue;
            }
            let outcome = self.set_status(registration.id, decision, reason).await?;
            let _ = outcome.notification;
            count += 1;
        }
        Ok(count)
    }

    async fn dispatch(
        &self,
        registration: &Registration,
        student: &Student,
        exam: &Exam,
        decision: Decision,
        reason: &str,
    ) -> Result<()> {
        let email = match decision {
            Decision::Approve => {
                let payload = hall_ticket::qr_payload(registration, student, exam);
                let bytes = self
                    .qr
                    .render(&payload)
                    .map_err(|e| RegistrationError::NotificationDispatchFailed(e.to_string()))?;
                Email {
                    template: EmailTemplate::HallTicket,
                    subject: format!("Hall Ticket: Registration Approved for {}", exam.name),
                    recipient: student.email.clone(),
                    context: json!({
                        "registration_number": registration.registration_number,
                        "student": student.full_name,
                        "exam": exam.name,
                        "exam_date": exam.exam_date,
                        "location": exam.location,
                    }),
                    attachment: Some(Attachment {
                        filename: "qr_code.svg".to_string(),
                        content_id: "qr_code".to_string(),
                        bytes,
                    }),
                }
            }
            Decision::Reject => Email {
                template: EmailTemplate::Rejection,
                subject: format!("Your Registration for {} - Status Update", exam.name),
                recipient: student.email.clone(),
                context: json!({
                    "student": student.full_name,
                    "exam": exam.name,
                    "reason": reason,
                }),
                attachment: None,
            },
            Decision::Hold => Email {
                template: EmailTemplate::Hold,
                subject: format!("Your Registration for {} - Status Update", exam.name),
                recipient: student.email.clone(),
                context: json!({
                    "student": student.full_name,
                    "exam": exam.name,
                    "reason": reason,
                }),
                attachment: None,
            },
        };

        self.mailer
            .send(email)
            .await
            .map_err(|e| RegistrationError::NotificationDispatchFailed(e.to_string()))?;

        let message = format!(
            "Update on your {} registration: Status is now {}.",
            exam.name, registration.status
        );
        self.notifier
            .notify(student.id, &message, PROFILE_LINK)
            .await
            .map_err(|e| RegistrationError::NotificationDispatchFailed(e.to_string()))?;
        Ok(())
    }
}
