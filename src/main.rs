use clap::Parser;
use examreg::application::adjudication::AdjudicationWorkflow;
use examreg::application::payment::{CallbackOutcome, CallbackParams, PaymentWorkflow};
use examreg::domain::ports::{
    ExamStore, ExamStoreRef, MailerRef, NotifierRef, QrRendererRef, RegistrationStore,
    RegistrationStoreRef, StudentStore, StudentStoreRef,
};
use examreg::domain::registration::Decision;
use examreg::error::RegistrationError;
use examreg::infrastructure::gateway::HmacGateway;
use examreg::infrastructure::in_memory::{
    InMemoryExamStore, InMemoryRegistrationStore, InMemoryStudentStore,
};
use examreg::infrastructure::outbox::{InMemoryMailer, InMemoryNotifier};
use examreg::infrastructure::qr::SvgQrRenderer;
use examreg::interfaces::csv::action_reader::{Action, ActionKind, ActionReader};
use examreg::interfaces::csv::registration_writer::RegistrationWriter;
use examreg::interfaces::csv::seed_reader::{ExamReader, StudentReader};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input actions CSV file
    actions: PathBuf,

    /// Exam catalog CSV file
    #[arg(long)]
    exams: PathBuf,

    /// Student directory CSV file
    #[arg(long)]
    students: PathBuf,

    /// Gateway public key id handed to the checkout page
    #[arg(long, default_value = "key_demo")]
    gateway_key_id: String,

    /// Gateway signing secret
    #[arg(long, default_value = "secret_demo")]
    gateway_secret: String,
}

fn required_student(action: &Action) -> examreg::error::Result<u64> {
    action.student.ok_or_else(|| {
        RegistrationError::Validation("action requires a student column".to_string())
    })
}

async fn apply_action(
    action: Action,
    payment: &PaymentWorkflow,
    adjudication: &AdjudicationWorkflow,
    registrations: &RegistrationStoreRef,
    students: &StudentStoreRef,
    gateway: &HmacGateway,
) -> examreg::error::Result<()> {
    match action.action {
        ActionKind::Register => {
            let student_id = required_student(&action)?;
            let student = students
                .get(student_id)
                .await?
                .ok_or(RegistrationError::NotFound("student"))?;
            let document = action.document.as_deref().unwrap_or("document.pdf");
            payment
                .register_and_initiate(&student, action.exam, document)
                .await?;
        }
        ActionKind::Pay | ActionKind::FailPay => {
            let student_id = required_student(&action)?;
            let registration = registrations
                .find_by_pair(student_id, action.exam)
                .await?
                .ok_or(RegistrationError::NotFound("registration"))?;
            let order_id = registration.payment_order_id.clone().ok_or_else(|| {
                RegistrationError::Validation("no payment order to settle".to_string())
            })?;
            let payment_id = format!("pay_{}", registration.id);
            // `pay` plays the processor's side with a genuine signature;
            // `fail-pay` simulates a tampered callback.
            let signature = match action.action {
                ActionKind::Pay => gateway.sign(&order_id, &payment_id)?,
                _ => "0badc0de".to_string(),
            };
            let outcome = payment
                .reconcile_callback(CallbackParams {
                    order_id,
                    payment_id,
                    signature,
                    registration_hint: Some(registration.id),
                })
                .await?;
            if matches!(outcome, CallbackOutcome::Declined(_)) {
                eprintln!(
                    "Payment verification failed for student {student_id}, exam {}",
                    action.exam
                );
            }
        }
        ActionKind::Approve | ActionKind::Reject | ActionKind::Hold => {
            let student_id = required_student(&action)?;
            let registration = registrations
                .find_by_pair(student_id, action.exam)
                .await?
                .ok_or(RegistrationError::NotFound("registration"))?;
            let decision = match action.action {
                ActionKind::Approve => Decision::Approve,
                ActionKind::Reject => Decision::Reject,
                _ => Decision::Hold,
            };
            let reason = action.reason.as_deref().unwrap_or("");
            let outcome = adjudication
                .set_status(registration.id, decision, reason)
                .await?;
            if let Err(err) = outcome.notification {
                eprintln!(
                    "Warning: status updated to {}, but notification failed: {err}",
                    outcome.registration.status
                );
            }
        }
        ActionKind::BulkApprove | ActionKind::BulkReject | ActionKind::BulkHold => {
            let decision = match action.action {
                ActionKind::BulkApprove => Decision::Approve,
                ActionKind::BulkReject => Decision::Reject,
                _ => Decision::Hold,
            };
            let reason = action
                .reason
                .as_deref()
                .unwrap_or("Bulk update by administrator");
            let count = adjudication
                .bulk_set_status(action.exam, decision, reason)
                .await?;
            eprintln!("Processed {count} registrations for exam {}", action.exam);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let registrations: RegistrationStoreRef = Arc::new(InMemoryRegistrationStore::new());
    let exams: ExamStoreRef = Arc::new(InMemoryExamStore::new());
    let students: StudentStoreRef = Arc::new(InMemoryStudentStore::new());
    let gateway = HmacGateway::new(&cli.gateway_key_id, &cli.gateway_secret);
    let mailer: MailerRef = Arc::new(InMemoryMailer::new());
    let notifier: NotifierRef = Arc::new(InMemoryNotifier::new());
    let qr: QrRendererRef = Arc::new(SvgQrRenderer);

    let exam_file = File::open(&cli.exams).into_diagnostic()?;
    for exam in ExamReader::new(exam_file).exams() {
        exams.store(exam.into_diagnostic()?).await.into_diagnostic()?;
    }
    let student_file = File::open(&cli.students).into_diagnostic()?;
    for student in StudentReader::new(student_file).students() {
        students
            .store(student.into_diagnostic()?)
            .await
            .into_diagnostic()?;
    }

    let payment = PaymentWorkflow::new(
        registrations.clone(),
        exams.clone(),
        Arc::new(gateway.clone()),
    );
    let adjudication = AdjudicationWorkflow::new(
        registrations.clone(),
        exams.clone(),
        students.clone(),
        mailer,
        notifier,
        qr,
    );

    let action_file = File::open(&cli.actions).into_diagnostic()?;
    for action_result in ActionReader::new(action_file).actions() {
        match action_result {
            Ok(action) => {
                if let Err(e) = apply_action(
                    action,
                    &payment,
                    &adjudication,
                    &registrations,
                    &students,
                    &gateway,
                )
                .await
                {
                    eprintln!("Error processing action: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading action: {e}");
            }
        }
    }

    let rows = registrations.all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = RegistrationWriter::new(stdout.lock());
    writer.write_registrations(rows).into_diagnostic()?;

    Ok(())
}
