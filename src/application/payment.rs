use crate::domain::ports::{
    ExamStore, ExamStoreRef, Order, PaymentGateway, PaymentGatewayRef, RegistrationStore,
    RegistrationStoreRef,
};
use crate::domain::registration::Registration;
use crate::domain::student::Student;
use crate::error::{RegistrationError, Result};
use tracing::{info, warn};

const CURRENCY: &str = "INR";

/// Everything the client-side checkout needs to collect the fee.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub registration: Registration,
    pub order: Order,
    pub key_id: String,
}

/// An asynchronous gateway callback, as received from the processor. The
/// payload is untrusted until the signature verifies; `registration_hint`
/// is the out-of-band id carried on the failure redirect.
#[derive(Debug, Clone)]
pub struct CallbackParams {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub registration_hint: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum CallbackOutcome {
    /// Signature verified and the payment is captured (or already was).
    Confirmed(Registration),
    /// Signature did not verify. Carries the affected registration when the
    /// minimal-trust fallback lookup could resolve one; no state was mutated
    /// either way.
    Declined(Option<Registration>),
}

/// Orchestrates order creation and callback reconciliation for one inbound
/// request at a time.
pub struct PaymentWorkflow {
    registrations: RegistrationStoreRef,
    exams: ExamStoreRef,
    gateway: PaymentGatewayRef,
}

impl PaymentWorkflow {
    pub fn new(
        registrations: RegistrationStoreRef,
        exams: ExamStoreRef,
        gateway: PaymentGatewayRef,
    ) -> Self {
        Self {
            registrations,
            exams,
            gateway,
        }
    }

    /// Upserts the (student, exam) registration and opens a gateway order
    /// for the exam fee.
    ///
    /// The two steps commit together: when order creation fails, the upsert
    /// is compensated (a fresh row is deleted, an updated row restored), so
    /// no registration is left pointing at a half-initiated payment.
    pub async fn register_and_initiate(
        &self,
        student: &Student,
        exam_id: u64,
        document: &str,
    ) -> Result<PaymentIntent> {
        let exam = self
            .exams
            .get(exam_id)
            .await?
            .ok_or(RegistrationError::NotFound("exam"))?;
        if !exam.is_registration_open {
            return Err(RegistrationError::RegistrationClosed);
        }

        let prior = self.registrations.find_by_pair(student.id, exam_id).await?;
        let mut registration = self
            .registrations
            .upsert_document(student.id, exam_id, document)
            .await?;

        let amount = exam.fee_minor_units()?;
        let receipt = format!("reg_{}", registration.id);
        let order = match self.gateway.create_order(amount, CURRENCY, &receipt).await {
            Ok(order) => order,
            Err(err) => {
                match prior {
                    Some(previous) => self.registrations.update(previous).await?,
                    None => self.registrations.delete(registration.id).await?,
                }
                return Err(err);
            }
        };

        registration.payment_order_id = Some(order.id.clone());
        self.registrations.update(registration.clone()).await?;

        info!(
            registration = registration.id,
            order = %order.id,
            amount,
            "payment order created"
        );
        Ok(PaymentIntent {
            registration,
            order,
            key_id: self.gateway.key_id().to_string(),
        })
    }

    /// Reconciles a gateway callback against the local registration.
    ///
    /// Verified callbacks resolve strictly by `payment_order_id` and are
    /// idempotent for already-paid rows. Unverified callbacks never mutate
    /// state; they only attempt the fallback lookup so the caller can route
    /// the student to a registration-specific failure page.
    pub async fn reconcile_callback(&self, params: CallbackParams) -> Result<CallbackOutcome> {
        let verified = match self
            .gateway
            .verify_signature(&params.order_id, &params.payment_id, &params.signature)
            .await
        {
            Ok(verified) => verified,
            Err(err) => {
                warn!(order = %params.order_id, %err, "signature verification unavailable");
                false
            }
        };

        if !verified {
            return Ok(CallbackOutcome::Declined(
                self.resolve_unverified(&params).await?,
            ));
        }

        let Some(mut registration) = self.registrations.find_by_order_id(&params.order_id).await?
        else {
            return Err(RegistrationError::ReconciliationNotFound(params.order_id));
        };

        if !registration.confirm_payment(&params.payment_id, &params.signature) {
            // Duplicate callback for a captured payment
            return Ok(CallbackOutcome::Confirmed(registration));
        }
        self.registrations.update(registration.clone()).await?;
        info!(
            registration = registration.id,
            order = %params.order_id,
            "payment captured"
        );
        Ok(CallbackOutcome::Confirmed(registration))
    }

    /// Minimal-trust resolution for a callback that failed verification:
    /// the order id first, then the out-of-band registration hint.
    async fn resolve_unverified(&self, params: &CallbackParams) -> Result<Option<Registration>> {
        warn!(order = %params.order_id, "payment callback rejected");

        if !params.order_id.trim().is_empty()
            && let Some(registration) = self.registrations.find_by_order_id(&params.order_id).await?
        {
            return Ok(Some(registration));
        }
        if let Some(id) = params.registration_hint {
            return self.registrations.get(id).await;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exam::Exam;
    use crate::domain::registration::PaymentStatus;
    use crate::infrastructure::gateway::HmacGateway;
    use crate::infrastructure::in_memory::{InMemoryExamStore, InMemoryRegistrationStore};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn student() -> Student {
        Student {
            id: 10,
            full_name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            is_staff: false,
        }
    }

    fn exam(id: u64, open: bool) -> Exam {
        Exam {
            id,
            name: "Entrance Exam".to_string(),
            exam_date: "2026-06-01T09:00:00Z".parse().unwrap(),
            location: "Block A".to_string(),
            fees: dec!(500.00),
            is_registration_open: open,
        }
    }

    async fn workflow_with(
        gateway: PaymentGatewayRef,
    ) -> (PaymentWorkflow, Arc<InMemoryRegistrationStore>) {
        let registrations = Arc::new(InMemoryRegistrationStore::new());
        let exams = Arc::new(InMemoryExamStore::new());
        exams.store(exam(1, true)).await.unwrap();
        exams.store(exam(2, false)).await.unwrap();
        let workflow = PaymentWorkflow::new(registrations.clone(), exams, gateway);
        (workflow, registrations)
    }

    async fn workflow() -> (PaymentWorkflow, Arc<InMemoryRegistrationStore>, HmacGateway) {
        let gateway = HmacGateway::new("key_test", "secret_test");
        let (wf, regs) = workflow_with(Arc::new(gateway.clone())).await;
        (wf, regs, gateway)
    }

    #[tokio::test]
    async fn test_order_amount_in_minor_units() {
        let (workflow, _, _) = workflow().await;
        let intent = workflow
            .register_and_initiate(&student(), 1, "doc.pdf")
            .await
            .unwrap();

        // 500.00 rupees becomes 50000 paise
        assert_eq!(intent.order.amount, 50_000);
        assert_eq!(intent.order.currency, "INR");
        assert_eq!(intent.order.receipt, format!("reg_{}", intent.registration.id));
        assert_eq!(intent.key_id, "key_test");
        assert_eq!(
            intent.registration.payment_order_id.as_deref(),
            Some(intent.order.id.as_str())
        );
    }

    #[tokio::test]
    async fn test_repeat_submission_updates_single_row() {
        let (workflow, registrations, _) = workflow().await;
        let first = workflow
            .register_and_initiate(&student(), 1, "draft.pdf")
            .await
            .unwrap();
        let second = workflow
            .register_and_initiate(&student(), 1, "final.pdf")
            .await
            .unwrap();

        assert_eq!(first.registration.id, second.registration.id);
        assert_eq!(second.registration.document, "final.pdf");
        assert_eq!(registrations.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_exam_rejected() {
        let (workflow, registrations, _) = workflow().await;
        let result = workflow.register_and_initiate(&student(), 2, "doc.pdf").await;
        assert!(matches!(result, Err(RegistrationError::RegistrationClosed)));
        assert!(registrations.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paid_registration_cannot_resubmit() {
        let (workflow, _, gateway) = workflow().await;
        let intent = workflow
            .register_and_initiate(&student(), 1, "doc.pdf")
            .await
            .unwrap();
        let order_id = intent.order.id;
        let signature = gateway.sign(&order_id, "pay_1").unwrap();
        workflow
            .reconcile_callback(CallbackParams {
                order_id,
                payment_id: "pay_1".to_string(),
                signature,
                registration_hint: None,
            })
            .await
            .unwrap();

        let result = workflow.register_and_initiate(&student(), 1, "again.pdf").await;
        assert!(matches!(result, Err(RegistrationError::AlreadyPaid)));
    }

    #[tokio::test]
    async fn test_valid_callback_captures_payment() {
        let (workflow, registrations, gateway) = workflow().await;
        let intent = workflow
            .register_and_initiate(&student(), 1, "doc.pdf")
            .await
            .unwrap();
        let order_id = intent.order.id;
        let signature = gateway.sign(&order_id, "pay_77").unwrap();

        let outcome = workflow
            .reconcile_callback(CallbackParams {
                order_id: order_id.clone(),
                payment_id: "pay_77".to_string(),
                signature: signature.clone(),
                registration_hint: None,
            })
            .await
            .unwrap();

        let CallbackOutcome::Confirmed(registration) = outcome else {
            panic!("expected confirmation");
        };
        assert_eq!(registration.payment_status, PaymentStatus::Success);

        // Success implies all gateway fields are present
        let stored = registrations.get(registration.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_order_id.as_deref(), Some(order_id.as_str()));
        assert_eq!(stored.payment_transaction_id.as_deref(), Some("pay_77"));
        assert_eq!(stored.payment_signature.as_deref(), Some(signature.as_str()));
    }

    #[tokio::test]
    async fn test_duplicate_callback_is_noop() {
        let (workflow, _, gateway) = workflow().await;
        let intent = workflow
            .register_and_initiate(&student(), 1, "doc.pdf")
            .await
            .unwrap();
        let order_id = intent.order.id;
        let params = CallbackParams {
            order_id: order_id.clone(),
            payment_id: "pay_77".to_string(),
            signature: gateway.sign(&order_id, "pay_77").unwrap(),
            registration_hint: None,
        };

        workflow.reconcile_callback(params.clone()).await.unwrap();
        let outcome = workflow.reconcile_callback(params).await.unwrap();

        let CallbackOutcome::Confirmed(registration) = outcome else {
            panic!("expected idempotent confirmation");
        };
        assert_eq!(registration.payment_transaction_id.as_deref(), Some("pay_77"));
    }

    #[tokio::test]
    async fn test_invalid_signature_never_captures() {
        let (workflow, registrations, _) = workflow().await;
        let intent = workflow
            .register_and_initiate(&student(), 1, "doc.pdf")
            .await
            .unwrap();

        let outcome = workflow
            .reconcile_callback(CallbackParams {
                order_id: intent.order.id.clone(),
                payment_id: "pay_77".to_string(),
                signature: "deadbeef".to_string(),
                registration_hint: None,
            })
            .await
            .unwrap();

        let CallbackOutcome::Declined(Some(registration)) = outcome else {
            panic!("expected fallback resolution by order id");
        };
        assert_eq!(registration.id, intent.registration.id);

        let stored = registrations.get(registration.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
        assert!(stored.payment_transaction_id.is_none());
    }

    #[tokio::test]
    async fn test_invalid_signature_falls_back_to_hint() {
        let (workflow, _, _) = workflow().await;
        let intent = workflow
            .register_and_initiate(&student(), 1, "doc.pdf")
            .await
            .unwrap();

        let outcome = workflow
            .reconcile_callback(CallbackParams {
                order_id: String::new(),
                payment_id: String::new(),
                signature: "bogus".to_string(),
                registration_hint: Some(intent.registration.id),
            })
            .await
            .unwrap();

        let CallbackOutcome::Declined(Some(registration)) = outcome else {
            panic!("expected fallback resolution by hint");
        };
        assert_eq!(registration.id, intent.registration.id);
    }

    #[tokio::test]
    async fn test_unresolvable_failure_is_generic() {
        let (workflow, _, _) = workflow().await;
        workflow
            .register_and_initiate(&student(), 1, "doc.pdf")
            .await
            .unwrap();

        let outcome = workflow
            .reconcile_callback(CallbackParams {
                order_id: "order_unknown".to_string(),
                payment_id: "pay_1".to_string(),
                signature: "bogus".to_string(),
                registration_hint: None,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, CallbackOutcome::Declined(None)));
    }

    #[tokio::test]
    async fn test_verified_callback_for_unknown_order() {
        let (workflow, _, gateway) = workflow().await;
        let signature = gateway.sign("order_ghost", "pay_1").unwrap();

        let result = workflow
            .reconcile_callback(CallbackParams {
                order_id: "order_ghost".to_string(),
                payment_id: "pay_1".to_string(),
                signature,
                registration_hint: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(RegistrationError::ReconciliationNotFound(_))
        ));
    }

    /// A gateway that is down for order creation.
    struct UnavailableGateway;

    #[async_trait]
    impl PaymentGateway for UnavailableGateway {
        fn key_id(&self) -> &str {
            "key_down"
        }
        async fn create_order(
            &self,
            _amount: u64,
            _currency: &str,
            _receipt: &str,
        ) -> Result<Order> {
            Err(RegistrationError::GatewayUnavailable(
                "connection refused".to_string(),
            ))
        }
        async fn verify_signature(
            &self,
            _order_id: &str,
            _payment_id: &str,
            _signature: &str,
        ) -> Result<bool> {
            Err(RegistrationError::GatewayUnavailable(
                "connection refused".to_string(),
            ))
        }
    }

    #[tokio::test]
    async fn test_gateway_outage_rolls_back_fresh_row() {
        let (workflow, registrations) = workflow_with(Arc::new(UnavailableGateway)).await;

        let result = workflow.register_and_initiate(&student(), 1, "doc.pdf").await;
        assert!(matches!(result, Err(RegistrationError::GatewayUnavailable(_))));
        // The upsert was compensated; no orphan row survives
        assert!(registrations.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_outage_restores_prior_row() {
        let (workflow, registrations, _gateway) = workflow().await;
        let intent = workflow
            .register_and_initiate(&student(), 1, "draft.pdf")
            .await
            .unwrap();

        let broken = PaymentWorkflow::new(
            registrations.clone(),
            workflow.exams.clone(),
            Arc::new(UnavailableGateway),
        );
        let result = broken.register_and_initiate(&student(), 1, "final.pdf").await;
        assert!(matches!(result, Err(RegistrationError::GatewayUnavailable(_))));

        let stored = registrations.get(intent.registration.id).await.unwrap().unwrap();
        assert_eq!(stored.document, "draft.pdf");
        assert_eq!(
            stored.payment_order_id.as_deref(),
            Some(intent.order.id.as_str())
        );
    }
}
