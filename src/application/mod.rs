//! Application layer containing the workflow orchestration.
//!
//! `PaymentWorkflow` drives registration upserts and gateway reconciliation,
//! `AdjudicationWorkflow` drives administrative status changes with
//! best-effort notification, and `HallTicketService` serves the printable
//! admission document.

pub mod adjudication;
pub mod hall_ticket;
pub mod number;
pub mod payment;
