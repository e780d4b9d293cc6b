//! Core of a student exam-registration portal: the registration lifecycle,
//! payment reconciliation against an external gateway, and administrative
//! adjudication (approve / reject / hold) with hall-ticket issuance.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
