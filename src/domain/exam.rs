use crate::error::{RegistrationError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

/// An exam offering, read-only from the core's perspective.
///
/// CRUD and the date-modification-window rule are handled elsewhere; the
/// workflows consume `fees` for order amounts, `is_registration_open` as a
/// precondition, and name/date/location for hall-ticket content.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Exam {
    pub id: u64,
    pub name: String,
    pub exam_date: DateTime<Utc>,
    pub location: String,
    pub fees: Decimal,
    pub is_registration_open: bool,
}

impl Exam {
    /// The exam fee in minor currency units (paise), as the gateway expects.
    pub fn fee_minor_units(&self) -> Result<u64> {
        (self.fees * Decimal::ONE_HUNDRED)
            .round()
            .to_u64()
            .ok_or_else(|| {
                RegistrationError::Validation(format!("exam fee {} is not chargeable", self.fees))
            })
    }
}
