use crate::error::{RegistrationError, Result};
use serde::Deserialize;
use std::io::Read;

/// One scripted portal action: student-side submissions and payments, or
/// administrator-side adjudication.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Register,
    Pay,
    FailPay,
    Approve,
    Reject,
    Hold,
    BulkApprove,
    BulkReject,
    BulkHold,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Action {
    pub action: ActionKind,
    /// Empty for bulk actions.
    pub student: Option<u64>,
    pub exam: u64,
    pub document: Option<String>,
    pub reason: Option<String>,
}

/// Reads portal actions from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding `Result<Action>` lazily so one malformed row does not abort the
/// rest of the script.
pub struct ActionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ActionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn actions(self) -> impl Iterator<Item = Result<Action>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(RegistrationError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = "action, student, exam, document, reason\n\
                    register, 10, 1, doc.pdf, \n\
                    pay, 10, 1, , \n\
                    bulk-approve, , 1, , Seats confirmed";
        let reader = ActionReader::new(data.as_bytes());
        let actions: Vec<Result<Action>> = reader.actions().collect();

        assert_eq!(actions.len(), 3);
        let first = actions[0].as_ref().unwrap();
        assert_eq!(first.action, ActionKind::Register);
        assert_eq!(first.student, Some(10));
        assert_eq!(first.document.as_deref(), Some("doc.pdf"));

        let bulk = actions[2].as_ref().unwrap();
        assert_eq!(bulk.action, ActionKind::BulkApprove);
        assert_eq!(bulk.student, None);
        assert_eq!(bulk.reason.as_deref(), Some("Seats confirmed"));
    }

    #[test]
    fn test_reader_malformed_action() {
        let data = "action, student, exam, document, reason\nenroll, 10, 1, , ";
        let reader = ActionReader::new(data.as_bytes());
        let actions: Vec<Result<Action>> = reader.actions().collect();

        assert!(actions[0].is_err());
    }
}
