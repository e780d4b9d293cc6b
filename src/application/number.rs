use crate::domain::exam::Exam;
use crate::domain::ports::RegistrationStore;
use crate::domain::registration::Registration;
use crate::error::{RegistrationError, Result};
use chrono::Datelike;
use rand::Rng;

const SUFFIX_LEN: usize = 4;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_ATTEMPTS: usize = 100;

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// Produces a unique registration number like `REG-2026-XK4Q`.
///
/// Idempotent: a registration that already carries a number gets it back
/// unchanged. Collisions against stored numbers re-roll the suffix, bounded
/// at [`MAX_ATTEMPTS`] so a pathological keyspace cannot loop forever.
pub async fn generate(
    store: &dyn RegistrationStore,
    registration: &Registration,
    exam: &Exam,
) -> Result<String> {
    if let Some(number) = &registration.registration_number {
        return Ok(number.clone());
    }

    let year = exam.exam_date.year();
    for _ in 0..MAX_ATTEMPTS {
        let candidate = format!("REG-{}-{}", year, random_suffix());
        if !store.number_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(RegistrationError::NumberGenerationExhausted(MAX_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exam::Exam;
    use crate::infrastructure::in_memory::InMemoryRegistrationStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn exam() -> Exam {
        Exam {
            id: 1,
            name: "Entrance Exam".to_string(),
            exam_date: "2026-06-01T09:00:00Z".parse().unwrap(),
            location: "Block A".to_string(),
            fees: dec!(500.00),
            is_registration_open: true,
        }
    }

    fn registration() -> Registration {
        Registration::new(1, 10, 1, "doc.pdf", Utc::now())
    }

    #[tokio::test]
    async fn test_number_format() {
        let store = InMemoryRegistrationStore::new();
        let number = generate(&store, &registration(), &exam()).await.unwrap();

        let (prefix, suffix) = number.split_at("REG-2026-".len());
        assert_eq!(prefix, "REG-2026-");
        assert_eq!(suffix.len(), 4);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[tokio::test]
    async fn test_existing_number_returned_unchanged() {
        let store = InMemoryRegistrationStore::new();
        let mut reg = registration();
        reg.registration_number = Some("REG-2026-AAAA".to_string());

        let number = generate(&store, &reg, &exam()).await.unwrap();
        assert_eq!(number, "REG-2026-AAAA");
    }

    /// A store that claims every candidate number is taken.
    struct SaturatedStore;

    #[async_trait]
    impl RegistrationStore for SaturatedStore {
        async fn get(&self, _id: u64) -> Result<Option<Registration>> {
            Ok(None)
        }
        async fn find_by_pair(&self, _student: u64, _exam: u64) -> Result<Option<Registration>> {
            Ok(None)
        }
        async fn find_by_order_id(&self, _order_id: &str) -> Result<Option<Registration>> {
            Ok(None)
        }
        async fn upsert_document(
            &self,
            _student: u64,
            _exam: u64,
            _document: &str,
        ) -> Result<Registration> {
            unimplemented!()
        }
        async fn update(&self, _registration: Registration) -> Result<()> {
            Ok(())
        }
        async fn delete(&self, _id: u64) -> Result<()> {
            Ok(())
        }
        async fn list_by_exam(&self, _exam: u64) -> Result<Vec<Registration>> {
            Ok(vec![])
        }
        async fn all(&self) -> Result<Vec<Registration>> {
            Ok(vec![])
        }
        async fn number_exists(&self, _number: &str) -> Result<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_collision_retries_are_bounded() {
        let result = generate(&SaturatedStore, &registration(), &exam()).await;
        assert!(matches!(
            result,
            Err(RegistrationError::NumberGenerationExhausted(_))
        ));
    }
}
