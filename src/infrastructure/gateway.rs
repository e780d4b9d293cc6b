use crate::domain::ports::{Order, PaymentGateway};
use crate::error::{RegistrationError, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type HmacSha256 = Hmac<Sha256>;

/// Payment gateway with hosted-checkout semantics: orders are created
/// server-side and the processor signs callbacks with
/// `HMAC-SHA256(secret, "<order_id>|<payment_id>")`, hex-encoded.
///
/// Order ids are allocated locally, which also makes this the gateway used
/// by the CLI driver and the tests, where [`HmacGateway::sign`] plays the
/// processor's side of the exchange.
#[derive(Clone)]
pub struct HmacGateway {
    key_id: String,
    key_secret: String,
    next_order: Arc<AtomicU64>,
}

impl HmacGateway {
    pub fn new(key_id: &str, key_secret: &str) -> Self {
        Self {
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
            next_order: Arc::new(AtomicU64::new(0)),
        }
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .map_err(|e| RegistrationError::GatewayUnavailable(e.to_string()))
    }

    /// Computes the processor-side signature for a captured payment.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl PaymentGateway for HmacGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_order(&self, amount: u64, currency: &str, receipt: &str) -> Result<Order> {
        let n = self.next_order.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Order {
            id: format!("order_{n:08x}"),
            amount,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        })
    }

    async fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool> {
        let Ok(provided) = hex::decode(signature) else {
            return Ok(false);
        };
        let mut mac = self.mac()?;
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        Ok(mac.verify_slice(&provided).is_ok())
    }
}
