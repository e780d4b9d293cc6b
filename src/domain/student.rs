use serde::Deserialize;

/// A portal user, read-only from the core's perspective.
///
/// Identity management (OTP, social login, sessions) lives outside the core;
/// the workflows only need the fields consumed by mail dispatch, the QR
/// payload, and the hall-ticket authorization rule.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct Student {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub is_staff: bool,
}
