use crate::domain::ports::QrRenderer;
use crate::error::{RegistrationError, Result};
use qrcode::QrCode;
use qrcode::render::svg;

/// Renders QR payloads to SVG bytes.
pub struct SvgQrRenderer;

impl QrRenderer for SvgQrRenderer {
    fn render(&self, payload: &str) -> Result<Vec<u8>> {
        let code = QrCode::new(payload.as_bytes())
            .map_err(|e| RegistrationError::Validation(format!("QR encoding failed: {e}")))?;
        let image = code
            .render::<svg::Color>()
            .min_dimensions(240, 240)
            .build();
        Ok(image.into_bytes())
    }
}
