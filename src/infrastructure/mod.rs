//! Adapters behind the domain ports: in-memory stores, the HMAC payment
//! gateway, recording mail/notification outboxes, and the SVG QR renderer.

pub mod gateway;
pub mod in_memory;
pub mod outbox;
pub mod qr;
