//! Inbound/outbound adapters for the CLI surface.

pub mod csv;
