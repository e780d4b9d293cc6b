//! Domain layer: the registration entity, its read-only collaborators, and
//! the ports every workflow depends on.

pub mod exam;
pub mod ports;
pub mod registration;
pub mod student;
