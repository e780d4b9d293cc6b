pub mod action_reader;
pub mod registration_writer;
pub mod seed_reader;
