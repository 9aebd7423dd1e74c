//! Event ingress from the message bus

pub mod consumer;

pub use consumer::{process_registration, Disposition, RegistrationConsumer, StudentRegistered};
