//! Delivery core of the ancillary subsystem: idempotent email/sms delivery
//! state machines driven by at-least-once queued messages. The queue may
//! redeliver; the aggregates guarantee exactly-once send effect.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
