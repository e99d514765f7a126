pub mod channels;
pub mod queued_messages;
pub mod services;
pub mod usecases;
pub mod views;
