pub mod id_factory;
pub mod queue;
pub mod transport;
