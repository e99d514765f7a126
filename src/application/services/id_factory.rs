use uuid::Uuid;

/// Injected aggregate id generation; production code never reaches for
/// process-wide counters.
pub trait IdFactory: Send + Sync {
    fn next_id(&self) -> Uuid;
}

#[derive(Default)]
pub struct UuidIdFactory;

impl IdFactory for UuidIdFactory {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
