//! Request identifier generation

use uuid::Uuid;

/// Source of request identifiers
///
/// Injected into the orchestrator so tests can produce deterministic ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random UUIDv4 identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
