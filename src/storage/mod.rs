mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::model::Model;

/// Contract of the storage collaborator.
///
/// Implementations own the durable medium. Records drive them through these
/// two operations only: fresh construction registers, `save` re-registers
/// the current state and then persists.
pub trait Store {
    /// Track a record's current state under its storage key for later
    /// persistence. Registering an already-tracked key refreshes it.
    fn register(&mut self, model: &dyn Model) -> Result<()>;

    /// Flush all tracked records to the backing medium.
    fn persist(&mut self) -> Result<()>;
}
