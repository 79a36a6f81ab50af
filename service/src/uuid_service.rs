use mockall::automock;
use uuid::Uuid;

/// Generates ids and version stamps. The usage tag names what the id is for
/// so tests can hand out deterministic values per call site.
#[automock]
pub trait UuidService {
    fn new_uuid(&self, usage: &str) -> Uuid;
}
