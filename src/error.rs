use crate::models::Kind;

/// Upstream handed the core a record that breaks the record contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("{kind} record at position {index} has no id")]
    MissingId { kind: Kind, index: usize },
}
