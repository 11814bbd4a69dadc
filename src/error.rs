use thiserror::Error;

/// Conditions a caller of the engine is expected to branch on. Everything
/// else (I/O failure, a broken invariant) is fatal and travels as a plain
/// `anyhow::Error`.
#[derive(Error, Debug)]
pub enum BtreeError {
    #[error("key {0} not found")]
    KeyNotFound(i64),

    #[error("structural invariant violated: {0}")]
    Invariant(String),

    #[error("cell does not fit in node (size {0} exceeds 2d+1)")]
    CellOverflow(usize),
}
