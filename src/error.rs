use thiserror::Error;

/// Crate-wide error taxonomy. Construction never corrupts a tree silently:
/// every invariant breach aborts with the offending ids and the phase that
/// detected it.
#[derive(Debug, Error)]
pub enum Error {
    /// Incompatible `(store, algorithm, variation)` combination or option
    /// misuse on the invocation surface.
    #[error("configuration: {0}")]
    Config(String),

    /// File or transcoding trouble on the text boundary.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    /// A code unit that cannot be represented: collides with the sentinel,
    /// the terminator, or exceeds the declared width.
    #[error("code unit {unit:#x} at position {position} is not representable")]
    Unrepresentable { unit: u32, position: usize },

    /// Allocation or growth failure in a store, stack or table.
    #[error("out of memory growing {what} to {requested} entries")]
    OutOfMemory { what: &'static str, requested: usize },

    /// A structural invariant was violated mid-build. `node` is the compact
    /// signed id under inspection (0 when none applies).
    #[error("invariant violated in {phase}: {detail} (node {node})")]
    Invariant {
        phase: &'static str,
        node: i32,
        detail: &'static str,
    },

    /// Re-insertion of a suffix that is already present.
    #[error("suffix {suffix} is already present")]
    Logic { suffix: u32 },
}

impl Error {
    pub(crate) fn invariant(phase: &'static str, node: i32, detail: &'static str) -> Self {
        Error::Invariant {
            phase,
            node,
            detail,
        }
    }

    pub(crate) fn oom(what: &'static str, requested: usize) -> Self {
        Error::OutOfMemory { what, requested }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
