mod memory;

pub use memory::*;

pub type StoreResult<T> = core::result::Result<T, StoreError>;

/// Errors surfaced by a [`DocumentStore`] implementation.
#[derive(Clone, thiserror::Error, Debug)]
pub enum StoreError {
    /// The uniqueness constraint on the identifier column rejected an insert.
    ///
    /// This is the expected signal under contention: another caller claimed
    /// the same candidate first. The allocator recovers by backing off and
    /// recomputing its candidate.
    #[error("duplicate identifier: {identifier}")]
    Duplicate { identifier: String },

    /// Any other backend failure (connectivity loss, timeout, ...).
    #[error("store backend error: {context}")]
    Backend { context: String },
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Lifecycle marker distinguishing transient placeholder rows from finalized
/// business documents sharing the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    /// A sentinel-valued row inserted solely to claim an identifier.
    Draft,
    /// A real document promoted by the caller after allocation.
    Final,
}

/// The persistence capabilities the allocator consumes.
///
/// Implementations back onto any table with a uniqueness constraint on the
/// identifier column. That constraint is the allocator's **only** concurrency
/// primitive: [`DocumentStore::insert_placeholder`] must reject the second of
/// two simultaneous inserts of the same identifier with
/// [`StoreError::Duplicate`], and nothing else is required of the backend. No
/// read-time locking is expected: a `SELECT ... FOR UPDATE` outside a
/// transaction serializes nothing, so the trait does not pretend otherwise.
pub trait DocumentStore {
    /// Returns the lexicographically greatest identifier beginning with
    /// `period_prefix` followed by `-`, or `None` when the period holds no
    /// rows.
    ///
    /// Descending string order stands in for descending numeric order of the
    /// sequence suffix. The two agree only while suffixes stay zero-padded to
    /// [`SEQUENCE_PAD_WIDTH`](crate::SEQUENCE_PAD_WIDTH) digits.
    fn latest_identifier(
        &self,
        period_prefix: &str,
    ) -> impl Future<Output = StoreResult<Option<String>>> + Send;

    /// Inserts a draft-status sentinel row keyed by `identifier`, claiming it
    /// via the uniqueness constraint.
    ///
    /// # Errors
    ///
    /// [`StoreError::Duplicate`] when the identifier is already taken;
    /// [`StoreError::Backend`] for any other failure.
    fn insert_placeholder(
        &self,
        identifier: &str,
        created_at_millis: u64,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes the row keyed by `identifier` **only if** it still carries the
    /// placeholder sentinel values. A row concurrently promoted to a real
    /// document must survive this call.
    fn delete_placeholder(&self, identifier: &str) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Allocators sharing one store across tasks can hold it behind an [`Arc`].
///
/// [`Arc`]: std::sync::Arc
impl<D> DocumentStore for std::sync::Arc<D>
where
    D: DocumentStore + Send + Sync,
{
    fn latest_identifier(
        &self,
        period_prefix: &str,
    ) -> impl Future<Output = StoreResult<Option<String>>> + Send {
        (**self).latest_identifier(period_prefix)
    }

    fn insert_placeholder(
        &self,
        identifier: &str,
        created_at_millis: u64,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).insert_placeholder(identifier, created_at_millis)
    }

    fn delete_placeholder(&self, identifier: &str) -> impl Future<Output = StoreResult<()>> + Send {
        (**self).delete_placeholder(identifier)
    }
}
