use crate::store::StoreError;

/// Why a sequential claim could not be completed.
///
/// This error never escapes [`SequenceAllocator::allocate`]: the infallible
/// entry point maps each variant onto a structurally unique fallback
/// identifier instead. Callers that need to distinguish a degraded allocation
/// from a sequential one use [`SequenceAllocator::try_allocate`] and handle
/// these variants themselves.
///
/// [`SequenceAllocator::allocate`]: crate::SequenceAllocator::allocate
/// [`SequenceAllocator::try_allocate`]: crate::SequenceAllocator::try_allocate
#[derive(Clone, thiserror::Error, Debug)]
pub enum AllocateError {
    /// Every claim attempt lost the insert race for its candidate identifier.
    #[error("sequence claim lost {attempts} races; last candidate {identifier}")]
    Contended {
        /// How many claim attempts were made before giving up.
        attempts: u32,
        /// The candidate the final attempt failed to claim.
        identifier: String,
    },

    /// The final claim attempt failed with a non-duplicate store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}
