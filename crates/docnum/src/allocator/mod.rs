
use core::time::Duration;

use crate::{
    error::AllocateError,
    period::Period,
    rand::RandSource,
    sleep::SleepProvider,
    store::{DocumentStore, StoreError},
    thread_random::ThreadRandom,
    time::TimeSource,
};

/// Width the sequence suffix is zero-padded to (`001`, `002`, ...).
///
/// Descending string order over identifiers matches descending numeric order
/// over suffixes only while every suffix is padded to this width. Sequences
/// that outgrow it simply widen (`999` is followed by `1000`), at which point
/// string order and numeric order diverge for the affected period. Revisit
/// [`DocumentStore::latest_identifier`] consumers before changing this value.
pub const SEQUENCE_PAD_WIDTH: usize = 3;

/// Maximum claim attempts before degrading to the contention fallback format.
pub const MAX_CLAIM_ATTEMPTS: u32 = 5;

/// Base backoff delay, doubled after each failed claim attempt.
pub const BASE_BACKOFF: Duration = Duration::from_millis(50);

/// Allocates sequential business-document identifiers of the form
/// `PREFIX-YYYYMM-NNN`.
///
/// The allocator holds no state of its own between calls. Concurrent callers
/// coordinate exclusively through the store's uniqueness constraint: each
/// call reads the greatest existing identifier in the current period,
/// computes its successor, and claims it by inserting a placeholder row. The
/// loser of a simultaneous claim sees a duplicate-key rejection, backs off,
/// and recomputes. A successfully claimed placeholder is deleted again before
/// the identifier is returned, leaving the caller free to write the real
/// document under that number.
///
/// Allocation is availability-biased and **never fails**: when the retry
/// budget is exhausted, [`SequenceAllocator::allocate`] degrades to a
/// timestamp-based fallback identifier that is structurally unique but not
/// sequential. Downstream consumers that require strict sequencing can detect
/// degraded identifiers by the letter (`T` or `E`) following the period
/// segment.
///
/// ## Features
/// - ✅ Safe under concurrent callers sharing one store
/// - ✅ Sequence restarts at `001` each calendar month, no rollover operation
/// - ❌ Not gap-free: abandoned claims burn their number
///
/// # Example
///
/// ```
/// use docnum::{InMemoryStore, SequenceAllocator, SystemClock, TokioSleep};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let allocator = SequenceAllocator::new(InMemoryStore::new(), SystemClock);
///
/// let id = allocator.allocate::<TokioSleep>("INV").await;
/// assert!(id.starts_with("INV-"));
/// assert!(id.ends_with("-001"));
/// # }
/// ```
pub struct SequenceAllocator<D, T, R = ThreadRandom> {
    store: D,
    time: T,
    rand: R,
}

impl<D, T> SequenceAllocator<D, T>
where
    D: DocumentStore + Sync,
    T: TimeSource + Sync,
{
    /// Creates an allocator over the given store and time source, using the
    /// thread-local RNG for fallback suffixes.
    pub fn new(store: D, time: T) -> Self {
        Self::with_rand_source(store, time, ThreadRandom)
    }
}

impl<D, T, R> SequenceAllocator<D, T, R>
where
    D: DocumentStore + Sync,
    T: TimeSource + Sync,
    R: RandSource + Sync,
{
    /// Creates an allocator with an explicit [`RandSource`], primarily so
    /// tests can pin the fallback suffix.
    pub fn with_rand_source(store: D, time: T, rand: R) -> Self {
        Self { store, time, rand }
    }

    /// The underlying store, e.g. for promoting an allocated identifier into
    /// a real document.
    pub fn store(&self) -> &D {
        &self.store
    }

    /// Allocates the next identifier for `prefix` in the current period.
    ///
    /// This call never fails. When the sequential claim loop exhausts its
    /// retry budget the returned identifier degrades to a fallback form:
    ///
    /// - `PREFIX-YYYYMM-T<millis><rand>` after losing
    ///   [`MAX_CLAIM_ATTEMPTS`] insert races (contention),
    /// - `PREFIX-YYYYMM-E<millis>` when the store kept failing with a
    ///   non-duplicate error.
    ///
    /// Neither fallback is registered in the store; both are structurally
    /// unique rather than sequential.
    ///
    /// `prefix` is expected to be a non-empty, fixed tag such as `"INV"`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn allocate<S: SleepProvider>(&self, prefix: &str) -> String {
        let period = Period::from_unix_millis(self.time.current_millis());
        match self.claim_with_retry::<S>(prefix, period).await {
            Ok(identifier) => identifier,
            Err(AllocateError::Contended { attempts, .. }) => {
                let identifier = self.contention_fallback(prefix, period);
                tracing::warn!(
                    attempts,
                    %identifier,
                    "sequence contention exhausted; issuing fallback identifier"
                );
                identifier
            }
            Err(AllocateError::Store(e)) => {
                let identifier = self.emergency_fallback(prefix, period);
                tracing::warn!(
                    error = %e,
                    %identifier,
                    "store failed during allocation; issuing emergency identifier"
                );
                identifier
            }
        }
    }

    /// Fallible counterpart of [`SequenceAllocator::allocate`]: returns the
    /// sequential identifier or reports why one could not be claimed, instead
    /// of degrading to a fallback form.
    ///
    /// # Errors
    ///
    /// - [`AllocateError::Contended`] when every claim attempt lost its
    ///   insert race.
    /// - [`AllocateError::Store`] when the final attempt failed with a
    ///   non-duplicate store error.
    pub async fn try_allocate<S: SleepProvider>(
        &self,
        prefix: &str,
    ) -> Result<String, AllocateError> {
        let period = Period::from_unix_millis(self.time.current_millis());
        self.claim_with_retry::<S>(prefix, period).await
    }

    /// Read-compute-claim-release loop with bounded, exponentially backed-off
    /// retries.
    ///
    /// Every failure, duplicate or not, consumes one attempt. Most failures
    /// in this narrow read/insert/delete path are contention, and a transient
    /// backend hiccup is retried just as cheaply. Only the *final* failure is
    /// classified, so persistent backend outages surface as
    /// [`AllocateError::Store`] rather than masquerading as contention.
    async fn claim_with_retry<S: SleepProvider>(
        &self,
        prefix: &str,
        period: Period,
    ) -> Result<String, AllocateError> {
        let period_prefix = format!("{prefix}-{period}");
        let mut attempts = 0;
        loop {
            match self.claim_next(&period_prefix).await {
                Ok(identifier) => return Ok(identifier),
                Err(e) => {
                    attempts += 1;
                    if attempts >= MAX_CLAIM_ATTEMPTS {
                        return Err(match e {
                            StoreError::Duplicate { identifier } => AllocateError::Contended {
                                attempts,
                                identifier,
                            },
                            other => AllocateError::Store(other),
                        });
                    }
                    tracing::debug!(attempt = attempts, error = %e, "claim failed; backing off");
                    S::sleep_for(BASE_BACKOFF * 2u32.pow(attempts)).await;
                }
            }
        }
    }

    /// One pass of the claim protocol: read the greatest identifier in the
    /// period, compute its successor, claim it with a placeholder insert, and
    /// release the placeholder.
    async fn claim_next(&self, period_prefix: &str) -> Result<String, StoreError> {
        let latest = self.store.latest_identifier(period_prefix).await?;
        let next = latest
            .as_deref()
            .and_then(parse_sequence)
            .map_or(1, |n| n + 1);
        let candidate = format!("{period_prefix}-{next:0width$}", width = SEQUENCE_PAD_WIDTH);

        self.store
            .insert_placeholder(&candidate, self.time.current_millis())
            .await?;
        self.store.delete_placeholder(&candidate).await?;
        Ok(candidate)
    }

    /// `PREFIX-YYYYMM-T<last 6 digits of unix millis><2-digit random>`.
    fn contention_fallback(&self, prefix: &str, period: Period) -> String {
        let millis = self.time.current_millis() % 1_000_000;
        let random = self.rand.rand() % 100;
        format!("{prefix}-{period}-T{millis:06}{random:02}")
    }

    /// `PREFIX-YYYYMM-E<unix millis>`. The path of last resort: built from
    /// nothing but the clock, so it cannot fail.
    fn emergency_fallback(&self, prefix: &str, period: Period) -> String {
        format!("{prefix}-{period}-E{}", self.time.current_millis())
    }
}

/// Parses the trailing `-NNN` sequence suffix of a full identifier.
///
/// Returns `None` for non-numeric suffixes, such as the `T`/`E` fallback
/// forms. A period whose greatest row carries one of those restarts the
/// sequence at 1, exactly like an empty period.
fn parse_sequence(identifier: &str) -> Option<u64> {
    identifier.rsplit('-').next()?.parse().ok()
}
