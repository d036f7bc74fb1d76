use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::{DocumentStatus, DocumentStore, StoreError, StoreResult};

/// A single row in the shared document table.
///
/// Placeholders and real documents live side by side; only the status marker
/// and sentinel totals tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub identifier: String,
    pub status: DocumentStatus,
    /// Monetary total in cents. Zero on placeholder rows.
    pub total_cents: i64,
    pub created_at_millis: u64,
}

impl DocumentRecord {
    /// A sentinel-valued draft row used solely to claim `identifier`.
    pub fn placeholder(identifier: &str, created_at_millis: u64) -> Self {
        Self {
            identifier: identifier.to_owned(),
            status: DocumentStatus::Draft,
            total_cents: 0,
            created_at_millis,
        }
    }

    /// A finalized document row, as written by a caller promoting an
    /// allocated identifier.
    pub fn finalized(identifier: &str, total_cents: i64, created_at_millis: u64) -> Self {
        Self {
            identifier: identifier.to_owned(),
            status: DocumentStatus::Final,
            total_cents,
            created_at_millis,
        }
    }

    fn is_placeholder(&self) -> bool {
        self.status == DocumentStatus::Draft && self.total_cents == 0
    }
}

/// An in-process [`DocumentStore`] over an ordered map.
///
/// The map key doubles as the unique identifier column, so insertion into an
/// occupied key reports [`StoreError::Duplicate`] exactly like a relational
/// unique index would. Suitable for tests and for embedders that do not need
/// durability.
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<BTreeMap<String, DocumentRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a finalized document row, e.g. when a caller promotes an
    /// allocated identifier into a real invoice. Subject to the same
    /// uniqueness constraint as placeholder inserts.
    ///
    /// # Errors
    ///
    /// [`StoreError::Duplicate`] when the identifier is already taken.
    pub fn insert_document(&self, record: DocumentRecord) -> StoreResult<()> {
        let mut rows = self.rows.lock();
        if rows.contains_key(&record.identifier) {
            return Err(StoreError::Duplicate {
                identifier: record.identifier,
            });
        }
        rows.insert(record.identifier.clone(), record);
        Ok(())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.rows.lock().contains_key(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<DocumentRecord> {
        self.rows.lock().get(identifier).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

impl DocumentStore for InMemoryStore {
    fn latest_identifier(
        &self,
        period_prefix: &str,
    ) -> impl Future<Output = StoreResult<Option<String>>> + Send {
        let pattern = format!("{period_prefix}-");
        let rows = self.rows.lock();
        let found = rows
            .range(pattern.clone()..)
            .take_while(|(identifier, _)| identifier.starts_with(&pattern))
            .last()
            .map(|(identifier, _)| identifier.clone());
        drop(rows);
        core::future::ready(Ok(found))
    }

    fn insert_placeholder(
        &self,
        identifier: &str,
        created_at_millis: u64,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        let mut rows = self.rows.lock();
        let result = if rows.contains_key(identifier) {
            Err(StoreError::Duplicate {
                identifier: identifier.to_owned(),
            })
        } else {
            rows.insert(
                identifier.to_owned(),
                DocumentRecord::placeholder(identifier, created_at_millis),
            );
            Ok(())
        };
        drop(rows);
        core::future::ready(result)
    }

    fn delete_placeholder(&self, identifier: &str) -> impl Future<Output = StoreResult<()>> + Send {
        let mut rows = self.rows.lock();
        if rows
            .get(identifier)
            .is_some_and(DocumentRecord::is_placeholder)
        {
            rows.remove(identifier);
        }
        drop(rows);
        core::future::ready(Ok(()))
    }
}
