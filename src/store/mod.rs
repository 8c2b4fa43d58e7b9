//! Recipe store interfaces and local adapters.
//!
//! Ownership model:
//! - `RecipeStore` is the query-facing interface (ping / count / find).
//! - `RecordCursor` streams raw documents in store order. A cursor owns its
//!   underlying handle and must release it in `close`; callers are expected
//!   to close cursors on every exit path (see `selector::select_recipes`).

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::constants::store::JSONL_EXTENSION;
use crate::errors::MenuError;
use crate::types::{Document, StoreId};

/// Directory-of-files store.
pub mod dir;
/// Newline-delimited JSON file store.
pub mod jsonl;

pub use dir::JsonDirStore;
pub use jsonl::JsonLinesStore;

/// Query filter accepted by stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordFilter {
    /// Every record in the collection.
    #[default]
    All,
}

/// Forward-only stream of raw documents.
pub trait RecordCursor {
    /// Next document, `None` when the stream is exhausted.
    ///
    /// A malformed document is reported as `MenuError::Decode`.
    fn next_document(&mut self) -> Option<Result<Document, MenuError>>;

    /// Release the underlying handle. Must be safe to call more than once.
    fn close(&mut self) {}
}

/// Document store holding recipe records.
pub trait RecipeStore {
    /// Identifier used in logs and errors.
    fn id(&self) -> &str;

    /// Verify the store is reachable before any work is done.
    fn ping(&self) -> Result<(), MenuError>;

    /// Number of records matching `filter`.
    ///
    /// Keep this consistent with `find` for the same filter; the sampler
    /// draws positions from `0..count`.
    fn count(&self, filter: &RecordFilter) -> Result<u64, MenuError>;

    /// Open a cursor over the records matching `filter`, in store order.
    fn find<'a>(&'a self, filter: &RecordFilter) -> Result<Box<dyn RecordCursor + 'a>, MenuError>;
}

/// Open the store at `path`: a `.jsonl` file or a directory of `.json` files.
pub fn open_store(path: &Path) -> Result<Box<dyn RecipeStore>, MenuError> {
    if path.is_dir() {
        return Ok(Box::new(JsonDirStore::new(path)));
    }
    let is_jsonl = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(JSONL_EXTENSION))
        .unwrap_or(false);
    if is_jsonl {
        return Ok(Box::new(JsonLinesStore::new(path)));
    }
    Err(MenuError::Configuration(format!(
        "unsupported recipe store '{}': expected a .{} file or a directory",
        path.display(),
        JSONL_EXTENSION
    )))
}

/// In-memory store over prebuilt documents.
///
/// Counts opened and closed cursors so callers can check that every cursor
/// was released.
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    id: StoreId,
    documents: Arc<Vec<Document>>,
    unavailable: Option<String>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Create a store from documents in stream order.
    pub fn new(id: impl Into<StoreId>, documents: Vec<Document>) -> Self {
        Self {
            id: id.into(),
            documents: Arc::new(documents),
            unavailable: None,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a store whose `ping` fails with `reason`.
    pub fn unreachable(id: impl Into<StoreId>, reason: impl Into<String>) -> Self {
        let mut store = Self::new(id, Vec::new());
        store.unavailable = Some(reason.into());
        store
    }

    /// Cursors handed out so far.
    pub fn cursors_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Cursors released so far.
    pub fn cursors_closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl RecipeStore for InMemoryStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn ping(&self) -> Result<(), MenuError> {
        match &self.unavailable {
            Some(reason) => Err(MenuError::StoreUnavailable {
                store: self.id.clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn count(&self, _filter: &RecordFilter) -> Result<u64, MenuError> {
        self.ping()?;
        Ok(self.documents.len() as u64)
    }

    fn find<'a>(&'a self, _filter: &RecordFilter) -> Result<Box<dyn RecordCursor + 'a>, MenuError> {
        self.ping()?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryCursor {
            documents: self.documents.as_slice(),
            next: 0,
            closed: Some(self.closed.as_ref()),
        }))
    }
}

struct InMemoryCursor<'a> {
    documents: &'a [Document],
    next: usize,
    closed: Option<&'a AtomicUsize>,
}

impl RecordCursor for InMemoryCursor<'_> {
    fn next_document(&mut self) -> Option<Result<Document, MenuError>> {
        if self.closed.is_none() {
            return None;
        }
        let document = self.documents.get(self.next)?.clone();
        self.next += 1;
        Some(Ok(document))
    }

    fn close(&mut self) {
        if let Some(counter) = self.closed.take() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn in_memory_cursor_streams_in_order_and_closes_once() {
        let store = InMemoryStore::new("mem", vec![json!({"Name": "a"}), json!({"Name": "b"})]);
        assert_eq!(store.count(&RecordFilter::All).unwrap(), 2);

        let mut cursor = store.find(&RecordFilter::All).unwrap();
        let first = cursor.next_document().unwrap().unwrap();
        assert_eq!(first["Name"], "a");
        cursor.close();
        cursor.close();
        assert!(cursor.next_document().is_none());
        assert_eq!(store.cursors_opened(), 1);
        assert_eq!(store.cursors_closed(), 1);
    }

    #[test]
    fn unreachable_store_fails_ping_and_queries() {
        let store = InMemoryStore::unreachable("mem", "connection refused");
        assert!(matches!(store.ping(), Err(MenuError::StoreUnavailable { .. })));
        assert!(store.count(&RecordFilter::All).is_err());
        assert!(store.find(&RecordFilter::All).is_err());
    }

    #[test]
    fn open_store_rejects_unknown_extensions() {
        let err = open_store(Path::new("recipes.csv")).err().unwrap();
        assert!(matches!(err, MenuError::Configuration(_)));
        assert!(open_store(Path::new("recipes.jsonl")).is_ok());
    }
}
