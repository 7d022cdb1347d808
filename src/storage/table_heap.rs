use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::common::{DbError, PageId, Result, Row, SharedPageStore, PAGE_SIZE};
use crate::storage::disk::PageStore;
use crate::storage::page::{HeapPage, HeapPageRef};
use crate::tuple::serialize_row;

/// TableHeap stores the rows of one table as a run of heap pages.
///
/// Rows are appended to the tail of page 0. When page 0 has no room left the
/// row goes to a freshly allocated page, even if an earlier overflow page
/// still has space. Rows are never updated or deleted in place.
pub struct TableHeap {
    store: SharedPageStore,
}

impl TableHeap {
    pub fn new(store: SharedPageStore) -> Self {
        Self { store }
    }

    /// Opens (or creates) the heap file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Arc::new(Mutex::new(PageStore::open(path)?))))
    }

    /// Returns the page store backing this heap.
    pub fn store(&self) -> &SharedPageStore {
        &self.store
    }

    /// Appends a row and flushes the page it landed on.
    /// Returns the number of that page.
    pub fn insert_row<S: AsRef<str>>(&self, fields: &[S]) -> Result<PageId> {
        let encoded = serialize_row(fields)?;
        let mut store = self.store.lock();

        if store.page_count() == 0 {
            store.allocate_page();
        }

        let first_page = PageId::new(0);
        let page_id = if HeapPage::new(store.get_page(first_page)?)
            .append_row(&encoded)
            .is_some()
        {
            first_page
        } else {
            let page_id = store.allocate_page();
            HeapPage::new(store.get_page(page_id)?)
                .append_row(&encoded)
                .ok_or(DbError::DataExceedsPageSize {
                    len: encoded.len(),
                    page_size: PAGE_SIZE,
                })?;
            page_id
        };

        store.flush_page(page_id)?;
        debug!(page = page_id.as_u32(), bytes = encoded.len(), "inserted row");
        Ok(page_id)
    }

    /// Reads every row of every page, in page order.
    pub fn read_all_rows(&self) -> Result<Vec<Row>> {
        let mut store = self.store.lock();
        let mut rows = Vec::new();
        for page_num in 0..store.page_count() {
            let page = store.get_page(PageId::new(page_num))?;
            rows.extend(HeapPageRef::new(page).rows());
        }
        Ok(rows)
    }
}
