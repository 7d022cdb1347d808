use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::storage::disk::PageStore;

/// Page identifier type - uniquely identifies a page within one storage file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Byte offset of this page inside its storage file.
    pub fn file_offset(&self) -> u64 {
        self.0 as u64 * super::PAGE_SIZE as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({})", self.0)
    }
}

/// A page store shared between owners. One mutex guards the whole store,
/// and it is held for a single operation at a time.
pub type SharedPageStore = Arc<Mutex<PageStore>>;

/// A decoded heap row: an ordered list of string fields.
pub type Row = Vec<String>;
