use tracing::debug;

use crate::common::{DbError, PageId, Result, SharedPageStore};

use super::btree_page::{BTreeNode, BTreeNodeRef};

/// Single-leaf B-tree over byte-string keys.
///
/// The root page must be a leaf. Internal-node routing and node splitting are
/// not implemented: a non-leaf root fails with `NotALeaf`, and a full leaf
/// fails with `NodeFull`.
pub struct BTreeIndex {
    root_page_id: PageId,
    store: SharedPageStore,
}

impl BTreeIndex {
    /// Allocates a fresh root page, stamps it as an empty leaf and flushes it.
    pub fn create(store: SharedPageStore) -> Result<Self> {
        let root_page_id = {
            let mut store = store.lock();
            let root_page_id = store.allocate_page();
            BTreeNode::new(store.get_page(root_page_id)?).init_leaf();
            store.flush_page(root_page_id)?;
            root_page_id
        };
        debug!(root = root_page_id.as_u32(), "created btree");

        Ok(Self {
            root_page_id,
            store,
        })
    }

    /// Attaches to an existing root page.
    pub fn open(root_page_id: PageId, store: SharedPageStore) -> Self {
        Self {
            root_page_id,
            store,
        }
    }

    pub fn root_page_id(&self) -> PageId {
        self.root_page_id
    }

    /// Inserts a key/value pair into the root leaf and flushes it.
    pub fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut store = self.store.lock();
        let mut node = BTreeNode::new(store.get_page(self.root_page_id)?);
        if !node.is_leaf() {
            return Err(DbError::NotALeaf(self.root_page_id));
        }
        node.insert(key, value)?;
        store.flush_page(self.root_page_id)
    }

    /// Returns the value of the first record whose key equals `key`.
    pub fn search(&self, key: &[u8]) -> Result<Vec<u8>> {
        let mut store = self.store.lock();
        let node = BTreeNodeRef::new(store.get_page(self.root_page_id)?);
        if !node.is_leaf() {
            return Err(DbError::NotALeaf(self.root_page_id));
        }
        let value = node.search(key)?.map(|value| value.to_vec());
        value.ok_or(DbError::KeyNotFound)
    }

    /// Returns every record of the root leaf in key order.
    pub fn scan(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut store = self.store.lock();
        let node = BTreeNodeRef::new(store.get_page(self.root_page_id)?);
        if !node.is_leaf() {
            return Err(DbError::NotALeaf(self.root_page_id));
        }
        let entries = node
            .entries()?
            .into_iter()
            .map(|(key, value)| (key.to_vec(), value.to_vec()))
            .collect();
        Ok(entries)
    }
}
