use std::sync::Arc;

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

use pagedb::common::{DbError, PageId, SharedPageStore, NODE_HEADER_SIZE, PAGE_SIZE};
use pagedb::index::{BTreeIndex, BTreeNode, BTreeNodeRef};
use pagedb::storage::disk::PageStore;

use tempfile::NamedTempFile;

fn create_store() -> (SharedPageStore, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let store = Arc::new(Mutex::new(PageStore::open(temp_file.path()).unwrap()));
    (store, temp_file)
}

#[test]
fn test_btree_create() {
    let (store, temp) = create_store();
    let index = BTreeIndex::create(store.clone()).unwrap();

    assert_eq!(index.root_page_id(), PageId::new(0));
    assert!(index.scan().unwrap().is_empty());
    // the empty root is flushed right away
    assert_eq!(
        std::fs::metadata(temp.path()).unwrap().len(),
        PAGE_SIZE as u64
    );
}

#[test]
fn test_btree_insert_and_search() {
    let (store, _temp) = create_store();
    let index = BTreeIndex::create(store).unwrap();

    index.insert(b"banana", b"2").unwrap();
    index.insert(b"apple", b"1").unwrap();
    index.insert(b"cherry", b"3").unwrap();

    assert_eq!(index.search(b"apple").unwrap(), b"1");
    assert_eq!(index.search(b"banana").unwrap(), b"2");
    assert_eq!(index.search(b"cherry").unwrap(), b"3");
    assert!(matches!(index.search(b"durian"), Err(DbError::KeyNotFound)));
}

#[test]
fn test_btree_survives_reopen() {
    let temp_file = NamedTempFile::new().unwrap();

    let root = {
        let store = Arc::new(Mutex::new(PageStore::open(temp_file.path()).unwrap()));
        let index = BTreeIndex::create(store).unwrap();
        index.insert(b"k1", b"v1").unwrap();
        index.insert(b"k2", b"v2").unwrap();
        index.root_page_id()
    };

    let store = Arc::new(Mutex::new(PageStore::open(temp_file.path()).unwrap()));
    let index = BTreeIndex::open(root, store);
    assert_eq!(index.search(b"k2").unwrap(), b"v2");
    assert_eq!(
        index.scan().unwrap(),
        vec![
            (b"k1".to_vec(), b"v1".to_vec()),
            (b"k2".to_vec(), b"v2".to_vec())
        ]
    );
}

#[test]
fn test_btree_random_order_stays_sorted() {
    let (store, _temp) = create_store();
    let index = BTreeIndex::create(store.clone()).unwrap();

    let mut keys: Vec<Vec<u8>> = (0..200u32)
        .map(|i| format!("key-{:04}", i * 7 % 200).into_bytes())
        .collect();
    keys.shuffle(&mut StdRng::seed_from_u64(42));

    for key in &keys {
        index.insert(key, b"v").unwrap();
    }

    let scanned: Vec<Vec<u8>> = index.scan().unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(scanned.len(), keys.len());
    assert!(scanned.windows(2).all(|w| w[0] <= w[1]));

    let mut store = store.lock();
    let page = store.get_page(index.root_page_id()).unwrap();
    assert_eq!(BTreeNodeRef::new(page).key_count() as usize, keys.len());
}

#[test]
fn test_btree_full_leaf_is_reported() {
    let (store, _temp) = create_store();
    let index = BTreeIndex::create(store.clone()).unwrap();

    let value = vec![0xABu8; 1000];
    let mut inserted = 0;
    let err = loop {
        match index.insert(format!("{inserted:03}").as_bytes(), &value) {
            Ok(()) => inserted += 1,
            Err(e) => break e,
        }
    };

    // each record takes 2 + 3 + 2 + 1000 bytes
    assert_eq!(inserted, (PAGE_SIZE - NODE_HEADER_SIZE) / 1007);
    assert!(matches!(err, DbError::NodeFull { needed: 1007, .. }));
    assert_eq!(index.scan().unwrap().len(), inserted);
}

#[test]
fn test_btree_rejects_internal_root() {
    let (store, _temp) = create_store();
    let root = {
        let mut store = store.lock();
        let root = store.allocate_page();
        BTreeNode::new(store.get_page(root).unwrap()).init_internal();
        store.flush_page(root).unwrap();
        root
    };

    let index = BTreeIndex::open(root, store);
    assert!(matches!(index.insert(b"a", b"b"), Err(DbError::NotALeaf(p)) if p == root));
    assert!(matches!(index.search(b"a"), Err(DbError::NotALeaf(_))));
}
