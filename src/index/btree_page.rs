use bytes::{Buf, BufMut};
use tracing::warn;

use crate::common::{DbError, Result, NODE_HEADER_SIZE, PAGE_SIZE};

/// Node page layout:
///
/// | Field          | Offset | Size |
/// |----------------|--------|------|
/// | node_type      | 0      | 1    |
/// | key_count      | 1      | 2    |
/// | parent_page    | 3      | 4    |
/// | next_leaf_page | 7      | 4    |
/// | records        | 11     | ...  |
///
/// Each leaf record is `key_len (u16) | key | value_len (u16) | value`, all
/// integers little-endian. Records are packed back to back in ascending
/// byte-wise key order. Used and free space are recomputed from the record
/// chain on demand and never stored.
const NODE_TYPE_OFFSET: usize = 0;
const KEY_COUNT_OFFSET: usize = 1;
const PARENT_PAGE_OFFSET: usize = 3;
const NEXT_LEAF_OFFSET: usize = 7;

const LEN_SIZE: usize = 2;

/// Kind of B-tree node stored in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Leaf = 0,
    Internal = 1,
}

impl From<u8> for NodeType {
    /// Anything other than the leaf tag is treated as an internal node.
    fn from(tag: u8) -> Self {
        if tag == NodeType::Leaf as u8 {
            NodeType::Leaf
        } else {
            NodeType::Internal
        }
    }
}

/// Decoded copy of the fixed header at the start of a node page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub node_type: NodeType,
    pub key_count: u16,
    pub parent_page: u32,
    /// Only meaningful for leaf nodes
    pub next_leaf_page: u32,
}

impl NodeHeader {
    pub fn empty(node_type: NodeType) -> Self {
        Self {
            node_type,
            key_count: 0,
            parent_page: 0,
            next_leaf_page: 0,
        }
    }

    pub fn read(data: &[u8]) -> Self {
        Self {
            node_type: NodeType::from(data[NODE_TYPE_OFFSET]),
            key_count: (&data[KEY_COUNT_OFFSET..]).get_u16_le(),
            parent_page: (&data[PARENT_PAGE_OFFSET..]).get_u32_le(),
            next_leaf_page: (&data[NEXT_LEAF_OFFSET..]).get_u32_le(),
        }
    }

    pub fn write(&self, data: &mut [u8]) {
        data[NODE_TYPE_OFFSET] = self.node_type as u8;
        (&mut data[KEY_COUNT_OFFSET..]).put_u16_le(self.key_count);
        (&mut data[PARENT_PAGE_OFFSET..]).put_u32_le(self.parent_page);
        (&mut data[NEXT_LEAF_OFFSET..]).put_u32_le(self.next_leaf_page);
    }
}

/// One key/value record inside a leaf page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafRecord<'a> {
    /// Offset of the record's first byte
    pub offset: usize,
    pub key: &'a [u8],
    pub value: &'a [u8],
    /// Offset just past the record
    pub end: usize,
}

impl LeafRecord<'_> {
    /// Encoded size of a record holding `key` and `value`.
    pub fn encoded_len(key: &[u8], value: &[u8]) -> usize {
        LEN_SIZE + key.len() + LEN_SIZE + value.len()
    }
}

fn read_len(data: &[u8], offset: usize) -> Result<usize> {
    if offset + LEN_SIZE > data.len() {
        return Err(DbError::IndexCorrupted(format!(
            "length prefix at offset {offset} runs past the page end"
        )));
    }
    Ok((&data[offset..]).get_u16_le() as usize)
}

fn read_record(data: &[u8], offset: usize) -> Result<LeafRecord<'_>> {
    let key_len = read_len(data, offset)?;
    let key_start = offset + LEN_SIZE;
    let value_len = read_len(data, key_start + key_len)?;
    let value_start = key_start + key_len + LEN_SIZE;
    let end = value_start + value_len;
    if end > data.len() {
        return Err(DbError::IndexCorrupted(format!(
            "record at offset {offset} runs past the page end"
        )));
    }

    Ok(LeafRecord {
        offset,
        key: &data[key_start..key_start + key_len],
        value: &data[value_start..end],
        end,
    })
}

/// Iterator over the records of a leaf page, in stored order.
///
/// Yields exactly `key_count` records, or stops after the first error.
pub struct LeafRecords<'a> {
    data: &'a [u8],
    offset: usize,
    remaining: u16,
}

impl<'a> Iterator for LeafRecords<'a> {
    type Item = Result<LeafRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        match read_record(self.data, self.offset) {
            Ok(record) => {
                self.offset = record.end;
                Some(Ok(record))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

/// Read-only view over a node page.
pub struct BTreeNodeRef<'a> {
    data: &'a [u8],
}

impl<'a> BTreeNodeRef<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    pub fn header(&self) -> NodeHeader {
        NodeHeader::read(self.data)
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::from(self.data[NODE_TYPE_OFFSET])
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type() == NodeType::Leaf
    }

    pub fn key_count(&self) -> u16 {
        self.header().key_count
    }

    pub fn parent_page(&self) -> u32 {
        self.header().parent_page
    }

    pub fn next_leaf_page(&self) -> u32 {
        self.header().next_leaf_page
    }

    /// Iterates over the records in stored (ascending key) order.
    pub fn records(&self) -> LeafRecords<'a> {
        LeafRecords {
            data: self.data,
            offset: NODE_HEADER_SIZE,
            remaining: self.key_count(),
        }
    }

    /// Returns all `(key, value)` pairs in stored order.
    pub fn entries(&self) -> Result<Vec<(&'a [u8], &'a [u8])>> {
        self.records()
            .map(|record| record.map(|r| (r.key, r.value)))
            .collect()
    }

    /// Linear scan for the first record whose key equals `key`.
    pub fn search(&self, key: &[u8]) -> Result<Option<&'a [u8]>> {
        for record in self.records() {
            let record = record?;
            if record.key == key {
                return Ok(Some(record.value));
            }
        }
        Ok(None)
    }

    /// Offset just past the last record.
    fn data_end(&self) -> Result<usize> {
        let mut end = NODE_HEADER_SIZE;
        for record in self.records() {
            end = record?.end;
        }
        Ok(end)
    }

    /// Bytes occupied by records, excluding the header.
    pub fn used_space(&self) -> Result<usize> {
        Ok(self.data_end()? - NODE_HEADER_SIZE)
    }

    /// Bytes left for new records.
    pub fn free_space(&self) -> Result<usize> {
        Ok(PAGE_SIZE - self.data_end()?)
    }
}

/// Mutable view over a node page.
pub struct BTreeNode<'a> {
    data: &'a mut [u8],
}

impl<'a> BTreeNode<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    /// Stamps an empty leaf header. The record area is left as is.
    pub fn init_leaf(&mut self) {
        NodeHeader::empty(NodeType::Leaf).write(self.data);
    }

    /// Stamps an empty internal header. Nothing routes through internal
    /// nodes yet; the tag only makes leaf-only operations refuse the page.
    pub fn init_internal(&mut self) {
        NodeHeader::empty(NodeType::Internal).write(self.data);
    }

    pub fn view(&self) -> BTreeNodeRef<'_> {
        BTreeNodeRef::new(&self.data[..])
    }

    pub fn is_leaf(&self) -> bool {
        self.view().is_leaf()
    }

    pub fn key_count(&self) -> u16 {
        self.view().key_count()
    }

    pub fn set_parent_page(&mut self, page: u32) {
        (&mut self.data[PARENT_PAGE_OFFSET..]).put_u32_le(page);
    }

    pub fn set_next_leaf_page(&mut self, page: u32) {
        (&mut self.data[NEXT_LEAF_OFFSET..]).put_u32_le(page);
    }

    fn set_key_count(&mut self, count: u16) {
        (&mut self.data[KEY_COUNT_OFFSET..]).put_u16_le(count);
    }

    /// Inserts a record in key order.
    ///
    /// The new record goes in front of the first record whose key is not less
    /// than `key`, so a duplicate lands before the existing equal key. Records
    /// after it are shifted right in place. When the record does not fit the
    /// page is left untouched and `NodeFull` is returned.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let needed = LeafRecord::encoded_len(key, value);

        let (pos, end) = {
            let node = self.view();
            let mut pos = None;
            let mut end = NODE_HEADER_SIZE;
            for record in node.records() {
                let record = record?;
                if pos.is_none() && record.key >= key {
                    pos = Some(record.offset);
                }
                end = record.end;
            }
            (pos.unwrap_or(end), end)
        };

        let available = PAGE_SIZE - end;
        if needed > available {
            warn!(needed, available, "leaf node full");
            return Err(DbError::NodeFull { needed, available });
        }

        self.data.copy_within(pos..end, pos + needed);

        let mut buf = &mut self.data[pos..pos + needed];
        buf.put_u16_le(key.len() as u16);
        buf.put_slice(key);
        buf.put_u16_le(value.len() as u16);
        buf.put_slice(value);

        let count = self.key_count();
        self.set_key_count(count + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(data: &[u8]) -> Vec<Vec<u8>> {
        BTreeNodeRef::new(data)
            .entries()
            .unwrap()
            .into_iter()
            .map(|(k, _)| k.to_vec())
            .collect()
    }

    #[test]
    fn test_header_layout() {
        let mut data = [0xAAu8; PAGE_SIZE];
        let mut node = BTreeNode::new(&mut data);
        node.init_leaf();
        node.set_parent_page(0x0102_0304);
        node.set_next_leaf_page(7);
        node.insert(b"k", b"v").unwrap();

        assert_eq!(data[0], 0);
        assert_eq!(&data[1..3], &[1, 0]);
        assert_eq!(&data[3..7], &[4, 3, 2, 1]);
        assert_eq!(&data[7..11], &[7, 0, 0, 0]);
        assert_eq!(&data[11..17], &[1, 0, b'k', 1, 0, b'v']);
    }

    #[test]
    fn test_init_internal() {
        let mut data = [0u8; PAGE_SIZE];
        let mut node = BTreeNode::new(&mut data);
        node.init_internal();

        assert!(!node.is_leaf());
        assert_eq!(
            node.view().header(),
            NodeHeader::empty(NodeType::Internal)
        );
    }

    #[test]
    fn test_insert_keeps_keys_sorted() {
        let mut data = [0u8; PAGE_SIZE];
        let mut node = BTreeNode::new(&mut data);
        node.init_leaf();

        let inserted: [&[u8]; 5] = [b"delta", b"alpha", b"charlie", b"bravo", b"echo"];
        for key in inserted {
            node.insert(key, b"x").unwrap();
        }

        assert_eq!(node.key_count(), 5);
        assert_eq!(
            keys(&data),
            vec![
                b"alpha".to_vec(),
                b"bravo".to_vec(),
                b"charlie".to_vec(),
                b"delta".to_vec(),
                b"echo".to_vec()
            ]
        );
    }

    #[test]
    fn test_duplicate_goes_before_existing_key() {
        let mut data = [0u8; PAGE_SIZE];
        let mut node = BTreeNode::new(&mut data);
        node.init_leaf();
        node.insert(b"a", b"old").unwrap();
        node.insert(b"b", b"other").unwrap();
        node.insert(b"a", b"new").unwrap();

        let view = BTreeNodeRef::new(&data);
        let entries = view.entries().unwrap();
        assert_eq!(entries[0], (b"a".as_slice(), b"new".as_slice()));
        assert_eq!(entries[1], (b"a".as_slice(), b"old".as_slice()));
        assert_eq!(view.search(b"a").unwrap(), Some(b"new".as_slice()));
    }

    #[test]
    fn test_space_accounting() {
        let mut data = [0u8; PAGE_SIZE];
        let mut node = BTreeNode::new(&mut data);
        node.init_leaf();
        assert_eq!(node.view().used_space().unwrap(), 0);
        assert_eq!(node.view().free_space().unwrap(), PAGE_SIZE - NODE_HEADER_SIZE);

        node.insert(b"abc", b"12345").unwrap();
        assert_eq!(node.view().used_space().unwrap(), 12);
        assert_eq!(
            node.view().free_space().unwrap(),
            PAGE_SIZE - NODE_HEADER_SIZE - 12
        );
    }

    #[test]
    fn test_full_node_is_left_unchanged() {
        let mut data = [0u8; PAGE_SIZE];
        let mut node = BTreeNode::new(&mut data);
        node.init_leaf();
        node.insert(b"a", &[1u8; 3000]).unwrap();

        let free = node.view().free_space().unwrap();
        let before = data;

        let mut node = BTreeNode::new(&mut data);
        let err = node.insert(b"b", &[2u8; 2000]).unwrap_err();
        assert!(matches!(
            err,
            DbError::NodeFull { needed: 2005, available } if available == free
        ));
        assert_eq!(data, before);
    }

    #[test]
    fn test_record_that_exactly_fills_page() {
        let mut data = [0u8; PAGE_SIZE];
        let mut node = BTreeNode::new(&mut data);
        node.init_leaf();

        let value = vec![9u8; PAGE_SIZE - NODE_HEADER_SIZE - 5];
        node.insert(b"k", &value).unwrap();
        assert_eq!(node.view().free_space().unwrap(), 0);
        assert!(node.insert(b"", b"").is_err());
    }

    #[test]
    fn test_corrupt_record_chain_is_reported() {
        let mut data = [0u8; PAGE_SIZE];
        let mut node = BTreeNode::new(&mut data);
        node.init_leaf();
        data[1] = 1;
        data[11..13].copy_from_slice(&u16::MAX.to_le_bytes());

        let view = BTreeNodeRef::new(&data);
        assert!(matches!(view.entries(), Err(DbError::IndexCorrupted(_))));
        assert!(matches!(view.search(b"x"), Err(DbError::IndexCorrupted(_))));
    }
}
