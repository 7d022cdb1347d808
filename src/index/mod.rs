pub mod btree_index;
pub mod btree_page;

pub use btree_index::BTreeIndex;
pub use btree_page::{BTreeNode, BTreeNodeRef, LeafRecord, LeafRecords, NodeHeader, NodeType};
