use crate::common::{Row, PAGE_SIZE};
use crate::tuple::{deserialize_row, ROW_LENGTH_SIZE};

/// Heap page layout:
///
/// +------------------+
/// | [row 0]          |  u16 LE length + payload
/// | [row 1]          |
/// | ...              |
/// +------------------+
/// | Zero bytes       |  unused tail
/// +------------------+
///
/// There is no page header. Rows are packed back to back from offset 0 and
/// the first zero length prefix marks the end of the data.
pub struct HeapPage<'a> {
    data: &'a mut [u8],
}

impl<'a> HeapPage<'a> {
    /// Creates a new HeapPage view over the given data buffer.
    /// The buffer must be exactly PAGE_SIZE bytes.
    pub fn new(data: &'a mut [u8]) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    /// Returns the offset at which the next row would be written.
    pub fn used_space(&self) -> usize {
        HeapPageRef::new(&self.data[..]).used_space()
    }

    /// Returns the number of bytes left after the last row.
    pub fn free_space(&self) -> usize {
        PAGE_SIZE - self.used_space()
    }

    /// Appends an encoded row after the last row on the page.
    /// Returns the offset it was written at, or `None` if it doesn't fit.
    pub fn append_row(&mut self, encoded: &[u8]) -> Option<usize> {
        let offset = self.used_space();
        if offset + encoded.len() > PAGE_SIZE {
            return None;
        }
        self.data[offset..offset + encoded.len()].copy_from_slice(encoded);
        Some(offset)
    }
}

/// Read-only view over a heap page.
pub struct HeapPageRef<'a> {
    data: &'a [u8],
}

impl<'a> HeapPageRef<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    /// Walks the row chain from offset 0 and returns where it ends.
    pub fn used_space(&self) -> usize {
        let mut offset = 0;
        while offset + ROW_LENGTH_SIZE <= PAGE_SIZE {
            // End of data is a zero length prefix, not the first zero byte:
            // a payload of 256 * n bytes has a prefix starting with 0x00.
            if self.data[offset] == 0 && self.data[offset + 1] == 0 {
                break;
            }
            match deserialize_row(&self.data[offset..]) {
                Some((_, consumed)) => offset += consumed,
                None => break,
            }
        }
        offset
    }

    /// Decodes the rows stored on this page.
    ///
    /// Scanning stops at the end sentinel, at an undecodable row, or at a row
    /// whose first field is empty.
    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        let mut offset = 0;
        while offset < PAGE_SIZE {
            let Some((row, consumed)) = deserialize_row(&self.data[offset..]) else {
                break;
            };
            if row.first().map_or(true, |field| field.is_empty()) {
                break;
            }
            rows.push(row);
            offset += consumed;
        }
        rows
    }
}
