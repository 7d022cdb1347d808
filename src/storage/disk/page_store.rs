use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::{DbError, PageId, Result, PAGE_SIZE};

type PageBuf = Box<[u8; PAGE_SIZE]>;

/// PageStore owns a single storage file and mediates all page I/O on it.
///
/// Pages are cached by page number for the lifetime of the store; there is no
/// eviction. Callers borrow a cached buffer through [`PageStore::get_page`]
/// for the span of one operation and persist it with
/// [`PageStore::flush_page`]. Nothing is written to disk implicitly, and
/// writes are plain `write` calls without `fsync`.
pub struct PageStore {
    /// The backing file
    file: File,
    /// Path to the backing file
    path: PathBuf,
    /// Cached page buffers, keyed by page number
    pages: HashMap<PageId, PageBuf>,
    /// Next page number handed out by `allocate_page`
    max_page: u32,
    /// Number of pages read from disk
    num_reads: u32,
    /// Number of pages written to disk
    num_writes: u32,
}

impl PageStore {
    /// Opens the storage file at `path`, creating it if it doesn't exist.
    /// The page count is derived from the current file length.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let file_size = file.metadata()?.len();
        let max_page = (file_size / PAGE_SIZE as u64) as u32;
        debug!(path = %path.display(), pages = max_page, "opened page store");

        Ok(Self {
            file,
            path,
            pages: HashMap::new(),
            max_page,
            num_reads: 0,
            num_writes: 0,
        })
    }

    /// Returns the cached buffer for `page_id`, loading it from disk on a miss.
    ///
    /// The returned slice is always `PAGE_SIZE` bytes. Edits made through it
    /// are seen by every later `get_page` of the same page, flushed or not.
    pub fn get_page(&mut self, page_id: PageId) -> Result<&mut [u8]> {
        let page = match self.pages.entry(page_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut buf: PageBuf = Box::new([0u8; PAGE_SIZE]);
                let read = read_zero_filled(&mut self.file, page_id.file_offset(), &mut buf[..])?;
                self.num_reads += 1;
                debug!(page = page_id.as_u32(), bytes = read, "page cache miss");
                entry.insert(buf)
            }
        };
        Ok(&mut page[..])
    }

    /// Writes `data` at the start of page `page_id` on disk.
    ///
    /// `data` may be shorter than a page; bytes after it are left untouched.
    /// A cached copy of the page is updated the same way so it stays coherent
    /// with the file.
    pub fn write_page(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        if data.len() > PAGE_SIZE {
            return Err(DbError::DataExceedsPageSize {
                len: data.len(),
                page_size: PAGE_SIZE,
            });
        }

        write_at(&mut self.file, page_id.file_offset(), data)?;
        self.num_writes += 1;

        if let Some(cached) = self.pages.get_mut(&page_id) {
            cached[..data.len()].copy_from_slice(data);
        }
        if page_id.as_u32() >= self.max_page {
            self.max_page = page_id.as_u32() + 1;
        }
        Ok(())
    }

    /// Persists the cached buffer of `page_id`. A page that was never loaded
    /// has nothing to flush.
    pub fn flush_page(&mut self, page_id: PageId) -> Result<()> {
        let Some(page) = self.pages.get(&page_id) else {
            return Ok(());
        };

        write_at(&mut self.file, page_id.file_offset(), &page[..])?;
        self.num_writes += 1;
        if page_id.as_u32() >= self.max_page {
            self.max_page = page_id.as_u32() + 1;
        }
        debug!(page = page_id.as_u32(), "flushed page");
        Ok(())
    }

    /// Hands out the next unused page number with a zero-filled cache entry.
    /// Nothing reaches the disk until the caller flushes the page. Page
    /// numbers are never reused within a session.
    pub fn allocate_page(&mut self) -> PageId {
        let page_id = PageId::new(self.max_page);
        self.max_page += 1;
        self.pages.insert(page_id, Box::new([0u8; PAGE_SIZE]));
        debug!(page = page_id.as_u32(), "allocated page");
        page_id
    }

    /// Returns the number of pages known to the store, allocated or on disk.
    pub fn page_count(&self) -> u32 {
        self.max_page
    }

    /// Returns the number of page reads that went to disk.
    pub fn num_reads(&self) -> u32 {
        self.num_reads
    }

    /// Returns the number of page writes issued to disk.
    pub fn num_writes(&self) -> u32 {
        self.num_writes
    }

    /// Returns the path to the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Fills `buf` from `offset`, zero-filling whatever lies past end-of-file.
/// Returns the number of bytes actually read.
fn read_zero_filled(file: &mut File, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
    file.seek(SeekFrom::Start(offset))?;

    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf[filled..].fill(0);
    Ok(filled)
}

fn write_at(file: &mut File, offset: u64, data: &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(data)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_page_store_open_empty() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = PageStore::open(temp_file.path()).unwrap();
        assert_eq!(store.page_count(), 0);
        assert_eq!(store.num_reads(), 0);
    }

    #[test]
    fn test_page_store_allocate_does_not_touch_disk() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut store = PageStore::open(temp_file.path()).unwrap();

        assert_eq!(store.allocate_page(), PageId::new(0));
        assert_eq!(store.allocate_page(), PageId::new(1));
        assert_eq!(store.page_count(), 2);
        assert_eq!(store.num_writes(), 0);
        assert_eq!(std::fs::metadata(temp_file.path()).unwrap().len(), 0);

        let page = store.get_page(PageId::new(1)).unwrap();
        assert!(page.iter().all(|&b| b == 0));
        assert_eq!(store.num_reads(), 0);
    }

    #[test]
    fn test_page_store_cache_aliasing() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut store = PageStore::open(temp_file.path()).unwrap();
        let page_id = store.allocate_page();

        store.get_page(page_id).unwrap()[10] = 7;
        assert_eq!(store.get_page(page_id).unwrap()[10], 7);
    }

    #[test]
    fn test_page_store_short_file_is_zero_filled() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), [9u8; 100]).unwrap();

        let mut store = PageStore::open(temp_file.path()).unwrap();
        assert_eq!(store.page_count(), 0);

        let page = store.get_page(PageId::new(0)).unwrap();
        assert_eq!(page.len(), PAGE_SIZE);
        assert!(page[..100].iter().all(|&b| b == 9));
        assert!(page[100..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_page_store_write_keeps_cache_coherent() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut store = PageStore::open(temp_file.path()).unwrap();
        let page_id = store.allocate_page();
        store.get_page(page_id).unwrap()[100] = 1;

        store.write_page(page_id, &[5u8; 10]).unwrap();

        let page = store.get_page(page_id).unwrap();
        assert_eq!(&page[..10], &[5u8; 10]);
        assert_eq!(page[100], 1);
    }
}
