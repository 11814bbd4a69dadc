use std::marker::PhantomData;
use std::path::Path;

use anyhow::{anyhow, Result};

use crate::page::PagedFileStore;

/// Record schema and byte-level layout are external to this engine: any
/// type that can report a fixed encoded length and serialize to/from bytes
/// can be stored. The b-tree never inspects record contents, only threads
/// the `(page, offset)` coordinate returned by `insert`.
pub trait Record: Sized {
    fn encoded_len() -> usize;
    fn to_bytes(&self) -> Vec<u8>;
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

/// Convenience record type for callers with no richer schema: a fixed-size
/// opaque byte array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedBytesRecord<const N: usize>(pub [u8; N]);

impl<const N: usize> Record for FixedBytesRecord<N> {
    fn encoded_len() -> usize {
        N
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; N] = bytes
            .try_into()
            .map_err(|_| anyhow!("expected {} bytes, got {}", N, bytes.len()))?;
        Ok(FixedBytesRecord(arr))
    }
}

/// Wraps a paged file store with a page size chosen to hold multiple
/// records; tracks an append cursor, mirroring the original data storage
/// layer's `nextpage`/`nextoffset` bookkeeping.
pub struct RecordStore<R: Record> {
    store: PagedFileStore,
    page_size: usize,
    next_page: i64,
    next_offset: i64,
    _marker: PhantomData<R>,
}

impl<R: Record> RecordStore<R> {
    pub fn open<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        if R::encoded_len() > page_size {
            return Err(anyhow!(
                "record of {} bytes does not fit in a page of {} bytes",
                R::encoded_len(),
                page_size
            ));
        }
        let store = PagedFileStore::open(path, page_size)?;
        Ok(RecordStore {
            store,
            page_size,
            next_page: 0,
            next_offset: 0,
            _marker: PhantomData,
        })
    }

    pub fn next_page(&self) -> i64 {
        self.next_page
    }

    pub fn next_offset(&self) -> i64 {
        self.next_offset
    }

    pub fn set_cursor(&mut self, next_page: i64, next_offset: i64) {
        self.next_page = next_page;
        self.next_offset = next_offset;
    }

    /// Appends `record` at the current cursor, advancing to the next page
    /// first if it would not fit in the remainder of the current one.
    /// Returns the coordinate the record was written at.
    pub fn insert(&mut self, record: &R) -> Result<(i64, i64)> {
        let len = R::encoded_len();
        if self.next_offset as usize + len > self.page_size {
            self.next_page += 1;
            self.next_offset = 0;
        }

        let page = self.next_page;
        let offset = self.next_offset;
        self.set(page, offset, record)?;
        self.next_offset += len as i64;
        Ok((page, offset))
    }

    pub fn get(&mut self, page: i64, offset: i64) -> Result<R> {
        let bytes = self.store.get_page(page as u64)?;
        let len = R::encoded_len();
        let start = offset as usize;
        R::from_bytes(&bytes[start..start + len])
    }

    pub fn set(&mut self, page: i64, offset: i64, record: &R) -> Result<()> {
        let mut bytes = self.store.get_page(page as u64)?;
        let encoded = record.to_bytes();
        let start = offset as usize;
        bytes[start..start + encoded.len()].copy_from_slice(&encoded);
        self.store.set_page(page as u64, &bytes)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()?;
        self.next_page = 0;
        self.next_offset = 0;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn insert_and_get_round_trips() {
        let file = NamedTempFile::new().unwrap();
        let mut store: RecordStore<FixedBytesRecord<8>> =
            RecordStore::open(file.path(), 64).unwrap();

        let rec = FixedBytesRecord([1, 2, 3, 4, 5, 6, 7, 8]);
        let (page, offset) = store.insert(&rec).unwrap();
        let back = store.get(page, offset).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn insert_advances_page_on_overflow() {
        let file = NamedTempFile::new().unwrap();
        // page holds exactly 2 records of 8 bytes
        let mut store: RecordStore<FixedBytesRecord<8>> =
            RecordStore::open(file.path(), 16).unwrap();

        let (p0, _) = store.insert(&FixedBytesRecord([0; 8])).unwrap();
        let (p1, _) = store.insert(&FixedBytesRecord([1; 8])).unwrap();
        let (p2, _) = store.insert(&FixedBytesRecord([2; 8])).unwrap();

        assert_eq!(p0, 0);
        assert_eq!(p1, 0);
        assert_eq!(p2, 1);
    }

    #[test]
    fn set_overwrites_in_place() {
        let file = NamedTempFile::new().unwrap();
        let mut store: RecordStore<FixedBytesRecord<8>> =
            RecordStore::open(file.path(), 64).unwrap();

        let (page, offset) = store.insert(&FixedBytesRecord([1; 8])).unwrap();
        store.set(page, offset, &FixedBytesRecord([9; 8])).unwrap();
        let back = store.get(page, offset).unwrap();
        assert_eq!(back, FixedBytesRecord([9; 8]));
    }
}
