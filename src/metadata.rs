use std::path::Path;

use anyhow::Result;

use crate::page::PagedFileStore;

const FIELD_COUNT: usize = 7;
pub const METADATA_PAGE_SIZE: usize = FIELD_COUNT * 8;

/// The 7 integers persisted in `NAME.meta`, page 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metadata {
    pub element_count: i64,
    pub node_count: i64,
    pub height: i64,
    pub root: i64,
    pub data_next_page: i64,
    pub data_next_offset: i64,
    pub btree_next_node: i64,
}

impl Metadata {
    fn to_bytes(self) -> [u8; METADATA_PAGE_SIZE] {
        let mut buf = [0u8; METADATA_PAGE_SIZE];
        let fields = [
            self.element_count,
            self.node_count,
            self.height,
            self.root,
            self.data_next_page,
            self.data_next_offset,
            self.btree_next_node,
        ];
        for (i, f) in fields.iter().enumerate() {
            buf[i * 8..(i + 1) * 8].copy_from_slice(&f.to_ne_bytes());
        }
        buf
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        let read = |i: usize| i64::from_ne_bytes(bytes[i * 8..(i + 1) * 8].try_into().unwrap());
        Metadata {
            element_count: read(0),
            node_count: read(1),
            height: read(2),
            root: read(3),
            data_next_page: read(4),
            data_next_offset: read(5),
            btree_next_node: read(6),
        }
    }
}

pub struct MetadataStore {
    store: PagedFileStore,
}

impl MetadataStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = PagedFileStore::open(path, METADATA_PAGE_SIZE)?;
        Ok(MetadataStore { store })
    }

    /// A freshly created (or truncated) metadata file has zero pages; that
    /// is the signal to initialize a brand-new tree.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.store.page_count()? == 0)
    }

    pub fn load(&mut self) -> Result<Metadata> {
        let bytes = self.store.get_page(0)?;
        Ok(Metadata::from_bytes(&bytes))
    }

    pub fn save(&mut self, metadata: Metadata) -> Result<()> {
        self.store.set_page(0, &metadata.to_bytes())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }
}
