use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use log::{debug, info};

use crate::error::BtreeError;
use crate::metadata::{Metadata, MetadataStore};
use crate::node::{Cell, Locate, Node, NodeStore, NO_POINTER};
use crate::record::{Record, RecordStore};

/// The key/value engine: lookup descent, insertion with
/// compensation-or-split, deletion with compensation-or-merge, and the
/// metadata bookkeeping (root, height, element count, allocation cursors)
/// that ties the node store and record store together.
pub struct Btree<R: Record> {
    node_store: NodeStore,
    record_store: RecordStore<R>,
    metadata_store: MetadataStore,
    metadata: Metadata,
    order: usize,
}

impl<R: Record> Btree<R> {
    pub fn open(name: &str, order: usize, record_page_size: usize) -> Result<Self> {
        let idx_path = format!("{name}.idx");
        let dat_path = format!("{name}.dat");
        let meta_path = format!("{name}.meta");

        let mut metadata_store = MetadataStore::open(&meta_path)?;
        let mut node_store = NodeStore::open(&idx_path, order)?;
        let mut record_store = RecordStore::open(&dat_path, record_page_size)?;

        let metadata = if metadata_store.is_empty()? {
            info!("initializing new tree at {name}");
            node_store.clear()?;
            record_store.clear()?;
            let root = node_store.new_node(true)?;
            root.borrow_mut().parent = NO_POINTER;
            let root_index = root.borrow().index;

            let metadata = Metadata {
                element_count: 0,
                node_count: 1,
                height: 1,
                root: root_index,
                data_next_page: 0,
                data_next_offset: 0,
                btree_next_node: node_store.next_node(),
            };
            metadata_store.save(metadata)?;
            node_store.flush()?;
            metadata_store.flush()?;
            metadata
        } else {
            let metadata = metadata_store.load()?;
            node_store.set_next_node(metadata.btree_next_node);
            record_store.set_cursor(metadata.data_next_page, metadata.data_next_offset);
            metadata
        };

        Ok(Btree {
            node_store,
            record_store,
            metadata_store,
            metadata,
            order,
        })
    }

    fn sync_metadata_cursors(&mut self) {
        self.metadata.btree_next_node = self.node_store.next_node();
        self.metadata.data_next_page = self.record_store.next_page();
        self.metadata.data_next_offset = self.record_store.next_offset();
    }

    /// Persists the 7-integer metadata block. This is the only state
    /// flushed implicitly on drop.
    pub fn flush_metadata(&mut self) -> Result<()> {
        self.sync_metadata_cursors();
        self.metadata_store.save(self.metadata)?;
        self.metadata_store.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.flush_metadata()?;
        self.node_store.flush()?;
        self.record_store.flush()?;
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    fn reparent(&mut self, child_index: i64, new_parent: i64) -> Result<()> {
        if child_index == NO_POINTER {
            return Ok(());
        }
        let child = self.node_store.get(child_index)?;
        child.borrow_mut().parent = new_parent;
        Ok(())
    }

    /// Inserts `cell` into `node`'s cell vector, refusing a node already at
    /// the transient overflow ceiling of `2d+1` real cells: reaching this
    /// means a caller skipped the post-insert compensation/split check, a
    /// programmer error rather than a recoverable condition.
    fn insert_cell_checked(&self, node: &Rc<RefCell<Node>>, cell: Cell) -> Result<()> {
        let mut n = node.borrow_mut();
        if n.size() > 2 * self.order {
            return Err(BtreeError::CellOverflow(n.size()).into());
        }
        n.insert_sorted(cell);
        Ok(())
    }

    /// Descends from the root, returning the node and position where `key`
    /// either matches exactly or where an insertion should land.
    fn locate(&mut self, key: i64) -> Result<(i64, Locate)> {
        let mut current_index = self.metadata.root;
        loop {
            let node = self.node_store.get(current_index)?;
            let loc = node.borrow().locate(key);
            match loc {
                Locate::Exact(i) => return Ok((current_index, Locate::Exact(i))),
                Locate::Between(i) => {
                    let child = node.borrow().cells[i].child;
                    if child == NO_POINTER {
                        return Ok((current_index, Locate::Between(i)));
                    }
                    current_index = child;
                }
            }
        }
    }

    pub fn get(&mut self, key: i64) -> Result<Option<R>> {
        let (node_index, loc) = self.locate(key)?;
        match loc {
            Locate::Exact(i) => {
                let node = self.node_store.get(node_index)?;
                let (page, offset) = {
                    let n = node.borrow();
                    (n.cells[i].page, n.cells[i].offset)
                };
                Ok(Some(self.record_store.get(page, offset)?))
            }
            Locate::Between(_) => Ok(None),
        }
    }

    /// Inserts `record` at `key`, overwriting in place if the key already
    /// exists.
    pub fn set(&mut self, key: i64, record: R) -> Result<()> {
        let (node_index, loc) = self.locate(key)?;
        match loc {
            Locate::Exact(i) => {
                let node = self.node_store.get(node_index)?;
                let (page, offset) = {
                    let n = node.borrow();
                    (n.cells[i].page, n.cells[i].offset)
                };
                self.record_store.set(page, offset, &record)?;
            }
            Locate::Between(_) => {
                let (page, offset) = self.record_store.insert(&record)?;
                let node = self.node_store.get(node_index)?;
                self.insert_cell_checked(&node, Cell::real(key, page, offset, NO_POINTER))?;
                self.metadata.element_count += 1;

                let size = node.borrow().size();
                if size > 2 * self.order {
                    self.restructure_after_insert(node_index)?;
                }
            }
        }
        Ok(())
    }

    pub fn delete(&mut self, key: i64) -> Result<()> {
        let (node_index, loc) = self.locate(key)?;
        let idx = match loc {
            Locate::Between(_) => return Err(BtreeError::KeyNotFound(key).into()),
            Locate::Exact(i) => i,
        };

        let node = self.node_store.get(node_index)?;
        let is_leaf = node.borrow().leaf;

        if is_leaf {
            node.borrow_mut().remove_at(idx);
            self.metadata.element_count -= 1;
            self.fix_node_after_delete(node_index)?;
        } else {
            let left_child = { node.borrow().cells[idx - 1].child };
            let mut leaf_index = left_child;
            loop {
                let n = self.node_store.get(leaf_index)?;
                let is_leaf = n.borrow().leaf;
                if is_leaf {
                    break;
                }
                let next = n.borrow().cells.last().unwrap().child;
                leaf_index = next;
            }

            let leaf = self.node_store.get(leaf_index)?;
            let pred_idx = { leaf.borrow().cells.len() - 1 };
            let pred_cell = { leaf.borrow().cells[pred_idx] };

            {
                let mut n = node.borrow_mut();
                let child = n.cells[idx].child;
                n.cells[idx] = Cell::real(pred_cell.key, pred_cell.page, pred_cell.offset, child);
            }
            leaf.borrow_mut().remove_at(pred_idx);
            self.metadata.element_count -= 1;
            self.fix_node_after_delete(leaf_index)?;
        }

        Ok(())
    }

    // -- restructuring after insert --------------------------------------

    fn restructure_after_insert(&mut self, node_index: i64) -> Result<()> {
        let has_parent = { self.node_store.get(node_index)?.borrow().parent != NO_POINTER };
        if has_parent && self.try_compensate_overflow(node_index)? {
            return Ok(());
        }
        self.split_node(node_index)
    }

    fn try_compensate_overflow(&mut self, node_index: i64) -> Result<bool> {
        let (left, right) = self.siblings(node_index)?;
        let node_size = self.node_store.get(node_index)?.borrow().size();
        let two_d = 2 * self.order;
        let four_d = 4 * self.order;

        for sibling in [left, right].into_iter().flatten() {
            let sibling_size = self.node_store.get(sibling)?.borrow().size();
            let combined = node_size + sibling_size;
            if combined >= two_d && combined <= four_d {
                debug!("compensating node {node_index} with sibling {sibling} instead of splitting");
                self.compensate(node_index, sibling)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn try_compensate_underflow(&mut self, node_index: i64) -> Result<bool> {
        let (left, right) = self.siblings(node_index)?;
        let node_size = self.node_store.get(node_index)?.borrow().size();
        let two_d = 2 * self.order;

        for sibling in [left, right].into_iter().flatten() {
            let sibling_size = self.node_store.get(sibling)?.borrow().size();
            if node_size + sibling_size >= two_d {
                self.compensate(node_index, sibling)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Finds the (up to two) siblings of a non-root node under its parent.
    fn siblings(&mut self, node_index: i64) -> Result<(Option<i64>, Option<i64>)> {
        let node = self.node_store.get(node_index)?;
        let parent_index = node.borrow().parent;
        if parent_index == NO_POINTER {
            return Ok((None, None));
        }
        let parent = self.node_store.get(parent_index)?;
        let pos = parent
            .borrow()
            .cell_index_for_child(node_index)
            .ok_or_else(|| BtreeError::Invariant("parent missing cell for child".into()))?;
        let cells_len = parent.borrow().cells.len();

        let left = if pos > 0 {
            Some(parent.borrow().cells[pos - 1].child)
        } else {
            None
        };
        let right = if pos + 1 < cells_len {
            Some(parent.borrow().cells[pos + 1].child)
        } else {
            None
        };
        Ok((left, right))
    }

    /// Orders `a`/`b` by their position under the shared parent (`node1` is
    /// the left one) and runs the rotation.
    fn compensate(&mut self, a_index: i64, b_index: i64) -> Result<()> {
        let a = self.node_store.get(a_index)?;
        let parent_index = a.borrow().parent;
        let parent = self.node_store.get(parent_index)?;
        let pos_a = parent
            .borrow()
            .cell_index_for_child(a_index)
            .ok_or_else(|| BtreeError::Invariant("parent missing cell for child".into()))?;
        let pos_b = parent
            .borrow()
            .cell_index_for_child(b_index)
            .ok_or_else(|| BtreeError::Invariant("parent missing cell for child".into()))?;

        let (node1, node2) = if pos_a < pos_b {
            (a_index, b_index)
        } else {
            (b_index, a_index)
        };
        self.compensation_phase_two(node1, node2)
    }

    /// Rotates cells across the separator between `node1` (lesser keys) and
    /// `node2` (greater keys) until their sizes differ by at most one.
    fn compensation_phase_two(&mut self, node1_index: i64, node2_index: i64) -> Result<()> {
        let node1 = self.node_store.get(node1_index)?;
        let node2 = self.node_store.get(node2_index)?;
        let parent_index = node1.borrow().parent;
        let parent = self.node_store.get(parent_index)?;
        let sep_idx = parent
            .borrow()
            .cell_index_for_child(node2_index)
            .ok_or_else(|| BtreeError::Invariant("no separator cell between siblings".into()))?;

        loop {
            let size1 = node1.borrow().size() as i64;
            let size2 = node2.borrow().size() as i64;
            if (size1 - size2).abs() <= 1 {
                break;
            }

            let sep = { parent.borrow().cells[sep_idx] };

            if size1 > size2 {
                let last = {
                    let mut n1 = node1.borrow_mut();
                    let last_pos = n1.cells.len() - 1;
                    n1.remove_at(last_pos)
                };
                let node2_old_sentinel_child = { node2.borrow().cells[0].child };
                {
                    let mut n2 = node2.borrow_mut();
                    n2.cells[0].child = last.child;
                    n2.cells.insert(
                        1,
                        Cell::real(sep.key, sep.page, sep.offset, node2_old_sentinel_child),
                    );
                }
                {
                    let mut p = parent.borrow_mut();
                    p.cells[sep_idx].key = last.key;
                    p.cells[sep_idx].page = last.page;
                    p.cells[sep_idx].offset = last.offset;
                }
                self.reparent(last.child, node2_index)?;
            } else {
                let first = {
                    let mut n2 = node2.borrow_mut();
                    n2.remove_at(1)
                };
                let node1_donated = { node2.borrow().cells[0].child };
                {
                    let mut n2 = node2.borrow_mut();
                    n2.cells[0].child = first.child;
                }
                {
                    let mut n1 = node1.borrow_mut();
                    n1.cells
                        .push(Cell::real(sep.key, sep.page, sep.offset, node1_donated));
                }
                {
                    let mut p = parent.borrow_mut();
                    p.cells[sep_idx].key = first.key;
                    p.cells[sep_idx].page = first.page;
                    p.cells[sep_idx].offset = first.offset;
                }
                self.reparent(node1_donated, node1_index)?;
            }
        }
        Ok(())
    }

    /// Splits an overflowing node in two, promoting the center cell into
    /// the parent (creating a new root if `node` was the root).
    fn split_node(&mut self, node_index: i64) -> Result<()> {
        let node = self.node_store.get(node_index)?;
        let leaf = node.borrow().leaf;
        let size = node.borrow().size();
        debug!("splitting node {node_index} ({size} cells, leaf={leaf})");
        let center_pos = size / 2 + 1;

        let mut center = {
            let mut n = node.borrow_mut();
            n.remove_at(center_pos)
        };

        let new_node = self.node_store.new_node(leaf)?;
        let new_index = new_node.borrow().index;

        {
            let mut nn = new_node.borrow_mut();
            nn.cells[0].child = center.child;
        }
        self.reparent(center.child, new_index)?;

        let tail: Vec<Cell> = {
            let mut n = node.borrow_mut();
            n.cells.drain(center_pos..).collect()
        };
        for c in &tail {
            self.reparent(c.child, new_index)?;
        }
        {
            let mut nn = new_node.borrow_mut();
            nn.cells.extend(tail);
        }

        center.child = new_index;

        let parent_index = node.borrow().parent;
        if parent_index == NO_POINTER {
            let new_root = self.node_store.new_node(false)?;
            let new_root_index = new_root.borrow().index;
            {
                let mut nr = new_root.borrow_mut();
                nr.cells[0].child = node_index;
                nr.cells.push(center);
            }
            node.borrow_mut().parent = new_root_index;
            new_node.borrow_mut().parent = new_root_index;

            self.metadata.root = new_root_index;
            self.metadata.height += 1;
            self.metadata.node_count += 2;
        } else {
            new_node.borrow_mut().parent = parent_index;
            self.metadata.node_count += 1;

            let parent = self.node_store.get(parent_index)?;
            self.insert_cell_checked(&parent, center)?;

            let parent_size = parent.borrow().size();
            if parent_size > 2 * self.order {
                self.restructure_after_insert(parent_index)?;
            }
        }

        Ok(())
    }

    // -- restructuring after delete ---------------------------------------

    fn fix_node_after_delete(&mut self, node_index: i64) -> Result<()> {
        let node = self.node_store.get(node_index)?;
        let is_root = node.borrow().parent == NO_POINTER;
        let size = node.borrow().size();

        if is_root || size >= self.order {
            return Ok(());
        }
        if self.try_compensate_underflow(node_index)? {
            return Ok(());
        }
        self.merge_nodes(node_index)
    }

    /// Merges an underflowing node with a sibling, pulling the separator
    /// down from the parent and recursively fixing the parent.
    fn merge_nodes(&mut self, node_index: i64) -> Result<()> {
        let (left, right) = self.siblings(node_index)?;
        let sibling_index = right
            .or(left)
            .ok_or_else(|| BtreeError::Invariant("underflowing non-root node has no sibling".into()))?;
        debug!("merging node {node_index} with sibling {sibling_index}");

        let parent_index = { self.node_store.get(node_index)?.borrow().parent };
        let parent = self.node_store.get(parent_index)?;
        let pos_node = parent.borrow().cell_index_for_child(node_index).unwrap();
        let pos_sib = parent.borrow().cell_index_for_child(sibling_index).unwrap();
        let (node1_index, node2_index) = if pos_node < pos_sib {
            (node_index, sibling_index)
        } else {
            (sibling_index, node_index)
        };

        let node1 = self.node_store.get(node1_index)?;
        let node2 = self.node_store.get(node2_index)?;

        let sep_idx = parent
            .borrow()
            .cell_index_for_child(node2_index)
            .ok_or_else(|| BtreeError::Invariant("no separator cell between siblings".into()))?;
        let sep = { parent.borrow().cells[sep_idx] };
        let node2_sentinel_child = { node2.borrow().cells[0].child };

        let bridge = Cell::real(sep.key, sep.page, sep.offset, node2_sentinel_child);
        self.reparent(node2_sentinel_child, node1_index)?;

        let node2_real_cells: Vec<Cell> = { node2.borrow().cells[1..].to_vec() };
        for c in &node2_real_cells {
            self.reparent(c.child, node1_index)?;
        }

        {
            let mut n1 = node1.borrow_mut();
            n1.cells.push(bridge);
            n1.cells.extend(node2_real_cells);
        }

        parent.borrow_mut().remove_at(sep_idx);
        self.node_store.remove_from_cache(node2_index);
        self.metadata.node_count -= 1;

        let parent_is_root = parent.borrow().parent == NO_POINTER;
        if !parent_is_root {
            self.fix_node_after_delete(parent_index)?;
        } else if parent.borrow().size() == 0 {
            self.metadata.root = node1_index;
            self.node_store.remove_from_cache(parent_index);
            node1.borrow_mut().parent = NO_POINTER;
            self.metadata.height -= 1;
            if self.metadata.height == 1 {
                node1.borrow_mut().leaf = true;
            }
            self.metadata.node_count -= 1;
        }

        Ok(())
    }

    // -- diagnostics -------------------------------------------------------

    pub fn element_count(&self) -> i64 {
        self.metadata.element_count
    }

    pub fn height(&self) -> i64 {
        self.metadata.height
    }

    /// Full in-order enumeration of (key, record) pairs. For debugging and
    /// tests; not an indexed cursor.
    pub fn collect_in_order(&mut self) -> Result<Vec<(i64, R)>> {
        let mut out = Vec::new();
        let root = self.metadata.root;
        self.collect_node(root, &mut out)?;
        Ok(out)
    }

    fn collect_node(&mut self, node_index: i64, out: &mut Vec<(i64, R)>) -> Result<()> {
        let node = self.node_store.get(node_index)?;
        let cells: Vec<Cell> = node.borrow().cells.clone();

        if cells[0].child != NO_POINTER {
            self.collect_node(cells[0].child, out)?;
        }
        for c in &cells[1..] {
            let record = self.record_store.get(c.page, c.offset)?;
            out.push((c.key, record));
            if c.child != NO_POINTER {
                self.collect_node(c.child, out)?;
            }
        }
        Ok(())
    }

    pub fn print_all(&mut self) -> Result<()> {
        for (key, record) in self.collect_in_order()? {
            println!("{key}: {:?}", record.to_bytes());
        }
        Ok(())
    }
}

impl<R: Record> Drop for Btree<R> {
    fn drop(&mut self) {
        if let Err(e) = self.flush_metadata() {
            debug!("failed to flush metadata on drop: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FixedBytesRecord;
    use tempfile::TempDir;

    type Rec = FixedBytesRecord<8>;

    fn rec(n: u8) -> Rec {
        FixedBytesRecord([n; 8])
    }

    fn open_tree(dir: &TempDir, order: usize) -> Btree<Rec> {
        let path = dir.path().join("t");
        Btree::open(path.to_str().unwrap(), order, 256).unwrap()
    }

    // S1: no-split insertion of [10, 20, 30] with d=2.
    #[test]
    fn s1_no_split_insertion() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir, 2);
        tree.set(10, rec(1)).unwrap();
        tree.set(20, rec(2)).unwrap();
        tree.set(30, rec(3)).unwrap();

        assert_eq!(tree.height(), 1);
        assert_eq!(tree.element_count(), 3);
        let entries = tree.collect_in_order().unwrap();
        assert_eq!(entries.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![10, 20, 30]);
    }

    // S2: root split on [10, 20, 30, 40, 50] with d=2.
    #[test]
    fn s2_root_split() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir, 2);
        for k in [10, 20, 30, 40, 50] {
            tree.set(k, rec(k as u8)).unwrap();
        }

        assert_eq!(tree.height(), 2);
        let entries = tree.collect_in_order().unwrap();
        assert_eq!(
            entries.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            vec![10, 20, 30, 40, 50]
        );
    }

    // S3: compensation (sibling rotation) avoids a second split.
    #[test]
    fn s3_compensation_avoids_split() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir, 2);
        for k in [10, 20, 30, 40, 50] {
            tree.set(k, rec(k as u8)).unwrap();
        }
        assert_eq!(tree.height(), 2);

        tree.set(5, rec(5)).unwrap();
        assert_eq!(tree.height(), 2, "left leaf absorbs one more cell without splitting");

        tree.set(6, rec(6)).unwrap();
        tree.set(7, rec(7)).unwrap();
        assert_eq!(
            tree.height(),
            2,
            "combined sibling occupancy stays compensable, no further split"
        );

        let entries = tree.collect_in_order().unwrap();
        let keys: Vec<i64> = entries.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![5, 6, 7, 10, 20, 30, 40, 50]);
    }

    // S4: delete-with-merge shrinking height back to 1.
    #[test]
    fn s4_delete_with_merge_shrinks_height() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir, 2);
        for k in [10, 20, 30, 40, 50] {
            tree.set(k, rec(k as u8)).unwrap();
        }
        assert_eq!(tree.height(), 2);

        tree.delete(10).unwrap();
        tree.delete(20).unwrap();

        assert_eq!(tree.height(), 1);
        let entries = tree.collect_in_order().unwrap();
        assert_eq!(entries.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![30, 40, 50]);
    }

    // S5: update in place, no duplicate entry.
    #[test]
    fn s5_update_in_place() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir, 2);
        tree.set(7, rec(1)).unwrap();
        tree.set(7, rec(2)).unwrap();

        assert_eq!(tree.element_count(), 1);
        assert_eq!(tree.get(7).unwrap(), Some(rec(2)));
    }

    // S6: persistence across flush/reopen for keys 1..100.
    #[test]
    fn s6_persistence_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t");
        let path_str = path.to_str().unwrap().to_string();

        {
            let mut tree: Btree<Rec> = Btree::open(&path_str, 2, 256).unwrap();
            for k in 1..=100 {
                tree.set(k, rec((k % 256) as u8)).unwrap();
            }
            tree.flush().unwrap();
        }

        let mut tree: Btree<Rec> = Btree::open(&path_str, 2, 256).unwrap();
        for k in 1..=100 {
            assert_eq!(tree.get(k).unwrap(), Some(rec((k % 256) as u8)));
        }
        assert_eq!(tree.get(101).unwrap(), None);
        assert_eq!(tree.element_count(), 100);
    }

    #[test]
    fn delete_missing_key_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir, 2);
        tree.set(1, rec(1)).unwrap();
        assert!(tree.delete(42).is_err());
        assert_eq!(tree.element_count(), 1);
    }

    #[test]
    fn ascending_insertion_cascades_without_corrupting_order() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir, 2);
        for k in 1..=200i64 {
            tree.set(k, rec((k % 256) as u8)).unwrap();
        }
        let entries = tree.collect_in_order().unwrap();
        let keys: Vec<i64> = entries.iter().map(|(k, _)| *k).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 200);
    }

    #[test]
    fn descending_insertion_cascades_without_corrupting_order() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir, 2);
        for k in (1..=200i64).rev() {
            tree.set(k, rec((k % 256) as u8)).unwrap();
        }
        let entries = tree.collect_in_order().unwrap();
        let keys: Vec<i64> = entries.iter().map(|(k, _)| *k).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn delete_down_to_one_element_collapses_to_leaf_root() {
        let dir = TempDir::new().unwrap();
        let mut tree = open_tree(&dir, 2);
        for k in 1..=50i64 {
            tree.set(k, rec(1)).unwrap();
        }
        for k in 1..=49i64 {
            tree.delete(k).unwrap();
        }
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.element_count(), 1);
        assert_eq!(tree.get(50).unwrap(), Some(rec(1)));
    }
}
