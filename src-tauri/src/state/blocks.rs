// Block store: ordered sketches, the current selection and code_blocks.json
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::models::{Block, BlockSnapshot, BlocksFile, FirstBlock, LocatedBlock, PLACEHOLDER_SKETCH};
use super::storage::{self, StorageResult};

/// Owns every block and the editor selection
///
/// Invariant: `selected_id` is `None` or the id of a block in `blocks`.
/// Every mutation rewrites the backing file; write failures are logged and
/// the in-memory state is kept.
#[derive(Debug)]
pub struct BlockStore {
    blocks: Vec<Block>,
    selected_id: Option<String>,
    path: PathBuf,
}

impl BlockStore {
    /// Create an empty store backed by `path` without reading it
    pub fn new(path: PathBuf) -> Self {
        BlockStore {
            blocks: Vec::new(),
            selected_id: None,
            path,
        }
    }

    /// Load the store from disk
    ///
    /// A missing or malformed file yields an empty store.
    pub fn load(path: PathBuf) -> Self {
        let file: BlocksFile = storage::load_or_default(&path);
        let mut store = BlockStore {
            blocks: file.blocks,
            selected_id: file.selected_code_id,
            path,
        };
        store.repair_selection();
        if store.selected_id.is_none() {
            store.selected_id = store.blocks.first().map(|b| b.id.clone());
        }
        log::info!("Loaded {} blocks from {}", store.blocks.len(), store.path.display());
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks and selection as one value
    pub fn snapshot(&self) -> BlockSnapshot {
        BlockSnapshot {
            blocks: self.blocks.clone(),
            selected_code_id: self.selected_id.clone(),
        }
    }

    /// Append a new placeholder block and select it
    pub fn add(&mut self) -> BlockSnapshot {
        let block = Block {
            id: Uuid::new_v4().to_string(),
            name: format!("Block {}", self.blocks.len() + 1),
            code: PLACEHOLDER_SKETCH.to_string(),
        };
        self.selected_id = Some(block.id.clone());
        self.blocks.push(block);
        self.persist();
        self.snapshot()
    }

    /// Select the block at `index` and return its code
    ///
    /// Out of range returns an empty string and leaves the selection alone.
    pub fn select(&mut self, index: usize) -> String {
        let Some(block) = self.blocks.get(index) else {
            return String::new();
        };
        let code = block.code.clone();
        self.selected_id = Some(block.id.clone());
        self.persist();
        code
    }

    /// Overwrite the code of the selected block
    ///
    /// Returns `false` when nothing is selected.
    pub fn update_code(&mut self, code: &str) -> bool {
        let Some(selected) = self.selected_id.as_deref() else {
            return false;
        };
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == selected) else {
            return false;
        };
        block.code = code.to_string();
        self.persist();
        true
    }

    /// Rename the block at `index`; returns `false` when out of range
    pub fn rename(&mut self, index: usize, name: &str) -> bool {
        let Some(block) = self.blocks.get_mut(index) else {
            return false;
        };
        block.name = name.to_string();
        self.persist();
        true
    }

    pub fn find_by_id(&self, block_id: &str) -> Option<LocatedBlock> {
        self.blocks
            .iter()
            .position(|b| b.id == block_id)
            .map(|index| LocatedBlock {
                block: self.blocks[index].clone(),
                index,
            })
    }

    /// Replace the whole ordering
    ///
    /// `moved_id`, when given, becomes the selection.
    pub fn reorder(&mut self, blocks: Vec<Block>, moved_id: Option<String>) -> BlockSnapshot {
        self.blocks = blocks;
        if moved_id.is_some() {
            self.selected_id = moved_id;
        }
        self.repair_selection();
        self.persist();
        self.snapshot()
    }

    /// Delete the block at `index`
    ///
    /// Deleting the selected block moves the selection to the block that
    /// followed it, or to the one before it when it was last.
    /// Returns `None` when `index` is out of range.
    pub fn delete(&mut self, index: usize) -> Option<BlockSnapshot> {
        if index >= self.blocks.len() {
            return None;
        }

        if self.selected_id.as_deref() == Some(self.blocks[index].id.as_str()) {
            self.selected_id = if index + 1 < self.blocks.len() {
                Some(self.blocks[index + 1].id.clone())
            } else if index > 0 {
                Some(self.blocks[index - 1].id.clone())
            } else {
                None
            };
        }

        let removed = self.blocks.remove(index);
        log::info!("Deleted block {} ({})", removed.name, removed.id);
        self.persist();
        Some(self.snapshot())
    }

    /// Select the first block and return its code
    pub fn load_first(&mut self) -> FirstBlock {
        let Some(first) = self.blocks.first() else {
            return FirstBlock {
                code: "// No blocks available".to_string(),
                selected_code_id: None,
            };
        };
        let result = FirstBlock {
            code: first.code.clone(),
            selected_code_id: Some(first.id.clone()),
        };
        self.selected_id = result.selected_code_id.clone();
        self.persist();
        result
    }

    /// Write the store to disk
    pub fn save(&self) -> StorageResult<()> {
        let file = BlocksFile {
            blocks: self.blocks.clone(),
            selected_code_id: self.selected_id.clone(),
        };
        storage::write_json(&self.path, &file)
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            log::error!("Error saving blocks to {}: {}", self.path.display(), e);
        }
    }

    // A selection naming no block falls back to the first block
    fn repair_selection(&mut self) {
        let dangling = self
            .selected_id
            .as_deref()
            .is_some_and(|id| !self.blocks.iter().any(|b| b.id == id));
        if dangling {
            self.selected_id = self.blocks.first().map(|b| b.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn block(id: &str) -> Block {
        Block {
            id: id.to_string(),
            name: format!("Block {}", id),
            code: format!("// sketch {}", id),
        }
    }

    fn store_with(temp_dir: &TempDir, ids: &[&str], selected: Option<&str>) -> BlockStore {
        let mut store = BlockStore::new(temp_dir.path().join("code_blocks.json"));
        store.reorder(ids.iter().map(|id| block(id)).collect(), selected.map(String::from));
        store
    }

    fn ids(store: &BlockStore) -> Vec<&str> {
        store.blocks().iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_add_names_and_selects_new_block() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = BlockStore::new(temp_dir.path().join("code_blocks.json"));

        let first = store.add();
        let second = store.add();

        assert_eq!(first.blocks[0].name, "Block 1");
        assert_eq!(second.blocks[1].name, "Block 2");
        assert_eq!(second.blocks[1].code, PLACEHOLDER_SKETCH);
        assert_eq!(second.selected_code_id.as_deref(), Some(second.blocks[1].id.as_str()));
        assert_ne!(second.blocks[0].id, second.blocks[1].id);
    }

    #[test]
    fn test_select_out_of_range_is_silent() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1", "2"], Some("1"));

        assert_eq!(store.select(1), "// sketch 2");
        assert_eq!(store.selected_id(), Some("2"));

        assert_eq!(store.select(5), "");
        assert_eq!(store.selected_id(), Some("2"));
    }

    #[test]
    fn test_update_code_targets_selection() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1", "2"], Some("2"));

        assert!(store.update_code("circle(0, 0, 10);"));
        assert_eq!(store.blocks()[1].code, "circle(0, 0, 10);");
        assert_eq!(store.blocks()[0].code, "// sketch 1");
    }

    #[test]
    fn test_update_code_without_selection_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = BlockStore::new(temp_dir.path().join("code_blocks.json"));
        assert!(!store.update_code("x"));
    }

    #[test]
    fn test_rename_bounds() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1"], Some("1"));

        assert!(store.rename(0, "Intro"));
        assert_eq!(store.blocks()[0].name, "Intro");
        assert!(!store.rename(3, "Nope"));
    }

    #[test]
    fn test_find_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with(&temp_dir, &["1", "2", "3"], None);

        let found = store.find_by_id("3").unwrap();
        assert_eq!(found.index, 2);
        assert_eq!(found.block.id, "3");
        assert!(store.find_by_id("9").is_none());
    }

    #[test]
    fn test_delete_selected_middle_selects_next() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1", "2", "3"], Some("2"));

        let snapshot = store.delete(1).unwrap();

        assert_eq!(ids(&store), vec!["1", "3"]);
        assert_eq!(snapshot.selected_code_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_delete_selected_last_selects_previous() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1", "2", "3"], Some("3"));

        store.delete(2).unwrap();

        assert_eq!(store.selected_id(), Some("2"));
    }

    #[test]
    fn test_delete_only_block_clears_selection() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1"], Some("1"));

        let snapshot = store.delete(0).unwrap();

        assert!(snapshot.blocks.is_empty());
        assert!(snapshot.selected_code_id.is_none());
    }

    #[test]
    fn test_delete_unselected_keeps_selection() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1", "2", "3"], Some("3"));

        store.delete(0).unwrap();

        assert_eq!(store.selected_id(), Some("3"));
    }

    #[test]
    fn test_delete_out_of_range() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1"], Some("1"));

        assert!(store.delete(1).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_selection_stays_valid_through_add_delete_sequences() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = BlockStore::new(temp_dir.path().join("code_blocks.json"));

        let script = [true, true, false, true, true, false, false, true, false, false, false];
        for (step, add) in script.iter().enumerate() {
            if *add {
                store.add();
            } else if !store.is_empty() {
                let index = step % store.len();
                store.select(index);
                store.delete(index);
            }

            match store.selected_id() {
                Some(id) => assert!(store.find_by_id(id).is_some()),
                None => assert!(store.is_empty()),
            }
        }
    }

    #[test]
    fn test_reorder_selects_moved_block() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1", "2", "3"], Some("1"));

        let snapshot = store.reorder(vec![block("3"), block("1"), block("2")], Some("3".into()));

        assert_eq!(ids(&store), vec!["3", "1", "2"]);
        assert_eq!(snapshot.selected_code_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_reorder_dropping_selection_falls_back_to_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1", "2"], Some("2"));

        store.reorder(vec![block("1")], None);

        assert_eq!(store.selected_id(), Some("1"));
    }

    #[test]
    fn test_reorder_keeps_empty_selection() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_with(&temp_dir, &["1", "2"], None);
        assert!(store.selected_id().is_none());

        let snapshot = store.reorder(vec![block("2"), block("1")], None);

        assert!(snapshot.selected_code_id.is_none());
    }

    #[test]
    fn test_load_without_selection_selects_first() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("code_blocks.json");
        std::fs::write(
            &path,
            r#"{"blocks":[{"id":"a","name":"A","code":""},{"id":"b","name":"B","code":""}],"selected_code_id":null}"#,
        )
        .unwrap();

        let store = BlockStore::load(path);

        assert_eq!(store.selected_id(), Some("a"));
    }

    #[test]
    fn test_load_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut empty = BlockStore::new(temp_dir.path().join("empty.json"));
        assert_eq!(empty.load_first().code, "// No blocks available");

        let mut store = store_with(&temp_dir, &["1", "2"], Some("2"));
        let first = store.load_first();
        assert_eq!(first.code, "// sketch 1");
        assert_eq!(store.selected_id(), Some("1"));
    }

    #[test]
    fn test_persistence_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("code_blocks.json");
        let mut store = BlockStore::new(path.clone());
        store.add();
        store.add();
        store.select(0);

        let reloaded = BlockStore::load(path);

        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn test_load_missing_and_malformed_files() {
        let temp_dir = TempDir::new().unwrap();
        let missing = BlockStore::load(temp_dir.path().join("missing.json"));
        assert!(missing.is_empty());

        let broken_path = temp_dir.path().join("broken.json");
        std::fs::write(&broken_path, "[1, 2").unwrap();
        let broken = BlockStore::load(broken_path);
        assert!(broken.is_empty());
        assert!(broken.selected_id().is_none());
    }

    #[test]
    fn test_load_repairs_dangling_selection() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("code_blocks.json");
        std::fs::write(
            &path,
            r#"{"blocks":[{"id":"a","name":"A","code":""}],"selected_code_id":"gone"}"#,
        )
        .unwrap();

        let store = BlockStore::load(path);

        assert_eq!(store.selected_id(), Some("a"));
    }

    #[test]
    fn test_persisted_file_shape() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with(&temp_dir, &["1"], Some("1"));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();

        assert_eq!(raw["selected_code_id"], "1");
        assert_eq!(raw["blocks"][0]["id"], "1");
        assert_eq!(raw["blocks"][0]["name"], "Block 1");
    }
}
