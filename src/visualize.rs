//! Visualizer
//!
//! This module records snapshots of the solver state as JSON, so that a run can be replayed step by step
//!

use crate::serde_json;
use std::fs::File;
use std::io::{Write, Seek, SeekFrom};
use crate::chrono::Local;

pub trait MatchingVisualizer {
    /// take a snapshot, set `abbrev` to true to save space
    fn snapshot(&self, abbrev: bool) -> serde_json::Value;
}

#[derive(Debug)]
pub struct Visualizer {
    /// save to file if applicable
    file: Option<File>,
    /// all snapshots
    snapshots: Vec<(String, serde_json::Value)>,
}

pub fn snapshot_fix_missing_fields(value: &mut serde_json::Value, abbrev: bool) {
    let value = value.as_object_mut().expect("snapshot must be an object");
    if let Some(nodes) = value.get_mut("nodes") {
        let nodes = nodes.as_array_mut().expect("nodes must be an array");
        for node in nodes {
            if node.is_null() { continue }  // expanded blossom
            let node = node.as_object_mut().expect("each node must be an object");
            let key_label = if abbrev { "l" } else { "label" };
            let key_blossom_parent = if abbrev { "p" } else { "blossom_parent" };
            assert!(node.contains_key(key_label), "missing unrecoverable field");
            if !node.contains_key(key_blossom_parent) {
                node.insert(key_blossom_parent.to_string(), json!(null));  // by default an outer node
            }
        }
    }
    if let Some(edges) = value.get_mut("edges") {
        let edges = edges.as_array_mut().expect("edges must be an array");
        for edge in edges {
            let edge = edge.as_object_mut().expect("each edge must be an object");
            let key_weight = if abbrev { "w" } else { "weight" };
            let key_slack = if abbrev { "s" } else { "slack" };
            assert!(edge.contains_key(key_weight), "missing unrecoverable field");
            if !edge.contains_key(key_slack) {
                let weight = edge[key_weight].clone();
                edge.insert(key_slack.to_string(), weight);  // by default all duals are zero
            }
        }
    }
}

pub type ObjectMap = serde_json::Map<String, serde_json::Value>;

/// move every field of `obj_2` into `obj`; a field present in both must agree
pub fn snapshot_copy_remaining_fields(obj: &mut ObjectMap, obj_2: &mut ObjectMap) {
    let keys: Vec<String> = obj_2.keys().cloned().collect();
    for key in keys.iter() {
        let Some(value_2) = obj_2.remove(key) else { continue };
        match obj.get(key) {
            None => { obj.insert(key.to_string(), value_2); }
            Some(value) => {
                assert_eq!(value, &value_2, "cannot combine different values of field {}", key);
            }
        }
    }
}

pub fn snapshot_combine_values(value: &mut serde_json::Value, mut value_2: serde_json::Value) {
    let value = value.as_object_mut().expect("snapshot must be an object");
    let value_2 = value_2.as_object_mut().expect("snapshot must be an object");
    snapshot_copy_remaining_fields(value, value_2);
}

impl Visualizer {
    /// create a new visualizer with target filename
    pub fn new(mut filename: Option<String>) -> std::io::Result<Self> {
        if cfg!(feature = "disable_visualizer") {
            filename = None;  // do not open file
        }
        let file = match filename {
            Some(filename) => Some(File::create(filename)?),
            None => None,
        };
        Ok(Self {
            file,
            snapshots: Vec::new(),
        })
    }

    /// append a snapshot, and also update the file in case the program panics later
    pub fn snapshot(&mut self, name: String, source: &impl MatchingVisualizer) -> std::io::Result<()> {
        if cfg!(feature = "disable_visualizer") {
            return Ok(())
        }
        let abbrev = true;
        let mut value = source.snapshot(abbrev);
        snapshot_fix_missing_fields(&mut value, abbrev);
        self.snapshots.push((name, value));
        self.save()?;
        Ok(())
    }

    pub fn snapshot_num(&self) -> usize {
        self.snapshots.len()
    }

    /// save to file
    pub fn save(&mut self) -> std::io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.set_len(0)?;  // truncate the file
            file.seek(SeekFrom::Start(0))?;  // move the cursor to the front
            file.write_all(json!({
                "format": "blossom_primal",
                "snapshots": &self.snapshots,
            }).to_string().as_bytes())?;
            file.sync_all()?;
        }
        Ok(())
    }

}

const DEFAULT_VISUALIZE_DATA_FOLDER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/visualize/data/");

pub fn visualize_data_folder() -> String {
    DEFAULT_VISUALIZE_DATA_FOLDER.to_string()
}

pub fn auto_visualize_data_filename() -> String {
    format!("{}.json", Local::now().format("%Y%m%d-%H-%M-%S%.3f"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(serde_json::Value);

    impl MatchingVisualizer for Fixed {
        fn snapshot(&self, _abbrev: bool) -> serde_json::Value {
            self.0.clone()
        }
    }

    #[test]
    fn visualize_fix_missing_fields() {  // cargo test visualize_fix_missing_fields -- --nocapture
        let mut value = json!({
            "nodes": [{ "l": "Plus" }, null],
            "edges": [{ "w": 3.0 }, { "w": 2.0, "s": 0.5 }],
        });
        snapshot_fix_missing_fields(&mut value, true);
        assert_eq!(value["nodes"][0]["p"], json!(null));
        assert_eq!(value["edges"][0]["s"], json!(3.0));
        assert_eq!(value["edges"][1]["s"], json!(0.5));
    }

    #[test]
    fn visualize_save_snapshots() {  // cargo test visualize_save_snapshots -- --nocapture
        let filename = std::env::temp_dir().join(format!("blossom_primal_{}", auto_visualize_data_filename()));
        let filename = filename.to_string_lossy().to_string();
        let mut visualizer = Visualizer::new(Some(filename.clone())).unwrap();
        let mut first = json!({ "nodes": [{ "l": "Plus" }], "edges": [] });
        snapshot_combine_values(&mut first, json!({ "statistics": { "grow_num": 1 } }));
        visualizer.snapshot("first".to_string(), &Fixed(first)).unwrap();
        visualizer.snapshot("second".to_string(), &Fixed(json!({ "nodes": [{ "l": "Minus", "p": 3 }], "edges": [] }))).unwrap();
        if cfg!(feature = "disable_visualizer") {
            assert_eq!(visualizer.snapshot_num(), 0);
            return
        }
        assert_eq!(visualizer.snapshot_num(), 2);
        let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&filename).unwrap()).unwrap();
        assert_eq!(saved["format"], json!("blossom_primal"));
        assert_eq!(saved["snapshots"][0][0], json!("first"));
        assert_eq!(saved["snapshots"][0][1]["statistics"]["grow_num"], json!(1));
        assert_eq!(saved["snapshots"][0][1]["nodes"][0]["p"], json!(null));
        assert_eq!(saved["snapshots"][1][1]["nodes"][0]["p"], json!(3));
        std::fs::remove_file(&filename).unwrap();
    }

    #[test]
    #[should_panic]
    fn visualize_combine_conflicting_fields() {  // cargo test visualize_combine_conflicting_fields -- --nocapture
        let mut value = json!({ "nodes": [] });
        snapshot_combine_values(&mut value, json!({ "nodes": [null] }));
    }

}
