//! Preparing value trees read from input files

use serde_json::Value;
use std::path::Path;

/// Resolve relative `path` fields of file references against `base_dir`.
///
/// A file reference is a mapping with `class: "File"`. Other mappings and
/// sequences are walked recursively; absolute paths are left untouched.
pub fn resolve_file_paths(value: &mut Value, base_dir: &Path) {
    match value {
        Value::Object(fields) if fields.get("class").and_then(Value::as_str) == Some("File") => {
            if let Some(Value::String(path)) = fields.get_mut("path") {
                if Path::new(path.as_str()).is_relative() {
                    *path = base_dir.join(path.as_str()).display().to_string();
                }
            }
        }
        Value::Object(fields) => {
            for nested in fields.values_mut() {
                resolve_file_paths(nested, base_dir);
            }
        }
        Value::Array(items) => {
            for item in items {
                resolve_file_paths(item, base_dir);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relative_file_paths_are_resolved() {
        let mut inputs = json!({
            "reads": {"class": "File", "path": "reads.fq"},
            "refs": [{"class": "File", "path": "/abs/ref.fa"}, {"class": "File", "path": "sub/b.fa"}],
            "nested": {"inner": {"class": "File", "path": "x"}},
            "count": 3,
            "plain": {"path": "untouched"},
        });
        resolve_file_paths(&mut inputs, Path::new("/data"));

        assert_eq!(inputs["reads"]["path"], "/data/reads.fq");
        assert_eq!(inputs["refs"][0]["path"], "/abs/ref.fa");
        assert_eq!(inputs["refs"][1]["path"], "/data/sub/b.fa");
        assert_eq!(inputs["nested"]["inner"]["path"], "/data/x");
        assert_eq!(inputs["plain"]["path"], "untouched");
        assert_eq!(inputs["count"], 3);
    }
}
