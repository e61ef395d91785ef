use crate::dashboard_table::JsonTableFile;
use crate::parquet_source::ParquetTable;
use crate::source::DataSource;
use rowsift_common::{Result, RowsiftError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TABLE_EXTENSIONS: [&str; 2] = ["json", "parquet"];

/// A table file opened from disk, ready to register.
pub struct LoadedTable {
    pub name: String,
    pub path: PathBuf,
    pub source: Arc<dyn DataSource>,
}

fn is_table_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TABLE_EXTENSIONS.contains(&e))
}

pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    scan_recursive(dir, &mut out)?;
    out.sort();
    Ok(out)
}

fn scan_recursive(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            scan_recursive(&path, out)?;
        } else if is_table_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// resolve a path string: single file, directory or glob pattern
pub fn resolve_table_paths(input: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(input);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if path.is_dir() {
        return scan_directory(path);
    }
    let entries = glob::glob(input)
        .map_err(|e| RowsiftError::Config(format!("bad table pattern {input}: {e}")))?;
    Ok(entries
        .flatten()
        .filter(|p| p.is_file() && is_table_file(p))
        .collect())
}

/// Open a table file by extension. JSON tables carry their own name; parquet
/// tables are named after the file stem.
pub fn open_table(path: &Path) -> Result<LoadedTable> {
    let stem = || {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let table = JsonTableFile::open(path)?;
            Ok(LoadedTable {
                name: table.name().to_owned(),
                path: path.to_path_buf(),
                source: Arc::new(table),
            })
        }
        Some("parquet") => Ok(LoadedTable {
            name: stem(),
            path: path.to_path_buf(),
            source: Arc::new(ParquetTable::open(path)?),
        }),
        _ => Err(RowsiftError::Config(format!(
            "{} is not a .json or .parquet table",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{"name": "votes", "table": {"columns": [{"name": "n", "type": "number"}], "rows": [[1]]}}"#;

    #[test]
    fn resolves_files_directories_and_globs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.json"), TABLE).unwrap();
        std::fs::write(dir.path().join("nested/b.json"), TABLE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let root = dir.path().to_string_lossy().into_owned();
        assert_eq!(resolve_table_paths(&root).unwrap().len(), 2);
        let pattern = format!("{root}/*.json");
        assert_eq!(resolve_table_paths(&pattern).unwrap(), vec![dir.path().join("a.json")]);
        let single = format!("{root}/a.json");
        assert_eq!(resolve_table_paths(&single).unwrap().len(), 1);
        assert!(resolve_table_paths(&format!("{root}/none/*.json")).unwrap().is_empty());
    }

    #[test]
    fn json_tables_keep_their_own_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file-name.json");
        std::fs::write(&path, TABLE).unwrap();
        let loaded = open_table(&path).unwrap();
        assert_eq!(loaded.name, "votes");
        assert_eq!(loaded.source.rows().unwrap().len(), 1);
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "a,b").unwrap();
        assert!(matches!(open_table(&path), Err(RowsiftError::Config(_))));
    }
}
