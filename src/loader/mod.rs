//! Loading decompiled class dumps from disk.
//!
//! A dump is one JSON file per class, produced by the decompiler
//! front-end: the class name, its superclass table, and the structured
//! method trees. The loader only validates what the flow engine relies
//! on (expression ids in range); semantic garbage surfaces later as a
//! per-class analysis error, never a crash.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

use crate::ast::{Block, ExprId, LoopKind, MethodBody, Node, TypeHierarchy};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dump {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid dump {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// One decompiled class as read from a dump file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassData {
    pub name: String,
    #[serde(default)]
    pub types: TypeHierarchy,
    #[serde(default)]
    pub methods: Vec<MethodBody>,
}

/// Source of class dumps for one analysis run.
pub trait Repository {
    /// Paths of every dump, in a stable order.
    fn class_files(&self) -> Vec<PathBuf>;
}

/// Repository over a directory tree of `*.json` dumps.
pub struct DirRepository {
    root: PathBuf,
}

impl DirRepository {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl Repository for DirRepository {
    fn class_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        files
    }
}

/// Read and validate one dump file.
pub fn load_class(path: &Path) -> Result<ClassData, LoaderError> {
    let file = File::open(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let class: ClassData =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| LoaderError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    validate(&class).map_err(|reason| LoaderError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(class)
}

/// Expression and closure ids must index into their method's arenas,
/// whether referenced from another expression or from the block tree.
fn validate(class: &ClassData) -> Result<(), String> {
    for method in &class.methods {
        let exprs = method.exprs.len();
        let closures = method.closures.len();
        for id in method.expr_ids() {
            let expr = method.expr(id);
            for arg in &expr.args {
                if arg.index() >= exprs {
                    return Err(format!(
                        "method {}: expression {} references out-of-range argument {}",
                        method.name, id.0, arg.0
                    ));
                }
            }
            if let Some(closure) = expr.closure() {
                if closure.index() >= closures {
                    return Err(format!(
                        "method {}: expression {} references unknown closure {}",
                        method.name, id.0, closure.0
                    ));
                }
            }
        }
        validate_block(method, &method.root)?;
        for closure in &method.closures {
            validate_block(method, &closure.body)?;
        }
    }
    Ok(())
}

fn validate_block(method: &MethodBody, block: &Block) -> Result<(), String> {
    let check = |id: ExprId| -> Result<(), String> {
        if id.index() >= method.exprs.len() {
            return Err(format!(
                "method {}: tree references out-of-range expression {}",
                method.name, id.0
            ));
        }
        Ok(())
    };
    for node in &block.body {
        match node {
            Node::Expr(id) => check(*id)?,
            Node::Block(inner) => validate_block(method, inner)?,
            Node::Condition(cond) => {
                check(cond.test)?;
                validate_block(method, &cond.then_block)?;
                validate_block(method, &cond.else_block)?;
            }
            Node::Loop(lp) => {
                match lp.kind {
                    LoopKind::NoTest => {}
                    LoopKind::PreTest(test) | LoopKind::PostTest(test) => check(test)?,
                }
                validate_block(method, &lp.body)?;
            }
            Node::Switch(sw) => {
                check(sw.selector)?;
                for case in &sw.cases {
                    validate_block(method, &case.body)?;
                }
            }
            Node::Try(tr) => validate_block(method, &tr.protected)?,
            Node::Label(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_dump(dir: &Path, name: &str, json: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_load_minimal_dump() {
        let temp = TempDir::new().unwrap();
        let path = write_dump(
            temp.path(),
            "Widget.json",
            r#"{
                "name": "com.example.Widget",
                "types": {"com.example.Widget": "java.lang.Object"},
                "methods": []
            }"#,
        );

        let class = load_class(&path).unwrap();
        assert_eq!(class.name, "com.example.Widget");
        assert!(class.methods.is_empty());
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = write_dump(temp.path(), "Broken.json", "{not json");

        let err = load_class(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Malformed { .. }));
    }

    #[test]
    fn test_out_of_range_argument_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_dump(
            temp.path(),
            "Bad.json",
            r#"{
                "name": "com.example.Bad",
                "methods": [{
                    "name": "m",
                    "descriptor": "()V",
                    "params": [],
                    "exprs": [{"op": "return", "args": [7], "operand": null, "ty": null}],
                    "closures": [],
                    "root": {"body": [{"expr": 0}]}
                }]
            }"#,
        );

        let err = load_class(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Invalid { .. }));
    }

    #[test]
    fn test_out_of_range_tree_reference_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_dump(
            temp.path(),
            "Dangling.json",
            r#"{
                "name": "com.example.Dangling",
                "methods": [{
                    "name": "m",
                    "descriptor": "()V",
                    "params": [],
                    "exprs": [{"op": "return"}],
                    "closures": [],
                    "root": {"body": [{"expr": 7}]}
                }]
            }"#,
        );

        let err = load_class(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Invalid { .. }));
        assert!(err.to_string().contains("out-of-range expression 7"));
    }

    #[test]
    fn test_out_of_range_loop_test_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_dump(
            temp.path(),
            "BadLoop.json",
            r#"{
                "name": "com.example.BadLoop",
                "methods": [{
                    "name": "m",
                    "descriptor": "()V",
                    "params": [],
                    "exprs": [{"op": "return"}],
                    "closures": [],
                    "root": {"body": [
                        {"loop": {"kind": {"pre_test": 9}, "body": {"body": []}}},
                        {"expr": 0}
                    ]}
                }]
            }"#,
        );

        let err = load_class(&path).unwrap_err();
        assert!(matches!(err, LoaderError::Invalid { .. }));
    }

    #[test]
    fn test_dir_repository_finds_json_only() {
        let temp = TempDir::new().unwrap();
        write_dump(temp.path(), "B.json", "{}");
        write_dump(temp.path(), "A.json", "{}");
        write_dump(temp.path(), "notes.txt", "ignored");
        let nested = temp.path().join("pkg");
        std::fs::create_dir(&nested).unwrap();
        write_dump(&nested, "C.json", "{}");

        let repo = DirRepository::new(temp.path());
        let files: Vec<_> = repo
            .class_files()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["A.json", "B.json", "C.json"]);
    }
}
