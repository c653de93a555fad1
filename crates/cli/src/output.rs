use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `doc` as pretty JSON to `path` and a `<stem>.run.json` sidecar
/// recording the code revision and the parameters that produced it.
/// Returns the sidecar path.
pub fn write_with_sidecar<T: Serialize>(path: &Path, doc: &T, params: Value) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    fs::write(path, serde_json::to_vec_pretty(doc)?)
        .with_context(|| format!("writing {}", path.display()))?;

    let sidecar = sidecar_path(path);
    let meta = json!({
        "code_rev": code_rev(),
        "engine_version": puzzlecut::VERSION,
        "params": params,
        "outputs": [path.to_string_lossy()]
    });
    fs::write(&sidecar, serde_json::to_vec_pretty(&meta)?)
        .with_context(|| format!("writing {}", sidecar.display()))?;
    Ok(sidecar)
}

fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".run.json");
    artifact.with_file_name(name)
}

fn code_rev() -> String {
    option_env!("GIT_COMMIT")
        .map(str::to_string)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sidecar_sits_next_to_the_artifact() {
        let derived = sidecar_path(Path::new("/tmp/out/pieces.json"));
        assert_eq!(derived, Path::new("/tmp/out/pieces.run.json"));
    }

    #[test]
    fn writes_document_and_sidecar() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("nested").join("cut.json");
        let sidecar =
            write_with_sidecar(&artifact, &json!({"pieces": []}), json!({"seed": 7})).unwrap();
        let doc: Value = serde_json::from_slice(&fs::read(&artifact).unwrap()).unwrap();
        assert_eq!(doc["pieces"], json!([]));
        let meta: Value = serde_json::from_slice(&fs::read(sidecar).unwrap()).unwrap();
        assert_eq!(meta["params"]["seed"], 7);
        assert_eq!(meta["outputs"][0], artifact.to_string_lossy().as_ref());
    }
}
