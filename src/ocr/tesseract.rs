//! tesseract command-line backend.
//!
//! PNG bytes go in on stdin, plain text comes out on stdout
//! (`tesseract stdin stdout -l <lang>`). No temp files.

use super::OcrError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Resolve the engine: an explicit path must exist, otherwise search `PATH`.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, OcrError> {
    match explicit {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(OcrError::EngineNotFound(path.display().to_string())),
        None => which::which("tesseract").map_err(|e| OcrError::EngineNotFound(e.to_string())),
    }
}

/// Run the engine on in-memory PNG bytes and return its output lines.
pub fn run(engine: &Path, language: &str, png_bytes: &[u8]) -> Result<Vec<String>, OcrError> {
    let mut child = Command::new(engine)
        .args(["stdin", "stdout", "-l", language])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| OcrError::Engine(format!("无法启动 {}: {}", engine.display(), e)))?;

    {
        let stdin = child
            .stdin
            .as_mut()
            .ok_or_else(|| OcrError::Engine("no stdin".to_string()))?;
        stdin
            .write_all(png_bytes)
            .map_err(|e| OcrError::Engine(e.to_string()))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| OcrError::Engine(e.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OcrError::Engine(stderr.trim().to_string()));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect())
}
