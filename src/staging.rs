//! Staging directories for tool input and output
//!
//! Every path received from a client is reduced to a location inside one of
//! the two staging directories before it touches the filesystem.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which staging directory an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StagingArea {
    /// PDF files (read_as_markdown input, html_to_pdf output)
    Pdf,
    /// HTML documents and downloaded filings
    Html,
}

/// A file found in a staging directory
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct StagedFile {
    /// Path relative to the staging directory
    pub path: String,
    /// Filename only
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified time (ISO 8601 format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

/// Owner of the PDF and HTML staging directories
pub struct Staging {
    pdf_dir: PathBuf,
    html_dir: PathBuf,
    write_locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

/// Reduce a client path to its final component.
///
/// Both separators are honoured so `..\\..\\x` and `../../x` behave alike.
pub fn sanitize_basename(input: &str) -> Result<String> {
    let normalized = input.replace('\\', "/");
    let name = normalized.rsplit('/').next().unwrap_or("").trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::PathAccessDenied {
            path: input.to_string(),
        });
    }

    Ok(name.to_string())
}

/// Reduce a client path to a relative path with only normal components.
///
/// Root, drive prefixes, `.` and `..` are dropped, so the result can never
/// climb out of the directory it is joined onto.
pub fn sanitize_relative(input: &str) -> Result<PathBuf> {
    let normalized = input.replace('\\', "/");
    let mut relative = PathBuf::new();

    for part in normalized.split('/') {
        let part = part.trim();
        if part.is_empty() || part == "." || part == ".." || part.ends_with(':') {
            continue;
        }
        relative.push(part);
    }

    if relative.as_os_str().is_empty() {
        return Err(Error::PathAccessDenied {
            path: input.to_string(),
        });
    }

    Ok(relative)
}

/// Render a relative path with forward slashes regardless of platform
pub fn display_relative(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl Staging {
    pub fn new(pdf_dir: impl Into<PathBuf>, html_dir: impl Into<PathBuf>) -> Self {
        Self {
            pdf_dir: pdf_dir.into(),
            html_dir: html_dir.into(),
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn pdf_dir(&self) -> &Path {
        &self.pdf_dir
    }

    pub fn html_dir(&self) -> &Path {
        &self.html_dir
    }

    pub fn dir(&self, area: StagingArea) -> &Path {
        match area {
            StagingArea::Pdf => &self.pdf_dir,
            StagingArea::Html => &self.html_dir,
        }
    }

    /// Resolve a PDF by basename inside the PDF staging directory
    pub fn pdf_path(&self, input: &str) -> Result<(String, PathBuf)> {
        let name = sanitize_basename(input)?;
        let path = self.pdf_dir.join(&name);
        Ok((name, path))
    }

    /// Resolve a document inside the HTML staging directory, keeping subdirectories
    pub fn html_path(&self, input: &str) -> Result<(PathBuf, PathBuf)> {
        let relative = sanitize_relative(input)?;
        let path = self.html_dir.join(&relative);
        Ok((relative, path))
    }

    /// Write `data` to `dest` atomically.
    ///
    /// Writers to the same destination are serialised. Data lands in a
    /// temporary sibling first and is renamed over `dest`, so readers never
    /// observe a partial file.
    pub async fn write_atomic(&self, dest: &Path, data: &[u8]) -> Result<()> {
        let lock = self.lock_for(dest);
        let _guard = lock.lock().await;

        let parent = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        tokio::fs::create_dir_all(parent).await?;

        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::PathAccessDenied {
                path: dest.display().to_string(),
            })?;
        let tmp = parent.join(format!(".{}.{}.part", file_name, uuid::Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&tmp, data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::Io(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, dest).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::Io(e));
        }

        tracing::debug!(path = %dest.display(), bytes = data.len(), "wrote staged file");
        Ok(())
    }

    /// Copy `src` over `dest` through the atomic writer
    pub async fn copy_atomic(&self, src: &Path, dest: &Path) -> Result<u64> {
        let data = tokio::fs::read(src).await?;
        self.write_atomic(dest, &data).await?;
        Ok(data.len() as u64)
    }

    fn lock_for(&self, dest: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.write_locks.lock();
        // Drop entries nobody is holding
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(dest.to_path_buf())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// List regular files in a staging directory, recursively
    pub fn list(&self, area: StagingArea, pattern: Option<&str>) -> Result<Vec<StagedFile>> {
        let root = self.dir(area);
        if !root.is_dir() {
            return Err(Error::FileNotFound {
                path: root.display().to_string(),
            });
        }

        let pattern = pattern.and_then(|p| glob::Pattern::new(p).ok());
        let mut files = Vec::new();
        Self::collect_files(root, root, &pattern, &mut files)?;

        // Sort by path for consistent ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn collect_files(
        root: &Path,
        dir: &Path,
        pattern: &Option<glob::Pattern>,
        files: &mut Vec<StagedFile>,
    ) -> Result<()> {
        let entries = std::fs::read_dir(dir).map_err(Error::Io)?;

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue, // Skip entries we can't read
            };

            let path = entry.path();

            if path.is_dir() {
                let _ = Self::collect_files(root, &path, pattern, files);
                continue;
            }
            if !path.is_file() {
                continue;
            }

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            // In-flight atomic writes
            if name.starts_with('.') && name.ends_with(".part") {
                continue;
            }

            if let Some(ref pat) = pattern {
                if !pat.matches(&name) {
                    continue;
                }
            }

            let metadata = std::fs::metadata(&path).ok();
            let size = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
            let modified = metadata
                .as_ref()
                .and_then(|m| m.modified().ok())
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| {
                    chrono::DateTime::from_timestamp(d.as_secs() as i64, 0)
                        .map(|dt| dt.to_rfc3339())
                        .unwrap_or_default()
                });

            let relative = path.strip_prefix(root).unwrap_or(&path);
            files.push(StagedFile {
                path: display_relative(relative),
                name,
                size,
                modified,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("../../etc/passwd", "passwd")]
    #[case("report.pdf", "report.pdf")]
    #[case("C:\\Users\\me\\report.pdf", "report.pdf")]
    #[case("/abs/path/report.pdf", "report.pdf")]
    fn test_sanitize_basename(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_basename(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("dir/")]
    #[case("..")]
    #[case("a/.")]
    fn test_sanitize_basename_rejects(#[case] input: &str) {
        assert!(matches!(
            sanitize_basename(input),
            Err(Error::PathAccessDenied { .. })
        ));
    }

    #[rstest]
    #[case("amzn/amzn-20221231.htm", "amzn/amzn-20221231.htm")]
    #[case("../../etc/passwd", "etc/passwd")]
    #[case("/etc/passwd", "etc/passwd")]
    #[case("C:\\temp\\..\\doc.htm", "temp/doc.htm")]
    #[case("./a/./b.htm", "a/b.htm")]
    fn test_sanitize_relative(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(display_relative(&sanitize_relative(input).unwrap()), expected);
    }

    #[test]
    fn test_sanitize_relative_rejects_only_traversal() {
        assert!(sanitize_relative("../..").is_err());
        assert!(sanitize_relative("").is_err());
    }

    #[test]
    fn test_pdf_path_stays_in_staging_dir() {
        let staging = Staging::new("/srv/pdf", "/srv/html");
        let (name, path) = staging.pdf_path("../../etc/passwd").unwrap();
        assert_eq!(name, "passwd");
        assert_eq!(path, PathBuf::from("/srv/pdf/passwd"));
    }

    #[tokio::test]
    async fn test_write_atomic_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = Staging::new(tmp.path().join("pdf"), tmp.path().join("html"));
        let dest = staging.html_dir().join("nested").join("doc.htm");
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

        staging.write_atomic(&dest, &data).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), data);
        // No temporary files left behind
        let leftovers: Vec<_> = std::fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_writes_same_path() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = Arc::new(Staging::new(tmp.path().join("pdf"), tmp.path().join("html")));
        let dest = staging.html_dir().join("race.htm");

        let mut handles = Vec::new();
        for byte in [b'a', b'b', b'c', b'd'] {
            let staging = staging.clone();
            let dest = dest.clone();
            handles.push(tokio::spawn(async move {
                staging.write_atomic(&dest, &vec![byte; 64 * 1024]).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let data = std::fs::read(&dest).unwrap();
        assert_eq!(data.len(), 64 * 1024);
        assert!(data.iter().all(|b| *b == data[0]));
    }

    #[test]
    fn test_list_with_pattern() {
        let tmp = tempfile::tempdir().unwrap();
        let staging = Staging::new(tmp.path().join("pdf"), tmp.path().join("html"));
        std::fs::create_dir_all(staging.html_dir().join("amzn")).unwrap();
        std::fs::write(staging.html_dir().join("amzn/amzn-20221231.htm"), b"<html/>").unwrap();
        std::fs::write(staging.html_dir().join("notes.txt"), b"x").unwrap();
        std::fs::write(staging.html_dir().join(".doc.htm.1234.part"), b"x").unwrap();

        let all = staging.list(StagingArea::Html, None).unwrap();
        let paths: Vec<_> = all.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["amzn/amzn-20221231.htm", "notes.txt"]);

        let htm = staging.list(StagingArea::Html, Some("*.htm")).unwrap();
        assert_eq!(htm.len(), 1);
        assert_eq!(htm[0].name, "amzn-20221231.htm");
        assert_eq!(htm[0].size, 7);
        assert!(htm[0].modified.is_some());
    }

    #[test]
    fn test_list_missing_dir() {
        let staging = Staging::new("/nonexistent/pdf", "/nonexistent/html");
        assert!(matches!(
            staging.list(StagingArea::Pdf, None),
            Err(Error::FileNotFound { .. })
        ));
    }
}
