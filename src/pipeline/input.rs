//! Input discovery: turn a user-supplied path into the list of PDFs to process.
//!
//! A file must carry a `.pdf` extension (any case). A directory yields its
//! `*.pdf` and `*.PDF` entries, sorted by name, without recursing. Magic-byte
//! validation happens per document so one bad file does not stop a batch.

use crate::error::ProcessError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

fn is_pdf_name(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Resolve `path` to the PDF files it names.
///
/// An empty `Vec` means a directory with no PDFs in it; callers report that
/// and exit cleanly.
pub fn find_pdf_files(path: &Path) -> Result<Vec<PathBuf>, ProcessError> {
    if path.is_file() {
        if !is_pdf_name(path) {
            return Err(ProcessError::InvalidPath {
                path: path.to_path_buf(),
                reason: "not a PDF file".into(),
            });
        }
        return Ok(vec![path.to_path_buf()]);
    }

    if path.is_dir() {
        let entries = std::fs::read_dir(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => ProcessError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ProcessError::InvalidPath {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && is_pdf_name(p))
            .collect();
        files.sort();

        debug!("Found {} PDF file(s) in {}", files.len(), path.display());
        return Ok(files);
    }

    if !path.exists() {
        return Err(ProcessError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    Err(ProcessError::InvalidPath {
        path: path.to_path_buf(),
        reason: "neither a file nor a directory".into(),
    })
}

/// Check that `path` is readable and starts with the `%PDF` magic bytes.
pub fn validate_pdf(path: &Path) -> Result<(), ProcessError> {
    let mut f = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ProcessError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ProcessError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let mut magic = [0u8; 4];
    match f.read_exact(&mut magic) {
        Ok(()) if &magic == b"%PDF" => Ok(()),
        Ok(()) => Err(ProcessError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        }),
        Err(e) => Err(ProcessError::UnreadableDocument {
            path: path.to_path_buf(),
            detail: format!("too short to be a PDF: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn single_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("Report.PDF");
        fs::write(&p, b"%PDF-1.7").unwrap();
        assert_eq!(find_pdf_files(&p).unwrap(), vec![p]);
    }

    #[test]
    fn non_pdf_file_is_invalid_path() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("notes.txt");
        fs::write(&p, b"hello").unwrap();
        let err = find_pdf_files(&p).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidPath { .. }));
    }

    #[test]
    fn directory_lists_sorted_pdfs_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "c.txt", "d.pdf"] {
            fs::write(dir.path().join(name), b"%PDF").unwrap();
        }
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();
        fs::write(dir.path().join("nested.pdf").join("inner.pdf"), b"%PDF").unwrap();

        let found = find_pdf_files(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf", "d.pdf"]);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_pdf_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_path_is_not_found() {
        let err = find_pdf_files(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, ProcessError::FileNotFound { .. }));
    }

    #[test]
    fn validate_checks_magic() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.pdf");
        let bad = dir.path().join("bad.pdf");
        let short = dir.path().join("short.pdf");
        fs::write(&good, b"%PDF-1.4\n").unwrap();
        fs::write(&bad, b"PK\x03\x04zip").unwrap();
        fs::write(&short, b"%P").unwrap();

        assert!(validate_pdf(&good).is_ok());
        assert!(matches!(
            validate_pdf(&bad).unwrap_err(),
            ProcessError::NotAPdf { magic, .. } if &magic == b"PK\x03\x04"
        ));
        assert!(matches!(
            validate_pdf(&short).unwrap_err(),
            ProcessError::UnreadableDocument { .. }
        ));
    }
}
