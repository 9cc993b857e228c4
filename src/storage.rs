//! On-disk storage for uploaded documents and their combined audio.
//!
//! Two sibling directories under the data directory are the only record of
//! past submissions: `uploads/<filename>` and `audios/<filename>.wav`. The
//! history is recomputed from them on every request, pairing each document
//! with the audio file named after its full file name.

use crate::audio::AudioSegment;
use crate::error::{PdfcastError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Directory holding uploaded documents.
pub const DOCUMENTS_DIR: &str = "uploads";
/// Directory holding combined audio artifacts.
pub const AUDIO_DIR: &str = "audios";
/// Extension of combined audio artifacts.
pub const AUDIO_EXTENSION: &str = "wav";

/// An uploaded document as stored on disk.
#[derive(Debug, Clone)]
pub struct Document {
    /// Original filename (base name only).
    pub filename: String,
    /// Where the document is stored.
    pub path: PathBuf,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// A stored document and, if it was fully processed, its audio.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// Document filename.
    pub name: String,
    pub document_path: PathBuf,
    pub audio_path: Option<PathBuf>,
    /// Size of the stored document in bytes.
    pub document_size: u64,
    /// Last modification of the stored document.
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    /// File name of the audio artifact, if present.
    pub fn audio_name(&self) -> Option<String> {
        self.audio_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }
}

/// Outcome of removing one stored file.
#[derive(Debug)]
pub enum FileRemoval {
    Removed(PathBuf),
    Failed(PdfcastError),
}

impl FileRemoval {
    pub fn is_removed(&self) -> bool {
        matches!(self, FileRemoval::Removed(_))
    }
}

/// Per-file outcome of deleting a document and its audio.
#[derive(Debug)]
pub struct DeleteReport {
    pub name: String,
    pub document: FileRemoval,
    pub audio: FileRemoval,
}

impl DeleteReport {
    /// Both files were removed.
    pub fn is_complete(&self) -> bool {
        self.document.is_removed() && self.audio.is_removed()
    }

    /// Failures, document first.
    pub fn errors(&self) -> Vec<&PdfcastError> {
        [&self.document, &self.audio]
            .into_iter()
            .filter_map(|removal| match removal {
                FileRemoval::Failed(e) => Some(e),
                FileRemoval::Removed(_) => None,
            })
            .collect()
    }

    /// Collapse the report into a single storage error if anything failed.
    pub fn into_result(self) -> Result<()> {
        let errors: Vec<String> = self.errors().iter().map(|e| e.to_string()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PdfcastError::Storage(errors.join("; ")))
        }
    }
}

/// The pair of storage directories.
#[derive(Debug, Clone)]
pub struct Storage {
    documents_dir: PathBuf,
    audio_dir: PathBuf,
}

impl Storage {
    /// Open storage under `data_dir`, creating both directories if needed.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let documents_dir = data_dir.join(DOCUMENTS_DIR);
        let audio_dir = data_dir.join(AUDIO_DIR);

        for dir in [&documents_dir, &audio_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PdfcastError::storage("create", dir, e))?;
        }

        Ok(Self {
            documents_dir,
            audio_dir,
        })
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Path of a stored document. `name` must be a bare file name.
    pub fn document_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.documents_dir.join(bare_name(name)?))
    }

    /// Path of the audio artifact belonging to a document.
    pub fn audio_path_for(&self, document_name: &str) -> Result<PathBuf> {
        let name = bare_name(document_name)?;
        Ok(self.audio_dir.join(audio_name_for(&name)))
    }

    /// Path of a stored audio file by its own file name.
    pub fn audio_file_path(&self, audio_name: &str) -> Result<PathBuf> {
        Ok(self.audio_dir.join(bare_name(audio_name)?))
    }

    /// Store an uploaded document under its original file name, replacing any
    /// document of the same name.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn save_document(&self, filename: &str, bytes: Vec<u8>) -> Result<Document> {
        let filename = sanitize_filename(filename)?;
        let path = self.documents_dir.join(&filename);

        if path.exists() {
            warn!("Overwriting existing document {}", filename);
        }
        std::fs::write(&path, &bytes).map_err(|e| PdfcastError::storage("write", &path, e))?;
        info!("Stored document at {}", path.display());

        Ok(Document {
            filename,
            path,
            bytes,
        })
    }

    /// Write the combined audio for a document, replacing any previous audio.
    pub fn write_audio(&self, document: &Document, audio: &AudioSegment) -> Result<PathBuf> {
        let path = self.audio_path_for(&document.filename)?;
        audio.export_wav(&path)?;
        info!("Stored {:.1}s of audio at {}", audio.duration_secs(), path.display());
        Ok(path)
    }

    /// Documents with their audio, sorted by name.
    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        let mut entries = Vec::new();

        for (name, path) in list_files(&self.documents_dir)? {
            let audio_path = self.audio_path_for(&name)?;
            let metadata = std::fs::metadata(&path).ok();

            entries.push(HistoryEntry {
                name,
                document_path: path,
                audio_path: audio_path.is_file().then_some(audio_path),
                document_size: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
                uploaded_at: metadata
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Utc>::from),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Audio files whose document no longer exists.
    pub fn orphaned_audio(&self) -> Result<Vec<PathBuf>> {
        let expected: Vec<String> = list_files(&self.documents_dir)?
            .into_iter()
            .map(|(name, _)| audio_name_for(&name))
            .collect();

        let mut orphans: Vec<PathBuf> = list_files(&self.audio_dir)?
            .into_iter()
            .filter(|(name, _)| !expected.contains(name))
            .map(|(_, path)| path)
            .collect();
        orphans.sort();
        Ok(orphans)
    }

    /// Remove a document and its audio.
    ///
    /// Each file is attempted independently; a failure on one does not stop
    /// the other, and nothing is restored afterwards.
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> DeleteReport {
        let document = match self.document_path(name) {
            Ok(path) => remove_file(path),
            Err(e) => FileRemoval::Failed(e),
        };
        let audio = match self.audio_path_for(name) {
            Ok(path) => remove_file(path),
            Err(e) => FileRemoval::Failed(e),
        };

        let report = DeleteReport {
            name: name.to_string(),
            document,
            audio,
        };
        if report.is_complete() {
            info!("Deleted {} and its audio", name);
        } else {
            for error in report.errors() {
                warn!("Delete of {} incomplete: {}", name, error);
            }
        }
        report
    }
}

/// File name of the audio artifact for a document: the full document file
/// name with the audio extension appended, so `a.pdf` and `a.PDF` never share one.
pub fn audio_name_for(filename: &str) -> String {
    format!("{}.{}", filename, AUDIO_EXTENSION)
}

/// Reduce an uploaded file name to its base name.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    let normalized = filename.replace('\\', "/");
    let base = normalized.rsplit('/').next().unwrap_or("").trim();

    if base.is_empty() || base == "." || base == ".." {
        return Err(PdfcastError::InvalidInput(format!(
            "Invalid file name: {:?}",
            filename
        )));
    }
    Ok(base.to_string())
}

/// Accept only names that already are base names.
fn bare_name(name: &str) -> Result<String> {
    let base = sanitize_filename(name)?;
    if base != name {
        return Err(PdfcastError::InvalidInput(format!(
            "File name must not contain a path: {:?}",
            name
        )));
    }
    Ok(base)
}

fn list_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(dir).map_err(|e| PdfcastError::storage("list", dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PdfcastError::storage("list", dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push((entry.file_name().to_string_lossy().to_string(), path));
        }
    }
    Ok(files)
}

fn remove_file(path: PathBuf) -> FileRemoval {
    match std::fs::remove_file(&path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            FileRemoval::Removed(path)
        }
        Err(e) => FileRemoval::Failed(PdfcastError::storage("remove", &path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        (dir, storage)
    }

    fn audio() -> AudioSegment {
        AudioSegment::silent(0.5, 8_000, 1).unwrap()
    }

    #[test]
    fn test_open_creates_directories() {
        let (dir, storage) = storage();
        assert!(dir.path().join("uploads").is_dir());
        assert!(dir.path().join("audios").is_dir());
        assert_eq!(storage.documents_dir(), dir.path().join("uploads"));
    }

    #[test]
    fn test_history_pairs_by_name_not_position() {
        let (_dir, storage) = storage();
        let alpha = storage.save_document("alpha.pdf", b"a".to_vec()).unwrap();
        storage.save_document("beta.pdf", b"b".to_vec()).unwrap();
        let zeta = storage.save_document("zeta.pdf", b"z".to_vec()).unwrap();

        // beta was never processed: positional pairing would give it zeta's audio.
        storage.write_audio(&alpha, &audio()).unwrap();
        storage.write_audio(&zeta, &audio()).unwrap();

        let history = storage.history().unwrap();
        let names: Vec<_> = history.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha.pdf", "beta.pdf", "zeta.pdf"]);

        assert_eq!(history[0].audio_name().as_deref(), Some("alpha.pdf.wav"));
        assert!(history[1].audio_path.is_none());
        assert_eq!(history[2].audio_name().as_deref(), Some("zeta.pdf.wav"));
        assert_eq!(history[0].document_size, 1);
    }

    #[test]
    fn test_same_name_upload_overwrites() {
        let (_dir, storage) = storage();
        let first = storage.save_document("report.pdf", b"first".to_vec()).unwrap();
        storage.write_audio(&first, &audio()).unwrap();

        let second = storage.save_document("report.pdf", b"second".to_vec()).unwrap();
        storage
            .write_audio(&second, &AudioSegment::silent(2.0, 8_000, 1).unwrap())
            .unwrap();

        let history = storage.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(std::fs::read(&history[0].document_path).unwrap(), b"second");

        let stored = std::fs::read(history[0].audio_path.as_ref().unwrap()).unwrap();
        let decoded = AudioSegment::from_wav_bytes(&stored).unwrap();
        assert!((decoded.duration_secs() - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_delete_removes_both_files() {
        let (_dir, storage) = storage();
        let doc = storage.save_document("notes.pdf", b"pdf".to_vec()).unwrap();
        let audio_path = storage.write_audio(&doc, &audio()).unwrap();

        let report = storage.delete("notes.pdf");
        assert!(report.is_complete());
        assert!(!doc.path.exists());
        assert!(!audio_path.exists());
        assert!(storage.history().unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_pair_reports_storage_error() {
        let (_dir, storage) = storage();

        let report = storage.delete("ghost.pdf");
        assert!(!report.is_complete());
        assert_eq!(report.errors().len(), 2);

        let err = report.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_delete_continues_after_missing_audio() {
        let (_dir, storage) = storage();
        let doc = storage.save_document("half.pdf", b"pdf".to_vec()).unwrap();

        let report = storage.delete("half.pdf");
        assert!(report.document.is_removed());
        assert!(!report.audio.is_removed());
        assert!(!doc.path.exists());
    }

    #[test]
    fn test_orphaned_audio() {
        let (_dir, storage) = storage();
        let doc = storage.save_document("kept.pdf", b"pdf".to_vec()).unwrap();
        storage.write_audio(&doc, &audio()).unwrap();
        std::fs::write(storage.audio_dir().join("lost.wav"), b"x").unwrap();

        let orphans = storage.orphaned_audio().unwrap();
        assert_eq!(orphans, vec![storage.audio_dir().join("lost.wav")]);
    }

    #[test]
    fn test_names_differing_in_extension_case_keep_separate_audio() {
        let (_dir, storage) = storage();
        let lower = storage.save_document("Report.pdf", b"lower".to_vec()).unwrap();
        let upper = storage.save_document("Report.PDF", b"upper".to_vec()).unwrap();
        storage.write_audio(&lower, &audio()).unwrap();

        let history = storage.history().unwrap();
        let audio_of = |name: &str| {
            history
                .iter()
                .find(|e| e.name == name)
                .and_then(|e| e.audio_name())
        };
        assert_eq!(audio_of("Report.pdf").as_deref(), Some("Report.pdf.wav"));
        assert_eq!(audio_of("Report.PDF"), None);

        let report = storage.delete("Report.PDF");
        assert!(report.document.is_removed());
        assert!(!report.audio.is_removed());
        assert!(!upper.path.exists());

        let history = storage.history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].audio_name().as_deref(), Some("Report.pdf.wav"));
        assert!(storage.orphaned_audio().unwrap().is_empty());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf").unwrap(), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\doc.pdf").unwrap(), "doc.pdf");
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("dir/").is_err());
    }

    #[test]
    fn test_lookup_rejects_paths() {
        let (_dir, storage) = storage();
        assert!(matches!(
            storage.document_path("../secret.pdf"),
            Err(PdfcastError::InvalidInput(_))
        ));
        assert_eq!(
            storage.audio_path_for("book.pdf").unwrap(),
            storage.audio_dir().join("book.pdf.wav")
        );
    }
}
