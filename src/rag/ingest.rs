//! Folder ingestion: read, chunk and index every supported document.

use std::path::Path;

use super::chunker::split_text;
use super::reader::read_document;
use super::store::{ChunkRecord, RetrievalIndex};
use crate::core::errors::RagError;

/// Upper bound on records per upsert call.
const UPSERT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files_ingested: usize,
    pub files_skipped: usize,
    pub chunks_stored: usize,
}

/// Ingests every supported file directly inside `folder` (subdirectories
/// are not descended into). A file that cannot be read or has an
/// unsupported extension is logged and skipped; index failures abort the
/// whole run.
pub async fn ingest_folder(
    index: &dyn RetrievalIndex,
    folder: &Path,
    chunk_size: usize,
) -> Result<IngestReport, RagError> {
    let entries = std::fs::read_dir(folder)
        .map_err(|e| RagError::document_read(folder.display().to_string(), e))?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut report = IngestReport::default();
    let mut records: Vec<ChunkRecord> = Vec::new();

    for path in &paths {
        match process_file(path, chunk_size) {
            Ok(file_records) => {
                report.files_ingested += 1;
                report.chunks_stored += file_records.len();
                records.extend(file_records);
            }
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                report.files_skipped += 1;
            }
        }
    }

    for batch in records.chunks(UPSERT_BATCH_SIZE) {
        index.upsert(batch).await?;
    }

    Ok(report)
}

fn process_file(path: &Path, chunk_size: usize) -> Result<Vec<ChunkRecord>, RagError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| RagError::internal(format!("unreadable file name: {}", path.display())))?;

    let text = read_document(path)?;

    Ok(split_text(&text, chunk_size)
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| ChunkRecord::new(file_name, i, chunk))
        .collect())
}
