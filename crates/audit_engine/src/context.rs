//! Context assembly for audit prompts
//!
//! Retrieved chunks are labelled `Documento {index}:` and joined with a blank
//! line, then cut at the character budget. The cut is a plain character cut
//! and may sever a document or page reference.

use tracing::{debug, warn};

use core_kernel::FileId;

use crate::ports::{ContextRetriever, SearchResult};

/// Context used when retrieval fails or finds nothing
pub const NO_CONTEXT_PLACEHOLDER: &str =
    "No se encontró información relevante en los documentos proporcionados.";

/// Appended to a context cut at its budget
pub const TRUNCATION_MARKER: &str = "...[contexto truncado]";

/// Prompt context plus the retrieval accounting that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    pub text: String,
    pub documents_retrieved: usize,
}

impl AssembledContext {
    pub fn placeholder() -> Self {
        Self {
            text: NO_CONTEXT_PLACEHOLDER.to_string(),
            documents_retrieved: 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.documents_retrieved == 0
    }
}

/// Searches and assembles; retrieval errors degrade to the placeholder
pub async fn gather(
    retriever: &dyn ContextRetriever,
    query: &str,
    file_ids: &[FileId],
    k: usize,
    max_chars: usize,
) -> AssembledContext {
    match retriever.search(query, file_ids, k).await {
        Ok(result) => assemble(&result, max_chars),
        Err(error) => {
            warn!(error = %error, query, "Retrieval failed, using placeholder context");
            AssembledContext::placeholder()
        }
    }
}

/// Labels, joins and truncates a search result
pub fn assemble(result: &SearchResult, max_chars: usize) -> AssembledContext {
    if result.is_empty() {
        debug!("Retrieval returned no documents");
        return AssembledContext::placeholder();
    }

    let joined = result
        .documents
        .iter()
        .map(|doc| format!("Documento {}:\n{}", doc.index, doc.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    AssembledContext {
        text: truncate_context(&joined, max_chars),
        documents_retrieved: result.total_documents.max(result.documents.len()),
    }
}

/// Keeps the first `max_chars` characters, appending the truncation marker
/// when cut
pub fn truncate_context(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => format!("{}{}", &text[..byte_offset], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
