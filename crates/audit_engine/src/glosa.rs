//! Deduction catalog lookup

use std::sync::Arc;

use tracing::{debug, warn};

use core_kernel::FileId;
use domain_audit::catalog;
use domain_audit::{AuditKind, DeductionRecord};

use crate::ports::ContextRetriever;

/// Pulls the catalog deductions applicable to an audit kind
///
/// Only chunks whose source is the catalog document are read, whatever the
/// retriever returns.
#[derive(Clone)]
pub struct GlosaExtractor {
    retriever: Arc<dyn ContextRetriever>,
    catalog_file_id: FileId,
    catalog_k: usize,
}

impl GlosaExtractor {
    pub fn new(retriever: Arc<dyn ContextRetriever>, catalog_file_id: FileId, catalog_k: usize) -> Self {
        Self {
            retriever,
            catalog_file_id,
            catalog_k,
        }
    }

    /// Catalog entries whose `Tipo` is `kind`'s label; empty for special kinds
    /// and on any retrieval failure
    pub async fn extract_for(&self, kind: AuditKind) -> Vec<DeductionRecord> {
        if kind.is_special() {
            return Vec::new();
        }

        let query = format!("Tipo: {} glosa detalle segmento", kind.label());
        let result = match self
            .retriever
            .search(&query, &[self.catalog_file_id], self.catalog_k)
            .await
        {
            Ok(result) => result,
            Err(error) => {
                warn!(kind = %kind, error = %error, "Catalog lookup failed, continuing without deductions");
                return Vec::new();
            }
        };

        let text = result
            .documents
            .iter()
            .filter(|doc| doc.file_id == Some(self.catalog_file_id))
            .map(|doc| doc.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let records = catalog::records_for(&text, kind);
        debug!(kind = %kind, chunks = result.documents.len(), records = records.len(), "Catalog lookup finished");
        records
    }
}

impl std::fmt::Debug for GlosaExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlosaExtractor")
            .field("catalog_file_id", &self.catalog_file_id)
            .field("catalog_k", &self.catalog_k)
            .finish()
    }
}
