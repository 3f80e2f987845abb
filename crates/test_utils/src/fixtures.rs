//! Pre-built Test Fixtures
//!
//! Claim documents, catalog excerpts and model replies shaped like the ones
//! the engine sees in production.

use once_cell::sync::Lazy;

use audit_engine::ports::RetrievedDocument;
use core_kernel::FileId;
use domain_audit::AuditKind;

/// Catalog document id used by the fixtures
pub const CATALOG_FILE_ID: FileId = FileId::new(210);

/// Claim document id used by the fixtures
pub const CLAIM_FILE_ID: FileId = FileId::new(12);

/// Catalog excerpt covering Factura, Medicamentos and one special kind
pub static CATALOG_EXCERPT: Lazy<String> = Lazy::new(|| {
    [
        "# Manual de glosas\n\nIntroducción al catálogo oficial.",
        "### Glosa: 223 Tarifa\n- **Tipo:** Factura\n- **SEGMENTO:** Tarifas\n- **Detalle de glosa:** Valor facturado superior al tarifario SOAT\n- **Glosa a ITEM:** Parcial\n- **Contexto:** Manual tarifario vigente",
        "### Glosa: 101 Soportes\n- **Tipo:** factura\n- **SEGMENTO:** Soportes\n- **Detalle de glosa:** Cargo sin soporte en historia clínica\n- **Glosa a reclamacion:** Total",
        "### Glosa: 305 Medicamento sin orden\n- **Tipo:** Medicamentos\n- **SEGMENTO:** Pertinencia\n- **Detalle de glosa:** Medicamento cobrado sin orden médica\n- **Glosa a ITEM:** Parcial\n- **Observacion:** Verificar CUM",
        "### Glosa: 816 RUT\n- **Tipo:** RUT\n- **Detalle de glosa:** RUT vencido",
    ]
    .join("\n\n")
});

/// Catalog excerpt split into retriever chunks from the catalog document
pub fn catalog_chunks() -> Vec<RetrievedDocument> {
    CATALOG_EXCERPT
        .split("\n\n### ")
        .enumerate()
        .map(|(index, chunk)| {
            let content = if index == 0 { chunk.to_string() } else { format!("### {chunk}") };
            RetrievedDocument::new(index + 1, content).in_file(CATALOG_FILE_ID)
        })
        .collect()
}

/// A catalog-looking chunk that belongs to a claim document
pub fn foreign_catalog_chunk() -> RetrievedDocument {
    RetrievedDocument::new(
        99,
        "### Glosa: 999 Falsa\n- **Tipo:** Factura\n- **Detalle de glosa:** Texto de una factura que imita el catálogo",
    )
    .in_file(CLAIM_FILE_ID)
}

/// Ordinary claim document chunks
pub fn claim_documents() -> Vec<RetrievedDocument> {
    vec![
        RetrievedDocument::new(1, "Factura electrónica FE-2024-118 página 1. CUFE a1b2c3. Total 1.250.000 COP.")
            .in_file(CLAIM_FILE_ID),
        RetrievedDocument::new(2, "Historia clínica página 4. Motivo de consulta: accidente de tránsito.")
            .in_file(CLAIM_FILE_ID),
        RetrievedDocument::new(3, "FURIPS página 7. Pagador ADRES NIT 901.037.916-1.")
            .in_file(CLAIM_FILE_ID),
    ]
}

/// Text that occurs only in `kind`'s prompt template
pub fn prompt_marker(kind: AuditKind) -> &'static str {
    match kind {
        AuditKind::Factura => "especializado en facturación",
        AuditKind::HistoriaClinica => "especializado en historia clínica",
        AuditKind::Medicamentos => "especializado en control de medicamentos",
        AuditKind::Examenes => "especializado en exámenes diagnósticos",
        AuditKind::Procedimientos => "especializado en procedimientos quirúrgicos",
        AuditKind::Maos => "especializado en materiales de osteosíntesis",
        AuditKind::Certificados => "especializado en documentación legal",
        AuditKind::FormulariosLegales => "especializado en validación de formularios legales",
        AuditKind::RutValidacion => "especializado en validación de documentos tributarios",
        AuditKind::DatosPaciente => "especializado en validación de datos de pacientes",
        AuditKind::ConsistenciaDocumento => "especializado en validación de consistencia documental",
        AuditKind::PagadorAdres => "especializado en validación de pagadores",
    }
}

/// Text that occurs only in the direct v2 prompt
pub const COMPREHENSIVE_PROMPT_MARKER: &str = "TAREA: analiza los documentos";

/// Text that occurs only in question prompts
pub const QUESTION_PROMPT_MARKER: &str = "DOCUMENTOS MÉDICOS:";

/// Model reply fixtures
pub struct ReplyFixtures;

impl ReplyFixtures {
    pub fn compliant() -> String {
        r#"```json
{"response": "Cumple", "justification": "Todos los campos presentes (p1)."}
```"#
            .to_string()
    }

    pub fn non_compliant() -> String {
        r#"{"response": "No cumple", "justification": "Falta el CUFE en página 3."}"#.to_string()
    }

    /// Prose without a JSON object
    pub fn unstructured_non_compliant() -> String {
        "La factura no cumple: falta el CUFE en p3".to_string()
    }

    /// Special reply carrying a deduction finding
    pub fn special_with_finding(code: &str) -> String {
        format!(
            r#"{{"response": "No cumple", "justification": "Hallazgo en p2",
               "special_result": {{"identificacion_reclamacion": "REC-77.pdf", "estado_glosa": 1,
               "justificacion": "Soporte ausente", "documentos_referenciados": "RUT, Factura",
               "clasificacion": "{code}", "description": "Falta de soporte"}}}}"#
        )
    }

    /// Direct v2 document without `items_reclamados`
    pub fn direct_without_items() -> String {
        r#"{"identificacion_reclamacion": "REC-7", "glosa_total": false, "justificacion": "Sin hallazgos"}"#.to_string()
    }

    /// Direct v2 document with decimal values and a partial deduction
    pub fn direct_with_items() -> String {
        r#"```json
{"identificacion_reclamacion": "REC-8", "glosa_total": false, "justificacion": "Glosa parcial",
 "clasificacion_glosas_totales": [],
 "items_reclamados": [
   {"codigo": "ITM-001", "nombre": "Consulta", "glosa_parcial": false, "valor": 50000},
   {"codigo": "ITM-002", "nombre": "Radiografía", "glosa_parcial": true, "valor": 80000.99,
    "clasificacion_glosas": [{"codigo": "101", "descripcion": "Sin informe", "justificacion": "HC p12", "referencias": ["HC.pdf/12"]}]}
 ]}
```"#
            .to_string()
    }
}
