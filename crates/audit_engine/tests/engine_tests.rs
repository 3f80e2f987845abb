//! Integration tests for the audit engine against scripted collaborators

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Value;

use audit_engine::ports::RetrievedDocument;
use audit_engine::{
    EngineConfig, ResponseFormatter, GlosaExtractor, Orchestrator, StageRequest, NO_CONTEXT_PLACEHOLDER, TRUNCATION_MARKER,
};
use domain_audit::{
    AuditKind, AuditRequest, ComplianceVerdict, DecisionKind, ParseOutcome, QuestionAnswer, QuestionRequest,
    ReportPayload, ResponseFormat, V2Generation,
};
use test_utils::{
    assert_classification_keys_consistent, assert_complete_result_set, audit_kind_strategy, deduction_finding, catalog_chunks, claim_documents,
    expect_result, expect_v1_results, result_set_strategy, foreign_catalog_chunk, init_test_tracing, prompt_marker, FailingRetriever,
    InMemoryRetriever, ModelBehavior, ReplyFixtures, ResultSetBuilder, ScriptedModel, CATALOG_FILE_ID, CLAIM_FILE_ID,
    COMPREHENSIVE_PROMPT_MARKER, QUESTION_PROMPT_MARKER,
};

const CATALOG_QUERY_NEEDLE: &str = "Tipo: ";

fn retriever() -> Arc<InMemoryRetriever> {
    Arc::new(InMemoryRetriever::with_documents(claim_documents()).on_query(CATALOG_QUERY_NEEDLE, catalog_chunks()))
}

fn orchestrator(retriever: Arc<InMemoryRetriever>, model: Arc<ScriptedModel>) -> Orchestrator {
    init_test_tracing();
    Orchestrator::new(retriever, model, EngineConfig::default())
}

fn request() -> AuditRequest {
    AuditRequest {
        response_format: ResponseFormat::V1,
        ..AuditRequest::for_files([CLAIM_FILE_ID])
    }
}

// ============================================================================
// Stage Tests
// ============================================================================

mod stage_tests {
    use super::*;

    #[tokio::test]
    async fn test_unparseable_factura_reply_falls_back_and_run_succeeds() {
        let model = Arc::new(
            ScriptedModel::replying(ReplyFixtures::compliant())
                .on_reply(prompt_marker(AuditKind::Factura), ReplyFixtures::unstructured_non_compliant()),
        );
        let report = orchestrator(retriever(), model).run_full_audit(request()).await;

        assert!(report.success);
        let factura = expect_result(&report, AuditKind::Factura);
        assert_eq!(factura.verdict, ComplianceVerdict::NoCumple);
        assert_eq!(factura.justification, "La factura no cumple: falta el CUFE en p3");
        let codes: Vec<_> = factura.deductions.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["223", "101"]);

        let historia = expect_result(&report, AuditKind::HistoriaClinica);
        assert_eq!(historia.verdict, ComplianceVerdict::Cumple);
        assert_complete_result_set(expect_v1_results(&report));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_synthesizes_failure_with_deductions() {
        let model = Arc::new(
            ScriptedModel::replying(ReplyFixtures::compliant()).on(prompt_marker(AuditKind::Factura), ModelBehavior::Hang),
        );
        let config = EngineConfig { stage_timeout_secs: 1, ..EngineConfig::default() };
        let orchestrator = Orchestrator::new(retriever(), model, config);
        let request = request();

        let outcome = orchestrator
            .runner()
            .run_stage(&StageRequest::for_kind(AuditKind::Factura, &request))
            .await;

        assert_eq!(outcome.outcome, ParseOutcome::Failed);
        assert_eq!(outcome.result.verdict, ComplianceVerdict::NoCumple);
        assert!(outcome
            .result
            .justification
            .starts_with("Error en auditoría de Factura: tiempo de espera agotado"));
        assert_eq!(outcome.result.deductions.len(), 2);
        assert_eq!(outcome.documents_retrieved, claim_documents().len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_model_still_counts_retrieved_documents() {
        let model = Arc::new(
            ScriptedModel::replying(ReplyFixtures::compliant())
                .on(prompt_marker(AuditKind::Factura), ModelBehavior::Hang)
                .on(prompt_marker(AuditKind::RutValidacion), ModelBehavior::Panic("sin respuesta".to_string())),
        );
        init_test_tracing();
        let config = EngineConfig { stage_timeout_secs: 1, ..EngineConfig::default() };
        let orchestrator = Orchestrator::new(retriever(), model, config);

        let report = orchestrator.run_full_audit(request()).await;

        assert!(report.success);
        assert_eq!(report.documents_retrieved, 12 * claim_documents().len());
        assert_eq!(expect_result(&report, AuditKind::Factura).verdict, ComplianceVerdict::NoCumple);
        assert_eq!(expect_result(&report, AuditKind::RutValidacion).verdict, ComplianceVerdict::NoCumple);
    }

    #[tokio::test]
    async fn test_panicking_model_only_fails_its_own_stage() {
        let model = Arc::new(
            ScriptedModel::replying(ReplyFixtures::compliant())
                .on(prompt_marker(AuditKind::Medicamentos), ModelBehavior::Panic("modelo caído".to_string())),
        );
        let report = orchestrator(retriever(), model).run_full_audit(request()).await;

        assert!(report.success);
        let results = expect_v1_results(&report);
        assert_complete_result_set(results);
        for result in results {
            if result.kind == AuditKind::Medicamentos {
                assert_eq!(result.verdict, ComplianceVerdict::NoCumple);
                assert!(result.justification.contains("modelo caído"));
                assert_eq!(result.deductions.len(), 1);
            } else {
                assert_eq!(result.verdict, ComplianceVerdict::Cumple, "{} should comply", result.kind);
            }
        }
    }

    #[tokio::test]
    async fn test_every_kind_degrades_instead_of_failing() {
        let behaviors = [
            ModelBehavior::Fail("503".to_string()),
            ModelBehavior::Panic("boom".to_string()),
            ModelBehavior::Reply("sin conclusión".to_string()),
        ];

        for behavior in behaviors {
            let model = Arc::new(ScriptedModel::new(behavior.clone()));
            let orchestrator = orchestrator(retriever(), model);
            let request = request();

            for kind in AuditKind::ALL {
                let outcome = orchestrator
                    .runner()
                    .run_stage(&StageRequest::for_kind(kind, &request))
                    .await;

                assert_eq!(outcome.result.kind, kind);
                assert_eq!(outcome.result.verdict, ComplianceVerdict::NoCumple, "{kind} with {behavior:?}");
                if kind.is_special() {
                    let finding = outcome.result.special_finding.as_ref().expect("special finding");
                    assert!(finding.has_deduction);
                    assert_eq!(finding.classification_code.as_deref(), Some("999"));
                    assert!(outcome.result.deductions.is_empty());
                }
            }
        }
    }

    #[tokio::test]
    async fn test_special_finding_is_kept_from_structured_reply() {
        let model = Arc::new(
            ScriptedModel::replying(ReplyFixtures::compliant())
                .on_reply(prompt_marker(AuditKind::RutValidacion), ReplyFixtures::special_with_finding("816")),
        );
        let report = orchestrator(retriever(), model).run_full_audit(request()).await;

        let rut = expect_result(&report, AuditKind::RutValidacion);
        assert_eq!(rut.verdict, ComplianceVerdict::NoCumple);
        let finding = rut.special_finding.as_ref().expect("finding");
        assert_eq!(finding.classification_code.as_deref(), Some("816"));
        assert_eq!(finding.referenced_documents, "RUT, Factura");
    }
}

// ============================================================================
// Context Tests
// ============================================================================

mod context_tests {
    use super::*;

    #[tokio::test]
    async fn test_context_is_cut_with_marker() {
        let long = "x".repeat(3000);
        let retriever = Arc::new(
            InMemoryRetriever::with_documents(vec![RetrievedDocument::new(1, long.clone())])
                .on_query(CATALOG_QUERY_NEEDLE, Vec::new()),
        );
        let model = Arc::new(ScriptedModel::replying(ReplyFixtures::compliant()));
        let orchestrator = orchestrator(retriever, model.clone());
        let request = AuditRequest { max_context_chars: 1000, ..request() };

        orchestrator
            .runner()
            .run(&StageRequest::for_kind(AuditKind::Factura, &request))
            .await;

        let full = format!("Documento 1:\n{long}");
        let expected: String = full.chars().take(1000).collect::<String>() + TRUNCATION_MARKER;
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(&expected));
        assert!(!prompts[0].contains(&full));
    }

    #[tokio::test]
    async fn test_failed_retrieval_uses_placeholder_and_completes() {
        let model = Arc::new(ScriptedModel::replying(ReplyFixtures::compliant()));
        init_test_tracing();
        let orchestrator = Orchestrator::new(Arc::new(FailingRetriever), model.clone(), EngineConfig::default());

        let report = orchestrator.run_full_audit(request()).await;

        assert!(report.success);
        assert_eq!(report.documents_retrieved, 0);
        assert_eq!(model.calls(), 12);
        assert!(model.prompts().iter().all(|p| p.contains(NO_CONTEXT_PLACEHOLDER)));
        assert!(expect_v1_results(&report).iter().all(|r| r.deductions.is_empty()));
    }

    #[tokio::test]
    async fn test_custom_query_reaches_retriever() {
        let retriever = retriever();
        let model = Arc::new(ScriptedModel::replying(ReplyFixtures::compliant()));
        let mut request = request();
        request.custom_queries = Some([("maos".to_string(), "factura proveedor placas".to_string())].into());

        orchestrator(retriever.clone(), model).run_full_audit(request).await;

        let queries = retriever.queries();
        assert!(queries.iter().any(|q| q == "factura proveedor placas"));
        assert!(!queries.iter().any(|q| q == AuditKind::Maos.default_query()));
    }
}

// ============================================================================
// Catalog Tests
// ============================================================================

mod catalog_tests {
    use super::*;

    #[tokio::test]
    async fn test_chunks_from_other_files_are_ignored() {
        let mut chunks = catalog_chunks();
        chunks.push(foreign_catalog_chunk());
        let retriever = Arc::new(InMemoryRetriever::empty().on_query(CATALOG_QUERY_NEEDLE, chunks));
        let extractor = GlosaExtractor::new(retriever, CATALOG_FILE_ID, 50);

        let records = extractor.extract_for(AuditKind::Factura).await;
        let codes: Vec<_> = records.iter().map(|r| r.code.as_str()).collect();

        assert_eq!(codes, vec!["223", "101"]);
    }

    #[tokio::test]
    async fn test_special_kind_skips_retrieval() {
        let retriever = Arc::new(InMemoryRetriever::with_documents(catalog_chunks()));
        let extractor = GlosaExtractor::new(retriever.clone(), CATALOG_FILE_ID, 50);

        assert!(extractor.extract_for(AuditKind::RutValidacion).await.is_empty());
        assert!(retriever.queries().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_query_names_kind_label() {
        let retriever = Arc::new(InMemoryRetriever::with_documents(catalog_chunks()));
        let extractor = GlosaExtractor::new(retriever.clone(), CATALOG_FILE_ID, 50);

        let records = extractor.extract_for(AuditKind::Medicamentos).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "305");
        assert_eq!(retriever.queries(), vec!["Tipo: Medicamentos glosa detalle segmento"]);
    }

    #[tokio::test]
    async fn test_kind_without_entries_yields_empty() {
        let extractor = GlosaExtractor::new(retriever(), CATALOG_FILE_ID, 50);
        assert!(extractor.extract_for(AuditKind::Examenes).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_catalog_lookup_yields_empty() {
        let extractor = GlosaExtractor::new(Arc::new(FailingRetriever), CATALOG_FILE_ID, 50);
        assert!(extractor.extract_for(AuditKind::Factura).await.is_empty());
    }
}

// ============================================================================
// Report Tests
// ============================================================================

mod report_tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_request_returns_failed_envelope() {
        let model = Arc::new(ScriptedModel::replying(ReplyFixtures::compliant()));
        let orchestrator = orchestrator(retriever(), model.clone());

        let report = orchestrator
            .run_full_audit(AuditRequest { k: 0, ..request() })
            .await;

        assert!(!report.success);
        assert!(report.error.as_deref().is_some_and(|e| e.starts_with("Invalid request")));
        assert_eq!(model.calls(), 0);
        assert_eq!(
            report.payload,
            ReportPayload::V1 { individual_audits: Vec::new(), master_audit: None }
        );
    }

    #[tokio::test]
    async fn test_v1_envelope_shape_and_document_count() {
        let model = Arc::new(ScriptedModel::replying(ReplyFixtures::compliant()).with_id("auditor-v1"));
        let report = orchestrator(retriever(), model).run_full_audit(request()).await;

        assert_eq!(report.documents_retrieved, 12 * claim_documents().len());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["success"], Value::Bool(true));
        assert_eq!(json["model_used"], "auditor-v1");
        assert_eq!(json["individual_audits"].as_array().map(Vec::len), Some(12));
        assert_eq!(json["individual_audits"][0]["audit_type"], "factura");
        assert_eq!(json["master_audit"]["decision"], "Aprobada total");
        assert!(json.get("audit_result").is_none());
    }

    #[tokio::test]
    async fn test_master_audit_returns_claim_with_five_failures() {
        let mut model = ScriptedModel::replying(ReplyFixtures::compliant());
        for kind in &AuditKind::SPECIAL {
            model = model.on(prompt_marker(*kind), ModelBehavior::Fail("503".to_string()));
        }
        let report = orchestrator(retriever(), Arc::new(model)).run_full_audit(request()).await;

        match &report.payload {
            ReportPayload::V1 { master_audit: Some(master), .. } => {
                assert_eq!(master.decision, DecisionKind::Returned);
                assert!(master
                    .justification
                    .contains(&format!("{}: No cumple", AuditKind::PagadorAdres.label())));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_master_audit_can_be_skipped() {
        let model = Arc::new(ScriptedModel::replying(ReplyFixtures::compliant()));
        let report = orchestrator(retriever(), model)
            .run_full_audit(AuditRequest { run_master_audit: false, ..request() })
            .await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["master_audit"], Value::Null);
    }

    #[tokio::test]
    async fn test_derived_v2_document() {
        let model = Arc::new(
            ScriptedModel::replying(ReplyFixtures::compliant())
                .on_reply(prompt_marker(AuditKind::PagadorAdres), ReplyFixtures::special_with_finding("815")),
        );
        let request = AuditRequest {
            response_format: ResponseFormat::V2,
            claim_id: Some("RC-2024-118".to_string()),
            ..request()
        };

        let report = orchestrator(retriever(), model).run_full_audit(request).await;

        assert!(report.success);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("individual_audits").is_none());
        let document = &json["audit_result"];
        assert_eq!(document["identificacion_reclamacion"], "RC-2024-118");
        assert_eq!(document["glosa_total"], true);
        assert_eq!(document["clasificacion_glosas_totales"][0]["codigo"], "815");

        let codes: Vec<_> = document["items_reclamados"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["codigo"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(codes, vec!["FACTURA_001", "MEDICAMENTOS_001"]);
        assert_classification_keys_consistent(document);
    }

    #[test]
    fn test_derived_v2_from_built_results() {
        let results = ResultSetBuilder::new()
            .with_non_compliant(2)
            .with_deductions(3)
            .with_special_finding(AuditKind::RutValidacion, deduction_finding(None, "No aplica"))
            .build();

        match ResponseFormatter::v2_derived(&results, None) {
            ReportPayload::V2 { audit_result: Some(document) } => {
                assert_eq!(document.claim_id, "reclamacion_auditoria_medica");
                assert!(document.has_total_deduction);
                assert_eq!(document.total_deductions[0].code, "999");
                assert!(document.total_deductions[0].references.is_empty());
                let codes: Vec<_> = document.items.iter().map(|item| item.code()).collect();
                assert_eq!(codes, vec!["FACTURA_001", "HISTORIA_CLINICA_001", "MEDICAMENTOS_001"]);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_direct_v2_without_items_gets_placeholder() {
        let model = Arc::new(
            ScriptedModel::replying(ReplyFixtures::compliant())
                .on_reply(COMPREHENSIVE_PROMPT_MARKER, ReplyFixtures::direct_without_items()),
        );
        let request = AuditRequest {
            response_format: ResponseFormat::V2,
            v2_generation: V2Generation::Direct,
            ..request()
        };

        let report = orchestrator(retriever(), model.clone()).run_full_audit(request).await;

        assert!(report.success);
        assert_eq!(report.documents_retrieved, 13 * claim_documents().len());
        assert_eq!(model.calls(), 13);

        let json = serde_json::to_value(&report).unwrap();
        let items = json["audit_result"]["items_reclamados"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0],
            serde_json::json!({"codigo": "ITM-001", "nombre": "Servicios médicos generales", "glosa_parcial": false, "valor": 0})
        );
        assert_eq!(json["audit_result"]["identificacion_reclamacion"], "REC-7");
    }

    #[tokio::test]
    async fn test_direct_v2_floors_values() {
        let model = Arc::new(
            ScriptedModel::replying(ReplyFixtures::compliant())
                .on_reply(COMPREHENSIVE_PROMPT_MARKER, ReplyFixtures::direct_with_items()),
        );
        let request = AuditRequest {
            response_format: ResponseFormat::V2,
            v2_generation: V2Generation::Direct,
            ..request()
        };

        let report = orchestrator(retriever(), model).run_full_audit(request).await;

        let json = serde_json::to_value(&report).unwrap();
        let document = &json["audit_result"];
        assert_eq!(document["items_reclamados"][1]["valor"], 80000);
        assert_eq!(document["items_reclamados"][1]["clasificacion_glosas"][0]["codigo"], 101);
        assert!(document["items_reclamados"][0].get("clasificacion_glosas").is_none());
        assert_classification_keys_consistent(document);
    }

    #[tokio::test]
    async fn test_direct_v2_model_failure_uses_conservative_record() {
        let model = Arc::new(
            ScriptedModel::replying(ReplyFixtures::compliant())
                .on(COMPREHENSIVE_PROMPT_MARKER, ModelBehavior::Fail("503".to_string())),
        );
        let request = AuditRequest {
            response_format: ResponseFormat::V2,
            v2_generation: V2Generation::Direct,
            claim_id: Some("RC-9".to_string()),
            ..request()
        };

        let report = orchestrator(retriever(), model).run_full_audit(request).await;

        assert!(report.success);
        let json = serde_json::to_value(&report).unwrap();
        let document = &json["audit_result"];
        assert_eq!(document["identificacion_reclamacion"], "RC-9");
        assert_eq!(document["glosa_total"], true);
        assert_eq!(document["clasificacion_glosas_totales"][0]["codigo"], "999");
        assert_eq!(document["items_reclamados"][0]["codigo"], "ERROR_001");
    }

    #[tokio::test]
    async fn test_configured_model_id_is_reported() {
        let model = Arc::new(ScriptedModel::replying(ReplyFixtures::compliant()));
        let config = EngineConfig { model_id: Some("auditor-large".to_string()), ..EngineConfig::default() };
        let orchestrator = Orchestrator::new(retriever(), model, config);

        let report = orchestrator.run_full_audit(orchestrator.new_request([CLAIM_FILE_ID])).await;

        assert_eq!(report.model_used, "auditor-large");
        assert!(report.execution_time_seconds >= 0.0);
    }
}

// ============================================================================
// Question Tests
// ============================================================================

mod question_tests {
    use super::*;

    #[tokio::test]
    async fn test_structured_question_is_answered() {
        let model = Arc::new(ScriptedModel::replying("").on_reply(QUESTION_PROMPT_MARKER, ReplyFixtures::non_compliant()));
        let orchestrator = orchestrator(retriever(), model.clone());

        let report = orchestrator
            .answer_question(QuestionRequest::new("¿La factura tiene CUFE?", [CLAIM_FILE_ID]))
            .await;

        assert!(report.success);
        assert_eq!(report.documents_retrieved, 3);
        assert_eq!(
            report.answer,
            Some(QuestionAnswer::Structured {
                response: ComplianceVerdict::NoCumple,
                justification: "Falta el CUFE en página 3.".to_string(),
            })
        );
        assert!(report.context_used.starts_with("Documento 1:"));
        assert_eq!(report.context_length, report.context_used.chars().count());
        assert!(model.prompts()[0].contains("Pregunta: ¿La factura tiene CUFE?"));
    }

    #[tokio::test]
    async fn test_free_text_question_is_answered() {
        let model = Arc::new(ScriptedModel::replying("  El paciente cumple con los soportes.  "));
        let mut request = QuestionRequest::new("¿Hay soportes?", [CLAIM_FILE_ID]);
        request.use_structured_output = false;

        let report = orchestrator(retriever(), model).answer_question(request).await;

        assert_eq!(
            report.answer,
            Some(QuestionAnswer::Text("El paciente cumple con los soportes.".to_string()))
        );
        assert_eq!(report.response_length, "El paciente cumple con los soportes.".chars().count());
    }

    #[tokio::test]
    async fn test_question_without_documents_skips_model() {
        let model = Arc::new(ScriptedModel::replying(ReplyFixtures::compliant()));
        let orchestrator = orchestrator(Arc::new(InMemoryRetriever::empty()), model.clone());

        let report = orchestrator
            .answer_question(QuestionRequest::new("¿Hay RUT?", [CLAIM_FILE_ID]))
            .await;

        assert!(report.success);
        assert_eq!(model.calls(), 0);
        assert_eq!(report.documents_retrieved, 0);
        assert!(matches!(
            report.answer,
            Some(QuestionAnswer::Structured { response: ComplianceVerdict::NoCumple, .. })
        ));
    }

    #[tokio::test]
    async fn test_question_model_failure_is_reported() {
        let model = Arc::new(ScriptedModel::new(ModelBehavior::Fail("503".to_string())));
        let report = orchestrator(retriever(), model)
            .answer_question(QuestionRequest::new("¿Hay RUT?", [CLAIM_FILE_ID]))
            .await;

        assert!(!report.success);
        assert!(report.answer.is_none());
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected() {
        let model = Arc::new(ScriptedModel::replying(ReplyFixtures::compliant()));
        let report = orchestrator(retriever(), model.clone())
            .answer_question(QuestionRequest::new("  ", [CLAIM_FILE_ID]))
            .await;

        assert!(!report.success);
        assert_eq!(model.calls(), 0);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_derived_documents_respect_classification_rule(results in result_set_strategy()) {
        assert_complete_result_set(&results);
        match ResponseFormatter::v2_derived(&results, None) {
            ReportPayload::V2 { audit_result: Some(document) } => {
                let expected_items = results
                    .iter()
                    .filter(|r| r.kind.is_standard() && !r.deductions.is_empty())
                    .count()
                    .max(1);
                prop_assert_eq!(document.items.len(), expected_items);
                let json = serde_json::to_value(&document).unwrap();
                assert_classification_keys_consistent(&json);
            }
            other => prop_assert!(false, "unexpected payload {:?}", other),
        }
    }
}

proptest! {
    #[test]
    fn prop_stage_uses_its_own_prompt(kind in audit_kind_strategy()) {
        let request = AuditRequest::for_files([CLAIM_FILE_ID]);
        let stage = StageRequest::for_kind(kind, &request);
        prop_assert!(stage.template.contains(prompt_marker(kind)));
        for other in AuditKind::ALL.iter().filter(|other| **other != kind) {
            prop_assert!(!stage.template.contains(prompt_marker(*other)));
        }
    }
}
