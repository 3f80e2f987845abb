//! Prompt catalog
//!
//! Every template carries a single `{context}` placeholder, filled with the
//! retrieved (and possibly truncated) document context. Templates are
//! model-facing and written in Spanish, like the claims they audit.

use crate::kind::AuditKind;

/// Placeholder replaced by the document context
pub const CONTEXT_PLACEHOLDER: &str = "{context}";
/// Placeholder replaced by the caller's question
pub const QUERY_PLACEHOLDER: &str = "{query}";

macro_rules! standard_prompt {
    ($role:literal, $task:literal, $question:literal, $finding:literal) => {
        concat!(
            "Eres un auditor médico especializado en ",
            $role,
            " de accidentes de tránsito (AT/ECAT) en Colombia.\n\n",
            $task,
            "\n\nREFERENCIAS: para cada hallazgo cita la página con el formato 'página X' o 'pX' ",
            "e incluye el valor concreto encontrado, no solo la página.\n\n",
            "Contexto:\n{context}\n\n",
            "Pregunta:\n",
            $question,
            "\n\nResponde únicamente con este JSON:\n",
            "{\n  \"response\": \"Cumple\" o \"No cumple\",\n  \"justification\": \"",
            $finding,
            "\"\n}"
        )
    };
}

macro_rules! special_prompt {
    ($role:literal, $task:literal, $justification:literal, $code:literal, $deduction:literal, $documents:literal, $description:literal) => {
        concat!(
            "Eres un auditor médico especializado en ",
            $role,
            " para accidentes de tránsito (AT/ECAT) en Colombia.\n\n",
            $task,
            "\n\nContexto disponible: {context}\n\n",
            "Responde en formato JSON:\n{\n",
            "  \"response\": \"Cumple\" o \"No cumple\",\n",
            "  \"justification\": \"",
            $justification,
            "\",\n",
            "  \"special_result\": {\n",
            "    \"identificacion_reclamacion\": \"[nombre del archivo PDF]\",\n",
            "    \"estado_glosa\": 0 o 1,\n",
            "    \"justificacion\": \"No aplica\" o \"",
            $deduction,
            "\",\n",
            "    \"documentos_referenciados\": \"No aplica\" o \"",
            $documents,
            "\",\n",
            "    \"clasificacion\": null o \"",
            $code,
            "\",\n",
            "    \"description\": \"No aplica\" o \"",
            $description,
            "\"\n  }\n}"
        )
    };
}

const FACTURA: &str = standard_prompt!(
    "facturación",
    "Tarea: verifica en la factura médica los campos obligatorios:\n\
     1. Número de factura presente y alfanumérico.\n\
     2. Fecha de emisión en formato dd/mm/aaaa.\n\
     3. Nombre y documento del paciente, coincidentes con la historia clínica.\n\
     4. Valor total numérico en COP.\n\
     5. Detalle de cargos con descripción, código, cantidad, valor unitario y total.\n\
     6. CUFE presente.",
    "¿La factura cumple con todos los requisitos legales y técnicos?",
    "Hallazgos con página y valor extraído: campos faltantes, errores de formato o inconsistencias."
);

const HISTORIA_CLINICA: &str = standard_prompt!(
    "historia clínica",
    "Tarea: verifica en la historia clínica:\n\
     1. TRIAGE presente y clasificado.\n\
     2. Motivo de consulta que mencione accidente, trauma o ECAT.\n\
     3. Diagnóstico principal y relacionados compatibles con lo facturado.\n\
     4. Notas médicas que describan la evolución del paciente.\n\
     5. Órdenes médicas de medicamentos (CUM), exámenes (CUPS) y procedimientos.\n\
     6. Epicrisis si hubo hospitalización o cirugía.",
    "¿La historia clínica cumple con los estándares de documentación médica?",
    "Hallazgos con página y valor extraído: secciones faltantes, diagnósticos no compatibles o evolución incompleta."
);

const MEDICAMENTOS: &str = standard_prompt!(
    "control de medicamentos",
    "Tarea: contrasta los medicamentos cobrados con las órdenes y registros:\n\
     1. Todo medicamento cobrado debe estar en órdenes médicas.\n\
     2. Toda orden debe tener firma o sello del médico.\n\
     3. Todo medicamento ordenado debe tener registro de administración de enfermería.\n\
     4. Medicamento sin orden o sin registro de administración genera glosa.",
    "¿Los medicamentos administrados están debidamente ordenados y registrados?",
    "Medicamentos con inconsistencias, órdenes sin firma o registros faltantes, con página y CUM."
);

const EXAMENES: &str = standard_prompt!(
    "exámenes diagnósticos",
    "Tarea: verifica los exámenes de laboratorio e imágenes:\n\
     1. Todo examen cobrado debe estar en órdenes médicas.\n\
     2. Todo examen realizado debe tener informe escrito del especialista.\n\
     3. Examen sin informe o sin orden genera glosa.",
    "¿Los exámenes realizados están debidamente ordenados e interpretados?",
    "Exámenes con informes faltantes u órdenes no encontradas, con página y CUPS."
);

const PROCEDIMIENTOS: &str = standard_prompt!(
    "procedimientos quirúrgicos",
    "Tarea: verifica los procedimientos y cirugías:\n\
     1. Todo procedimiento facturado debe estar ordenado y realizado.\n\
     2. La nota operatoria debe incluir técnica, complicaciones y materiales.\n\
     3. Cirujano, anestesiólogo y ayudante deben estar registrados y firmados.\n\
     4. Falta de nota operatoria, incompatibilidad con el diagnóstico u honorarios sin registro generan glosa.",
    "¿Los procedimientos quirúrgicos están debidamente documentados y justificados?",
    "Procedimientos con notas incompletas o personal no registrado, con página y valor extraído."
);

const MAOS: &str = standard_prompt!(
    "materiales de osteosíntesis",
    "Tarea: verifica los materiales de osteosíntesis (MAOS):\n\
     1. Factura del proveedor presente y legible.\n\
     2. CUFE del proveedor presente.\n\
     3. Valor facturado por la IPS no mayor al 12% sobre el del proveedor.\n\
     4. Cantidades y dispositivos coincidentes entre IPS y proveedor.",
    "¿Los materiales quirúrgicos están debidamente facturados y justificados?",
    "Materiales con facturas faltantes o valores fuera de rango, con página, cantidad y valor."
);

const CERTIFICADOS: &str = standard_prompt!(
    "documentación legal",
    "Tarea: verifica los certificados adicionales:\n\
     1. Certificado de autoridad (policía) presente y legible.\n\
     2. Certificado SOAT presente y con datos consistentes.\n\
     3. Certificado faltante o ilegible genera glosa.",
    "¿Los certificados legales están presentes y son válidos?",
    "Certificados faltantes, ilegibles o inconsistentes, con página y número de póliza."
);

const FORMULARIOS_LEGALES: &str = special_prompt!(
    "validación de formularios legales",
    "Tarea: verifica que el documento contenga al menos uno de estos formularios oficiales:\n\
     1. Formulario Único de Reclamación de los Prestadores de Servicios de Salud (FURIPS).\n\
     2. Formulario Único de Reclamación de Gastos de Transporte y Movilización de Víctimas.\n\
     Revisa página por página; tolera errores menores de OCR pero no coincidencias parciales irrelevantes.",
    "Formulario encontrado con su página, o indicación de que ninguno de los dos formularios está presente.",
    "332",
    "Se glosa la reclamación por ausencia del FURIPS y del formulario de transporte y movilización de víctimas, obligatorios para el cobro ante la ADRES.",
    "FURIPS / Formulario de transporte",
    "Ausencia de documentos obligatorios exigidos por la normatividad para el tipo de reclamación."
);

const RUT_VALIDACION: &str = special_prompt!(
    "validación de documentos tributarios",
    "Tarea: verifica que el documento contenga el RUT expedido por la DIAN, en formato oficial, \
     con NIT y dígito de verificación, razón social, dirección, actividad económica y código de verificación. \
     La fecha de expedición no puede superar tres meses respecto a la fecha de la factura.",
    "RUT encontrado y vigente, o indicación de ausencia o de vigencia superior a tres meses.",
    "816",
    "Se devuelve la reclamación por ausencia del RUT o por no cumplir la vigencia mínima de tres meses exigida para radicación ante la ADRES.",
    "RUT",
    "Falta de soporte obligatorio para la radicación."
);

const DATOS_PACIENTE: &str = special_prompt!(
    "validación de datos de pacientes",
    "Tarea: verifica que los datos del paciente en los documentos coincidan con los del paciente facturado: \
     tipo y número de documento (exacto), nombre completo (tolerando mayúsculas, tildes y abreviaturas) \
     y fecha de nacimiento si está presente.",
    "Datos coincidentes, o lista de campos con diferencias.",
    "814",
    "Se devuelve la reclamación porque los datos del paciente no corresponden al paciente facturado.",
    "Factura / Historia Clinica",
    "Presentación de la reclamación con datos del usuario no coincidentes."
);

const CONSISTENCIA_DOCUMENTO: &str = special_prompt!(
    "validación de consistencia documental",
    "Tarea: verifica que el número de documento del paciente sea el mismo en todos los soportes \
     (FURIPS, factura, historia clínica, formato de transporte). Se toleran puntos y guiones; \
     no se toleran diferencias en dígitos.",
    "Número de documento consistente, o soportes con valor diferente.",
    "326",
    "Se glosa la reclamación porque el número de documento del usuario no coincide entre los soportes presentados.",
    "Historia Clinica",
    "Inconsistencia en la identificación del usuario."
);

const PAGADOR_ADRES: &str = special_prompt!(
    "validación de pagadores",
    "Tarea: verifica que el pagador de la factura sea la Administradora de los Recursos del Sistema \
     General de Seguridad Social en Salud (ADRES), NIT 901.037.916-1. Se toleran puntos, guiones y la \
     abreviatura ADRES; no se aceptan otras entidades.",
    "Pagador ADRES confirmado con NIT y nombre, o datos del pagador encontrado.",
    "815",
    "Se devuelve la reclamación porque el NIT o el nombre del pagador no corresponde a la ADRES.",
    "Factura / FURIPS",
    "La reclamación se presenta a una entidad diferente a la responsable del pago."
);

/// Broad query used by direct v2 generation
pub const COMPREHENSIVE_QUERY: &str = "factura médica historia clínica órdenes medicamentos exámenes procedimientos MAOS certificados formularios RUT ADRES pagador FURIPS SOAT";

/// Prompt asking the model to emit a v2 document directly
pub const COMPREHENSIVE_V2: &str = r#"Eres un auditor médico especializado en cuentas médicas de accidentes de tránsito (AT/ECAT) en Colombia.

TAREA: analiza los documentos y genera el resultado de auditoría en el formato JSON indicado.

DOCUMENTOS A ANALIZAR:
{context}

1. GLOSAS TOTALES (afectan toda la reclamación): formularios obligatorios ausentes, RUT vencido o ausente, datos del paciente inconsistentes, pagador distinto de ADRES, certificados faltantes, factura duplicada.
2. GLOSAS PARCIALES (por ítem): medicamentos sin orden, exámenes sin informe, procedimientos sin nota operatoria, cargos sin soporte, MAOS sin justificación.
3. ÍTEMS: extrae todos los servicios facturados con códigos ITM-001, ITM-002... y valores enteros.

REGLAS:
- Códigos de glosas totales como texto; códigos de glosas parciales como enteros.
- Valores sin decimales.
- Incluye "clasificacion_glosas" solo si "glosa_parcial" es true.

FORMATO:
{
  "identificacion_reclamacion": "REC-2025-00123",
  "glosa_total": false,
  "justificacion": "...",
  "clasificacion_glosas_totales": [{"codigo": "GT001", "descripcion": "...", "justificacion": "...", "referencias": ["FAC123.pdf/3"]}],
  "items_reclamados": [
    {"codigo": "ITM-001", "nombre": "Consulta médica general", "glosa_parcial": false, "valor": 50000},
    {"codigo": "ITM-002", "nombre": "Radiografía", "glosa_parcial": true, "valor": 80000,
     "clasificacion_glosas": [{"codigo": 101, "descripcion": "...", "justificacion": "...", "referencias": ["HC.pdf/12"]}]}
  ]
}

Responde ÚNICAMENTE con el JSON, sin texto adicional."#;

macro_rules! question_preamble {
    () => {
        concat!(
            "Eres un auditor médico especializado en cuentas médicas de accidentes de tránsito (AT/ECAT) en Colombia. ",
            "Analiza únicamente la información del contexto, de forma objetiva, considerando la normatividad colombiana de facturación y SOAT. ",
            "No cites documentos específicos; analiza la información de manera general."
        )
    };
}

/// Single question, JSON verdict expected
pub const QUESTION_STRUCTURED: &str = concat!(
    question_preamble!(),
    "\n\nPregunta: {query}\n\nDOCUMENTOS MÉDICOS:\n{context}\n\n",
    "Tu respuesta es binaria: \"Cumple\" si todo está conforme, \"No cumple\" ante cualquier incumplimiento o discrepancia.\n",
    "Responde ÚNICAMENTE con este JSON:\n{\n  \"response\": \"Cumple\" o \"No cumple\",\n  \"justification\": \"hallazgos y razones\"\n}"
);

/// Single question, free text expected
pub const QUESTION_FREE_TEXT: &str = concat!(
    question_preamble!(),
    "\n\nPregunta: {query}\n\nDOCUMENTOS MÉDICOS:\n{context}\n\n",
    "Responde con:\n1. RESPUESTA: \"Cumple\" o \"No cumple\".\n2. JUSTIFICACIÓN: hallazgos, evidencias y discrepancias que sustentan la respuesta."
);

/// Prompt template of an audit kind
pub fn template_for(kind: AuditKind) -> &'static str {
    match kind {
        AuditKind::Factura => FACTURA,
        AuditKind::HistoriaClinica => HISTORIA_CLINICA,
        AuditKind::Medicamentos => MEDICAMENTOS,
        AuditKind::Examenes => EXAMENES,
        AuditKind::Procedimientos => PROCEDIMIENTOS,
        AuditKind::Maos => MAOS,
        AuditKind::Certificados => CERTIFICADOS,
        AuditKind::FormulariosLegales => FORMULARIOS_LEGALES,
        AuditKind::RutValidacion => RUT_VALIDACION,
        AuditKind::DatosPaciente => DATOS_PACIENTE,
        AuditKind::ConsistenciaDocumento => CONSISTENCIA_DOCUMENTO,
        AuditKind::PagadorAdres => PAGADOR_ADRES,
    }
}

/// Fills the `{context}` placeholder
pub fn render(template: &str, context: &str) -> String {
    template.replace(CONTEXT_PLACEHOLDER, context)
}

/// Fills a question template
///
/// The query is substituted first so a `{context}` typed by the caller is
/// never expanded into document text.
pub fn render_question(template: &str, query: &str, context: &str) -> String {
    let (head, tail) = template
        .split_once(CONTEXT_PLACEHOLDER)
        .unwrap_or((template, ""));
    let mut rendered = head.replace(QUERY_PLACEHOLDER, query);
    if template.contains(CONTEXT_PLACEHOLDER) {
        rendered.push_str(context);
        rendered.push_str(tail);
    }
    rendered
}
