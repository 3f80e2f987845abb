//! The fixed battery of audit kinds
//!
//! Seven *standard* kinds check the claim against the official deduction
//! catalog. Five *special* kinds carry their deduction logic inside their own
//! prompt and report a [`SpecialFindingResult`](crate::SpecialFindingResult)
//! instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One compliance check of the claim audit battery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Factura,
    HistoriaClinica,
    Medicamentos,
    Examenes,
    Procedimientos,
    Maos,
    Certificados,
    FormulariosLegales,
    RutValidacion,
    DatosPaciente,
    ConsistenciaDocumento,
    PagadorAdres,
}

impl AuditKind {
    /// Every kind in execution and reporting order
    pub const ALL: [AuditKind; 12] = [
        AuditKind::Factura,
        AuditKind::HistoriaClinica,
        AuditKind::Medicamentos,
        AuditKind::Examenes,
        AuditKind::Procedimientos,
        AuditKind::Maos,
        AuditKind::Certificados,
        AuditKind::FormulariosLegales,
        AuditKind::RutValidacion,
        AuditKind::DatosPaciente,
        AuditKind::ConsistenciaDocumento,
        AuditKind::PagadorAdres,
    ];

    /// Kinds that consult the deduction catalog
    pub const STANDARD: [AuditKind; 7] = [
        AuditKind::Factura,
        AuditKind::HistoriaClinica,
        AuditKind::Medicamentos,
        AuditKind::Examenes,
        AuditKind::Procedimientos,
        AuditKind::Maos,
        AuditKind::Certificados,
    ];

    /// Kinds whose prompt embeds its own deduction rules
    pub const SPECIAL: [AuditKind; 5] = [
        AuditKind::FormulariosLegales,
        AuditKind::RutValidacion,
        AuditKind::DatosPaciente,
        AuditKind::ConsistenciaDocumento,
        AuditKind::PagadorAdres,
    ];

    pub fn is_standard(&self) -> bool {
        !self.is_special()
    }

    pub fn is_special(&self) -> bool {
        matches!(
            self,
            AuditKind::FormulariosLegales
                | AuditKind::RutValidacion
                | AuditKind::DatosPaciente
                | AuditKind::ConsistenciaDocumento
                | AuditKind::PagadorAdres
        )
    }

    /// Wire key used in v1 output and in per-kind query overrides
    pub fn key(&self) -> &'static str {
        match self {
            AuditKind::Factura => "factura",
            AuditKind::HistoriaClinica => "historia_clinica",
            AuditKind::Medicamentos => "medicamentos",
            AuditKind::Examenes => "examenes",
            AuditKind::Procedimientos => "procedimientos",
            AuditKind::Maos => "maos",
            AuditKind::Certificados => "certificados",
            AuditKind::FormulariosLegales => "formularios_legales",
            AuditKind::RutValidacion => "rut_validacion",
            AuditKind::DatosPaciente => "datos_paciente",
            AuditKind::ConsistenciaDocumento => "consistencia_documento",
            AuditKind::PagadorAdres => "pagador_adres",
        }
    }

    /// Canonical label, matched against the catalog `Tipo` field
    pub fn label(&self) -> &'static str {
        match self {
            AuditKind::Factura => "Factura",
            AuditKind::HistoriaClinica => "Historia Clínica",
            AuditKind::Medicamentos => "Medicamentos",
            AuditKind::Examenes => "Exámenes",
            AuditKind::Procedimientos => "Procedimientos",
            AuditKind::Maos => "MAOS",
            AuditKind::Certificados => "Certificados",
            AuditKind::FormulariosLegales => "Formularios Legales",
            AuditKind::RutValidacion => "RUT Validación",
            AuditKind::DatosPaciente => "Datos Paciente",
            AuditKind::ConsistenciaDocumento => "Consistencia Documento",
            AuditKind::PagadorAdres => "Pagador ADRES",
        }
    }

    /// Retrieval query used when the caller supplies no override
    pub fn default_query(&self) -> &'static str {
        match self {
            AuditKind::Factura => {
                "factura médica número fecha emisión CUFE valor total detalle cargos"
            }
            AuditKind::HistoriaClinica => {
                "historia clínica triage motivo consulta diagnóstico notas médicas órdenes epicrisis"
            }
            AuditKind::Medicamentos => {
                "órdenes médicas medicamentos administración enfermería firma médico CUM"
            }
            AuditKind::Examenes => {
                "exámenes laboratorio imágenes diagnósticas CUPS informe especialista"
            }
            AuditKind::Procedimientos => {
                "procedimientos quirúrgicos nota operatoria cirujano anestesiólogo"
            }
            AuditKind::Maos => {
                "materiales osteosíntesis factura proveedor CUFE proveedor incremento 12%"
            }
            AuditKind::Certificados => {
                "certificado autoridad policía SOAT ECAT documentación legal"
            }
            AuditKind::FormulariosLegales => {
                "formulario único reclamación prestadores servicios salud FURIPS transporte movilización víctimas"
            }
            AuditKind::RutValidacion => "registro único tributario RUT DIAN fecha expedición NIT",
            AuditKind::DatosPaciente => {
                "paciente identificación nombre documento número fecha nacimiento"
            }
            AuditKind::ConsistenciaDocumento => {
                "número documento identificación paciente CC TI CE pasaporte"
            }
            AuditKind::PagadorAdres => {
                "pagador NIT ADRES administradora recursos sistema seguridad social"
            }
        }
    }

    /// Classification code a special audit reports when its deduction applies
    pub fn special_code(&self) -> Option<&'static str> {
        match self {
            AuditKind::FormulariosLegales => Some("332"),
            AuditKind::RutValidacion => Some("816"),
            AuditKind::DatosPaciente => Some("814"),
            AuditKind::ConsistenciaDocumento => Some("326"),
            AuditKind::PagadorAdres => Some("815"),
            _ => None,
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for AuditKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditKind::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| format!("unknown audit kind: {s}"))
    }
}
