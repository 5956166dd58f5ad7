//! Error classification against a knowledge base of known failure signatures.
//!
//! Matching is first-match-wins over a fixed declaration order: the specific
//! signatures are scanned first, then the generic bucket. Overlapping
//! patterns resolve to whichever was declared earlier.

use hotspot_runner::{push_indented, ExecutionRecord, TraceSession};
use serde::Serialize;
use tracing::debug;

const BANNER_WIDTH: usize = 60;

/// A known failure signature.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorSignature {
    /// Lowercase substring matched against the raw error text
    pub pattern: &'static str,
    /// One-line human description
    pub description: &'static str,
    /// Ordered remediation steps (unnumbered)
    pub remediation: &'static [&'static str],
}

/// Entries of the generic fallback bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GenericKind {
    NoAdapter,
    NotSupported,
    Unknown,
}

/// Which part of the knowledge base produced a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosisSource {
    Specific(&'static str),
    Generic(GenericKind),
    /// Raw text matched nothing and is echoed back
    Unmatched,
    /// Raw text was empty
    Unexpected,
}

/// Structured diagnosis ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub description: String,
    pub remediation: Vec<String>,
    pub source: DiagnosisSource,
}

impl Diagnosis {
    fn from_signature(signature: &ErrorSignature, source: DiagnosisSource) -> Self {
        Self {
            description: signature.description.to_string(),
            remediation: signature.remediation.iter().map(|s| s.to_string()).collect(),
            source,
        }
    }

    /// Description followed by the numbered remediation list.
    pub fn render(&self) -> String {
        let steps: Vec<String> = self
            .remediation
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect();
        format!(
            "{}\n\nPosibles soluciones:\n{}",
            self.description,
            steps.join("\n")
        )
    }
}

static SPECIFIC_SIGNATURES: &[ErrorSignature] = &[
    ErrorSignature {
        pattern: "hosted network couldn't be started",
        description: "No se pudo iniciar el punto de acceso.",
        remediation: &[
            "Asegurate de ejecutar la aplicacion como Administrador",
            "Verifica que el WiFi este encendido",
            "Desactiva cualquier VPN o firewall temporalmente",
            "Reinicia el adaptador de red desde Administrador de dispositivos",
            "Cierra otras aplicaciones que puedan usar el WiFi (como Mobile Hotspot de Windows)",
        ],
    },
    ErrorSignature {
        pattern: "group or resource is not in the correct state",
        description: "El adaptador de red no esta en el estado correcto.",
        remediation: &[
            "Ve a Configuracion > Red e Internet > Configuracion avanzada de red",
            "Desactiva y reactiva el adaptador WiFi",
            "Ejecuta como Administrador: netsh wlan set hostednetwork mode=disallow",
            "Vuelve a ejecutar: netsh wlan set hostednetwork mode=allow",
            "Si persiste, reinicia la computadora",
        ],
    },
    ErrorSignature {
        pattern: "access is denied",
        description: "Acceso denegado.",
        remediation: &[
            "Ejecuta la aplicacion como Administrador",
            "Clic derecho en el ejecutable > Ejecutar como administrador",
        ],
    },
    ErrorSignature {
        pattern: "wireless local area network interface is powered down",
        description: "El adaptador WiFi esta apagado.",
        remediation: &[
            "Enciende el WiFi desde la barra de tareas o Configuracion",
            "Verifica que no este en modo avion",
            "Revisa el interruptor fisico de WiFi (si tu laptop tiene uno)",
        ],
    },
    ErrorSignature {
        pattern: "the device is not ready",
        description: "El dispositivo de red no esta listo.",
        remediation: &[
            "Espera unos segundos e intenta de nuevo",
            "Reinicia el adaptador WiFi desde Administrador de dispositivos",
            "Desconecta y reconecta el adaptador USB WiFi (si aplica)",
        ],
    },
    ErrorSignature {
        pattern: "element not found",
        description: "No se encontro el elemento de red.",
        remediation: &[
            "El hotspot puede no estar configurado. Crea uno nuevo.",
            "Ejecuta primero: netsh wlan set hostednetwork mode=allow",
        ],
    },
    ErrorSignature {
        pattern: "the parameter is incorrect",
        description: "Parametro incorrecto.",
        remediation: &[
            "Verifica que el SSID no tenga caracteres especiales",
            "Usa solo letras y numeros en la contrasena",
            "El SSID debe tener maximo 32 caracteres",
        ],
    },
    ErrorSignature {
        pattern: "the requested operation requires elevation",
        description: "Se requieren permisos de administrador.",
        remediation: &[
            "Ejecuta la aplicacion como Administrador",
            "Clic derecho > Ejecutar como administrador",
        ],
    },
    // Shadowed by the first entry; kept so the declared order stays pinned.
    ErrorSignature {
        pattern: "the hosted network couldn't be started",
        description: "El hosted network no pudo iniciarse.",
        remediation: &[
            "Verifica que el adaptador WiFi no este en uso por otra aplicacion",
            "El 'Mobile Hotspot' de Windows puede estar ocupando el adaptador",
            "Desactiva el hotspot de Windows en Configuracion > Red e Internet > Hotspot movil",
            "Reinicia el servicio WLAN AutoConfig (services.msc)",
        ],
    },
];

static NO_ADAPTER: ErrorSignature = ErrorSignature {
    pattern: "no wireless interface",
    description: "No se detecto adaptador WiFi.",
    remediation: &[
        "Verifica que tengas un adaptador WiFi instalado",
        "Revisa en Administrador de dispositivos > Adaptadores de red",
        "Instala los drivers del adaptador WiFi",
    ],
};

static NOT_SUPPORTED: ErrorSignature = ErrorSignature {
    pattern: "not supported",
    description: "Adaptador no compatible: tu adaptador WiFi no soporta Hosted Network.",
    remediation: &[
        "Usa el Mobile Hotspot de Windows (Configuracion > Red e Internet > Hotspot movil); puede funcionar aunque netsh no lo soporte",
        "Usa un adaptador USB WiFi compatible (TP-Link TL-WN722N v1, Alfa AWUS036NHA, Panda PAU09)",
        "Actualiza los drivers del adaptador desde la web del fabricante; a veces las versiones nuevas habilitan esta funcion",
    ],
};

static UNKNOWN: ErrorSignature = ErrorSignature {
    pattern: "unknown",
    description: "Error desconocido.",
    remediation: &[
        "Ejecuta como Administrador",
        "Verifica que el WiFi este activo",
        "Reinicia la aplicacion",
        "Consulta el log de Windows para mas detalles",
    ],
};

/// Knowledge base lookup with first-match-wins semantics.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    specific: Vec<ErrorSignature>,
    generic: Vec<(GenericKind, ErrorSignature)>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

impl ErrorClassifier {
    /// The built-in knowledge base.
    pub fn standard() -> Self {
        Self {
            specific: SPECIFIC_SIGNATURES.to_vec(),
            generic: vec![
                (GenericKind::NoAdapter, NO_ADAPTER.clone()),
                (GenericKind::NotSupported, NOT_SUPPORTED.clone()),
                (GenericKind::Unknown, UNKNOWN.clone()),
            ],
        }
    }

    /// Specific signatures in iteration order.
    pub fn signatures(&self) -> &[ErrorSignature] {
        &self.specific
    }

    /// Classify raw error text.
    pub fn classify(&self, raw: &str) -> Diagnosis {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            let mut diagnosis = self.generic(GenericKind::Unknown);
            diagnosis.description = "Error inesperado.".to_string();
            diagnosis.source = DiagnosisSource::Unexpected;
            return diagnosis;
        }

        let lower = trimmed.to_lowercase();

        if let Some(signature) = self.specific.iter().find(|s| lower.contains(s.pattern)) {
            debug!(pattern = signature.pattern, "Matched specific error signature");
            return Diagnosis::from_signature(signature, DiagnosisSource::Specific(signature.pattern));
        }

        if let Some((kind, signature)) = self.generic.iter().find(|(_, s)| lower.contains(s.pattern)) {
            debug!(?kind, "Matched generic error signature");
            return Diagnosis::from_signature(signature, DiagnosisSource::Generic(*kind));
        }

        let mut diagnosis = self.generic(GenericKind::Unknown);
        diagnosis.description = format!("Error: {}", trimmed);
        diagnosis.source = DiagnosisSource::Unmatched;
        diagnosis
    }

    /// Diagnosis for a generic bucket entry, without matching.
    pub fn generic(&self, kind: GenericKind) -> Diagnosis {
        let signature = self
            .generic
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, s)| s)
            .unwrap_or(&UNKNOWN);
        Diagnosis::from_signature(signature, DiagnosisSource::Generic(kind))
    }

    /// Render an error for display.
    ///
    /// Uses the technical rendering when the trace is capturing and the
    /// failing execution record is known, the plain diagnosis otherwise.
    pub fn format_error(
        &self,
        raw: &str,
        record: Option<&ExecutionRecord>,
        trace: &TraceSession,
    ) -> String {
        match record {
            Some(record) if trace.is_enabled() => self.format_developer_error(raw, record, trace),
            _ => self.classify(raw).render(),
        }
    }

    /// Full technical detail of a failed step plus the session report.
    pub fn format_developer_error(
        &self,
        raw: &str,
        record: &ExecutionRecord,
        trace: &TraceSession,
    ) -> String {
        let banner = "=".repeat(BANNER_WIDTH);
        let mut lines = vec![
            banner.clone(),
            "MODO DESARROLLADOR - INFORMACION TECNICA".to_string(),
            banner.clone(),
            String::new(),
            format!("PASO DONDE FALLO: {}", record.step()),
            format!("TIMESTAMP: {}", record.timestamp_label()),
            String::new(),
            "COMANDO EJECUTADO:".to_string(),
            format!("  {}", record.command()),
            String::new(),
            format!("CODIGO DE RETORNO: {}", record.exit_code()),
        ];

        if !record.stdout().trim().is_empty() {
            lines.push(String::new());
            push_indented(&mut lines, "SALIDA STDOUT:", record.stdout());
        }
        if !record.stderr().trim().is_empty() {
            lines.push(String::new());
            push_indented(&mut lines, "SALIDA STDERR:", record.stderr());
        }
        if !raw.trim().is_empty() {
            lines.push(String::new());
            lines.push("MENSAJE DE ERROR ORIGINAL:".to_string());
            lines.push(format!("  {}", raw));
        }

        lines.push(String::new());
        lines.push(banner.clone());
        lines.push("REPORTE COMPLETO DE LA SESION:".to_string());
        lines.push(banner);
        lines.push(trace.full_report());

        lines.join("\n")
    }
}
