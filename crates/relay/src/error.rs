//! Fehlertypen fuer den Relay-Service

use thiserror::Error;

/// Fehlertyp fuer Relay-Operationen
///
/// Jeder Fehler wird dem Ausloeser als `error`-Ereignis zugestellt,
/// andere Verbindungen bekommen davon nichts mit.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Verbindung hat sich noch nicht registriert
    #[error("Nicht verbunden – bitte zuerst registrieren")]
    NichtVerbunden,

    /// Verbindung ist keinem Raum beigetreten
    #[error("Sie sind keinem Raum beigetreten")]
    NichtImRaum,

    /// Raum existiert nicht (mehr)
    #[error("Raum nicht gefunden: {0}")]
    RaumNichtGefunden(String),

    /// Eingabe hat die Validierung nicht bestanden
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),
}

impl RelayError {
    /// Erstellt einen Validierungsfehler
    pub fn ungueltige_eingabe(msg: impl Into<String>) -> Self {
        Self::UngueltigeEingabe(msg.into())
    }
}

/// Result-Typ fuer Relay-Operationen
pub type RelayResult<T> = Result<T, RelayError>;
