//! Gemeinsame Identifikationstypen fuer Stammtisch
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Verbindungs-ID
///
/// Wird vom Transport beim Annehmen der Verbindung vergeben und bleibt
/// fuer die Lebensdauer der Verbindung stabil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }

    /// Gibt die ersten fuenf Hex-Zeichen der ID zurueck
    ///
    /// Wird fuer automatisch generierte Anzeigenamen verwendet.
    pub fn kurzform(&self) -> String {
        self.0.simple().to_string()[..5].to_string()
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Eindeutige Raum-ID
///
/// Raeume werden vom Client frei benannt; die ID ist der Name selbst.
/// Serialisiert als einfacher String.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Erstellt eine RoomId aus einem beliebigen Namen
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Gibt den Raumnamen als &str zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "raum:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_eindeutig() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b, "Zwei neue ConnectionIds muessen verschieden sein");
    }

    #[test]
    fn connection_id_kurzform_hat_fuenf_zeichen() {
        let id = ConnectionId::new();
        assert_eq!(id.kurzform().len(), 5);
    }

    #[test]
    fn connection_id_display() {
        let id = ConnectionId(Uuid::nil());
        assert!(id.to_string().starts_with("conn:"));
    }

    #[test]
    fn room_id_serialisiert_als_string() {
        let raum = RoomId::new("lobby");
        let json = serde_json::to_string(&raum).unwrap();
        assert_eq!(json, "\"lobby\"");

        let zurueck: RoomId = serde_json::from_str(&json).unwrap();
        assert_eq!(zurueck, raum);
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let cid = ConnectionId::new();
        let json = serde_json::to_string(&cid).unwrap();
        let cid2: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(cid, cid2);
    }
}
