//! Verbindungs-Registry – Wer ist verbunden, unter welchem Namen
//!
//! Die Registry haelt pro Verbindung einen [`Teilnehmer`]-Eintrag mit
//! Anzeigenamen, aktuellem Raum und den Profildaten des Clients.
//!
//! Die Registry selbst ist nicht thread-safe: sie lebt zusammen mit dem
//! Raumverzeichnis hinter dem Lock des
//! [`PresenceCoordinator`](crate::presence::PresenceCoordinator).

use serde_json::{Map, Value};
use stammtisch_core::types::{ConnectionId, RoomId};
use stammtisch_protocol::events::Profil;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Teilnehmer
// ---------------------------------------------------------------------------

/// Registrierter Teilnehmer einer Verbindung
#[derive(Debug, Clone)]
pub struct Teilnehmer {
    pub id: ConnectionId,
    /// Anzeigename, nie leer
    pub username: String,
    /// Aktueller Raum (None = in keinem Raum)
    pub raum: Option<RoomId>,
    /// Weitere Profilfelder aus der Registrierung, unveraendert
    pub profil: Map<String, Value>,
}

impl Teilnehmer {
    /// Erstellt einen Teilnehmer aus den Profildaten einer Registrierung
    ///
    /// Fehlt der Benutzername oder besteht er nur aus Leerzeichen, wird
    /// ein automatischer Anzeigename aus der Verbindungs-ID vergeben.
    pub fn aus_profil(id: ConnectionId, profil: Profil) -> Self {
        let username = match profil.username {
            Some(name) if !name.trim().is_empty() => name,
            _ => format!("Gast_{}", id.kurzform()),
        };

        Self {
            id,
            username,
            raum: None,
            profil: profil.extra,
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionRegistry
// ---------------------------------------------------------------------------

/// Registry aller registrierten Verbindungen
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    teilnehmer: HashMap<ConnectionId, Teilnehmer>,
}

impl ConnectionRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self {
            teilnehmer: HashMap::new(),
        }
    }

    /// Registriert einen Teilnehmer
    ///
    /// Eine erneute Registrierung derselben Verbindung ueberschreibt den
    /// bestehenden Eintrag vollstaendig.
    pub fn registrieren(&mut self, teilnehmer: Teilnehmer) {
        self.teilnehmer.insert(teilnehmer.id, teilnehmer);
    }

    /// Sucht einen Teilnehmer
    pub fn suchen(&self, verbindung: &ConnectionId) -> Option<&Teilnehmer> {
        self.teilnehmer.get(verbindung)
    }

    /// Sucht einen Teilnehmer zum Aendern
    pub fn suchen_mut(&mut self, verbindung: &ConnectionId) -> Option<&mut Teilnehmer> {
        self.teilnehmer.get_mut(verbindung)
    }

    /// Entfernt einen Teilnehmer und gibt seinen Eintrag zurueck
    pub fn entfernen(&mut self, verbindung: &ConnectionId) -> Option<Teilnehmer> {
        self.teilnehmer.remove(verbindung)
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, verbindung: &ConnectionId) -> bool {
        self.teilnehmer.contains_key(verbindung)
    }

    /// Gibt die Anzahl der registrierten Teilnehmer zurueck
    pub fn anzahl(&self) -> usize {
        self.teilnehmer.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn teilnehmer_mit_username_aus_profil() {
        let id = ConnectionId::new();
        let teilnehmer = Teilnehmer::aus_profil(id, Profil::mit_username("anna"));

        assert_eq!(teilnehmer.username, "anna");
        assert_eq!(teilnehmer.id, id);
        assert!(teilnehmer.raum.is_none());
    }

    #[test]
    fn teilnehmer_ohne_username_bekommt_gastnamen() {
        let id = ConnectionId::new();
        let teilnehmer = Teilnehmer::aus_profil(id, Profil::default());

        assert_eq!(teilnehmer.username, format!("Gast_{}", id.kurzform()));
    }

    #[test]
    fn leerer_username_bekommt_gastnamen() {
        let id = ConnectionId::new();
        let teilnehmer = Teilnehmer::aus_profil(id, Profil::mit_username("   "));

        assert!(teilnehmer.username.starts_with("Gast_"));
    }

    #[test]
    fn profilfelder_bleiben_erhalten() {
        let id = ConnectionId::new();
        let mut profil = Profil::mit_username("bela");
        profil.extra.insert("avatar".to_string(), json!("rot"));

        let teilnehmer = Teilnehmer::aus_profil(id, profil);
        assert_eq!(teilnehmer.profil.get("avatar"), Some(&json!("rot")));
    }

    #[test]
    fn registrieren_und_suchen() {
        let mut registry = ConnectionRegistry::neu();
        let id = ConnectionId::new();

        registry.registrieren(Teilnehmer::aus_profil(id, Profil::mit_username("carla")));
        assert!(registry.ist_registriert(&id));
        assert_eq!(registry.anzahl(), 1);

        let gefunden = registry.suchen(&id).expect("Teilnehmer muss existieren");
        assert_eq!(gefunden.username, "carla");
    }

    #[test]
    fn erneute_registrierung_ueberschreibt() {
        let mut registry = ConnectionRegistry::neu();
        let id = ConnectionId::new();

        registry.registrieren(Teilnehmer::aus_profil(id, Profil::mit_username("alt")));
        registry.registrieren(Teilnehmer::aus_profil(id, Profil::mit_username("neu")));

        assert_eq!(registry.anzahl(), 1);
        assert_eq!(registry.suchen(&id).unwrap().username, "neu");
    }

    #[test]
    fn entfernen_gibt_eintrag_zurueck() {
        let mut registry = ConnectionRegistry::neu();
        let id = ConnectionId::new();

        registry.registrieren(Teilnehmer::aus_profil(id, Profil::mit_username("doro")));
        let entfernt = registry.entfernen(&id).expect("Eintrag muss vorhanden sein");

        assert_eq!(entfernt.username, "doro");
        assert!(!registry.ist_registriert(&id));
        assert_eq!(registry.anzahl(), 0);

        // Zweites Entfernen ist ein No-Op
        assert!(registry.entfernen(&id).is_none());
    }
}
