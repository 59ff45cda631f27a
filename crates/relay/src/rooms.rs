//! Raumverzeichnis – Raeume mit Mitgliedschaft und Nachrichten-Log
//!
//! Raeume entstehen beim ersten Beitritt und verschwinden sobald das
//! letzte Mitglied geht. Ein Raum ohne Mitglieder existiert nie; sein
//! Nachrichten-Log wird mit ihm verworfen.
//!
//! Das Verzeichnis ist nicht thread-safe, es lebt hinter dem Lock des
//! [`PresenceCoordinator`](crate::presence::PresenceCoordinator).

use stammtisch_core::types::{ConnectionId, RoomId};
use stammtisch_protocol::events::RaumEintrag;
use std::collections::{HashMap, HashSet, VecDeque};

// ---------------------------------------------------------------------------
// Raum
// ---------------------------------------------------------------------------

/// Ein Raum mit Mitgliedern und geordnetem Nachrichten-Log
#[derive(Debug)]
pub struct Raum {
    pub id: RoomId,
    mitglieder: HashSet<ConnectionId>,
    nachrichten: VecDeque<RaumEintrag>,
    /// Naechste zu vergebende Eintrags-Nummer, zaehlt auch nach
    /// Verdraengung alter Eintraege weiter
    naechste_nachricht_nr: u64,
}

impl Raum {
    fn neu(id: RoomId) -> Self {
        Self {
            id,
            mitglieder: HashSet::new(),
            nachrichten: VecDeque::new(),
            naechste_nachricht_nr: 1,
        }
    }

    /// Gibt die aktuelle Mitgliederzahl zurueck
    pub fn mitglieder_anzahl(&self) -> usize {
        self.mitglieder.len()
    }

    /// Prueft ob eine Verbindung Mitglied ist
    pub fn ist_mitglied(&self, verbindung: &ConnectionId) -> bool {
        self.mitglieder.contains(verbindung)
    }

    /// Gibt eine Kopie der Mitgliederliste zurueck
    pub fn mitglieder_kopie(&self) -> Vec<ConnectionId> {
        self.mitglieder.iter().copied().collect()
    }

    /// Gibt eine Kopie des Nachrichten-Logs in Ankunftsreihenfolge zurueck
    pub fn nachrichten_kopie(&self) -> Vec<RaumEintrag> {
        self.nachrichten.iter().cloned().collect()
    }

    /// Gibt die Anzahl der Eintraege im Log zurueck
    pub fn log_laenge(&self) -> usize {
        self.nachrichten.len()
    }
}

// ---------------------------------------------------------------------------
// RaumVerzeichnis
// ---------------------------------------------------------------------------

/// Verzeichnis aller existierenden Raeume
#[derive(Debug)]
pub struct RaumVerzeichnis {
    raeume: HashMap<RoomId, Raum>,
    /// Maximale Log-Laenge pro Raum, 0 = unbegrenzt
    log_limit: usize,
}

impl RaumVerzeichnis {
    /// Erstellt ein leeres Verzeichnis mit dem gegebenen Log-Limit
    pub fn neu(log_limit: usize) -> Self {
        Self {
            raeume: HashMap::new(),
            log_limit,
        }
    }

    /// Legt einen Raum an falls er noch nicht existiert
    pub fn raum_sicherstellen(&mut self, raum_id: &RoomId) -> &mut Raum {
        self.raeume
            .entry(raum_id.clone())
            .or_insert_with(|| Raum::neu(raum_id.clone()))
    }

    /// Traegt eine Verbindung als Mitglied ein und gibt die neue
    /// Mitgliederzahl zurueck
    ///
    /// Legt den Raum bei Bedarf an. Ein doppelter Eintritt derselben
    /// Verbindung veraendert nichts.
    pub fn mitglied_hinzufuegen(&mut self, raum_id: &RoomId, verbindung: ConnectionId) -> usize {
        let raum = self.raum_sicherstellen(raum_id);
        raum.mitglieder.insert(verbindung);
        raum.mitglieder.len()
    }

    /// Entfernt ein Mitglied und gibt die verbleibende Mitgliederzahl zurueck
    ///
    /// Geht das letzte Mitglied, wird der Raum samt Log aufgeloest.
    pub fn mitglied_entfernen(&mut self, raum_id: &RoomId, verbindung: &ConnectionId) -> usize {
        let verbleibend = match self.raeume.get_mut(raum_id) {
            Some(raum) => {
                raum.mitglieder.remove(verbindung);
                raum.mitglieder.len()
            }
            None => return 0,
        };

        if verbleibend == 0 {
            self.raeume.remove(raum_id);
        }
        verbleibend
    }

    /// Haengt einen Eintrag an das Raum-Log an
    ///
    /// Ueberschreitet das Log das Limit, wird der aelteste Eintrag
    /// verdraengt. Gibt `false` zurueck wenn der Raum nicht existiert.
    pub fn eintrag_anhaengen(&mut self, raum_id: &RoomId, eintrag: RaumEintrag) -> bool {
        let raum = match self.raeume.get_mut(raum_id) {
            Some(r) => r,
            None => return false,
        };

        raum.nachrichten.push_back(eintrag);
        if self.log_limit > 0 && raum.nachrichten.len() > self.log_limit {
            raum.nachrichten.pop_front();
        }
        true
    }

    /// Vergibt die naechste Eintrags-Nummer eines Raums
    ///
    /// Die Nummern sind pro Raum monoton steigend, beginnend bei 1.
    pub fn nachricht_nr_vergeben(&mut self, raum_id: &RoomId) -> Option<u64> {
        let raum = self.raeume.get_mut(raum_id)?;
        let nr = raum.naechste_nachricht_nr;
        raum.naechste_nachricht_nr += 1;
        Some(nr)
    }

    /// Gibt einen Raum zurueck
    pub fn raum(&self, raum_id: &RoomId) -> Option<&Raum> {
        self.raeume.get(raum_id)
    }

    /// Prueft ob ein Raum existiert
    pub fn existiert(&self, raum_id: &RoomId) -> bool {
        self.raeume.contains_key(raum_id)
    }

    /// Gibt die Anzahl der existierenden Raeume zurueck
    pub fn raum_anzahl(&self) -> usize {
        self.raeume.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
