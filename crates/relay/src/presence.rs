//! Presence-Koordinator – Registrierung, Raumwechsel, Trennung
//!
//! Der Koordinator haelt Registry und Raumverzeichnis hinter einem
//! gemeinsamen Lock und fuehrt alle zustandsaendernden Ablaeufe als
//! unteilbare Schritte aus. Ausgehende Ereignisse werden waehrend
//! gehaltenem Lock eingereiht; dadurch stimmt die Zustellreihenfolge
//! pro Verbindung mit der Reihenfolge der Zustandsaenderungen ueberein.
//!
//! Unter dem Lock wird nie awaited und nie blockierend gesendet.

use parking_lot::{Mutex, MutexGuard};
use stammtisch_core::types::{ConnectionId, RoomId};
use stammtisch_protocol::events::{
    Absender, Profil, RaumSnapshot, ServerEvent, VerbindungBestaetigt,
};
use std::sync::Arc;

use crate::error::{RelayError, RelayResult};
use crate::registry::{ConnectionRegistry, Teilnehmer};
use crate::rooms::RaumVerzeichnis;
use crate::transport::PushTransport;

// ---------------------------------------------------------------------------
// Tabellen
// ---------------------------------------------------------------------------

/// Registry und Raumverzeichnis unter einem gemeinsamen Lock
///
/// Invariante: `teilnehmer.raum == Some(r)` genau dann wenn die
/// Verbindung Mitglied von `r` ist.
pub(crate) struct Tabellen {
    pub registry: ConnectionRegistry,
    pub raeume: RaumVerzeichnis,
}

impl Tabellen {
    /// Loest Raum und Absender-Schnappschuss einer Verbindung auf
    ///
    /// Prueft die Vorbedingungen fuer Nachrichten- und Signal-Operationen:
    /// registriert, in einem Raum, Raum existiert.
    pub(crate) fn absender_im_raum(
        &self,
        verbindung: &ConnectionId,
    ) -> RelayResult<(RoomId, Absender)> {
        let teilnehmer = self
            .registry
            .suchen(verbindung)
            .ok_or(RelayError::NichtVerbunden)?;

        let raum_id = teilnehmer.raum.clone().ok_or(RelayError::NichtImRaum)?;

        if !self.raeume.existiert(&raum_id) {
            return Err(RelayError::RaumNichtGefunden(raum_id.as_str().to_string()));
        }

        Ok((
            raum_id,
            Absender {
                id: teilnehmer.id,
                username: teilnehmer.username.clone(),
            },
        ))
    }
}

// ---------------------------------------------------------------------------
// PresenceCoordinator
// ---------------------------------------------------------------------------

/// Koordiniert Registrierung, Raumwechsel und Trennung
///
/// Thread-safe via Arc. Clone teilt den inneren Zustand.
pub struct PresenceCoordinator<T> {
    inner: Arc<CoordinatorInner<T>>,
}

struct CoordinatorInner<T> {
    tabellen: Mutex<Tabellen>,
    transport: Arc<T>,
}

impl<T> Clone for PresenceCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: PushTransport> PresenceCoordinator<T> {
    /// Erstellt einen neuen Koordinator
    pub fn neu(transport: Arc<T>, raum_log_limit: usize) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                tabellen: Mutex::new(Tabellen {
                    registry: ConnectionRegistry::neu(),
                    raeume: RaumVerzeichnis::neu(raum_log_limit),
                }),
                transport,
            }),
        }
    }

    /// Sperrt die Zustandstabellen fuer einen zusammenhaengenden Ablauf
    pub(crate) fn tabellen_sperren(&self) -> MutexGuard<'_, Tabellen> {
        self.inner.tabellen.lock()
    }

    /// Gibt den Transport zurueck
    pub(crate) fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Registriert eine Verbindung mit ihren Profildaten
    ///
    /// Eine erneute Registrierung verlaesst zuerst den aktuellen Raum
    /// und ersetzt dann den Registry-Eintrag. Nach der Registrierung
    /// bekommen alle Verbindungen die neue Online-Anzahl.
    pub fn verbinden(&self, verbindung: ConnectionId, profil: Profil) -> VerbindungBestaetigt {
        let mut t = self.tabellen_sperren();

        if t.registry.ist_registriert(&verbindung) {
            tracing::debug!(verbindung = %verbindung, "Erneute Registrierung, Raum wird verlassen");
            self.raum_verlassen_intern(&mut t, &verbindung);
        }

        let teilnehmer = Teilnehmer::aus_profil(verbindung, profil);
        let username = teilnehmer.username.clone();
        t.registry.registrieren(teilnehmer);
        let online = t.registry.anzahl();

        tracing::info!(verbindung = %verbindung, username = %username, online, "Teilnehmer verbunden");
        self.transport()
            .an_alle_senden(ServerEvent::online_anzahl(online));

        VerbindungBestaetigt {
            success: true,
            user_id: verbindung,
            message: format!("Willkommen, {}!", username),
        }
    }

    /// Wechselt eine Verbindung in einen Raum
    ///
    /// Der Ablauf ist unteilbar: aktuellen Raum verlassen, Zielraum
    /// anlegen falls noetig, Mitglied eintragen, Zustellungen abonnieren,
    /// Snapshot fuer den Beitretenden bauen und die uebrigen Mitglieder
    /// informieren.
    pub fn raum_beitreten(
        &self,
        verbindung: &ConnectionId,
        raum_id: RoomId,
    ) -> RelayResult<RaumSnapshot> {
        let mut t = self.tabellen_sperren();

        let (id, username) = {
            let teilnehmer = t
                .registry
                .suchen(verbindung)
                .ok_or(RelayError::NichtVerbunden)?;
            (teilnehmer.id, teilnehmer.username.clone())
        };

        // Aktuellen Raum verlassen (auch beim Wiederbeitritt desselben Raums)
        self.raum_verlassen_intern(&mut t, verbindung);

        let mitglieder = t.raeume.mitglied_hinzufuegen(&raum_id, *verbindung);
        self.transport().raum_abonnieren(*verbindung, raum_id.clone());

        if let Some(teilnehmer) = t.registry.suchen_mut(verbindung) {
            teilnehmer.raum = Some(raum_id.clone());
        }

        let nachrichten = t
            .raeume
            .raum(&raum_id)
            .map(|r| r.nachrichten_kopie())
            .unwrap_or_default();

        self.transport().an_raum_ausser_senden(
            &raum_id,
            verbindung,
            ServerEvent::user_joined(id, username, mitglieder),
        );

        tracing::info!(verbindung = %verbindung, raum = %raum_id, mitglieder, "Raum beigetreten");

        Ok(RaumSnapshot {
            room: raum_id,
            member_count: mitglieder,
            messages: nachrichten,
        })
    }

    /// Verlaesst den aktuellen Raum
    ///
    /// Ohne Registrierung oder Raum ein No-Op.
    pub fn raum_verlassen(&self, verbindung: &ConnectionId) {
        let mut t = self.tabellen_sperren();
        self.raum_verlassen_intern(&mut t, verbindung);
    }

    /// Bereinigt eine getrennte Verbindung
    ///
    /// Verlaesst zuerst den Raum (damit die `user-left`-Benachrichtigung
    /// noch den Registry-Eintrag sieht), entfernt dann den Eintrag und
    /// verteilt die neue Online-Anzahl.
    pub fn getrennt(&self, verbindung: &ConnectionId) {
        let mut t = self.tabellen_sperren();

        self.raum_verlassen_intern(&mut t, verbindung);

        if let Some(teilnehmer) = t.registry.entfernen(verbindung) {
            let online = t.registry.anzahl();
            tracing::info!(
                verbindung = %verbindung,
                username = %teilnehmer.username,
                online,
                "Teilnehmer getrennt"
            );
            self.transport()
                .an_alle_senden(ServerEvent::online_anzahl(online));
        }
    }

    /// Gibt die Anzahl der registrierten Teilnehmer zurueck
    pub fn online_anzahl(&self) -> usize {
        self.tabellen_sperren().registry.anzahl()
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_verbunden(&self, verbindung: &ConnectionId) -> bool {
        self.tabellen_sperren().registry.ist_registriert(verbindung)
    }

    /// Gibt den aktuellen Raum einer Verbindung zurueck
    pub fn raum_von(&self, verbindung: &ConnectionId) -> Option<RoomId> {
        self.tabellen_sperren()
            .registry
            .suchen(verbindung)?
            .raum
            .clone()
    }

    /// Gibt die Mitglieder eines Raums zurueck (leer wenn der Raum fehlt)
    pub fn raum_mitglieder(&self, raum_id: &RoomId) -> Vec<ConnectionId> {
        self.tabellen_sperren()
            .raeume
            .raum(raum_id)
            .map(|r| r.mitglieder_kopie())
            .unwrap_or_default()
    }

    /// Prueft ob ein Raum existiert
    pub fn raum_existiert(&self, raum_id: &RoomId) -> bool {
        self.tabellen_sperren().raeume.existiert(raum_id)
    }

    /// Gibt die Anzahl der existierenden Raeume zurueck
    pub fn raum_anzahl(&self) -> usize {
        self.tabellen_sperren().raeume.raum_anzahl()
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    /// Verlaesst den aktuellen Raum unter bereits gehaltenem Lock
    ///
    /// Reihenfolge: Mitgliedschaft austragen, Abonnement entfernen,
    /// Registry-Eintrag bereinigen, verbleibende Mitglieder informieren.
    fn raum_verlassen_intern(&self, t: &mut Tabellen, verbindung: &ConnectionId) {
        let (id, username, raum_id) = match t.registry.suchen(verbindung) {
            Some(teilnehmer) => match &teilnehmer.raum {
                Some(raum) => (teilnehmer.id, teilnehmer.username.clone(), raum.clone()),
                None => return,
            },
            None => return,
        };

        let verbleibend = t.raeume.mitglied_entfernen(&raum_id, verbindung);
        self.transport().raum_abbestellen(verbindung);

        if let Some(teilnehmer) = t.registry.suchen_mut(verbindung) {
            teilnehmer.raum = None;
        }

        if verbleibend > 0 {
            self.transport().an_raum_senden(
                &raum_id,
                ServerEvent::user_left(id, username, verbleibend),
            );
        } else {
            tracing::debug!(raum = %raum_id, "Letztes Mitglied gegangen, Raum aufgeloest");
        }

        tracing::debug!(verbindung = %verbindung, raum = %raum_id, verbleibend, "Raum verlassen");
    }
}
