//! Event-Broadcaster – Sendet Ereignisse an alle relevanten Clients
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen Clients
//! und ist die Produktiv-Implementierung von [`PushTransport`].
//!
//! ## Selektives Broadcasting
//! - An alle Clients: `an_alle_senden`
//! - An einen Raum: `an_raum_senden`
//! - An eine Verbindung: `an_verbindung_senden`
//! - An einen Raum ausser einem: `an_raum_ausser_senden`

use dashmap::DashMap;
use stammtisch_core::types::{ConnectionId, RoomId};
use stammtisch_protocol::events::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::transport::PushTransport;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Client
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub verbindung: ConnectionId,
    pub tx: mpsc::Sender<ServerEvent>,
}

impl ClientSender {
    /// Reiht ein Ereignis nicht-blockierend beim Client ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, event: ServerEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.verbindung, "Send-Queue voll – Ereignis verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.verbindung, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Client-Sender, indiziert nach Verbindungs-ID
    clients: DashMap<ConnectionId, ClientSender>,
    /// Raum-Abonnements: raum -> Vec<ConnectionId>
    raum_mitglieder: DashMap<RoomId, Vec<ConnectionId>>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                raum_mitglieder: DashMap::new(),
            }),
        }
    }

    /// Prueft ob eine Verbindung angemeldet ist
    pub fn ist_angemeldet(&self, verbindung: &ConnectionId) -> bool {
        self.inner.clients.contains_key(verbindung)
    }

    /// Gibt alle Abonnenten eines Raums zurueck
    pub fn abonnenten(&self, raum: &RoomId) -> Vec<ConnectionId> {
        self.inner
            .raum_mitglieder
            .get(raum)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    fn aus_allen_raeumen_entfernen(&self, verbindung: &ConnectionId) {
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|v| v != verbindung);
        });
        self.inner
            .raum_mitglieder
            .retain(|_, mitglieder| !mitglieder.is_empty());
    }
}

impl PushTransport for EventBroadcaster {
    fn verbindung_anmelden(&self, verbindung: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        let sender = ClientSender { verbindung, tx };
        self.inner.clients.insert(verbindung, sender);
        tracing::debug!(verbindung = %verbindung, "Client im Broadcaster angemeldet");
        rx
    }

    fn verbindung_abmelden(&self, verbindung: &ConnectionId) {
        self.inner.clients.remove(verbindung);
        self.aus_allen_raeumen_entfernen(verbindung);
        tracing::debug!(verbindung = %verbindung, "Client aus Broadcaster abgemeldet");
    }

    fn raum_abonnieren(&self, verbindung: ConnectionId, raum: RoomId) {
        // Altes Abonnement entfernen
        self.aus_allen_raeumen_entfernen(&verbindung);

        self.inner
            .raum_mitglieder
            .entry(raum)
            .or_default()
            .push(verbindung);
    }

    fn raum_abbestellen(&self, verbindung: &ConnectionId) {
        self.aus_allen_raeumen_entfernen(verbindung);
    }

    fn an_verbindung_senden(&self, verbindung: &ConnectionId, event: ServerEvent) -> bool {
        match self.inner.clients.get(verbindung) {
            Some(sender) => sender.senden(event),
            None => {
                tracing::debug!(verbindung = %verbindung, "Senden an unbekannten Client");
                false
            }
        }
    }

    fn an_raum_senden(&self, raum: &RoomId, event: ServerEvent) -> usize {
        let verbindungen = match self.inner.raum_mitglieder.get(raum) {
            Some(ids) => ids.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for verbindung in &verbindungen {
            if let Some(sender) = self.inner.clients.get(verbindung) {
                if sender.senden(event.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    fn an_raum_ausser_senden(
        &self,
        raum: &RoomId,
        ausgeschlossen: &ConnectionId,
        event: ServerEvent,
    ) -> usize {
        let verbindungen = match self.inner.raum_mitglieder.get(raum) {
            Some(ids) => ids.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for verbindung in &verbindungen {
            if verbindung == ausgeschlossen {
                continue;
            }
            if let Some(sender) = self.inner.clients.get(verbindung) {
                if sender.senden(event.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    fn an_alle_senden(&self, event: ServerEvent) -> usize {
        let mut gesendet = 0;
        self.inner.clients.iter().for_each(|entry| {
            if entry.value().senden(event.clone()) {
                gesendet += 1;
            }
        });
        gesendet
    }

    fn verbindungs_anzahl(&self) -> usize {
        self.inner.clients.len()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event(count: usize) -> ServerEvent {
        ServerEvent::online_anzahl(count)
    }

    #[tokio::test]
    async fn anmelden_und_senden() {
        let broadcaster = EventBroadcaster::neu();
        let verbindung = ConnectionId::new();

        let mut rx = broadcaster.verbindung_anmelden(verbindung);
        assert!(broadcaster.ist_angemeldet(&verbindung));

        let gesendet = broadcaster.an_verbindung_senden(&verbindung, test_event(1));
        assert!(gesendet);

        let empfangen = rx.try_recv().expect("Ereignis muss vorhanden sein");
        assert!(matches!(empfangen, ServerEvent::OnlineUsersCount(a) if a.count == 1));
    }

    #[tokio::test]
    async fn an_raum_senden_erreicht_nur_abonnenten() {
        let broadcaster = EventBroadcaster::neu();
        let raum = RoomId::new("lobby");

        let v1 = ConnectionId::new();
        let v2 = ConnectionId::new();
        let v3 = ConnectionId::new(); // kein Abonnement

        let mut rx1 = broadcaster.verbindung_anmelden(v1);
        let mut rx2 = broadcaster.verbindung_anmelden(v2);
        let mut rx3 = broadcaster.verbindung_anmelden(v3);

        broadcaster.raum_abonnieren(v1, raum.clone());
        broadcaster.raum_abonnieren(v2, raum.clone());

        let gesendet = broadcaster.an_raum_senden(&raum, test_event(10));
        assert_eq!(gesendet, 2);

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
        assert!(rx3.try_recv().is_err(), "v3 darf nichts empfangen");
    }

    #[tokio::test]
    async fn an_raum_ausser_senden_ueberspringt_ausloeser() {
        let broadcaster = EventBroadcaster::neu();
        let raum = RoomId::new("lobby");

        let v1 = ConnectionId::new();
        let v2 = ConnectionId::new();

        let mut rx1 = broadcaster.verbindung_anmelden(v1);
        let mut rx2 = broadcaster.verbindung_anmelden(v2);

        broadcaster.raum_abonnieren(v1, raum.clone());
        broadcaster.raum_abonnieren(v2, raum.clone());

        broadcaster.an_raum_ausser_senden(&raum, &v1, test_event(20));

        assert!(rx1.try_recv().is_err(), "Ausloeser darf nichts empfangen");
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn an_alle_senden() {
        let broadcaster = EventBroadcaster::neu();

        let verbindungen: Vec<ConnectionId> = (0..5).map(|_| ConnectionId::new()).collect();
        let mut receivers: Vec<_> = verbindungen
            .iter()
            .map(|v| broadcaster.verbindung_anmelden(*v))
            .collect();

        let gesendet = broadcaster.an_alle_senden(test_event(99));
        assert_eq!(gesendet, 5);

        for rx in &mut receivers {
            assert!(rx.try_recv().is_ok());
        }
    }

    #[test]
    fn abonnieren_wechselt_den_raum() {
        let broadcaster = EventBroadcaster::neu();
        let verbindung = ConnectionId::new();
        let alt = RoomId::new("alt");
        let neu = RoomId::new("neu");

        let _rx = broadcaster.verbindung_anmelden(verbindung);
        broadcaster.raum_abonnieren(verbindung, alt.clone());
        broadcaster.raum_abonnieren(verbindung, neu.clone());

        assert!(broadcaster.abonnenten(&alt).is_empty());
        assert_eq!(broadcaster.abonnenten(&neu), vec![verbindung]);
    }

    #[test]
    fn abmelden_bereinigt_raum_abonnements() {
        let broadcaster = EventBroadcaster::neu();
        let raum = RoomId::new("lobby");
        let verbindung = ConnectionId::new();

        let _rx = broadcaster.verbindung_anmelden(verbindung);
        broadcaster.raum_abonnieren(verbindung, raum.clone());
        assert_eq!(broadcaster.abonnenten(&raum).len(), 1);

        broadcaster.verbindung_abmelden(&verbindung);
        assert!(!broadcaster.ist_angemeldet(&verbindung));
        assert_eq!(broadcaster.abonnenten(&raum).len(), 0);
        assert_eq!(broadcaster.verbindungs_anzahl(), 0);
    }

    #[tokio::test]
    async fn senden_an_unbekannte_verbindung_schlaegt_fehl() {
        let broadcaster = EventBroadcaster::neu();
        let fremd = ConnectionId::new();

        assert!(!broadcaster.an_verbindung_senden(&fremd, test_event(1)));
    }
}
