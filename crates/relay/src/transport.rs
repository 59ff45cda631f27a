//! Transport-Abstraktion fuer ausgehende Ereignisse
//!
//! Der Relay-Kern kennt keine Sockets. Alle ausgehenden Ereignisse laufen
//! ueber diesen Trait; die Produktiv-Implementierung ist der
//! [`EventBroadcaster`](crate::broadcast::EventBroadcaster).
//!
//! Alle Methoden sind synchron und blockieren nicht: "Senden" heisst
//! Einreihen in die Send-Queue der Ziel-Verbindung. Die Verbindungs-Tasks
//! leeren ihre Queues unabhaengig voneinander.

use stammtisch_core::types::{ConnectionId, RoomId};
use stammtisch_protocol::events::ServerEvent;
use tokio::sync::mpsc;

/// Push-Transport fuer Server-Ereignisse
///
/// Wird vom [`PresenceCoordinator`](crate::presence::PresenceCoordinator)
/// waehrend gehaltenem Zustands-Lock aufgerufen. Implementierungen duerfen
/// deshalb selbst keine Relay-Operationen ausloesen.
pub trait PushTransport: Send + Sync + 'static {
    /// Meldet eine neue Verbindung an und gibt ihre Empfangs-Queue zurueck
    ///
    /// Der Verbindungs-Task liest aus dieser Queue und schreibt via TCP.
    fn verbindung_anmelden(&self, verbindung: ConnectionId) -> mpsc::Receiver<ServerEvent>;

    /// Meldet eine Verbindung ab und entfernt alle Raum-Abonnements
    fn verbindung_abmelden(&self, verbindung: &ConnectionId);

    /// Abonniert Raum-Zustellungen fuer eine Verbindung
    ///
    /// Eine Verbindung kann hoechstens einen Raum abonniert haben;
    /// bestehende Abonnements werden vorher entfernt.
    fn raum_abonnieren(&self, verbindung: ConnectionId, raum: RoomId);

    /// Entfernt das Raum-Abonnement einer Verbindung
    fn raum_abbestellen(&self, verbindung: &ConnectionId);

    /// Sendet ein Ereignis an eine einzelne Verbindung
    ///
    /// Gibt `true` zurueck wenn die Verbindung bekannt ist und das
    /// Ereignis eingereiht wurde.
    fn an_verbindung_senden(&self, verbindung: &ConnectionId, event: ServerEvent) -> bool;

    /// Sendet ein Ereignis an alle Abonnenten eines Raums
    ///
    /// Gibt die Anzahl der erfolgreichen Zustellungen zurueck.
    fn an_raum_senden(&self, raum: &RoomId, event: ServerEvent) -> usize;

    /// Sendet ein Ereignis an alle Abonnenten eines Raums ausser einem
    fn an_raum_ausser_senden(
        &self,
        raum: &RoomId,
        ausgeschlossen: &ConnectionId,
        event: ServerEvent,
    ) -> usize;

    /// Sendet ein Ereignis an alle angemeldeten Verbindungen
    fn an_alle_senden(&self, event: ServerEvent) -> usize;

    /// Gibt die Anzahl der angemeldeten Verbindungen zurueck
    fn verbindungs_anzahl(&self) -> usize;
}
