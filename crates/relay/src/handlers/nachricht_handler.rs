//! Nachricht-Handler – Chat-Nachrichten und Dateiankuendigungen
//!
//! Erfolgreiche Sendungen erreichen den Absender ueber den Raum-Broadcast,
//! deshalb gibt es keine direkte Bestaetigung. Nur Fehler werden als
//! Antwort zurueckgegeben.

use stammtisch_core::types::ConnectionId;
use stammtisch_protocol::events::{DateiMeta, ServerEvent};
use std::sync::Arc;

use crate::server_state::RelayState;
use crate::transport::PushTransport;

/// Verarbeitet eine Chat-Nachricht
pub fn handle_send<T: PushTransport>(
    content: &str,
    verbindung: &ConnectionId,
    state: &Arc<RelayState<T>>,
) -> Option<ServerEvent> {
    match state.nachrichten.nachricht_senden(verbindung, content) {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(verbindung = %verbindung, fehler = %e, "Nachricht senden fehlgeschlagen");
            Some(ServerEvent::fehler(e.to_string()))
        }
    }
}

/// Verarbeitet eine Dateiankuendigung
pub fn handle_file_info<T: PushTransport>(
    meta: DateiMeta,
    verbindung: &ConnectionId,
    state: &Arc<RelayState<T>>,
) -> Option<ServerEvent> {
    match state.nachrichten.datei_ankuendigen(verbindung, meta) {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(verbindung = %verbindung, fehler = %e, "Dateiankuendigung fehlgeschlagen");
            Some(ServerEvent::fehler(e.to_string()))
        }
    }
}
