//! Signal-Handler – Dateitransfer-Signale weiterleiten

use stammtisch_core::types::ConnectionId;
use stammtisch_protocol::events::{ServerEvent, SignalDaten};
use std::sync::Arc;

use crate::server_state::RelayState;
use crate::transport::PushTransport;

/// Verarbeitet ein Dateitransfer-Signal
///
/// Ein nicht mehr erreichbares Ziel ist kein Fehler; der Absender
/// bekommt nur bei verletzten Vorbedingungen eine Antwort.
pub fn handle_signal<T: PushTransport>(
    signal: SignalDaten,
    verbindung: &ConnectionId,
    state: &Arc<RelayState<T>>,
) -> Option<ServerEvent> {
    match state.signale.signal_weiterleiten(verbindung, signal) {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(verbindung = %verbindung, fehler = %e, "Signal-Weiterleitung fehlgeschlagen");
            Some(ServerEvent::fehler(e.to_string()))
        }
    }
}
