//! Presence-Handler – Registrierung, Raum beitreten, Raum verlassen

use stammtisch_core::types::{ConnectionId, RoomId};
use stammtisch_protocol::events::{Profil, ServerEvent};
use std::sync::Arc;

use crate::server_state::RelayState;
use crate::transport::PushTransport;

/// Verarbeitet eine Registrierung
pub fn handle_connect<T: PushTransport>(
    profil: Profil,
    verbindung: ConnectionId,
    state: &Arc<RelayState<T>>,
) -> ServerEvent {
    let bestaetigung = state.presence.verbinden(verbindung, profil);
    ServerEvent::ConnectionEstablished(bestaetigung)
}

/// Verarbeitet einen Raumbeitritt
pub fn handle_join<T: PushTransport>(
    raum: RoomId,
    verbindung: &ConnectionId,
    state: &Arc<RelayState<T>>,
) -> ServerEvent {
    match state.presence.raum_beitreten(verbindung, raum) {
        Ok(snapshot) => ServerEvent::RoomJoined(snapshot),
        Err(e) => {
            tracing::warn!(verbindung = %verbindung, fehler = %e, "Raumbeitritt fehlgeschlagen");
            ServerEvent::fehler(e.to_string())
        }
    }
}

/// Verarbeitet das Verlassen des aktuellen Raums
///
/// Ohne Registrierung oder Raum ein No-Op; es gibt keine Bestaetigung.
pub fn handle_leave<T: PushTransport>(verbindung: &ConnectionId, state: &Arc<RelayState<T>>) {
    state.presence.raum_verlassen(verbindung);
}
