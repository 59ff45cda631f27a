//! Message-Dispatcher – Routet Client-Ereignisse an die richtigen Handler
//!
//! Der Dispatcher empfaengt Ereignisse von einer ClientConnection,
//! bestimmt den richtigen Handler und gibt die direkte Antwort zurueck.
//! Alles Weitere (Raum-Broadcasts, Online-Anzahl) laeuft ueber den
//! Transport und landet in den Send-Queues der Empfaenger.

use stammtisch_core::types::ConnectionId;
use stammtisch_protocol::events::{ClientEvent, ServerEvent};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::handlers::{nachricht_handler, presence_handler, signal_handler};
use crate::server_state::RelayState;
use crate::transport::PushTransport;

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
pub struct DispatcherContext {
    /// Peer-Adresse fuer Logging
    pub peer_addr: SocketAddr,
    /// Vom Relay vergebene Verbindungs-ID
    pub verbindung: ConnectionId,
}

/// Zentraler Message-Dispatcher
///
/// Routet eingehende Client-Ereignisse an die entsprechenden Handler
/// und gibt die direkte Antwort zurueck.
pub struct MessageDispatcher<T: PushTransport> {
    state: Arc<RelayState<T>>,
}

impl<T: PushTransport> MessageDispatcher<T> {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<RelayState<T>>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein eingehendes Ereignis und gibt die Antwort zurueck
    ///
    /// Gibt `None` zurueck wenn keine direkte Antwort gesendet werden
    /// soll (Erfolgsfaelle die ueber den Raum-Broadcast bestaetigt
    /// werden, Pong-Antworten).
    pub fn dispatch(&self, event: ClientEvent, ctx: &DispatcherContext) -> Option<ServerEvent> {
        match event {
            // -------------------------------------------------------------------
            // Presence
            // -------------------------------------------------------------------
            ClientEvent::ConnectRequest(profil) => Some(presence_handler::handle_connect(
                profil,
                ctx.verbindung,
                &self.state,
            )),

            ClientEvent::JoinRoom { room } => Some(presence_handler::handle_join(
                room,
                &ctx.verbindung,
                &self.state,
            )),

            ClientEvent::LeaveRoom => {
                presence_handler::handle_leave(&ctx.verbindung, &self.state);
                None
            }

            // -------------------------------------------------------------------
            // Nachrichten
            // -------------------------------------------------------------------
            ClientEvent::SendMessage { content } => {
                nachricht_handler::handle_send(&content, &ctx.verbindung, &self.state)
            }

            ClientEvent::FileInfo(meta) => {
                nachricht_handler::handle_file_info(meta, &ctx.verbindung, &self.state)
            }

            // -------------------------------------------------------------------
            // Signaling
            // -------------------------------------------------------------------
            ClientEvent::FileTransferSignal(signal) => {
                signal_handler::handle_signal(signal, &ctx.verbindung, &self.state)
            }

            // -------------------------------------------------------------------
            // Keepalive
            // -------------------------------------------------------------------
            ClientEvent::Pong(_) => {
                // Pong-Antworten vom Client werden nur geloggt (RTT-Messung)
                tracing::trace!(peer = %ctx.peer_addr, "Pong empfangen (RTT-Messung)");
                None
            }
        }
    }

    /// Bereinigt alle Ressourcen einer Verbindung beim Trennen
    ///
    /// Der Raum wird verlassen solange der Registry-Eintrag noch
    /// existiert, erst danach wird die Verbindung abgemeldet.
    pub fn verbindung_getrennt(&self, verbindung: &ConnectionId) {
        self.state.presence.getrennt(verbindung);
        self.state.transport.verbindung_abmelden(verbindung);

        tracing::debug!(verbindung = %verbindung, "Verbindungs-Ressourcen bereinigt");
    }
}
