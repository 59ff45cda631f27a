//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task und eine frische Verbindungs-ID. Der Lebenszyklus aus
//! Client-Sicht:
//!
//! ```text
//! Unregistriert -> Online -> (ImRaum <-> Online) -> Getrennt
//! ```
//!
//! ## Keepalive
//! - Server sendet alle `keepalive_sek` einen Ping
//! - Jedes empfangene Ereignis (auch Pong) gilt als Lebenszeichen
//! - Nach `verbindungs_timeout_sek` ohne Empfang wird getrennt

use futures_util::{SinkExt, StreamExt};
use stammtisch_core::types::ConnectionId;
use stammtisch_protocol::events::ServerEvent;
use stammtisch_protocol::wire::RelayCodec;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::server_state::RelayState;
use crate::transport::PushTransport;

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Frames via `RelayCodec`, dispatcht an `MessageDispatcher` und
/// sendet Antworten zurueck. Laeuft in einem eigenen tokio-Task.
pub struct ClientConnection<T: PushTransport> {
    state: Arc<RelayState<T>>,
    peer_addr: SocketAddr,
    verbindung: ConnectionId,
}

impl<T: PushTransport> ClientConnection<T> {
    /// Erstellt eine neue ClientConnection mit frischer Verbindungs-ID
    pub fn neu(state: Arc<RelayState<T>>, peer_addr: SocketAddr) -> Self {
        Self {
            state,
            peer_addr,
            verbindung: ConnectionId::new(),
        }
    }

    /// Gibt die Verbindungs-ID zurueck
    pub fn verbindungs_id(&self) -> ConnectionId {
        self.verbindung
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Diese Methode laeuft bis die Verbindung getrennt wird oder ein
    /// Shutdown-Signal eingeht. Beim Verlassen werden alle Ressourcen
    /// der Verbindung bereinigt.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        let verbindung = self.verbindung;
        let keepalive_intervall = Duration::from_secs(self.state.config.keepalive_sek);
        let timeout_dauer = Duration::from_secs(self.state.config.verbindungs_timeout_sek);

        tracing::info!(peer = %peer_addr, verbindung = %verbindung, "Neue Verbindung");

        // Framed-Stream mit RelayCodec einrichten
        let mut framed = Framed::new(stream, RelayCodec::new());

        // Empfangs-Queue beim Transport anmelden (Broadcaster -> TCP)
        let mut sende_rx = self.state.transport.verbindung_anmelden(verbindung);

        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));
        let ctx = DispatcherContext {
            peer_addr,
            verbindung,
        };

        // Zeitpunkt des letzten empfangenen Frames
        let mut letzter_empfang = Instant::now();
        // Zeitpunkt des naechsten Ping
        let mut naechster_ping = Instant::now() + keepalive_intervall;

        loop {
            let jetzt = Instant::now();

            // Timeout-Pruefung
            if jetzt.duration_since(letzter_empfang) > timeout_dauer {
                tracing::warn!(peer = %peer_addr, "Verbindungs-Timeout");
                break;
            }

            // Naechsten Ping-Zeitpunkt berechnen
            let ping_verzoegerung = if jetzt < naechster_ping {
                naechster_ping.duration_since(jetzt)
            } else {
                Duration::from_millis(1)
            };

            tokio::select! {
                // Eingehendes Ereignis vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(event)) => {
                            letzter_empfang = Instant::now();
                            tracing::trace!(peer = %peer_addr, "Ereignis empfangen");

                            if let Some(antwort) = dispatcher.dispatch(event, &ctx) {
                                if let Err(e) = framed.send(antwort).await {
                                    tracing::warn!(
                                        peer = %peer_addr,
                                        fehler = %e,
                                        "Senden fehlgeschlagen"
                                    );
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                peer = %peer_addr,
                                fehler = %e,
                                "Frame-Lesefehler"
                            );
                            break;
                        }
                        None => {
                            // Verbindung geschlossen
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehendes Ereignis aus dem Broadcaster
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = framed.send(ausgehend).await {
                        tracing::warn!(
                            peer = %peer_addr,
                            fehler = %e,
                            "Broadcast-Senden fehlgeschlagen"
                        );
                        break;
                    }
                }

                // Keepalive-Ping
                _ = tokio::time::sleep(ping_verzoegerung) => {
                    if jetzt >= naechster_ping {
                        let ts = std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_millis() as u64;

                        if let Err(e) = framed.send(ServerEvent::ping(ts)).await {
                            tracing::warn!(
                                peer = %peer_addr,
                                fehler = %e,
                                "Ping-Senden fehlgeschlagen"
                            );
                            break;
                        }
                        naechster_ping = Instant::now() + keepalive_intervall;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        // Abschiedsnachricht senden
                        let abschied = ServerEvent::fehler("Server wird heruntergefahren");
                        let _ = framed.send(abschied).await;
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende: Raum verlassen, Registry und
        // Broadcaster bereinigen, Online-Anzahl verteilen
        dispatcher.verbindung_getrennt(&verbindung);

        tracing::info!(peer = %peer_addr, verbindung = %verbindung, "Verbindungs-Task beendet");
    }
}
