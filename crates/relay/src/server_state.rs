//! Gemeinsamer Server-Zustand fuer den Relay-Service
//!
//! Haelt Konfiguration, Transport und die Relay-Dienste als geteilte
//! Referenzen, die sicher zwischen tokio-Tasks geteilt werden koennen.

use std::sync::Arc;

use crate::broadcast::EventBroadcaster;
use crate::nachrichten::MessageRelay;
use crate::presence::PresenceCoordinator;
use crate::signal::SignalRelay;
use crate::transport::PushTransport;

/// Konfiguration fuer den Relay-Service
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximale Clients
    pub max_clients: u32,
    /// Maximale Log-Laenge pro Raum, 0 = unbegrenzt
    pub raum_log_limit: usize,
    /// Maximale Nachrichtenlaenge in Bytes, 0 = unbegrenzt
    pub max_nachricht_laenge: usize,
    /// Keepalive-Intervall in Sekunden
    pub keepalive_sek: u64,
    /// Timeout fuer inaktive Verbindungen in Sekunden
    pub verbindungs_timeout_sek: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_clients: 512,
            raum_log_limit: 500,
            max_nachricht_laenge: 4096,
            keepalive_sek: 30,
            verbindungs_timeout_sek: 90,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
///
/// Alle Dienste teilen denselben PresenceCoordinator und damit dasselbe
/// Zustands-Lock.
pub struct RelayState<T: PushTransport> {
    /// Server-Konfiguration
    pub config: Arc<RelayConfig>,
    /// Transport fuer ausgehende Ereignisse
    pub transport: Arc<T>,
    /// Presence-Koordinator (Registrierung, Raumwechsel, Trennung)
    pub presence: PresenceCoordinator<T>,
    /// Nachrichten-Relay (Chat, Dateiankuendigungen)
    pub nachrichten: MessageRelay<T>,
    /// Signal-Relay (Dateitransfer-Verhandlung)
    pub signale: SignalRelay<T>,
}

impl<T: PushTransport> RelayState<T> {
    /// Erstellt einen neuen RelayState
    pub fn neu(config: RelayConfig, transport: Arc<T>) -> Arc<Self> {
        let config = Arc::new(config);
        let presence = PresenceCoordinator::neu(Arc::clone(&transport), config.raum_log_limit);
        let nachrichten = MessageRelay::neu(presence.clone(), config.max_nachricht_laenge);
        let signale = SignalRelay::neu(presence.clone());

        Arc::new(Self {
            config,
            transport,
            presence,
            nachrichten,
            signale,
        })
    }
}

impl RelayState<EventBroadcaster> {
    /// Erstellt einen RelayState mit dem Standard-Broadcaster
    pub fn mit_broadcaster(config: RelayConfig) -> Arc<Self> {
        Self::neu(config, Arc::new(EventBroadcaster::neu()))
    }
}
