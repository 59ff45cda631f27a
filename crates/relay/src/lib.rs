//! stammtisch-relay – TCP Relay- und Praesenz-Schicht
//!
//! Dieser Crate implementiert den Relay-Service fuer Stammtisch. Er
//! verwaltet TCP-Verbindungen, Raeume mit Mitgliedschaft und
//! Nachrichten-Log, und leitet Chat-Nachrichten, Dateiankuendigungen
//! und Dateitransfer-Signale zwischen den Teilnehmern weiter.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (RelayServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Keepalive: Ping/Pong + Inaktivitaets-Timeout
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- PresenceHandler  (ConnectRequest, JoinRoom, LeaveRoom)
//!     +-- NachrichtHandler (SendMessage, FileInfo)
//!     +-- SignalHandler    (FileTransferSignal)
//!
//! PresenceCoordinator – Registry + Raumverzeichnis unter einem Lock
//! EventBroadcaster    – Ereignisse an alle relevanten Clients senden
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod nachrichten;
pub mod presence;
pub mod registry;
pub mod rooms;
pub mod server_state;
pub mod signal;
pub mod tcp;
pub mod transport;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use dispatcher::MessageDispatcher;
pub use error::{RelayError, RelayResult};
pub use nachrichten::MessageRelay;
pub use presence::PresenceCoordinator;
pub use registry::{ConnectionRegistry, Teilnehmer};
pub use rooms::RaumVerzeichnis;
pub use server_state::{RelayConfig, RelayState};
pub use signal::SignalRelay;
pub use tcp::RelayServer;
pub use transport::PushTransport;
