//! stammtisch-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use config::ServerConfig;
use stammtisch_relay::{RelayServer, RelayState};
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Relay-Server und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Relay-Zustand aufbauen (Registry, Raumverzeichnis, Broadcaster)
    /// 2. TCP-Listener binden
    /// 3. Ctrl-C-Handler registrieren
    /// 4. Verbindungen annehmen bis zum Shutdown-Signal
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %self.config.tcp_bind_adresse(),
            max_clients = self.config.server.max_clients,
            "Server startet"
        );

        let state = RelayState::mit_broadcaster(self.config.als_relay_config());

        let bind_adresse: SocketAddr = self.config.tcp_bind_adresse().parse().with_context(|| {
            format!("Ungueltige Bind-Adresse: {}", self.config.tcp_bind_adresse())
        })?;
        let server = RelayServer::binden(state, bind_adresse)
            .await
            .with_context(|| format!("TCP-Listener konnte nicht binden: {bind_adresse}"))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(fehler = %e, "Ctrl-C-Handler fehlgeschlagen");
                return;
            }
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            let _ = shutdown_tx.send(true);
        });

        server.starten(shutdown_rx).await?;
        Ok(())
    }
}
