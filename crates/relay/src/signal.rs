//! Signal-Relay – Dateitransfer-Verhandlung zwischen Clients
//!
//! Signale sind fuer das Relay opake Payloads. Sie werden um die
//! Absenderdaten angereichert und entweder punktgenau an eine
//! Ziel-Verbindung oder an den Raum des Absenders (ohne ihn selbst)
//! weitergereicht. Signale landen nie im Raum-Log.

use stammtisch_core::types::ConnectionId;
use stammtisch_protocol::events::{ServerEvent, SignalDaten, SignalWeiterleitung};

use crate::error::RelayResult;
use crate::presence::PresenceCoordinator;
use crate::transport::PushTransport;

/// Relay fuer Dateitransfer-Signale
pub struct SignalRelay<T> {
    presence: PresenceCoordinator<T>,
}

impl<T: PushTransport> SignalRelay<T> {
    /// Erstellt ein neues Signal-Relay
    pub fn neu(presence: PresenceCoordinator<T>) -> Self {
        Self { presence }
    }

    /// Leitet ein Signal weiter
    ///
    /// Mit `target_id` geht das Signal nur an diese Verbindung; das Ziel
    /// muss nicht im selben Raum sein. Ist das Ziel nicht mehr verbunden,
    /// wird das Signal kommentarlos verworfen. Ohne `target_id` geht das
    /// Signal an alle Raum-Mitglieder ausser dem Absender.
    pub fn signal_weiterleiten(
        &self,
        verbindung: &ConnectionId,
        signal: SignalDaten,
    ) -> RelayResult<()> {
        let t = self.presence.tabellen_sperren();
        let (raum_id, absender) = t.absender_im_raum(verbindung)?;

        let ziel = signal.target_id;
        let weiterleitung = SignalWeiterleitung {
            sender_id: absender.id,
            sender_name: absender.username,
            target_id: ziel,
            daten: signal.daten,
        };

        match ziel {
            Some(ziel) => {
                let zugestellt = self
                    .presence
                    .transport()
                    .an_verbindung_senden(&ziel, ServerEvent::FileTransferSignal(weiterleitung));
                if !zugestellt {
                    tracing::debug!(
                        verbindung = %verbindung,
                        ziel = %ziel,
                        "Signal-Ziel nicht mehr erreichbar, verworfen"
                    );
                }
            }
            None => {
                self.presence.transport().an_raum_ausser_senden(
                    &raum_id,
                    verbindung,
                    ServerEvent::FileTransferSignal(weiterleitung),
                );
            }
        }

        Ok(())
    }
}
