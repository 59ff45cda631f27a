//! Nachrichten-Relay – Chat-Nachrichten und Dateiankuendigungen
//!
//! Validiert eingehende Inhalte, haengt sie an das Raum-Log an und
//! verteilt sie an alle Raum-Mitglieder inklusive Absender. Der
//! Absender-Schnappschuss wird beim Senden eingefroren; spaetere
//! Namensaenderungen wirken sich auf verteilte Eintraege nicht aus.

use chrono::Utc;
use stammtisch_core::types::ConnectionId;
use stammtisch_protocol::events::{
    ChatNachricht, DateiAnkuendigung, DateiInfo, DateiMeta, RaumEintrag, ServerEvent,
};

use crate::error::{RelayError, RelayResult};
use crate::presence::PresenceCoordinator;
use crate::transport::PushTransport;

/// Relay fuer Chat-Nachrichten und Dateiankuendigungen
pub struct MessageRelay<T> {
    presence: PresenceCoordinator<T>,
    /// Maximale Nachrichtenlaenge in Bytes, 0 = unbegrenzt
    max_nachricht_laenge: usize,
}

impl<T: PushTransport> MessageRelay<T> {
    /// Erstellt ein neues Nachrichten-Relay
    pub fn neu(presence: PresenceCoordinator<T>, max_nachricht_laenge: usize) -> Self {
        Self {
            presence,
            max_nachricht_laenge,
        }
    }

    /// Sendet eine Chat-Nachricht in den aktuellen Raum des Absenders
    ///
    /// Die Nachricht bekommt eine raumweite laufende Nummer, landet im
    /// Raum-Log und wird an alle Mitglieder verteilt, auch an den
    /// Absender selbst.
    pub fn nachricht_senden(
        &self,
        verbindung: &ConnectionId,
        content: &str,
    ) -> RelayResult<ChatNachricht> {
        if content.trim().is_empty() {
            return Err(RelayError::ungueltige_eingabe(
                "Nachrichteninhalt darf nicht leer sein",
            ));
        }

        if self.max_nachricht_laenge > 0 && content.len() > self.max_nachricht_laenge {
            return Err(RelayError::UngueltigeEingabe(format!(
                "Nachricht zu lang: {} Zeichen (Maximum: {})",
                content.len(),
                self.max_nachricht_laenge
            )));
        }

        let mut t = self.presence.tabellen_sperren();
        let (raum_id, absender) = t.absender_im_raum(verbindung)?;

        let nr = t
            .raeume
            .nachricht_nr_vergeben(&raum_id)
            .ok_or_else(|| RelayError::RaumNichtGefunden(raum_id.as_str().to_string()))?;

        let nachricht = ChatNachricht {
            id: nr,
            content: content.to_string(),
            sender: absender,
            timestamp: Utc::now(),
        };

        t.raeume
            .eintrag_anhaengen(&raum_id, RaumEintrag::Message(nachricht.clone()));
        self.presence
            .transport()
            .an_raum_senden(&raum_id, ServerEvent::NewMessage(nachricht.clone()));

        tracing::debug!(
            verbindung = %verbindung,
            raum = %raum_id,
            nr,
            "Chat-Nachricht verteilt"
        );

        Ok(nachricht)
    }

    /// Kuendigt eine Datei im aktuellen Raum des Absenders an
    ///
    /// Das Relay transportiert keine Dateiinhalte; die Ankuendigung
    /// traegt nur die Metadaten, ergaenzt um die Absender-Verbindung.
    pub fn datei_ankuendigen(
        &self,
        verbindung: &ConnectionId,
        meta: DateiMeta,
    ) -> RelayResult<DateiAnkuendigung> {
        if meta.name.trim().is_empty() {
            return Err(RelayError::ungueltige_eingabe(
                "Dateiname darf nicht leer sein",
            ));
        }

        let mut t = self.presence.tabellen_sperren();
        let (raum_id, absender) = t.absender_im_raum(verbindung)?;

        let nr = t
            .raeume
            .nachricht_nr_vergeben(&raum_id)
            .ok_or_else(|| RelayError::RaumNichtGefunden(raum_id.as_str().to_string()))?;

        let ankuendigung = DateiAnkuendigung {
            id: nr,
            file_info: DateiInfo {
                meta,
                sender_id: *verbindung,
            },
            sender: absender,
            timestamp: Utc::now(),
        };

        t.raeume
            .eintrag_anhaengen(&raum_id, RaumEintrag::File(ankuendigung.clone()));
        self.presence
            .transport()
            .an_raum_senden(&raum_id, ServerEvent::NewFile(ankuendigung.clone()));

        tracing::debug!(
            verbindung = %verbindung,
            raum = %raum_id,
            nr,
            datei = %ankuendigung.file_info.meta.name,
            "Dateiankuendigung verteilt"
        );

        Ok(ankuendigung)
    }
}
