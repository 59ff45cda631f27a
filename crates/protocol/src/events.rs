//! Relay-Protokoll (TCP)
//!
//! Definiert alle Ereignisse die ueber die TCP-Verbindung zwischen
//! Client und Relay ausgetauscht werden.
//!
//! ## Design
//! - Getrennte Enums fuer beide Richtungen: `ClientEvent` (eingehend)
//!   und `ServerEvent` (ausgehend)
//! - JSON-Serialisierung via serde, Tag-Feld `event` in kebab-case
//! - Offene Payloads (Profil, Signaldaten) tragen einen Erweiterungs-Bag
//!   via `#[serde(flatten)]`, statt Felder dynamisch zu injizieren

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stammtisch_core::types::{ConnectionId, RoomId};

// ---------------------------------------------------------------------------
// Profil & Absender
// ---------------------------------------------------------------------------

/// Profildaten die ein Client bei `connect-request` mitschickt
///
/// Alle Felder sind optional; fehlt der Benutzername, vergibt das Relay
/// einen automatischen Anzeigenamen. Unbekannte Felder landen unveraendert
/// im Erweiterungs-Bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profil {
    /// Gewuenschter Anzeigename
    pub username: Option<String>,
    /// Beliebige weitere Profilfelder des Clients
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profil {
    /// Erstellt ein Profil mit Benutzernamen und leerem Erweiterungs-Bag
    pub fn mit_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            extra: Map::new(),
        }
    }
}

/// Absender-Schnappschuss einer Nachricht
///
/// Wird beim Senden aus dem Registry-Eintrag kopiert und danach nicht
/// mehr veraendert, auch wenn sich der Benutzername spaeter aendert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absender {
    pub id: ConnectionId,
    pub username: String,
}

// ---------------------------------------------------------------------------
// Nachrichten & Dateiankuendigungen
// ---------------------------------------------------------------------------

/// Eine Chat-Nachricht in einem Raum
///
/// Die `id` ist innerhalb des Raums eindeutig (monoton steigender Zaehler).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatNachricht {
    pub id: u64,
    pub content: String,
    pub sender: Absender,
    pub timestamp: DateTime<Utc>,
}

/// Datei-Metadaten wie vom Client bei `file-info` angekuendigt
///
/// Das Relay transportiert keine Dateiinhalte; `name` ist das einzige
/// Pflichtfeld, alles Weitere ist Sache des Clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateiMeta {
    pub name: String,
    pub size_bytes: Option<u64>,
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Serverseitig angereicherte Datei-Metadaten (Absender-ID ergaenzt)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateiInfo {
    #[serde(flatten)]
    pub meta: DateiMeta,
    pub sender_id: ConnectionId,
}

/// Eine Dateiankuendigung in einem Raum
///
/// Teilt Raum-IDs mit den Chat-Nachrichten denselben Zaehler, da beide
/// im selben Raum-Log landen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateiAnkuendigung {
    pub id: u64,
    pub file_info: DateiInfo,
    pub sender: Absender,
    pub timestamp: DateTime<Utc>,
}

/// Ein Eintrag im geordneten Raum-Log
///
/// Chat-Nachrichten und Dateiankuendigungen liegen im selben Log und
/// behalten dadurch eine gemeinsame Gesamtordnung.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RaumEintrag {
    Message(ChatNachricht),
    File(DateiAnkuendigung),
}

impl RaumEintrag {
    /// Gibt die raumweite Eintrags-ID zurueck
    pub fn id(&self) -> u64 {
        match self {
            Self::Message(n) => n.id,
            Self::File(a) => a.id,
        }
    }

    /// Gibt den Absender-Schnappschuss zurueck
    pub fn sender(&self) -> &Absender {
        match self {
            Self::Message(n) => &n.sender,
            Self::File(a) => &a.sender,
        }
    }
}

// ---------------------------------------------------------------------------
// Signaling-Payloads
// ---------------------------------------------------------------------------

/// Signaldaten einer Dateitransfer-Verhandlung (Client -> Relay)
///
/// Der Inhalt ist fuer das Relay opak; nur `target_id` wird fuer die
/// Zustellung ausgewertet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalDaten {
    /// Ziel-Verbindung fuer Punkt-zu-Punkt-Zustellung (None = Raum)
    #[serde(default)]
    pub target_id: Option<ConnectionId>,
    #[serde(flatten)]
    pub daten: Map<String, Value>,
}

/// Weitergeleitetes Signal (Relay -> Client), um Absenderdaten ergaenzt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalWeiterleitung {
    pub sender_id: ConnectionId,
    pub sender_name: String,
    #[serde(default)]
    pub target_id: Option<ConnectionId>,
    #[serde(flatten)]
    pub daten: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Bestaetigungen & Benachrichtigungen
// ---------------------------------------------------------------------------

/// Bestaetigung einer erfolgreichen Registrierung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerbindungBestaetigt {
    pub success: bool,
    /// Vom Relay vergebene Verbindungs-ID
    pub user_id: ConnectionId,
    pub message: String,
}

/// Globale Anzahl verbundener Teilnehmer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineAnzahl {
    pub count: usize,
}

/// Antwort auf einen Raumbeitritt: Mitgliederzahl und komplettes Log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaumSnapshot {
    pub room: RoomId,
    pub member_count: usize,
    pub messages: Vec<RaumEintrag>,
}

/// Mitglieder-Benachrichtigung fuer `user-joined` und `user-left`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MitgliedsInfo {
    pub id: ConnectionId,
    pub username: String,
    /// Mitgliederzahl des Raums nach der Aenderung
    pub member_count: usize,
}

/// Fehler-Benachrichtigung an die ausloesende Verbindung
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FehlerMeldung {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Ping (Relay -> Client)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PingDaten {
    /// Unix-Timestamp in Millisekunden fuer RTT-Messung
    pub timestamp_ms: u64,
}

/// Pong-Antwort (Client -> Relay, spiegelt den Timestamp zurueck)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PongDaten {
    pub echo_timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Haupt-Enums: ClientEvent / ServerEvent
// ---------------------------------------------------------------------------

/// Alle Ereignisse die ein Client an das Relay sendet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Registrierung mit Profildaten
    ConnectRequest(Profil),
    /// Raum beitreten (legt den Raum bei Bedarf an)
    JoinRoom { room: RoomId },
    /// Chat-Nachricht in den aktuellen Raum senden
    SendMessage { content: String },
    /// Datei im aktuellen Raum ankuendigen
    FileInfo(DateiMeta),
    /// Dateitransfer-Signal weiterleiten lassen
    FileTransferSignal(SignalDaten),
    /// Aktuellen Raum verlassen
    LeaveRoom,
    /// Keepalive-Antwort
    Pong(PongDaten),
}

/// Alle Ereignisse die das Relay an Clients sendet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Bestaetigung der Registrierung (nur an den Ausloeser)
    ConnectionEstablished(VerbindungBestaetigt),
    /// Globale Online-Anzahl (an alle Verbindungen)
    OnlineUsersCount(OnlineAnzahl),
    /// Bestaetigung eines Raumbeitritts (nur an den Beitretenden)
    RoomJoined(RaumSnapshot),
    /// Neues Mitglied im Raum (an alle anderen Mitglieder)
    UserJoined(MitgliedsInfo),
    /// Mitglied hat den Raum verlassen (an die verbleibenden Mitglieder)
    UserLeft(MitgliedsInfo),
    /// Neue Chat-Nachricht (an alle Mitglieder inklusive Absender)
    NewMessage(ChatNachricht),
    /// Neue Dateiankuendigung (an alle Mitglieder inklusive Absender)
    NewFile(DateiAnkuendigung),
    /// Weitergeleitetes Dateitransfer-Signal
    FileTransferSignal(SignalWeiterleitung),
    /// Keepalive-Anfrage
    Ping(PingDaten),
    /// Fehler-Benachrichtigung (nur an den Ausloeser)
    Error(FehlerMeldung),
}

impl ClientEvent {
    /// Erstellt eine Pong-Antwort
    pub fn pong(echo_timestamp_ms: u64) -> Self {
        Self::Pong(PongDaten { echo_timestamp_ms })
    }

    /// Serialisiert das Ereignis als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert ein Ereignis aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl ServerEvent {
    /// Erstellt eine Ping-Anfrage
    pub fn ping(timestamp_ms: u64) -> Self {
        Self::Ping(PingDaten { timestamp_ms })
    }

    /// Erstellt eine Fehler-Benachrichtigung
    pub fn fehler(message: impl Into<String>) -> Self {
        Self::Error(FehlerMeldung {
            message: message.into(),
        })
    }

    /// Erstellt eine Online-Anzahl-Benachrichtigung
    pub fn online_anzahl(count: usize) -> Self {
        Self::OnlineUsersCount(OnlineAnzahl { count })
    }

    /// Erstellt eine `user-joined`-Benachrichtigung
    pub fn user_joined(id: ConnectionId, username: String, member_count: usize) -> Self {
        Self::UserJoined(MitgliedsInfo {
            id,
            username,
            member_count,
        })
    }

    /// Erstellt eine `user-left`-Benachrichtigung
    pub fn user_left(id: ConnectionId, username: String, member_count: usize) -> Self {
        Self::UserLeft(MitgliedsInfo {
            id,
            username,
            member_count,
        })
    }

    /// Serialisiert das Ereignis als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert ein Ereignis aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_id() -> ConnectionId {
        ConnectionId(Uuid::nil())
    }

    fn test_absender() -> Absender {
        Absender {
            id: test_id(),
            username: "tester".to_string(),
        }
    }

    #[test]
    fn connect_request_mit_profil() {
        let json = r#"{"event":"connect-request","username":"anna","avatar":"blau"}"#;
        let event = ClientEvent::from_json(json).unwrap();

        if let ClientEvent::ConnectRequest(profil) = event {
            assert_eq!(profil.username.as_deref(), Some("anna"));
            assert_eq!(
                profil.extra.get("avatar").and_then(|v| v.as_str()),
                Some("blau")
            );
        } else {
            panic!("Erwartet ConnectRequest");
        }
    }

    #[test]
    fn connect_request_ohne_felder() {
        let json = r#"{"event":"connect-request"}"#;
        let event = ClientEvent::from_json(json).unwrap();

        if let ClientEvent::ConnectRequest(profil) = event {
            assert!(profil.username.is_none());
            assert!(profil.extra.is_empty());
        } else {
            panic!("Erwartet ConnectRequest");
        }
    }

    #[test]
    fn leave_room_ohne_payload() {
        let json = r#"{"event":"leave-room"}"#;
        let event = ClientEvent::from_json(json).unwrap();
        assert!(matches!(event, ClientEvent::LeaveRoom));
    }

    #[test]
    fn join_room_serialisierung() {
        let event = ClientEvent::JoinRoom {
            room: RoomId::new("lobby"),
        };
        let json = event.to_json().unwrap();
        assert!(json.contains(r#""event":"join-room""#));
        assert!(json.contains(r#""room":"lobby""#));

        let decoded = ClientEvent::from_json(&json).unwrap();
        if let ClientEvent::JoinRoom { room } = decoded {
            assert_eq!(room.as_str(), "lobby");
        } else {
            panic!("Erwartet JoinRoom");
        }
    }

    #[test]
    fn neue_nachricht_serialisierung() {
        let event = ServerEvent::NewMessage(ChatNachricht {
            id: 7,
            content: "Hallo Welt".to_string(),
            sender: test_absender(),
            timestamp: Utc::now(),
        });
        let json = event.to_json().unwrap();
        assert!(json.contains(r#""event":"new-message""#));

        let decoded = ServerEvent::from_json(&json).unwrap();
        if let ServerEvent::NewMessage(n) = decoded {
            assert_eq!(n.id, 7);
            assert_eq!(n.content, "Hallo Welt");
            assert_eq!(n.sender.username, "tester");
        } else {
            panic!("Erwartet NewMessage");
        }
    }

    #[test]
    fn raum_eintrag_traegt_typ_feld() {
        let nachricht = RaumEintrag::Message(ChatNachricht {
            id: 1,
            content: "hi".to_string(),
            sender: test_absender(),
            timestamp: Utc::now(),
        });
        let json = serde_json::to_string(&nachricht).unwrap();
        assert!(json.contains(r#""type":"message""#));

        let datei = RaumEintrag::File(DateiAnkuendigung {
            id: 2,
            file_info: DateiInfo {
                meta: DateiMeta {
                    name: "bild.png".to_string(),
                    size_bytes: Some(2048),
                    mime_type: Some("image/png".to_string()),
                    extra: Map::new(),
                },
                sender_id: test_id(),
            },
            sender: test_absender(),
            timestamp: Utc::now(),
        });
        let json = serde_json::to_string(&datei).unwrap();
        assert!(json.contains(r#""type":"file""#));

        let decoded: RaumEintrag = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id(), 2);
    }

    #[test]
    fn datei_info_felder_liegen_flach() {
        let info = DateiInfo {
            meta: DateiMeta {
                name: "notizen.txt".to_string(),
                size_bytes: None,
                mime_type: None,
                extra: Map::new(),
            },
            sender_id: test_id(),
        };
        let wert = serde_json::to_value(&info).unwrap();

        // Metadaten liegen neben sender_id, nicht in einem Unterobjekt
        assert_eq!(wert.get("name").and_then(|v| v.as_str()), Some("notizen.txt"));
        assert!(wert.get("sender_id").is_some());
        assert!(wert.get("meta").is_none());
    }

    #[test]
    fn signal_daten_behalten_fremde_felder() {
        let json = r#"{"event":"file-transfer-signal","offer":"sdp-blob","kind":"webrtc"}"#;
        let event = ClientEvent::from_json(json).unwrap();

        let daten = match event {
            ClientEvent::FileTransferSignal(d) => d,
            _ => panic!("Erwartet FileTransferSignal"),
        };
        assert!(daten.target_id.is_none());
        assert_eq!(
            daten.daten.get("offer").and_then(|v| v.as_str()),
            Some("sdp-blob")
        );

        // Anreicherung: Absenderfelder kommen dazu, Original bleibt erhalten
        let weiter = SignalWeiterleitung {
            sender_id: test_id(),
            sender_name: "tester".to_string(),
            target_id: daten.target_id,
            daten: daten.daten,
        };
        let json = serde_json::to_string(&ServerEvent::FileTransferSignal(weiter)).unwrap();
        assert!(json.contains(r#""sender_name":"tester""#));
        assert!(json.contains(r#""offer":"sdp-blob""#));
    }

    #[test]
    fn fehler_event_serialisierung() {
        let event = ServerEvent::fehler("Sie sind keinem Raum beigetreten");
        let json = event.to_json().unwrap();
        assert!(json.contains(r#""event":"error""#));

        let decoded = ServerEvent::from_json(&json).unwrap();
        if let ServerEvent::Error(f) = decoded {
            assert_eq!(f.message, "Sie sind keinem Raum beigetreten");
        } else {
            panic!("Erwartet Error");
        }
    }

    #[test]
    fn ereignisnamen_sind_kebab_case() {
        let faelle: Vec<(String, &str)> = vec![
            (
                ClientEvent::ConnectRequest(Profil::default()).to_json().unwrap(),
                "connect-request",
            ),
            (
                ClientEvent::JoinRoom { room: RoomId::new("r") }.to_json().unwrap(),
                "join-room",
            ),
            (
                ClientEvent::SendMessage { content: "x".into() }.to_json().unwrap(),
                "send-message",
            ),
            (
                ClientEvent::FileInfo(DateiMeta::default()).to_json().unwrap(),
                "file-info",
            ),
            (
                ClientEvent::FileTransferSignal(SignalDaten::default()).to_json().unwrap(),
                "file-transfer-signal",
            ),
            (ClientEvent::LeaveRoom.to_json().unwrap(), "leave-room"),
            (ClientEvent::pong(1).to_json().unwrap(), "pong"),
            (
                ServerEvent::online_anzahl(3).to_json().unwrap(),
                "online-users-count",
            ),
            (
                ServerEvent::ConnectionEstablished(VerbindungBestaetigt {
                    success: true,
                    user_id: test_id(),
                    message: String::new(),
                })
                .to_json()
                .unwrap(),
                "connection-established",
            ),
            (
                ServerEvent::RoomJoined(RaumSnapshot {
                    room: RoomId::new("r"),
                    member_count: 1,
                    messages: vec![],
                })
                .to_json()
                .unwrap(),
                "room-joined",
            ),
            (
                ServerEvent::user_joined(test_id(), "a".into(), 2).to_json().unwrap(),
                "user-joined",
            ),
            (
                ServerEvent::user_left(test_id(), "a".into(), 1).to_json().unwrap(),
                "user-left",
            ),
            (ServerEvent::ping(5).to_json().unwrap(), "ping"),
        ];

        for (json, erwartet) in faelle {
            assert!(
                json.contains(&format!(r#""event":"{erwartet}""#)),
                "Tag '{erwartet}' fehlt in {json}"
            );
        }
    }
}
