//! Handler fuer alle Client-Ereignisse
//!
//! Jeder Handler ist fuer eine Ereignisgruppe zustaendig und hat
//! Zugriff auf den gemeinsamen RelayState.

pub mod nachricht_handler;
pub mod presence_handler;
pub mod signal_handler;
