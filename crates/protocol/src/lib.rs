//! stammtisch-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert alle Ereignistypen, Enums und Strukturen
//! die zwischen Client und Relay ausgetauscht werden, plus das
//! Frame-basierte Wire-Format.

pub mod events;
pub mod wire;

pub use events::{ClientEvent, ServerEvent};
pub use wire::{ClientCodec, EventCodec, RelayCodec};
