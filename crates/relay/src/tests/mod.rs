//! Integrations-Tests fuer den Relay-Service
