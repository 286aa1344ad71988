#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Minesweeper Duel Server
//!
//! Authoritative server core for a two-player, turn-based competitive
//! Minesweeper with live spectators and a chat channel. The server is the
//! single source of truth for mine layout, turn ownership, scoring, and
//! timing; clients only render and emit intents.
//!
//! The core is split along the components named in the specification:
//! room lifecycle ([`room`]), the per-room game engine ([`engine`]), event
//! dispatch and fan-out ([`dispatcher`]), journaling ([`journal`]), the
//! admin observer surface ([`admin`]), and the transport adapter
//! ([`transport`]) that wires the rest onto axum.

/// Administrative observer surface: room-stats subscribers and
/// admin-spectator memberships.
pub mod admin;

/// Admin bearer-token authentication.
pub mod auth;

/// Layered configuration for every subsystem.
pub mod config;

/// Event dispatcher: the seam between transport and engine/registry.
pub mod dispatcher;

/// Per-room pure-logic game engine.
pub mod engine;

/// Typed error taxonomy shared by the engine, registry, and journal.
pub mod errors;

/// Per-room append-only persistence.
pub mod journal;

/// Structured logging initialisation.
pub mod logging;

/// Wire-facing types: identifiers, grid snapshots, and message envelopes.
pub mod protocol;

/// Room data model and in-memory registry.
pub mod room;

/// HTTP/WebSocket transport adapter.
pub mod transport;
