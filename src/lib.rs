//! Client-side flows for attaching AI-recommended policies to features,
//! plus the organization and actor create dialogs.
//!
//! - [`modal`]: the recommendation dialog state machine, batch submitter and
//!   single-field forms.
//! - [`store`]: store traits the flows write through.
//! - [`client`]: HTTP implementations of the recommendation source and store.
//! - [`db`] / [`api`]: a local SQLite backend and the REST server exposing it.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod i18n;
pub mod modal;
pub mod models;
pub mod notify;
pub mod store;
