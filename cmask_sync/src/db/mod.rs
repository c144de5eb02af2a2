//! Database utilities.
//!
//! A single [`PgConnection`](diesel::PgConnection) is opened lazily per run,
//! reused for every query, and released when the orchestrator's scope ends
//! (on every exit path, including early failure). Catalog and zonal table
//! names are per-biome configuration, so queries go through
//! `diesel::sql_query` with `QueryableByName` row structs; values are always
//! bound, never interpolated.

pub mod connection;
