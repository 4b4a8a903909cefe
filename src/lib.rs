//! Team registrations, photos and payments plumbing for the La Bamba
//! Frisbee club site.
//!
//! The core is the ingestion pipeline in [`ingest`]: a [`sources::TableSource`]
//! yields a raw table, [`ingest::project`] maps its heterogeneous headers
//! onto canonical [`ingest::TeamRecord`]s and [`ingest::reduce`] deduplicates
//! and sorts them. [`refresh`] runs that pipeline as repeatable cycles and
//! [`server`] is the club backend: the registrations proxy the backend
//! source talks to, plus the photo and checkout endpoints [`site_api`] calls.

pub mod config;
pub mod health;
pub mod ingest;
pub mod logging;
pub mod payments;
pub mod photos;
pub mod refresh;
pub mod render;
pub mod server;
pub mod site_api;
pub mod sources;
pub mod state;

#[cfg(test)]
mod test_utils;

/// Run the registrations backend with the given settings.
pub async fn run(settings: config::Settings) -> anyhow::Result<()> {
	server::serve(settings).await
}
