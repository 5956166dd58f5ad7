//! Stop and delete commands.

use anyhow::Result;
use hotspot_core::Operation;
use tracing::info;

use super::Session;

pub async fn stop(session: &Session) -> Result<()> {
    info!(backend = %session.backend(), "Stopping hotspot");
    session.run(&session.service(), Operation::Stop).await
}

pub async fn delete(session: &Session) -> Result<()> {
    info!(backend = %session.backend(), "Deleting hotspot");
    session.run(&session.service(), Operation::Delete).await
}
