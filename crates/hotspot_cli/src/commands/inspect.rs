//! Read-only commands: status, support check and diagnosis.
//!
//! None of these needs an elevated prompt.

use anyhow::Result;
use hotspot_core::Operation;

use super::Session;

pub async fn status(session: &Session) -> Result<()> {
    session.run(&session.service(), Operation::Status).await
}

pub async fn check(session: &Session) -> Result<()> {
    session.run(&session.service(), Operation::CheckSupport).await
}

pub async fn diagnose(session: &Session) -> Result<()> {
    session.run(&session.service(), Operation::Diagnose).await
}
