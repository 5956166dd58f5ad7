//! Create command - bring the hotspot up, falling back across methods.

use anyhow::Result;
use clap::Args;
use hotspot_core::Operation;
use tracing::info;

use super::Session;

#[derive(Args)]
pub struct CreateArgs {
    /// Network name (1-32 characters)
    #[arg(env = "HOTSPOT_SSID")]
    pub ssid: String,

    /// WPA2 passphrase (8-63 characters)
    #[arg(env = "HOTSPOT_PASSPHRASE", hide_env_values = true)]
    pub passphrase: String,
}

pub async fn execute(session: &Session, args: CreateArgs) -> Result<()> {
    info!(ssid = %args.ssid, backend = %session.backend(), "Creating hotspot");

    let service = session.service();
    session
        .run(
            &service,
            Operation::Create {
                ssid: args.ssid,
                passphrase: args.passphrase,
            },
        )
        .await
}
