//! Config command - print the configuration after flags and environment.

use anyhow::Result;

use super::Session;

pub fn execute(session: &Session) -> Result<()> {
    if session.json {
        println!("{}", serde_json::to_string_pretty(&session.config)?);
    } else {
        print!("{}", session.config.to_yaml()?);
    }
    Ok(())
}
