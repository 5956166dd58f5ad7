//! Methods command - list the strategies in fallback order.

use anyhow::Result;
use hotspot_core::{attempt_order, BackendKind};
use serde::Serialize;

use super::Session;

#[derive(Debug, Serialize)]
struct MethodEntry {
    position: usize,
    tag: &'static str,
    label: &'static str,
    preferred: bool,
}

fn entries(preferred: BackendKind) -> Vec<MethodEntry> {
    attempt_order(preferred)
        .into_iter()
        .enumerate()
        .map(|(i, kind)| MethodEntry {
            position: i + 1,
            tag: kind.as_str(),
            label: kind.label(),
            preferred: kind == preferred,
        })
        .collect()
}

pub fn execute(session: &Session) -> Result<()> {
    let entries = entries(session.backend());

    if session.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Metodos disponibles (orden de intento):");
    for entry in &entries {
        let marker = if entry.preferred { " (preferido)" } else { "" };
        println!("  {}. {:<11} {}{}", entry.position, entry.tag, entry.label, marker);
    }
    Ok(())
}
