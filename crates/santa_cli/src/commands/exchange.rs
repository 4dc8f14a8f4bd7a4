//! Generation runs and the pairing overview

use miette::Result;
use owo_colors::OwoColorize;
use santa_core::{CoreError, Exchange};

use crate::output::{Output, flag};

/// Run a generation over every non-admin user
pub async fn generate(exchange: &Exchange) -> Result<()> {
    let output = Output::new();

    match exchange.generate_assignments().await {
        Ok(summary) => {
            output.success(&format!(
                "Generated assignments for {} participants",
                summary.count.to_string().bright_white()
            ));
            output.status("Previous assignments and viewed flags were replaced");
            Ok(())
        }
        Err(e @ CoreError::InsufficientParticipants { .. }) => {
            output.error(&e.to_string());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Table of giver → receiver pairs
pub async fn assignments(exchange: &Exchange) -> Result<()> {
    let output = Output::new();
    let entries = exchange.assignment_entries().await?;

    output.section("Assignments");
    if entries.is_empty() {
        output.status("No assignments have been generated");
        return Ok(());
    }

    let viewed = entries.iter().filter(|entry| entry.has_viewed).count();
    let total = entries.len();
    let rows = entries
        .into_iter()
        .map(|entry| vec![entry.giver_name, entry.receiver_name, flag(entry.has_viewed)])
        .collect();
    output.table(&["Giver", "Receiver", "Viewed"], rows);
    output.kv("Viewed", &format!("{}/{}", viewed, total));

    Ok(())
}
