//! `galago-smoke list` command handler

use std::io::Write;

use serde::Serialize;

use galago_smoke_harness::ScenarioKind;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command.
pub fn execute(writer: &OutputWriter) -> Result<(), CliError> {
    writer.render(&catalogue())
}

pub fn catalogue() -> ScenarioCatalogue {
    ScenarioCatalogue {
        scenarios: ScenarioKind::ALL
            .into_iter()
            .map(|kind| ScenarioEntry {
                name: kind,
                description: kind.description(),
                needs_workload: kind.needs_workload(),
            })
            .collect(),
    }
}

#[derive(Serialize)]
pub struct ScenarioCatalogue {
    pub scenarios: Vec<ScenarioEntry>,
}

#[derive(Serialize)]
pub struct ScenarioEntry {
    pub name: ScenarioKind,
    pub description: &'static str,
    pub needs_workload: bool,
}

impl Render for ScenarioCatalogue {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "{:<28} {:<9} {}", "NAME".bold(), "WORKLOAD".bold(), "CHECKS".bold())?;
        for entry in &self.scenarios {
            let workload = if entry.needs_workload { "yes" } else { "-" };
            writeln!(
                w,
                "{:<28} {:<9} {}",
                entry.name.name(),
                workload,
                entry.description
            )?;
        }
        Ok(())
    }
}
