use crate::types::{MigrationResult, Outcome};
use itertools::Itertools;
use std::io::{self, Write};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_CONFIG_ERROR: u8 = 1;
pub const EXIT_MIGRATION_FAILED: u8 = 2;

/// Per-target outcomes in the order they were produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    results: Vec<MigrationResult>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: MigrationResult) {
        match (result.outcome, &result.error_detail) {
            (Outcome::Failed, detail) => log::error!(
                "Unable to migrate target: {} {}, reason: {}",
                result.target_id,
                result.display_name,
                detail.as_deref().unwrap_or("unknown")
            ),
            (Outcome::Skipped, detail) => log::warn!(
                "Skipped target: {} {}: {}",
                result.target_id,
                result.display_name,
                detail.as_deref().unwrap_or("no reason given")
            ),
            (outcome, _) => log::info!(
                "{} target: {} {}",
                outcome.label(),
                result.target_id,
                result.display_name
            ),
        }
        self.results.push(result);
    }

    pub fn results(&self) -> &[MigrationResult] {
        &self.results
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|x| x.outcome == outcome).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(Outcome::Failed) > 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.has_failures() {
            EXIT_MIGRATION_FAILED
        } else {
            EXIT_SUCCESS
        }
    }

    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(self.render().as_bytes())
    }

    pub fn render(&self) -> String {
        let details = self
            .results
            .iter()
            .filter(|x| x.outcome != Outcome::Migrated)
            .map(|result| {
                let line = format!(
                    "Target: {}, Name: {} ({})",
                    result.target_id,
                    result.display_name,
                    result.outcome.label()
                );
                match &result.error_detail {
                    Some(detail) => format!("{}: {}\n", line, detail),
                    None => format!("{}\n", line),
                }
            })
            .join("");
        let counts = Outcome::ALL
            .iter()
            .map(|outcome| format!("{}: {}", outcome.label(), self.count(*outcome)))
            .join(", ");
        format!(
            "{}\nTotal Targets: {}\n{}\n",
            details,
            self.results.len(),
            counts
        )
    }
}
