//! CLI command for listing report presets

use clap::Args;
use serde_json::{json, Value};

use super::{write_records, CliError, OutputFormat};
use crate::records::Record;
use crate::reports::{self, ReportPreset};

/// Reports subcommand
#[derive(Debug, Args)]
pub struct ReportsCommand {
    /// Only presets in this area (Load, Generation, Market, ...)
    #[arg(long)]
    pub area: Option<String>,
}

impl ReportsCommand {
    /// Presets selected by the filter
    pub fn selected(&self) -> Vec<&'static ReportPreset> {
        reports::all()
            .iter()
            .filter(|preset| {
                self.area
                    .as_deref()
                    .map_or(true, |area| preset.area.eq_ignore_ascii_case(area))
            })
            .collect()
    }

    /// Execute the reports command
    pub fn execute(&self, format: OutputFormat) -> Result<(), CliError> {
        let rows: Vec<Record> = self.selected().into_iter().map(preset_record).collect();
        write_records(&rows, format, None)?;
        Ok(())
    }
}

fn preset_record(preset: &ReportPreset) -> Record {
    let options = preset.options();
    let fixed = preset
        .fixed
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(";");

    let row = json!({
        "code": preset.code,
        "name": preset.name,
        "area": preset.area,
        "document_type": preset.document_type,
        "fixed": fixed,
        "group": preset.group.to_string(),
        "max_days": options.max_days_limit,
        "offset_increment": options.offset_increment,
        "paginated": preset.paginated,
        "domain_rule": preset.domain_rule.map(|rule| rule.to_string()),
    });
    match row {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}
