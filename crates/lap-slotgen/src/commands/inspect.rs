use crate::common::GlobalOpts;
use crate::errors::InspectError;
use clap::Args;
use colored::Colorize;
use lap_logger as logger;
use lap_slots::{format_service_id, AuditFinding, OutputFormat, Pool, SlotConfigDocument};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct InspectCommand {
    /// Slot configuration file written by `generate`
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Input format (default: from the file extension)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// List every entry
    #[arg(short, long)]
    pub list: bool,
}

/// Load a slot configuration, print a summary and audit it.
///
/// Findings are printed and turned into an error so the exit status reflects them.
pub fn handle_inspect(cmd: &InspectCommand, opts: &GlobalOpts) -> Result<(), InspectError> {
    logger::debug(&format!("Inspecting {}", cmd.config.display()));

    let document = load_document(cmd)?;
    print_summary(&document);

    if cmd.list || opts.verbosity_level() > 0 {
        print_entries(&document);
    }

    let findings = document.audit();
    if findings.is_empty() {
        logger::success(&format!("{} is consistent", cmd.config.display()));
        return Ok(());
    }

    print_findings(&findings);
    Err(InspectError::Findings(findings.len()))
}

fn load_document(cmd: &InspectCommand) -> Result<SlotConfigDocument, InspectError> {
    let Some(format) = cmd.format else {
        return Ok(SlotConfigDocument::load(&cmd.config)?);
    };
    if !cmd.config.exists() {
        return Err(lap_slots::DocumentError::NotFound(cmd.config.clone()).into());
    }
    let content = fs::read_to_string(&cmd.config).map_err(lap_slots::DocumentError::from)?;
    Ok(SlotConfigDocument::from_str_as(&content, format)?)
}

fn print_summary(document: &SlotConfigDocument) {
    let metadata = &document.metadata;
    let mapping = &document.slot_mapping;

    println!("{}", "Slot configuration:".bold().green());
    println!("  {}: {}", "version".cyan(), document.version);
    println!("  {}: {}", "generated_by".cyan(), metadata.generated_by);
    println!("  {}: {}", "source".cyan(), metadata.source);
    println!("  {}: {}", "date".cyan(), metadata.date);
    println!("  {}: {}", "total_services".cyan(), metadata.total_services);

    for (pool, count) in [
        (Pool::Static, mapping.static_allocations.len()),
        (Pool::Dynamic, mapping.dynamic_allocations.len()),
        (Pool::Asil, mapping.asil_allocations.len()),
    ] {
        println!(
            "  {} ({}): {}/{}",
            pool.to_string().cyan(),
            pool.range_string(),
            count,
            pool.size()
        );
    }
}

fn print_entries(document: &SlotConfigDocument) {
    println!("{}", "Entries:".bold().green());
    let mut entries: Vec<_> = document.entries().collect();
    entries.sort_by_key(|(_, entry)| entry.slot_index);
    for (bucket, entry) in entries {
        let service_id = lap_manifest::parse_permissive_int(&entry.service_id)
            .map_or_else(|| entry.service_id.clone(), format_service_id);
        println!(
            "  {:>4}  {}  {:<32} {:<6} {}",
            entry.slot_index,
            service_id,
            entry.service_name,
            entry.safety_level.as_str(),
            bucket.to_string().dimmed()
        );
    }
}

fn print_findings(findings: &[AuditFinding]) {
    println!("{}", "Findings:".bold().red());
    for finding in findings {
        println!("  {} {}", "-".red(), finding);
    }
}
