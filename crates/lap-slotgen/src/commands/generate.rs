use crate::common::GlobalOpts;
use crate::errors::GenerateError;
use chrono::NaiveDate;
use clap::Args;
use colored::Colorize;
use lap_config::{Config, PinFile};
use lap_logger as logger;
use lap_manifest::{assign_identities, read_manifest, ManifestError, Reconciler, ServiceRecord};
use lap_slots::{
    emit, AllocationStrategy, Bucket, CollisionPolicy, GenerationInfo, OutputFormat,
    SlotAllocator, SlotConfigDocument,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
    /// Input ARXML service manifests (processed in order)
    #[arg(short, long = "input", value_name = "ARXML", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Output slot configuration file
    #[arg(short, long, value_name = "OUT")]
    pub output: PathBuf,

    /// Allocation strategy: auto, static or dynamic
    #[arg(long)]
    pub strategy: Option<AllocationStrategy>,

    /// TOML file pinning identities, slot hints and categories per service
    #[arg(long, value_name = "TOML")]
    pub pins: Option<PathBuf>,

    /// Static slot collision policy: allow, probe or reject
    #[arg(long = "collisions")]
    pub collision_policy: Option<CollisionPolicy>,

    /// Output format (default: output file extension, then the configured format)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Generation date stamped into metadata (default: today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,
}

/// Settings for one run after merging command line and user configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSettings {
    pub strategy: AllocationStrategy,
    pub collision_policy: CollisionPolicy,
    pub format: OutputFormat,
    pub info: GenerationInfo,
}

/// Slots handed out per pool in one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub total: usize,
    pub static_count: usize,
    pub dynamic_count: usize,
    pub asil_count: usize,
}

impl GenerateSummary {
    pub fn from_document(document: &SlotConfigDocument) -> Self {
        let mapping = &document.slot_mapping;
        GenerateSummary {
            total: document.metadata.total_services,
            static_count: mapping.static_allocations.len(),
            dynamic_count: mapping.dynamic_allocations.len(),
            asil_count: mapping.asil_allocations.len(),
        }
    }
}

pub fn handle_generate(
    cmd: &GenerateCommand,
    _opts: &GlobalOpts,
) -> Result<GenerateSummary, GenerateError> {
    logger::debug("Handling generate command");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            logger::warn(&format!("Failed to load config, using defaults: {}", e));
            Config::default()
        }
    };
    let settings = resolve_settings(cmd, &config)?;
    logger::debug(&format!(
        "Strategy: {}, collisions: {}, format: {}",
        settings.strategy, settings.collision_policy, settings.format
    ));

    let mut records = read_inputs(&cmd.inputs);
    if records.is_empty() {
        return Err(GenerateError::NoServices);
    }

    if let Some(pins_path) = &cmd.pins {
        let pins = PinFile::load(pins_path)?;
        logger::debug(&format!(
            "Loaded {} service pin(s) from {}",
            pins.services.len(),
            pins_path.display()
        ));
        for name in pins.apply(&mut records) {
            logger::warn(&format!("Pinned service '{}' not found in manifests", name));
        }
    }

    assign_identities(&mut records);

    let mut allocator = SlotAllocator::new(settings.strategy, settings.collision_policy);
    if let Err(e) = allocator.assign_all(&mut records) {
        tracing::warn!(strategy = %settings.strategy, "slot allocation failed: {}", e);
        return Err(e.into());
    }
    logger::step(&format!("Allocated {} slot(s)", records.len()));

    let document = emit(&records, &settings.info)?;

    logger::spinner_start(&format!("Writing {}", cmd.output.display()));
    if let Err(e) = document.save(&cmd.output, settings.format) {
        logger::spinner_error(&format!("Failed to write {}", cmd.output.display()));
        return Err(e.into());
    }
    logger::spinner_success(&format!(
        "Generated {} ({} services)",
        cmd.output.display(),
        records.len()
    ));

    let summary = GenerateSummary::from_document(&document);
    print_summary(&summary);
    Ok(summary)
}

/// Merge command line options over user configuration over built-in defaults
pub fn resolve_settings(
    cmd: &GenerateCommand,
    config: &Config,
) -> Result<GenerateSettings, GenerateError> {
    let strategy = resolve_setting(cmd.strategy, config, "strategy")?;
    let collision_policy = resolve_setting(cmd.collision_policy, config, "collision-policy")?;
    // An explicit extension on the output path wins over the configured format
    let format = match (cmd.format, cmd.output.extension(), config.get("format")) {
        (Some(format), _, _) => format,
        (None, Some(_), _) | (None, None, None) => OutputFormat::from_path(&cmd.output),
        (None, None, Some(raw)) => parse_setting("format", &raw)?,
    };

    let mut info = match &cmd.date {
        Some(date) => GenerationInfo::dated(parse_date(date)?),
        None => GenerationInfo::today(),
    };
    if let Some(generator) = config.get("generator-name") {
        info.generator = generator;
    }

    Ok(GenerateSettings {
        strategy,
        collision_policy,
        format,
        info,
    })
}

fn resolve_setting<T>(cli: Option<T>, config: &Config, key: &str) -> Result<T, GenerateError>
where
    T: FromStr<Err = String> + Default,
{
    if let Some(value) = cli {
        return Ok(value);
    }
    match config.get(key) {
        Some(raw) => parse_setting(key, &raw),
        None => Ok(T::default()),
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T, GenerateError>
where
    T: FromStr<Err = String>,
{
    raw.parse().map_err(|message| GenerateError::InvalidSetting {
        key: key.to_string(),
        message,
    })
}

fn parse_date(date: &str) -> Result<String, GenerateError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(|parsed| parsed.format("%Y-%m-%d").to_string())
        .map_err(|_| GenerateError::InvalidDate(date.to_string()))
}

/// Read and reconcile every input in order; unreadable documents are skipped
fn read_inputs(inputs: &[PathBuf]) -> Vec<ServiceRecord> {
    let mut reconciler = Reconciler::new();

    for path in inputs {
        match read_manifest(path) {
            Ok(document) => {
                let added = reconciler.reconcile_document(&document);
                tracing::debug!(
                    source = %path.display(),
                    interfaces = document.interfaces.len(),
                    instances = document.instances.len(),
                    records = added,
                    "reconciled manifest"
                );
                logger::info(&format!(
                    "{}: {} interface(s), {} record(s)",
                    path.display(),
                    document.interfaces.len(),
                    added
                ));
            }
            Err(ManifestError::NotFound(missing)) => {
                logger::warn(&format!("File not found: {}, skipping", missing.display()));
            }
            Err(e) => {
                tracing::debug!(source = %path.display(), "manifest skipped: {}", e);
                logger::warn(&format!("Skipping {}: {}", display_name(path), e));
            }
        }
    }

    reconciler.into_records()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn print_summary(summary: &GenerateSummary) {
    println!("{}", "Slot allocation:".bold().green());
    println!(
        "  {}: {}",
        Bucket::Static.to_string().cyan(),
        summary.static_count
    );
    println!(
        "  {}: {}",
        Bucket::Dynamic.to_string().cyan(),
        summary.dynamic_count
    );
    println!("  {}: {}", Bucket::Asil.to_string().cyan(), summary.asil_count);
    println!("  {}: {}", "total".cyan(), summary.total);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(output: &str) -> GenerateCommand {
        GenerateCommand {
            inputs: vec![PathBuf::from("services.arxml")],
            output: PathBuf::from(output),
            strategy: None,
            pins: None,
            collision_policy: None,
            format: None,
            date: Some("2025-11-19".to_string()),
        }
    }

    #[test]
    fn test_defaults_without_config() {
        let Ok(settings) = resolve_settings(&command("slots.yaml"), &Config::default()) else {
            panic!("settings should resolve");
        };
        assert_eq!(settings.strategy, AllocationStrategy::Auto);
        assert_eq!(settings.collision_policy, CollisionPolicy::Allow);
        assert_eq!(settings.format, OutputFormat::Yaml);
        assert_eq!(settings.info.date, "2025-11-19");
        assert_eq!(settings.info.generator, "lap-slotgen");
    }

    #[test]
    fn test_format_follows_output_extension() {
        let Ok(settings) = resolve_settings(&command("slots.json"), &Config::default()) else {
            panic!("settings should resolve");
        };
        assert_eq!(settings.format, OutputFormat::Json);
    }

    #[test]
    fn test_command_line_overrides_config() {
        let mut config = Config::default();
        config.set("strategy", "dynamic".to_string());
        config.set("collision-policy", "probe".to_string());
        config.set("format", "json".to_string());
        config.set("generator-name", "LightAP Slot Generator".to_string());

        let Ok(from_config) = resolve_settings(&command("slots"), &config) else {
            panic!("settings should resolve");
        };
        assert_eq!(from_config.strategy, AllocationStrategy::Dynamic);
        assert_eq!(from_config.collision_policy, CollisionPolicy::Probe);
        assert_eq!(from_config.format, OutputFormat::Json);
        assert_eq!(from_config.info.generator, "LightAP Slot Generator");

        let mut cmd = command("slots.yaml");
        cmd.strategy = Some(AllocationStrategy::Static);
        cmd.format = Some(OutputFormat::Yaml);
        let Ok(from_cli) = resolve_settings(&cmd, &config) else {
            panic!("settings should resolve");
        };
        assert_eq!(from_cli.strategy, AllocationStrategy::Static);
        assert_eq!(from_cli.format, OutputFormat::Yaml);
    }

    #[test]
    fn test_output_extension_wins_over_configured_format() {
        let mut config = Config::default();
        config.set("format", "json".to_string());

        let Ok(yaml) = resolve_settings(&command("slots.yaml"), &config) else {
            panic!("settings should resolve");
        };
        assert_eq!(yaml.format, OutputFormat::Yaml);

        let Ok(bare) = resolve_settings(&command("out/slots"), &config) else {
            panic!("settings should resolve");
        };
        assert_eq!(bare.format, OutputFormat::Json);

        let Ok(bare_default) = resolve_settings(&command("out/slots"), &Config::default()) else {
            panic!("settings should resolve");
        };
        assert_eq!(bare_default.format, OutputFormat::Yaml);
    }

    #[test]
    fn test_invalid_config_value_is_reported() {
        let mut config = Config::default();
        config.set("strategy", "round-robin".to_string());
        assert!(matches!(
            resolve_settings(&command("slots.yaml"), &config),
            Err(GenerateError::InvalidSetting { key, .. }) if key == "strategy"
        ));
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let mut cmd = command("slots.yaml");
        cmd.date = Some("2025-13-40".to_string());
        assert!(matches!(
            resolve_settings(&cmd, &Config::default()),
            Err(GenerateError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_missing_inputs_yield_no_records() {
        let records = read_inputs(&[PathBuf::from("/nonexistent/services.arxml")]);
        assert!(records.is_empty());
    }
}
