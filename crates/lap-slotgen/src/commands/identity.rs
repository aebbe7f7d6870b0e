use clap::Args;
use lap_manifest::derive_identity;
use lap_slots::{format_service_id, static_bucket};

#[derive(Args, Debug, Clone)]
pub struct IdentityCommand {
    /// Service names to hash
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,
}

/// One derived identity and the static slot it hashes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityLine {
    pub name: String,
    pub identity: u32,
    pub static_slot: u16,
}

impl IdentityLine {
    pub fn for_name(name: &str) -> Self {
        let identity = derive_identity(name);
        IdentityLine {
            name: name.to_string(),
            identity,
            static_slot: static_bucket(identity),
        }
    }
}

pub fn handle_identity(cmd: &IdentityCommand) {
    for name in &cmd.names {
        let line = IdentityLine::for_name(name);
        println!(
            "{}\t{}\tstatic-slot={}",
            line.name,
            format_service_id(line.identity),
            line.static_slot
        );
    }
}
