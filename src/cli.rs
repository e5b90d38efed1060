use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "fleetcert",
    version,
    about = "Insurance-certificate ingestion and vehicle reconciliation tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Relink(RelinkArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/fleetcert")]
    pub cache_root: PathBuf,

    /// Password-protected insurer certificate document.
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long)]
    pub password: String,

    #[arg(long)]
    pub year: u16,

    #[arg(long)]
    pub month: u8,

    #[arg(long)]
    pub inventory_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RelinkArgs {
    #[arg(long, default_value = ".cache/fleetcert")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub certificate_id: String,

    #[arg(long)]
    pub record_id: String,

    /// Target vehicle in the active or archived inventory.
    #[arg(long)]
    pub bike_id: String,

    #[arg(long)]
    pub inventory_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/fleetcert")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
