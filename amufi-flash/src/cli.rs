//! CLI argument parsing for amufi-flash.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Agent type the hostname prefix is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AgentKind {
    #[value(name = "aMussel")]
    AMussel,
    #[value(name = "aFish")]
    AFish,
}

impl AgentKind {
    pub fn hostname_prefix(&self) -> &'static str {
        match self {
            AgentKind::AMussel => "aMussel",
            AgentKind::AFish => "aFish",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hostname_prefix())
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "amufi-flash")]
#[command(version)]
#[command(about = "SD-card provisioning for the aMussel/aFish agent fleet")]
pub struct Cli {
    /// Device location of the SD card (e.g. /dev/sdb)
    pub dev: PathBuf,

    /// Partition the SD card into "system" and "data" regions
    #[arg(short, long)]
    pub partition: bool,

    /// Format the SD card partitions to ext4
    #[arg(short, long)]
    pub format: bool,

    /// Copy the image onto the "system" partition
    #[arg(short, long)]
    pub copy_image: bool,

    /// Agent number the card should be configured for
    #[arg(short, long)]
    pub number: Option<String>,

    /// Image file to copy (default can be set in the config file)
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Agent type [aMussel | aFish]
    #[arg(short, long, value_enum)]
    pub agent: Option<AgentKind>,

    /// No safety checks
    #[arg(long)]
    pub force: bool,

    /// Detailed output (echoes the external commands being run)
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the size in bytes of the device and exit
    #[arg(short, long)]
    pub size: bool,

    /// Card-reader-attached media (changes the partition naming convention)
    #[arg(long)]
    pub cardreader: bool,

    /// Path to the provisioning config file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
