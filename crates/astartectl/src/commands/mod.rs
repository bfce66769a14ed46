use clap::{Parser, Subcommand};

pub mod cluster;
pub mod completions;
pub mod devices;

#[derive(clap::ValueEnum, Clone, Debug)]
pub enum LogFormat {
    Auto,
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "astartectl", version, about = "Command line client for the Astarte IoT platform")]
pub struct Cli {
    /// Log level: trace|debug|info|warn|error
    #[arg(long, default_value = "warn")]
    pub log_level: String,
    /// Log format: auto|text|json
    #[arg(long, default_value = "auto")]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interact with the devices of the realm
    #[command(subcommand)]
    Devices(DeviceCommands),
    /// Manage the Astarte cluster
    #[command(subcommand)]
    Cluster(ClusterCommands),
    /// Generate shell completions (hidden)
    #[command(hide = true)]
    Completions {
        #[arg(long, default_value = "bash")]
        shell: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DeviceCommands {
    /// List all devices in the realm
    List,
    /// Describe a device, printing all its known information
    Describe { device_id: String },
    /// Print the last known sample or value for every device interface
    DataSnapshot { device_id: String },
    /// Retrieve samples for a datastream path
    GetSamples {
        device_id: String,
        interface: String,
        path: String,
        /// Number of samples to retrieve. Setting this to 0 retrieves all samples.
        #[arg(short, long, default_value_t = 10000)]
        count: usize,
        /// Return samples in ascending order rather than descending
        #[arg(long, default_value_t = false)]
        ascending: bool,
        /// Only return samples newer than the provided timestamp
        #[arg(long)]
        since: Option<String>,
        /// Only return samples older than the provided timestamp
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    /// Install the Astarte Operator in the current Kubernetes cluster
    InstallOperator {
        /// Operator version to install. Defaults to the latest stable release.
        #[arg(long)]
        version: Option<String>,
        /// Non-interactive mode. Will answer yes by default to all questions.
        #[arg(short = 'y', long, default_value_t = false)]
        non_interactive: bool,
    },
}
