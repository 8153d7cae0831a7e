//! Clap derive structures for the `devprof` CLI.
//!
//! Defines the command tree, global flags, and the value enums mirrored
//! from the platform's wire types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// devprof -- administer IoT platform device profiles from the command line
#[derive(Debug, Parser)]
#[command(
    name = "devprof",
    version,
    about = "Manage device profiles, credentials and firmware from the command line",
    long_about = "Administers device profiles, LwM2M security settings, device credentials\n\
        and firmware packages over the platform's REST API.\n\n\
        Credential checks and the default LwM2M document work offline.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Platform profile to use
    #[arg(long, short = 'p', env = "DEVPROF_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Platform URL (overrides profile)
    #[arg(long, short = 'u', env = "DEVPROF_URL", global = true)]
    pub url: Option<String>,

    /// Pre-issued JWT
    #[arg(long, env = "DEVPROF_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DEVPROF_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "DEVPROF_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "DEVPROF_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Domain value enums ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    Default,
    Mqtt,
    Coap,
    Lwm2m,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SecurityModeArg {
    #[value(name = "no-sec", alias = "nosec")]
    NoSec,
    Psk,
    Rpk,
    X509,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CredentialsTypeArg {
    AccessToken,
    X509Certificate,
    MqttBasic,
    Lwm2mCredentials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FirmwareTypeArg {
    Firmware,
    Software,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChecksumArg {
    Md5,
    Sha256,
    Crc32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyKindArg {
    Attributes,
    Timeseries,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage device profiles
    #[command(alias = "prof", alias = "dp")]
    Profiles(ProfilesArgs),

    /// Manage firmware and software packages
    #[command(alias = "fw")]
    Firmware(FirmwareArgs),

    /// Browse LwM2M objects and server security defaults
    Lwm2m(Lwm2mArgs),

    /// Inspect, check and update device credentials
    #[command(alias = "creds")]
    Credentials(CredentialsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Search text shared by list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only entries whose name contains this text
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICE PROFILES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    pub command: ProfilesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProfilesCommand {
    /// List device profiles
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only profiles using this transport
        #[arg(long, short = 't')]
        transport: Option<TransportArg>,
    },

    /// Show one device profile in full
    Get {
        /// Device profile UUID
        id: String,
    },

    /// Show the tenant's default profile
    Default,

    /// Create or update a profile from a JSON file
    Apply {
        /// Path to the profile JSON
        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },

    /// Make a profile the tenant default
    SetDefault {
        /// Device profile UUID
        id: String,
    },

    /// Delete a device profile
    #[command(alias = "rm")]
    Delete {
        /// Device profile UUID
        id: String,
    },

    /// List attribute or time-series keys reported by devices
    Keys {
        /// Which key set to list
        kind: KeyKindArg,

        /// Restrict to devices of this profile
        #[arg(long)]
        profile_id: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FIRMWARE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FirmwareArgs {
    #[command(subcommand)]
    pub command: FirmwareCommand,
}

#[derive(Debug, Subcommand)]
pub enum FirmwareCommand {
    /// List firmware packages
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only packages assigned to this device profile
        #[arg(long, requires = "firmware_type")]
        profile_id: Option<String>,

        /// Package type (with --profile-id)
        #[arg(long = "type")]
        firmware_type: Option<FirmwareTypeArg>,

        /// Only packages with uploaded data (with --profile-id)
        #[arg(long)]
        has_data: bool,
    },

    /// Show firmware metadata
    Get {
        /// Firmware UUID
        id: String,

        /// Include the base64 payload (json/yaml output)
        #[arg(long)]
        with_data: bool,
    },

    /// Register a new firmware entry (upload data separately)
    #[command(disable_version_flag = true)]
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        version: String,

        #[arg(long = "type", default_value = "firmware")]
        firmware_type: FirmwareTypeArg,

        /// Device profile the package targets
        #[arg(long)]
        profile_id: Option<String>,
    },

    /// Upload the binary for a firmware entry
    Upload {
        /// Firmware UUID
        id: String,

        /// File to upload
        file: PathBuf,

        /// MIME type of the file
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,

        /// Expected checksum of the file
        #[arg(long, requires = "algorithm")]
        checksum: Option<String>,

        /// Algorithm of --checksum
        #[arg(long)]
        algorithm: Option<ChecksumArg>,
    },

    /// Download the binary of a firmware entry
    Download {
        /// Firmware UUID
        id: String,

        /// Destination path (defaults to the server-side file name)
        #[arg(long, short = 'O')]
        output_file: Option<PathBuf>,
    },

    /// Delete a firmware entry
    #[command(alias = "rm")]
    Delete {
        /// Firmware UUID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LWM2M
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct Lwm2mArgs {
    #[command(subcommand)]
    pub command: Lwm2mCommand,
}

#[derive(Debug, Subcommand)]
pub enum Lwm2mCommand {
    /// List LwM2M object models
    Objects {
        #[command(flatten)]
        list: ListArgs,

        /// Only these object ids (e.g. 3_1.0)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,

        /// Sort property
        #[arg(long, default_value = "id")]
        sort: String,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Fetch a single page (0-based) instead of the whole catalogue
        #[arg(long, conflicts_with = "ids")]
        page: Option<u32>,

        /// Page size (with --page)
        #[arg(long, default_value_t = 20, requires = "page")]
        page_size: u32,
    },

    /// Show the platform's defaults for a server security mode
    Defaults {
        mode: SecurityModeArg,

        /// Bootstrap server instead of LwM2M server
        #[arg(long)]
        bootstrap: bool,
    },

    /// Build a server security entry and check it
    Server {
        /// Security mode of the entry
        #[arg(long, short = 'm', default_value = "no-sec")]
        mode: SecurityModeArg,

        /// Bootstrap server instead of LwM2M server
        #[arg(long)]
        bootstrap: bool,

        /// Server host (defaults to the platform host)
        #[arg(long)]
        host: Option<String>,

        /// Server public key or certificate, hex encoded
        #[arg(long)]
        public_key: Option<String>,

        /// Do not require the numeric fields
        #[arg(long)]
        optional: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CREDENTIALS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CredentialsArgs {
    #[command(subcommand)]
    pub command: CredentialsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CredentialsCommand {
    /// Validate a credentials JSON file and print its normalised form
    Check {
        /// Path to the credentials JSON ("-" for stdin)
        file: PathBuf,
    },

    /// Print blank credentials of a type, as the editor seeds them
    New {
        #[arg(long = "type", short = 't')]
        credentials_type: CredentialsTypeArg,
    },

    /// Print the default LwM2M client security document
    DefaultLwm2m,

    /// Show a device's credentials
    Get {
        /// Device UUID
        device_id: String,
    },

    /// Replace a device's credentials from a JSON file
    Set {
        /// Device UUID
        device_id: String,

        /// Path to the credentials JSON
        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },

    /// Edit a device's LwM2M security document in $EDITOR
    Edit {
        /// Device UUID
        device_id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Set a profile value
    Set {
        /// Profile field (url, auth_mode, username, ...) or `defaults.<field>`
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password or token in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,

        /// Store a JWT instead of a password
        #[arg(long)]
        token: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
