//! Ercha CLI - LZW archiver for RCH containers
//!
//! Compresses files into single-payload RCH containers and restores, checks
//! and inspects them. Several files can also be packed into one archive of
//! named containers, extracted selectively, and edited in place.

mod commands;
mod config;
mod utils;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use config::ErchaConfig;
use ercha_core::{ChecksumKind, ErchaError};
use ercha_lzw::{DictionaryPolicy, LzwConfig};
use ercha_rch::archive::ops::DEFAULT_STDIN_NAME;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ercha")]
#[command(author, version, about = "Ercha - LZW archiver for RCH containers")]
#[command(long_about = "
Ercha compresses each input into a self-describing RCH container: a 30-byte
header (magic, codec flags, lengths, checksum) followed by an LZW payload.
Archives hold several named containers in one file.

Examples:
  ercha compress notes.txt
  ercha compress --policy reset --max-bits 12 *.log -o archive/
  ercha compress --legacy data.bin -o data.rch
  cat data.bin | ercha compress - > data.rch
  ercha decompress notes.txt.rch
  ercha check archive/*.rch
  ercha info --json notes.txt.rch
  ercha pack logs.erca *.log
  tar c dir | ercha pack --stdin-filename dir.tar backup.erca -
  ercha unpack logs.erca out/ --files app.log
  ercha inject logs.erca late.log
  ercha detract logs.erca old.log --output trimmed.erca
  ercha list logs.erca
  ercha config init
  ercha completions bash > ercha.bash
")]
pub(crate) struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors; disables progress bars
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file (default: ./ercha.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress files into RCH containers
    #[command(alias = "c")]
    Compress {
        /// Files to compress ('-' for stdin)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file, or directory for several inputs ('-' for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace existing output files
        #[arg(long)]
        overwrite: bool,

        #[command(flatten)]
        codec: CodecArgs,

        /// Worker threads for several inputs (0 = one per core)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Restore files from RCH containers
    #[command(alias = "x")]
    Decompress {
        /// Containers to restore ('-' for stdin)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file, or directory for several inputs ('-' for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace existing output files
        #[arg(long)]
        overwrite: bool,

        /// Worker threads for several inputs (0 = one per core)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Decode containers or archives and verify their checksums
    #[command(alias = "t")]
    Check {
        /// Containers or archives to check
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Worker threads (0 = one per core)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Pack files into one archive of named containers
    #[command(alias = "p")]
    Pack {
        /// Archive to create ('-' for stdout)
        archive: PathBuf,

        /// Files to add ('-' for stdin)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Member name for data read from stdin
        #[arg(long, value_name = "NAME", default_value = DEFAULT_STDIN_NAME)]
        stdin_filename: String,

        /// Replace an existing archive
        #[arg(long)]
        overwrite: bool,

        #[command(flatten)]
        codec: CodecArgs,

        /// Worker threads (0 = one per core)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Extract members of an archive
    #[command(alias = "u")]
    Unpack {
        /// Archive to read ('-' for stdin)
        archive: PathBuf,

        /// Directory to extract into ('-' for stdout)
        #[arg(default_value = ".")]
        output_dir: PathBuf,

        /// Only extract these members
        #[arg(long, num_args = 1.., value_name = "NAME")]
        files: Vec<String>,

        /// Write members even when their checksum fails
        #[arg(long)]
        force: bool,

        /// Replace existing output files
        #[arg(long)]
        overwrite: bool,

        /// Worker threads (0 = one per core)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Add files to an existing archive
    Inject {
        /// Archive to extend
        archive: PathBuf,

        /// Files to add ('-' for stdin)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Member name for data read from stdin
        #[arg(long, value_name = "NAME", default_value = DEFAULT_STDIN_NAME)]
        stdin_filename: String,

        /// Replace members that already have the same name
        #[arg(long)]
        replace: bool,

        #[command(flatten)]
        codec: CodecArgs,

        /// Worker threads (0 = one per core)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Remove members from an archive
    Detract {
        /// Archive to edit
        archive: PathBuf,

        /// Members to remove
        #[arg(required = true)]
        names: Vec<String>,

        /// Write the result here instead of rewriting the archive
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace an existing output file
        #[arg(long)]
        overwrite: bool,
    },

    /// List the members of an archive
    #[command(alias = "l")]
    List {
        /// Archive to list
        archive: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Show the header of a container
    #[command(alias = "i")]
    Info {
        /// Container to inspect
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Create or display the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a configuration file with default values
    Init {
        /// Where to write it
        #[arg(default_value = config::CONFIG_FILE)]
        path: PathBuf,

        /// Replace an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Codec settings that override the configuration file.
#[derive(Args, Debug, Default)]
struct CodecArgs {
    /// Maximum LZW code width in bits (9-16)
    #[arg(long, value_parser = clap::value_parser!(u8).range(9..=16))]
    max_bits: Option<u8>,

    /// What to do when the dictionary is full
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Write every code at the maximum width
    #[arg(long)]
    fixed_width: bool,

    /// Legacy layout: fixed 16-bit codes, frozen dictionary
    #[arg(long, conflicts_with_all = ["max_bits", "policy", "fixed_width"])]
    legacy: bool,

    /// Payload checksum
    #[arg(long, value_enum)]
    checksum: Option<ChecksumArg>,

    /// Invert every byte before compressing
    #[arg(long)]
    xor255: bool,
}

impl CodecArgs {
    /// Apply these flags on top of `config`.
    fn apply(&self, config: &mut ErchaConfig) {
        if self.legacy {
            let legacy = LzwConfig::LEGACY;
            config.lzw.max_code_width = legacy.max_bits;
            config.lzw.policy = legacy.policy;
            config.lzw.fixed_width = legacy.fixed_width;
        }
        if let Some(bits) = self.max_bits {
            config.lzw.max_code_width = bits;
        }
        if let Some(policy) = self.policy {
            config.lzw.policy = policy.into();
        }
        if self.fixed_width {
            config.lzw.fixed_width = true;
        }
        if let Some(checksum) = self.checksum {
            config.container.checksum = checksum.into();
        }
        if self.xor255 {
            config.container.xor255 = true;
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    /// Keep using the full dictionary unchanged
    Freeze,
    /// Start over from the 256 root entries
    Reset,
    /// Fail the compression
    Strict,
}

impl From<PolicyArg> for DictionaryPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Freeze => DictionaryPolicy::Freeze,
            PolicyArg::Reset => DictionaryPolicy::Reset,
            PolicyArg::Strict => DictionaryPolicy::Strict,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChecksumArg {
    Crc32,
    Crc64,
}

impl From<ChecksumArg> for ChecksumKind {
    fn from(arg: ChecksumArg) -> Self {
        match arg {
            ChecksumArg::Crc32 => ChecksumKind::Crc32,
            ChecksumArg::Crc64 => ChecksumKind::Crc64,
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 1)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let progress = !cli.quiet;

    match cli.command {
        Commands::Completions { shell } => {
            commands::completions::cmd_completions(shell);
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Init { path, force },
        } => commands::config::cmd_init(&path, force),
        command => {
            let (mut config, source) = ErchaConfig::load(cli.config.as_deref())?;
            match command {
                Commands::Compress {
                    inputs,
                    output,
                    overwrite,
                    codec,
                    jobs,
                } => {
                    codec.apply(&mut config);
                    if let Some(jobs) = jobs {
                        config.runtime.jobs = jobs;
                    }
                    config.validate()?;
                    commands::compress::cmd_compress(
                        &inputs,
                        output.as_deref(),
                        &config,
                        overwrite,
                        progress,
                    )
                }
                Commands::Decompress {
                    inputs,
                    output,
                    overwrite,
                    jobs,
                } => {
                    if let Some(jobs) = jobs {
                        config.runtime.jobs = jobs;
                    }
                    commands::decompress::cmd_decompress(
                        &inputs,
                        output.as_deref(),
                        &config,
                        overwrite,
                        progress,
                    )
                }
                Commands::Check { inputs, jobs } => {
                    if let Some(jobs) = jobs {
                        config.runtime.jobs = jobs;
                    }
                    commands::check::cmd_check(&inputs, &config, cli.quiet)
                }
                Commands::Pack {
                    archive,
                    inputs,
                    stdin_filename,
                    overwrite,
                    codec,
                    jobs,
                } => {
                    codec.apply(&mut config);
                    if let Some(jobs) = jobs {
                        config.runtime.jobs = jobs;
                    }
                    config.validate()?;
                    commands::pack::cmd_pack(
                        &archive,
                        &inputs,
                        &stdin_filename,
                        &config,
                        overwrite,
                        cli.quiet,
                    )
                }
                Commands::Unpack {
                    archive,
                    output_dir,
                    files,
                    force,
                    overwrite,
                    jobs,
                } => {
                    if let Some(jobs) = jobs {
                        config.runtime.jobs = jobs;
                    }
                    let options = commands::unpack::UnpackOptions {
                        files: &files,
                        force,
                        overwrite,
                        quiet: cli.quiet,
                    };
                    commands::unpack::cmd_unpack(&archive, &output_dir, &options, &config)
                }
                Commands::Inject {
                    archive,
                    inputs,
                    stdin_filename,
                    replace,
                    codec,
                    jobs,
                } => {
                    codec.apply(&mut config);
                    if let Some(jobs) = jobs {
                        config.runtime.jobs = jobs;
                    }
                    config.validate()?;
                    commands::inject::cmd_inject(
                        &archive,
                        &inputs,
                        &stdin_filename,
                        replace,
                        &config,
                        cli.quiet,
                    )
                }
                Commands::Detract {
                    archive,
                    names,
                    output,
                    overwrite,
                } => commands::detract::cmd_detract(
                    &archive,
                    &names,
                    output.as_deref(),
                    overwrite,
                    cli.quiet,
                ),
                Commands::List { archive, json } => commands::list::cmd_list(&archive, json),
                Commands::Info { input, json } => commands::info::cmd_info(&input, json),
                Commands::Config {
                    action: ConfigAction::Show,
                } => commands::config::cmd_show(&config, source.as_deref()),
                Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        match e.downcast_ref::<ErchaError>() {
            Some(err) => eprintln!("Error [{}]: {}", err.kind(), err),
            None => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}
