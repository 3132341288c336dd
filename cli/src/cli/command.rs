use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use songcrypt_core::constants::DEFAULT_KEY_FILE;
use songcrypt_core::framing::SectionLayout;
use songcrypt_core::stream::DecodeConfig;

#[derive(Debug, ClapParser)]
#[command(
    name       = "unprotect-song",
    version    = env!("CARGO_PKG_VERSION"),
    about      = "Decrypt protected song containers back into WAV files",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decrypt a protected container into a WAV file.
    Decrypt(DecryptArgs),

    /// Authenticate header and metadata and print container information.
    Info(InfoArgs),
}

#[derive(Debug, Args)]
pub struct DecryptArgs {
    /// Protected input container.
    #[arg(long, value_name = "PATH")]
    pub infile: PathBuf,

    /// Destination WAV file. Written only if the whole container verifies.
    #[arg(long, value_name = "PATH")]
    pub outfile: PathBuf,

    /// JSON key file holding {"key": "<64 hex digits>"}.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_KEY_FILE)]
    pub keys: PathBuf,

    /// Chunk decrypt workers (default: one per core but one).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Chunks buffered between pipeline stages.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub inflight_chunks: Option<u16>,

    /// Skip the check that emitted PCM matches the declared payload size.
    #[arg(long)]
    pub no_verify_length: bool,

    /// Where the header section keeps its tag.
    #[arg(long, value_enum, default_value_t = HeaderLayout::TagFirst)]
    pub header_layout: HeaderLayout,
}

impl DecryptArgs {
    pub fn decode_config(&self) -> DecodeConfig {
        DecodeConfig {
            workers: self.workers.map(usize::from),
            inflight_chunks: self.inflight_chunks.map(usize::from),
            verify_payload_len: !self.no_verify_length,
            header_layout: self.header_layout.into(),
            ..DecodeConfig::default()
        }
    }
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Protected input container.
    #[arg(long, value_name = "PATH")]
    pub infile: PathBuf,

    /// JSON key file holding {"key": "<64 hex digits>"}.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_KEY_FILE)]
    pub keys: PathBuf,

    /// Print machine-readable JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Where the header section keeps its tag.
    #[arg(long, value_enum, default_value_t = HeaderLayout::TagFirst)]
    pub header_layout: HeaderLayout,
}

impl InfoArgs {
    pub fn decode_config(&self) -> DecodeConfig {
        DecodeConfig::default().with_header_layout(self.header_layout.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HeaderLayout {
    /// nonce, tag, ciphertext (same as every other section).
    TagFirst,
    /// nonce, ciphertext, tag (containers from the reference producer).
    TagLast,
}

impl From<HeaderLayout> for SectionLayout {
    fn from(layout: HeaderLayout) -> Self {
        match layout {
            HeaderLayout::TagFirst => SectionLayout::TagFirst,
            HeaderLayout::TagLast => SectionLayout::TagLast,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn decrypt_defaults() {
        let cli = Cli::try_parse_from([
            "unprotect-song",
            "decrypt",
            "--infile",
            "song.enc",
            "--outfile",
            "song.wav",
        ])
        .unwrap();

        let Commands::Decrypt(args) = cli.command else {
            panic!("expected decrypt");
        };
        assert_eq!(args.infile, PathBuf::from("song.enc"));
        assert_eq!(args.outfile, PathBuf::from("song.wav"));
        assert_eq!(args.keys, PathBuf::from("keys.json"));
        assert_eq!(args.decode_config(), DecodeConfig::default());
    }

    #[test]
    fn decrypt_tuning_flags() {
        let cli = Cli::try_parse_from([
            "unprotect-song",
            "--loglevel",
            "debug",
            "decrypt",
            "--infile",
            "a",
            "--outfile",
            "b",
            "--keys",
            "k.json",
            "--workers",
            "3",
            "--inflight-chunks",
            "8",
            "--no-verify-length",
            "--header-layout",
            "tag-last",
        ])
        .unwrap();

        assert!(matches!(cli.loglevel, LogLevel::Debug));
        let Commands::Decrypt(args) = cli.command else {
            panic!("expected decrypt");
        };
        let config = args.decode_config();
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.inflight_chunks, Some(8));
        assert!(!config.verify_payload_len);
        assert_eq!(config.header_layout, SectionLayout::TagLast);
    }

    #[test]
    fn outfile_is_required() {
        assert!(Cli::try_parse_from(["unprotect-song", "decrypt", "--infile", "a"]).is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let res = Cli::try_parse_from([
            "unprotect-song", "decrypt", "--infile", "a", "--outfile", "b", "--workers", "0",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn info_json_flag() {
        let cli = Cli::try_parse_from([
            "unprotect-song", "--log-format", "json", "info", "--infile", "a", "--json",
        ])
        .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        let Commands::Info(args) = cli.command else {
            panic!("expected info");
        };
        assert!(args.json);
        assert_eq!(args.decode_config().header_layout, SectionLayout::TagFirst);
    }
}
