use std::process::ExitCode;

use clap::Parser as ClapParser;

use cli::command::{Cli, Commands, LogFormat};
use cli::decrypt::cmd_decrypt;
use cli::exit::exit_code;
use cli::info::cmd_info;

mod cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logger(&cli) {
        eprintln!("failed to initialise logging: {e}");
    }

    let result = match cli.command {
        Commands::Decrypt(ref args) => cmd_decrypt(args),
        Commands::Info(ref args) => cmd_info(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_logger(cli: &Cli) -> Result<(), log::SetLoggerError> {
    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(cli.loglevel.to_level_filter());
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                let line = json_record(
                    &buf.timestamp().to_string(),
                    record.level(),
                    record.target(),
                    &record.args().to_string(),
                );
                serde_json::to_writer(&mut *buf, &line)?;
                writeln!(buf)
            });
        }
    }
    env_builder.try_init()
}

/// One structured log line; serde_json does the escaping.
fn json_record(ts: &str, level: log::Level, target: &str, msg: &str) -> serde_json::Value {
    serde_json::json!({
        "ts": ts,
        "lvl": level.to_string(),
        "target": target,
        "msg": msg,
    })
}
