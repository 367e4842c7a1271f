use anyhow::Result;
use argh::EarlyExit;
use file_manager::config::{self, Config};
use file_manager::Interpreter;
use std::{env, io, process};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let raw: Vec<String> = env::args().collect();
    let args = match config::parse_args(&raw) {
        Ok(args) => args,
        Err(EarlyExit { output, status }) => match status {
            Ok(()) => {
                println!("{output}");
                process::exit(0);
            }
            Err(()) => {
                eprintln!("{output}");
                process::exit(1);
            }
        },
    };
    let config = Config::from_args(args, |key| env::var(key).ok());

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level().to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let mut interpreter = Interpreter::from_config(&config, io::stdout())?;
    interpreter.repl()
}
