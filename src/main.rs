use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use vidsweep::cli;

fn init_logging(verbose: bool) {
    let filter_level = if verbose { Level::DEBUG } else { Level::INFO };

    // stdout carries the per-message report, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(filter_level.into()))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::time())
        .init();
}

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;

            e.print().ok();
            match e.kind() {
                ErrorKind::DisplayVersion | ErrorKind::DisplayHelp => std::process::exit(0),
                _ => std::process::exit(vidsweep::error::EXIT_CONFIG),
            }
        }
    };

    init_logging(cli.verbose);
    tracing::debug!("Verbose mode enabled");
    tracing::info!("Starting vidsweep v{}", env!("CARGO_PKG_VERSION"));

    let code = cli::run(cli).await;
    std::process::exit(code);
}
