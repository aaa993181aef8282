use clap::Parser;
use tokio::runtime::Runtime;

use market_scanner::Cli;

fn main() -> anyhow::Result<()> {
    // Info by default, RUST_LOG overrides
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    let rt = Runtime::new()?;
    rt.block_on(market_scanner::run(args))
}
