mod batch;
mod cli;
mod config;
mod download;
mod parquet;
mod reading;
mod region;
mod rose;
mod scrape;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use config::Settings;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(());
        }
    };
    if let Some(out_dir) = &cli.out_dir {
        settings.out_dir = out_dir.clone();
    }

    match &cli.command {
        Commands::Stations {} => saved(command::stations(&settings).await),
        Commands::Snotel { start, end } => saved(command::snotel(&settings, *start, *end).await),
        Commands::Forecasts {} => saved(command::forecasts(&settings).await),
        Commands::Read { image, pixel } => report(command::read(&settings, image, *pixel)),
        Commands::Generate {
            input,
            template,
            output,
            alpha,
        } => saved(command::generate(
            &settings,
            input,
            template.as_deref(),
            output,
            *alpha,
        )),
        Commands::Template { output_dir, size } => saved(command::template(output_dir, *size)),
        Commands::Locate {
            lat,
            lon,
            elevation,
        } => report(command::locate(&settings, *lat, *lon, *elevation)),
    }

    Ok(())
}

fn saved(result: Result<String>) {
    match result {
        Ok(filename) => println!("File saved to `{}`", filename),
        Err(e) => eprintln!("Error: {:#}", e),
    }
}

fn report(result: Result<String>) {
    match result {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {:#}", e),
    }
}
