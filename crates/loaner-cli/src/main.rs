// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;

use anyhow::{Context, Result};
use config::Config;
use loaner_app::{TableView, to_csv};
use loaner_client::Client;
use loaner_tui::UiOptions;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `loaner --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    logging::init()?;

    let client = Client::new(&config.client_options()?).with_context(|| {
        format!(
            "invalid [server] config in {}; fix base_url/timeout/session values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        let rows = client.list_devices()?.rows.len();
        println!("ok: {} lists {rows} devices", client.base_url());
        return Ok(());
    }

    if let Some(path) = &options.export_path {
        let rows = export_listing(&client, path)?;
        println!("exported {rows} devices to {}", path.display());
        return Ok(());
    }

    let ui_options = UiOptions {
        base_url: client.base_url().to_string(),
        status_column: config.status_column().to_owned(),
        export_dir: config.export_dir()?,
    };
    loaner_tui::run_app(client, &ui_options)
}

fn export_listing(client: &Client, path: &Path) -> Result<usize> {
    let table = TableView::new(client.list_devices()?);
    let rows = table.rows().len();
    fs::write(path, to_csv(&table, &[]))
        .with_context(|| format!("write export {}", path.display()))?;
    info!(path = %path.display(), rows, "listing exported");
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    export_path: Option<PathBuf>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        export_path: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--export" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--export requires a file path"))?;
                options.export_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("loaner: check devices in and out of the inventory server");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and fetch the device listing once");
    println!("  --export <path>          Write the device listing as CSV and exit");
    println!("  --help                   Show this help");
}
