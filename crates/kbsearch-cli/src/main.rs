// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use kbsearch_app::SearchPage;
use kbsearch_db::Store;
use runtime::ApiRuntime;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    match options.action {
        CliAction::Help => {
            print_help();
            return Ok(());
        }
        CliAction::PrintConfigPath => {
            println!("{}", options.config_path.display());
            return Ok(());
        }
        CliAction::PrintExampleConfig => {
            print!("{}", Config::example_config(&options.config_path));
            return Ok(());
        }
        CliAction::PrintDbPath | CliAction::Check | CliAction::Launch => {}
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `kbsearch --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = config.db_path()?;
    if options.action == CliAction::PrintDbPath {
        println!("{}", db_path.display());
        return Ok(());
    }

    init_logging(&config)?;

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or KBSEARCH_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;

    let client = kbsearch_api::Client::new(
        &config.search_url(),
        &config.summarize_url(),
        config.timeout()?,
        config.stream_timeout()?,
    )
    .with_context(|| {
        format!(
            "invalid [api] config in {}; fix base_url/search_url/summarize_url/timeout values",
            options.config_path.display()
        )
    })?;

    let page_config = config.page_config();
    let preferences = store.load_preferences(page_config.variant)?;
    let column_widths = store.load_column_widths(page_config.variant)?;
    if options.action == CliAction::Check {
        println!(
            "ok: {} variant, search {}, preferences {}",
            page_config.variant.as_str(),
            client.search_url(),
            db_path.display()
        );
        return Ok(());
    }

    tracing::info!(
        variant = page_config.variant.as_str(),
        search_url = client.search_url(),
        summarize_url = client.summarize_url(),
        "starting"
    );

    let mut page = SearchPage::new(page_config, preferences, column_widths);
    let mut runtime = ApiRuntime::new(client, &store);
    let result = kbsearch_tui::run_app(&mut page, &mut runtime);
    if let Err(error) = &result {
        tracing::error!(error = %format!("{error:#}"), "terminal session ended with error");
    }
    result
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {} -- set [log].path to a writable file", path.display()))?;

    let level = config.log_level();
    let filter = EnvFilter::try_new(&level)
        .with_context(|| format!("invalid log filter {level:?}; fix [log].level or KBSEARCH_LOG"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .context("install log subscriber")
}

/// What one invocation does. Only one action may be named per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliAction {
    Launch,
    Check,
    PrintConfigPath,
    PrintDbPath,
    PrintExampleConfig,
    Help,
}

impl CliAction {
    const fn flag(self) -> &'static str {
        match self {
            Self::Launch => "",
            Self::Check => "--check",
            Self::PrintConfigPath => "--print-config-path",
            Self::PrintDbPath => "--print-path",
            Self::PrintExampleConfig => "--print-example-config",
            Self::Help => "--help",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    action: CliAction,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config_path = default_config_path;
    let mut action = CliAction::Launch;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let next = match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                config_path = PathBuf::from(value.as_ref());
                continue;
            }
            "--check" => CliAction::Check,
            "--print-config-path" => CliAction::PrintConfigPath,
            "--print-path" => CliAction::PrintDbPath,
            "--print-example-config" => CliAction::PrintExampleConfig,
            "--help" | "-h" => CliAction::Help,
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        };

        if next == CliAction::Help || action == CliAction::Help {
            action = CliAction::Help;
        } else if action == CliAction::Launch || action == next {
            action = next;
        } else {
            return Err(anyhow::anyhow!(
                "{} and {} cannot be combined; pass one of them",
                action.flag(),
                next.flag()
            ));
        }
    }

    Ok(CliOptions {
        config_path,
        action,
    })
}

fn print_help() {
    println!("kbsearch: search a knowledge base and summarize answers in the terminal");
    println!();
    println!("usage: kbsearch [--config <path>] [action]");
    println!();
    println!("  --config <path>          Read settings from <path> instead of the default");
    println!("  --check                  Load config, open the preference store, build the API client, then exit");
    println!("  --print-config-path      Print the config file path in use");
    println!("  --print-path             Print the preference database path");
    println!("  --print-example-config   Print a commented config template");
    println!("  -h, --help               Show this help");
}
