use std::env;
use std::error::Error;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};
use tracing::info;

use crate::config::{Delivery, MenuConfig};
use crate::constants::env::{CREDENTIALS, RECIPIENT, SENDER, STORE};
use crate::constants::selection::DEFAULT_RECIPE_COUNT;
use crate::errors::MenuError;
use crate::mail::{DryRunSink, OutboxSink, SendmailSink};
use crate::pipeline::{MenuReport, run_weekly_menu};
use crate::sampler::run_rng;
use crate::secrets::{FileSecretStore, SecretProvider, require_secret};
use crate::store::open_store;

#[derive(Debug, Parser)]
#[command(
    name = "weekly-menu",
    version,
    disable_help_subcommand = true,
    about = "Pick this week's recipes and mail them with a grocery list",
    long_about = "Randomly select recipes from a recipe store, build a deduplicated grocery list from their ingredients, and deliver both as an HTML report.",
    after_help = "Store, sender, recipient, and credentials paths are resolved in order by explicit arg, environment variables (WEEKLY_MENU_*), then defaults."
)]
/// CLI for `weekly-menu`.
///
/// Common usage:
/// - Save the sender password: `weekly-menu --configure --sender me@example.com`
/// - Preview without sending: `weekly-menu --store recipes.jsonl --dry-run`
/// - Weekly cron entry: `weekly-menu --store recipes.jsonl --sender me@example.com`
struct WeeklyMenuCli {
    #[arg(
        long,
        help = "Read the sender password from stdin, store it, and exit"
    )]
    configure: bool,
    #[arg(
        long = "recipes",
        default_value_t = DEFAULT_RECIPE_COUNT,
        value_parser = parse_positive_usize,
        help = "Number of recipes to select"
    )]
    recipe_count: usize,
    #[arg(long, help = "Optional deterministic seed (defaults to the clock)")]
    seed: Option<u64>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Recipe store: a .jsonl file or a directory of .json files"
    )]
    store: Option<PathBuf>,
    #[arg(long, value_name = "ADDR", help = "Sending account address")]
    sender: Option<String>,
    #[arg(
        long,
        value_name = "ADDR",
        help = "Report recipient (defaults to the sender)"
    )]
    recipient: Option<String>,
    #[arg(long, value_name = "PATH", help = "Credentials file location")]
    credentials: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        conflicts_with_all = ["sendmail", "dry_run"],
        help = "Write the report as an .eml file into this directory"
    )]
    outbox: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "dry_run",
        help = "Sendmail-compatible binary used for delivery"
    )]
    sendmail: Option<PathBuf>,
    #[arg(long = "dry-run", help = "Print the HTML report instead of sending it")]
    dry_run: bool,
}

/// Run the CLI with the process stdin/stdout.
pub fn run<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_with_io(args_iter, &mut stdin.lock(), &mut stdout.lock())
}

/// Run the CLI against explicit input/output streams.
///
/// `--configure` reads the password from `input`; `--dry-run` writes the
/// report to `output`.
pub fn run_with_io<I>(
    args_iter: I,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let Some(cli) = parse_cli::<WeeklyMenuCli, _>(
        std::iter::once("weekly-menu".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let configure = cli.configure;
    let config = build_config(cli);
    let secrets = FileSecretStore::new(&config.credentials_path);

    if configure {
        configure_credentials(&secrets, &config, input, output)?;
        return Ok(());
    }

    config.validate()?;
    let report = run_configured(&config, &secrets, output)?;
    info!(
        "[weekly_menu:app] run finished: {} of {} recipes selected",
        report.menu.selection.len(),
        report.population
    );
    Ok(())
}

fn build_config(cli: WeeklyMenuCli) -> MenuConfig {
    let defaults = MenuConfig::default();
    let delivery = if cli.dry_run {
        Delivery::DryRun
    } else if let Some(dir) = cli.outbox {
        Delivery::Outbox(dir)
    } else if let Some(program) = cli.sendmail {
        Delivery::Sendmail(program)
    } else {
        defaults.delivery.clone()
    };
    MenuConfig {
        recipe_count: cli.recipe_count,
        seed: cli.seed,
        store_path: cli.store.or_else(|| env_value(STORE).map(PathBuf::from)),
        sender: cli
            .sender
            .or_else(|| env_value(SENDER))
            .unwrap_or_default(),
        recipient: cli
            .recipient
            .or_else(|| env_value(RECIPIENT))
            .unwrap_or_default(),
        credentials_path: cli
            .credentials
            .or_else(|| env_value(CREDENTIALS).map(PathBuf::from))
            .unwrap_or(defaults.credentials_path.clone()),
        delivery,
        ..defaults
    }
}

fn run_configured(
    config: &MenuConfig,
    secrets: &dyn SecretProvider,
    output: &mut dyn Write,
) -> Result<MenuReport, MenuError> {
    let password = if config.delivery.needs_credentials() {
        Some(require_secret(secrets, &config.service, &config.sender)?)
    } else {
        None
    };

    let store_path = config.store_path.as_deref().ok_or_else(|| {
        MenuError::Configuration("no recipe store configured".into())
    })?;
    let store = open_store(store_path)?;
    let mut rng = run_rng(config.seed);
    let now = chrono::Local::now();

    match &config.delivery {
        Delivery::DryRun => {
            let mut sink = DryRunSink::new(config.sender.clone());
            let report = run_weekly_menu(config, store.as_ref(), &mut sink, &now, &mut rng)?;
            writeln!(output, "Subject: {}", report.subject)?;
            writeln!(output)?;
            output.write_all(report.html.as_bytes())?;
            output.flush()?;
            Ok(report)
        }
        Delivery::Outbox(dir) => {
            let mut sink = OutboxSink::new(dir, config.sender.clone());
            run_weekly_menu(config, store.as_ref(), &mut sink, &now, &mut rng)
        }
        Delivery::Sendmail(program) => {
            let mut sink = SendmailSink::new(program, config.sender.clone());
            if let Some(password) = password {
                sink = sink.with_password(password);
            }
            run_weekly_menu(config, store.as_ref(), &mut sink, &now, &mut rng)
        }
    }
}

/// Replace the stored password for the configured sender with one read from `input`.
pub fn configure_credentials(
    secrets: &dyn SecretProvider,
    config: &MenuConfig,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<(), MenuError> {
    if config.sender.is_empty() {
        return Err(MenuError::Configuration(
            "--configure needs a sender address (use --sender)".into(),
        ));
    }
    write!(output, "Password: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(MenuError::Configuration("no password entered".into()));
    }

    secrets.delete(&config.service, &config.sender)?;
    secrets.set(&config.service, &config.sender, password)?;
    writeln!(
        output,
        "\nSaved password for {} in {}",
        config.sender,
        config.credentials_path.display()
    )?;
    Ok(())
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw.parse::<usize>().map_err(|_| {
        format!(
            "Could not parse --recipes value '{}' as a positive integer",
            raw
        )
    })?;
    if parsed == 0 {
        return Err("--recipes must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<WeeklyMenuCli, clap::Error> {
        WeeklyMenuCli::try_parse_from(std::iter::once("weekly-menu").chain(args.iter().copied()))
    }

    #[test]
    fn recipe_count_defaults_to_seven_and_rejects_zero() {
        assert_eq!(parse(&[]).unwrap().recipe_count, 7);
        assert_eq!(parse(&["--recipes", "3"]).unwrap().recipe_count, 3);
        assert!(parse(&["--recipes", "0"]).is_err());
        assert!(parse(&["--recipes", "many"]).is_err());
    }

    #[test]
    fn delivery_flags_are_mutually_exclusive() {
        assert!(parse(&["--dry-run", "--outbox", "/tmp/out"]).is_err());
        assert!(parse(&["--dry-run", "--sendmail", "/usr/sbin/sendmail"]).is_err());
        assert!(parse(&["--outbox", "/tmp/out", "--sendmail", "/usr/sbin/sendmail"]).is_err());
    }

    #[test]
    fn explicit_flags_build_config() {
        let cli = parse(&[
            "--store",
            "recipes.jsonl",
            "--sender",
            "me@example.com",
            "--recipient",
            "you@example.com",
            "--credentials",
            "/tmp/creds.json",
            "--outbox",
            "/tmp/outbox",
            "--seed",
            "9",
        ])
        .unwrap();
        let config = build_config(cli);
        assert_eq!(config.store_path, Some(PathBuf::from("recipes.jsonl")));
        assert_eq!(config.recipient(), "you@example.com");
        assert_eq!(config.credentials_path, PathBuf::from("/tmp/creds.json"));
        assert_eq!(config.delivery, Delivery::Outbox(PathBuf::from("/tmp/outbox")));
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn help_returns_without_running() {
        let mut input: &[u8] = b"";
        let mut output = Vec::new();
        run_with_io(
            ["--help".to_string()].into_iter(),
            &mut input,
            &mut output,
        )
        .unwrap();
    }
}
