use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rs_mail_printer::auth::token_manager::TokenManager;
use rs_mail_printer::config::load_config;
use rs_mail_printer::daemon::{DaemonConfig, build_pool, poll_once, run_daemon};
use rs_mail_printer::pipeline::MessageOutcome;
use rs_mail_printer::printer::LpPrinter;

#[derive(Parser)]
#[command(name = "rs_mail_printer")]
#[command(about = "Save and print attachments of authorized Gmail messages", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/rs_mail_printer/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the mailbox until interrupted
    Daemon {
        /// Seconds between cycles (overrides polling.interval_secs)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Messages processed in parallel (overrides polling.workers)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Run a single cycle and report every message
    Once,

    /// Authorize access to the mailbox in the browser and cache the tokens
    Login,

    /// Load and validate the configuration
    CheckConfig,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref()).map_err(|e| anyhow!("Configuration error: {e}"))?;

    match cli.cmd {
        Command::CheckConfig => {
            println!("account:          {}", cfg.account);
            println!("authorized users: {}", cfg.authorized_users.len());
            println!(
                "shared token:     {}",
                if cfg.shared_token().is_some() { "enabled" } else { "disabled" }
            );
            println!("attachment dir:   {}", cfg.attachment_dir()?.display());
            println!("existing files:   {:?}", cfg.attachments.existing);
            println!("printer:          {} ({})", cfg.printer.destination, cfg.printer.command);
            println!("finalize:         {:?}", cfg.processing.finalize);
            println!("client secret:    {}", cfg.client_secret_path()?.display());
            Ok(())
        }

        Command::Login => {
            let token_mgr = TokenManager::from_config(&cfg)?;
            token_mgr.login()?;
            println!("Authorized {}", cfg.account);
            Ok(())
        }

        Command::Once => {
            let token_mgr = TokenManager::from_config(&cfg)?;
            let printer = LpPrinter::new(&cfg.printer.command, &cfg.printer.destination);
            let pool = build_pool(cfg.polling.workers)?;

            let (summary, outcomes) = poll_once(&cfg, &token_mgr, &printer, &pool)?;
            for o in &outcomes {
                match o {
                    MessageOutcome::Skipped { id, reason } => println!("{id}: skipped ({reason:?})"),
                    MessageOutcome::Processed { id, intent, report, marked_read } => println!(
                        "{id}: {intent}, {} saved, {} printed, {} print errors{}",
                        report.saved.len(),
                        report.printed.len(),
                        report.print_failures.len(),
                        if *marked_read { "" } else { ", left unread" }
                    ),
                    MessageOutcome::Failed { id, error, marked_read } => println!(
                        "{id}: FAILED: {error}{}",
                        if *marked_read { " (marked read)" } else { "" }
                    ),
                    MessageOutcome::FinalizeFailed { id, intent, error, .. } => {
                        println!("{id}: {intent} done, NOT marked read: {error}")
                    }
                }
            }
            println!("{summary}");

            if summary.has_failures() {
                bail!("some messages failed");
            }
            Ok(())
        }

        Command::Daemon { interval, workers } => {
            let token_mgr = TokenManager::from_config(&cfg)?;
            // Fail at startup rather than in the first cycle.
            token_mgr.get_access_token(true)?;

            let printer = LpPrinter::new(&cfg.printer.command, &cfg.printer.destination);
            let daemon = DaemonConfig {
                interval_secs: interval.unwrap_or(cfg.polling.interval_secs),
                workers: workers.unwrap_or(cfg.polling.workers),
            };
            run_daemon(&cfg, &token_mgr, &printer, daemon)
        }
    }
}
