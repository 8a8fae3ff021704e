pub mod summary;

use anyhow::Result;
use log::{debug, error, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

use crate::auth::token_manager::TokenManager;
use crate::config::Config;
use crate::mail::gmail_client::GmailClient;
use crate::mail::provider::MailProvider;
use crate::pipeline::{MessageOutcome, Pipeline, PipelineConfig};
use crate::printer::Printer;

pub use summary::CycleSummary;

pub struct DaemonConfig {
    pub interval_secs: u64,
    pub workers: usize,
}

pub fn build_pool(workers: usize) -> Result<ThreadPool> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("mail-worker-{i}"))
        .build()?)
}

/// One polling cycle against an already authenticated provider. Every listed
/// message is processed on `pool`; a failure on one message never stops the
/// others.
pub fn run_cycle(
    provider: &dyn MailProvider,
    printer: &dyn Printer,
    config: &PipelineConfig,
    pool: &ThreadPool,
    query: Option<&str>,
) -> Result<(CycleSummary, Vec<MessageOutcome>)> {
    let ids = provider.list_message_ids(query)?;
    debug!("cycle: {} candidate messages", ids.len());

    let pipeline = Pipeline::new(provider, printer, config);
    let outcomes: Vec<MessageOutcome> =
        pool.install(|| ids.par_iter().map(|id| pipeline.process(id)).collect());

    let summary = CycleSummary::from_outcomes(&outcomes);
    Ok((summary, outcomes))
}

/// Authenticate, then run one cycle against Gmail. A token rejected during
/// the cycle is refreshed through `token_mgr`.
pub fn poll_once(
    cfg: &Config,
    token_mgr: &TokenManager,
    printer: &dyn Printer,
    pool: &ThreadPool,
) -> Result<(CycleSummary, Vec<MessageOutcome>)> {
    let access = token_mgr.get_access_token(false)?;
    let gmail = GmailClient::new(
        cfg.user_id.clone(),
        access,
        cfg.polling.page_size,
        cfg.polling.max_pages,
    )?
    .with_token_source(token_mgr);
    let pipeline_cfg = cfg.pipeline()?;
    run_cycle(
        &gmail,
        printer,
        &pipeline_cfg,
        pool,
        cfg.polling.query.as_deref(),
    )
}

pub fn run_daemon(
    cfg: &Config,
    token_mgr: &TokenManager,
    printer: &dyn Printer,
    daemon: DaemonConfig,
) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r2 = running.clone();
    ctrlc::set_handler(move || {
        r2.store(false, Ordering::SeqCst);
    })?;

    let pool = build_pool(daemon.workers)?;
    info!(
        "polling every {}s with {} workers",
        daemon.interval_secs, daemon.workers
    );

    while running.load(Ordering::SeqCst) {
        match poll_once(cfg, token_mgr, printer, &pool) {
            Ok((summary, _)) => info!("cycle done: {summary}"),
            Err(e) => error!("cycle failed: {e:#}"),
        }

        sleep_while(&running, Duration::from_secs(daemon.interval_secs));
    }

    info!("stopped");
    Ok(())
}

fn sleep_while(running: &AtomicBool, total: Duration) {
    let until = Instant::now() + total;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= until {
            break;
        }
        thread::sleep((until - now).min(Duration::from_secs(1)));
    }
}
