use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use checkout_core::{
    AnalyticsBridge, CheckoutLoader, CheckoutSession, FileCheckoutLoader, HttpCheckoutLoader,
    LoggingPageNavigator, MissingStylesheetSink, PageNavigator, StepNavigator, TokioViewScheduler,
    TracingErrorSink, TracingStepTracker,
};
use clap::Parser;
use embedding::{create_embedded_messenger, ParentFrame};
use shared::domain::CheckoutId;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod script;

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./checkout.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Load checkout data from a recorded snapshot instead of the storefront.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// JSON list of events to replay after the initial load.
    #[arg(long)]
    script: Option<PathBuf>,
    #[arg(long)]
    checkout_id: Option<String>,
}

/// Prints parent frame messages as JSON lines on stdout.
struct StdoutParentFrame;

impl ParentFrame for StdoutParentFrame {
    fn post_message(&self, message: &str, target_origin: &str) -> Result<()> {
        println!("postMessage({target_origin}) {message}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(checkout_id) = args.checkout_id {
        settings.checkout_id = checkout_id;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let page: Arc<dyn PageNavigator> = Arc::new(LoggingPageNavigator);
    let navigator = StepNavigator::new(
        AnalyticsBridge::new(Arc::new(TracingStepTracker)),
        Arc::new(TokioViewScheduler::new(tx.clone())),
        page.clone(),
        settings.navigator_options(),
    );
    let messenger = create_embedded_messenger(settings.embedding(), Arc::new(StdoutParentFrame));
    let mut session = CheckoutSession::new(
        navigator,
        messenger,
        Arc::new(TracingErrorSink),
        page,
        Arc::new(MissingStylesheetSink),
        settings.session_settings(),
    );
    info!(session_id = %session.session_id(), checkout_id = %settings.checkout_id, "starting checkout");

    let loader: Box<dyn CheckoutLoader> = match &args.snapshot {
        Some(path) => Box::new(FileCheckoutLoader::new(path)),
        None => Box::new(HttpCheckoutLoader::new(settings.store_url.clone())),
    };
    let checkout_id = CheckoutId(settings.checkout_id.clone());
    session.load(loader.as_ref(), checkout_id.clone()).await;

    let steps = match &args.script {
        Some(path) => script::load_script(path)?,
        None => Vec::new(),
    };
    let settle = Duration::from_millis(settings.view_debounce_ms + 50);
    let driver = tokio::spawn(script::play(steps, checkout_id, tx, settle));

    session.run(&mut rx).await;
    if let Err(err) = driver.await? {
        warn!(error = %format!("{err:#}"), "script aborted");
    }

    let navigator = session.navigator();
    println!(
        "active step: {}",
        navigator
            .active_step()
            .map_or_else(|| "none".to_string(), |step| step.to_string())
    );
    for status in navigator.statuses() {
        println!(
            "{:<9} required={:<5} complete={:<5} active={}",
            status.step_type.name(),
            status.is_required,
            status.is_complete,
            status.is_active
        );
    }
    Ok(())
}
