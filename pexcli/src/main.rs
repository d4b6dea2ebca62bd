use anyhow::Result;
use clap::Parser;
use pexcli::{Cli, PexCliApp};
use pexwall_core::{CancelHandle, RequestContext};

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr, RUST_LOG overrides the default level
    let default_level = if cfg!(debug_assertions) { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let cli = Cli::parse();
    let app = PexCliApp::new(&cli)?;

    // Ctrl-C abandons the in-flight request instead of killing the process mid-print
    let cancel = CancelHandle::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, cancelling request");
            on_interrupt.cancel();
        }
    });

    let ctx = RequestContext::new().with_cancel(cancel);
    app.run(&cli.command, &ctx).await
}
