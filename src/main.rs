use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schoolmed_core::{
    ChannelLinkSource, DeeplinkConfig, DeeplinkResult, Dispatcher, DispatcherState, Navigator,
    Notifier, ResolvedRoute,
};

/// Navigator for headless runs: every navigation is written to stdout as one
/// JSON line for the host shell to pick up.
struct JsonLineNavigator;

impl Navigator for JsonLineNavigator {
    fn navigate(&self, route: &ResolvedRoute) -> DeeplinkResult<()> {
        let line = serde_json::to_string(route)?;
        println!("{}", line);
        Ok(())
    }
}

/// Notifier that writes user-facing messages to stderr.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn show_message(&self, title: &str, body: &str) {
        eprintln!("[{}] {}", title, body);
    }
}

/// Main entry point for the SchoolMed deep-link runner
///
/// Mounts the deep-link dispatcher and feeds it one link per line from stdin,
/// as a stand-in for the OS link event source. Navigation instructions are
/// printed to stdout as JSON lines. The runner unmounts the dispatcher on
/// end of input or Ctrl-C.
///
/// # Environment Variables
/// - `SCHOOLMED_APP_SCHEME`: custom URL scheme of the app (default: "schoolmedical")
/// - `SCHOOLMED_LAUNCH_DELAY_MS`: grace period before the launch link is opened (default: 1000)
/// - `SCHOOLMED_LAUNCH_URL`: link the app was "launched" with (optional; the first
///   command-line argument takes precedence)
///
/// # Returns
/// * `Ok(())` - If the runner starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration is invalid or stdin cannot be read
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("schoolmed_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DeeplinkConfig::from_env_values(
        std::env::var("SCHOOLMED_APP_SCHEME").ok(),
        std::env::var("SCHOOLMED_LAUNCH_DELAY_MS").ok(),
    )?;
    let launch_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SCHOOLMED_LAUNCH_URL").ok());

    tracing::info!(
        "++ Starting SchoolMed deep-link runner (scheme: {}, launch delay: {} ms)",
        config.app_scheme(),
        config.launch_delay().as_millis()
    );

    let source = Arc::new(ChannelLinkSource::new(launch_url));
    let mut dispatcher = Dispatcher::new(
        config,
        source.clone(),
        Arc::new(JsonLineNavigator),
        Arc::new(StderrNotifier),
    )
    .mount();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    if source.deliver(line.trim()) == 0 {
                        tracing::warn!("no live listener for link: {}", line.trim());
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    // Give a pending launch link its chance, then let queued links drain
    // before tearing down.
    let mut state = dispatcher.subscribe_state();
    let _ = state
        .wait_for(|state| *state == DispatcherState::Ready)
        .await;
    source.close();
    dispatcher.wait_for_source_closed().await;

    dispatcher.unmount().await;
    Ok(())
}
