use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use courier::consts::{NAME, VERSION};
use courier::engine::cache::EngineCache;
use courier::engine::echo::EchoFactory;
use courier::message::{InboundEvent, JsonDecoder};
use courier::receiver::{Delivery, SmsReceiver};

#[derive(Parser)]
#[command(
    name = "courier",
    version,
    about = "Delivers inbound SMS broadcasts to a cached background engine."
)]
struct Cli {
    /// Deliver a single message and exit: "<sender> <body>"
    #[arg(short, long)]
    send: Option<String>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "courier=info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log)),
        )
        .init();

    info!(version = VERSION, "{NAME} starting");

    let engines = Arc::new(EngineCache::new(Box::new(EchoFactory)));
    let receiver = SmsReceiver::new(Box::new(JsonDecoder), engines);

    // Single message mode
    if let Some(line) = cli.send {
        deliver(&receiver, line.trim()).await;
        return Ok(());
    }

    // Simulated event source: every stdin line becomes one platform
    // event, interruptible by Ctrl+C like the rest of the loop.
    info!("type `<sender> <body>` per line; Ctrl+C or EOF to quit");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!(%e, "input error");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        deliver(&receiver, line).await;
    }

    info!("{NAME} stopped");
    Ok(())
}

/// Wrap one line as an SMS broadcast and hand it to the receiver. The
/// line is `<sender> <body>`; a line without a space sends an empty
/// body.
async fn deliver(receiver: &SmsReceiver, line: &str) {
    let (sender, body) = line.split_once(' ').unwrap_or((line, ""));
    let payload = serde_json::json!({ "sender": sender, "message": body.trim() });
    let event = InboundEvent::sms(vec![payload.to_string().into_bytes()]);

    if let Delivery::Failed(err) = receiver.on_event(&event).await {
        error!(%err, "delivery failed");
    }
}
