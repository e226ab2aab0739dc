use parley_ai::OllamaBackend;
use parley_bot::{BotConfig, ChatService, ConsoleTransport};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Authority granted to the local console user.
const CONSOLE_AUTHORITY: u8 = 4;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Optional explicit config file; otherwise ./parley.toml if present
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = BotConfig::load(config_path.as_deref()).expect("failed to load configuration");
    tracing::info!(endpoint = %config.endpoint, "Loaded configuration");

    let Some(chat) = config.chat().cloned() else {
        tracing::info!("Chat is disabled (set enable_chat to turn it on)");
        return;
    };

    let backend = OllamaBackend::new(&config.endpoint, chat.connect_timeout())
        .expect("failed to create inference client");
    tracing::info!(model = %chat.chat_model_name, "Chat enabled");

    let service = ChatService::new(backend, chat, config.replies);
    let console = ConsoleTransport::stdio("console", CONSOLE_AUTHORITY);

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            event = console.recv() => event,
        };

        match event {
            Ok(Some(event)) => {
                if let Err(e) = service.dispatch(&event, &console).await {
                    tracing::warn!(error = %e, "Failed to deliver reply");
                }
            }
            Ok(None) => {
                tracing::info!("Input closed, shutting down");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read input");
                break;
            }
        }
    }
}
