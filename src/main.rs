use agency_forms::bot::FormBot;
use agency_forms::channels::{ChannelManager, CliChannel, TelegramChannel};
use agency_forms::config::{BotConfig, FormKind};
use agency_forms::forms::FormEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = BotConfig::from_env()?;

    // First argument picks the form, overriding AGENCY_FORM.
    if let Some(arg) = std::env::args().nth(1) {
        config.form = arg.parse::<FormKind>()?;
    }

    let form = config.form.definition()?;

    eprintln!("🤖 Agency Forms v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Form: {} ({} steps)", config.form, form.len());

    let mut channels = ChannelManager::new();

    if config.cli_enabled {
        channels.add(Box::new(CliChannel::new()));
    }

    if let Some(token) = config.telegram_token.clone() {
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            if config.allowed_users.iter().any(|u| u == "*") {
                "everyone".to_string()
            } else {
                config.allowed_users.join(", ")
            }
        );
        channels.add(Box::new(TelegramChannel::new(
            token,
            config.allowed_users.clone(),
        )));
    }

    for (name, err) in channels.health_check_all().await {
        tracing::warn!(channel = %name, "Health check failed: {}", err);
    }

    eprintln!("   Channels: {}", channels.names().join(", "));
    eprintln!("   Type /start to begin, /cancel to stop. Ctrl+C to exit.\n");

    let bot = FormBot::new(FormEngine::new(form), channels, &config);
    bot.run().await?;

    Ok(())
}
