mod cli;
mod render;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use itinera_ai::{GeminiConfig, Session, SessionError};

/// Load environment variables from a .env file (KEY=VALUE lines).
fn load_dotenv() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        // Workspace root — two levels up from crates/itinera-app/
        manifest_dir.join("..").join("..").join(".env"),
        // Current directory
        std::path::PathBuf::from(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
            return;
        }
    }
}

fn build_session(args: &cli::Args) -> Result<Session, SessionError> {
    let session = match &args.model {
        Some(model) => {
            let config = GeminiConfig::from_env()
                .ok_or_else(|| SessionError::Initialization("GEMINI_API_KEY is not set".into()))?
                .with_model(model.clone());
            Session::with_config(config, None)
        }
        None => Session::initialize(None)?,
    };

    Ok(session
        .on_itinerary_update(Box::new(|itinerary| {
            println!("\n{}", render::itinerary(itinerary));
        }))
        .on_suggestions_update(Box::new(|suggestions| {
            if !suggestions.is_empty() {
                println!("  Next steps: {}", suggestions.join(" | "));
            }
        })))
}

#[tokio::main]
async fn main() {
    load_dotenv();

    let args = cli::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("itinera=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "itinera=info".parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("Itinera v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut session = match build_session(&args) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("itinera: {e}");
            std::process::exit(1);
        }
    };

    println!("Itinera travel concierge. Where to next? (type 'quit' to exit)\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"you> ").await.ok();
        stdout.flush().await.ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "exit" {
            break;
        }

        match session.send_turn(input).await {
            Ok(reply) => {
                println!("\nitinera> {}\n", reply.text);
            }
            Err(e) => {
                tracing::error!(%e, "turn failed");
                eprintln!("itinera: {e}");
            }
        }
    }

    let usage = session.tracker();
    tracing::info!(
        exchanges = usage.exchange_count(),
        tokens = usage.total().total_tokens(),
        "session ended"
    );
}
