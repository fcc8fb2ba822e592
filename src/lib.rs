pub mod cli;
pub mod config;
pub mod http;
pub mod llm;
pub mod trace;
pub mod tutor;

use anyhow::Result;
use cli::{AppState, CliArgs, Theme, run_repl};
use config::AppConfig;
use http::{HttpClient, HttpDebugConfig};
use llm::GeminiClient;
use std::time::{SystemTime, UNIX_EPOCH};
use trace::SessionTrace;
use tutor::Session;

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let session_id = generate_session_id();
    let trace = SessionTrace::create(&session_id)?;
    let http = HttpClient::new(
        reqwest::Client::new(),
        HttpDebugConfig::from_verbose(args.verbose),
    )
    .with_trace(trace.clone());
    let client = GeminiClient::new(
        http,
        config.api_key_source(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    );
    trace.log_event(
        "config",
        &format!(
            "model {} via {} ({})",
            client.model(),
            config.gemini_base_url,
            config.config_path.display()
        ),
    );

    let session = Session::new(session_id, config.context);
    let mut app_state = AppState::new(session, client, trace, Theme::from_env(config.theme));

    run_repl(&mut app_state).await
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
