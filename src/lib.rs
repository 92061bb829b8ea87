pub mod config;
pub mod console;
pub mod engine;
pub mod models;
pub mod prompts;
pub mod renal;
pub mod session;

use tracing_subscriber::EnvFilter;

/// Process entry: logging, credentials, then the console loop.
///
/// Returns the process exit code. A missing credential halts before any UI
/// is usable; everything after startup is handled per turn and never
/// terminates the session.
pub fn run() -> i32 {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = match config::load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "startup halted");
            eprintln!("{e}");
            return 1;
        }
    };

    match console::run(settings) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "console terminated");
            eprintln!("{e}");
            1
        }
    }
}
