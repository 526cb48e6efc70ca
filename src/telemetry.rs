//! Log setup for the quiz runner.
//!
//! - LOG_LEVEL: filter directives, e.g. "info,quiz=debug,card=trace,audio=debug".
//!   Defaults to debug for the quiz targets and info elsewhere.
//! - LOG_FORMAT=json: one JSON object per event; anything else prints plain lines.
//!
//! Output goes to stderr; stdout belongs to the console card.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,quizcard=debug,quiz=debug,card=debug";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}
