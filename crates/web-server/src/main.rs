use configuration::{DEFAULT_CONFIG_FILE, init_tracing, load_config};
use std::path::Path;

// This main function is the entry point when running `cargo run -p web-server`.
// It loads the configuration, installs tracing and hands over to `run_server`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config(Path::new(DEFAULT_CONFIG_FILE))?;
    let _guard = init_tracing(&config.logging)?;
    web_server::run_server(&config).await
}
