use clap::Parser;
use tracing::error;

use eegwatch::adapter::inbound::cli::command::Cli;
use eegwatch::adapter::inbound::cli::{apply_global_flags, dispatch, output};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    // reqwest and tungstenite both link rustls; pick the provider explicitly.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    apply_global_flags(&cli);

    if let Err(e) = dispatch(cli).await {
        error!(error = %e, "Fatal error");
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
