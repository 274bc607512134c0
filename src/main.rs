use std::env;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wardline=info,wardline_server=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut args = env::args().skip(1);
    let cmd = args.next().unwrap_or_default();
    if cmd != "serve" {
        eprintln!("Usage: wardline serve --config <path>");
        std::process::exit(2);
    }

    let mut config_path = String::from("./config/example-config.yaml");
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(v) = args.next() {
                config_path = v;
            }
        }
    }

    let cfg = match wardline_config::load_and_validate(&config_path) {
        Ok(v) => v,
        Err(e) => {
            error!(path = %config_path, error = %e, "failed to load config");
            std::process::exit(1);
        }
    };
    info!(
        ward = %cfg.ward.name,
        store = %cfg.store.kind,
        gate_unverified = cfg.menu.gate_unverified,
        "config loaded"
    );

    if let Err(e) = wardline_server::serve(cfg).await {
        error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
