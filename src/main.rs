use std::process::ExitCode;

use image2list_lib::core_state::CoreState;
use image2list_lib::pipeline::extraction::{ExtractionType, Photo};
use image2list_lib::pipeline_config::{env_vars, ExtractionConfig};
use image2list_lib::{config, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let Some(path) = std::env::args_os().nth(1) else {
        eprintln!("usage: image2list <photo>");
        eprintln!("methods ({}):", env_vars::METHOD);
        for method in ExtractionType::ALL {
            eprintln!("  {:<8} {}", method.to_string(), method.label());
        }
        eprintln!("data directory: {}", config::app_data_dir().display());
        return ExitCode::from(2);
    };

    let config = match ExtractionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    if let Some(var) = config.missing_api_key() {
        tracing::warn!(method = %config.method, "{var} is not set; the request will be rejected");
    }

    let photo = match std::fs::read(&path) {
        Ok(bytes) => match Photo::decode(&bytes) {
            Ok(photo) => photo,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        },
        Err(e) => {
            eprintln!("error: cannot read {}: {e}", path.to_string_lossy());
            return ExitCode::FAILURE;
        }
    };

    let state = CoreState::open_default();
    let progress = |message: &str| eprintln!("{message}");

    if let Err(e) = state.process_photo(&config, photo, &progress).await {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match state.items() {
        Ok(items) => {
            for item in items {
                let mark = if item.is_checked { "x" } else { " " };
                println!("[{mark}] {}", item.text);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
