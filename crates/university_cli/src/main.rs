//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the storage named by the environment and print a short summary.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use university_core::config::{LOG_DIR_ENV, LOG_LEVEL_ENV};
use university_core::{default_log_level, init_logging, Storage, StorageConfig};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("university: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
    }

    let config = StorageConfig::from_env().map_err(|err| err.to_string())?;
    let storage = Storage::open(&config).map_err(|err| format!("storage open failed: {err}"))?;
    let staff_count = storage
        .staff_repository()
        .count()
        .map_err(|err| err.to_string())?;
    let department_count = storage
        .department_repository()
        .count()
        .map_err(|err| err.to_string())?;

    log::info!(
        "event=cli_summary module=cli status=ok backend={} staff={staff_count} departments={department_count}",
        storage.backend()
    );

    println!("university_core ping={}", university_core::ping());
    println!("university_core version={}", university_core::core_version());
    println!("storage backend={}", storage.backend());
    match &config.data_path {
        Some(path) => println!("storage location={}", path.display()),
        None => println!("storage location=memory"),
    }
    println!("staff count={staff_count}");
    println!("department count={department_count}");
    Ok(())
}
