// src/logging.rs
use env_logger::Env;

/// Starts the `env_logger` backend. `RUST_LOG` wins over `default_level`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(default_level: &str) {
    let env = Env::default().default_filter_or(default_level);
    if env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_ok()
    {
        log::debug!("Logger initialized (default level {})", default_level);
    }
}
