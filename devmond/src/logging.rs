use env_logger::Env;

use crate::config::LoggingConfig;

/// `RUST_LOG` wins; otherwise the configured level applies.
pub fn init(cfg: &LoggingConfig) {
    let env = Env::default().default_filter_or(cfg.level.as_str());
    if let Err(err) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("logger already initialised: {err}");
    }
}
