use env_logger::Env;

/// Logger setup: `info` by default, overridable through `RUST_LOG`
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}
