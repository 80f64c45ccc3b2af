use env_logger::Env;

/// Initialize stderr logging. `RUST_LOG` wins over the default filter.
///
/// Standard output carries the converted data, so nothing is ever logged there.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };

    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}
