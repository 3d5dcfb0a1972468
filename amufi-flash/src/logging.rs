pub fn init(verbose: bool) {
    // Respect RUST_LOG if set; -v raises the default so the external
    // commands echoed at debug level become visible.
    let default_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(default_level)
        .init();
}
