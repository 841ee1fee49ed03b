/// Rawteous Docs admin entry point for native builds
#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use clap::Parser;
    use rawteous_docs::SiteConfig;
    use rawteous_docs::cli::{self, Cli};

    let cli = Cli::parse();
    let config = SiteConfig::load_or_default(cli.config.as_deref());

    // RUST_LOG overrides the configured level
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match cli::run(&cli, &config) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
