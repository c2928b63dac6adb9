use clap::Parser;
use pingora::server::configuration::Opt as ServerOpt;
use pingora_core::server::Server;
use std::path::PathBuf;
use std::sync::Arc;
use shrinkray::config::Config;
use shrinkray::proxy::ShrinkrayProxy;

/// Shrinkray - caching, rewriting, payload-shrinking reverse proxy built with Cloudflare's Pingora
#[derive(Parser, Debug)]
#[command(name = "shrinkray")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to an optional YAML configuration file (environment variables override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

fn load_config(args: &Args) -> Result<Config, shrinkray::config::ConfigError> {
    let config = match &args.config {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => Config::from_env(),
    };
    config.validate()?;
    Ok(config)
}

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    if args.test {
        println!("Configuration is valid");
        return;
    }

    // Initialize logging subsystem
    shrinkray::logging::init_subscriber(&config.logging)
        .expect("Failed to initialize logging subsystem");

    tracing::info!(
        config_file = ?args.config.as_ref().map(|p| p.display().to_string()),
        origin = %format!("{}://{}", config.origin.scheme, config.origin.host),
        public = %format!("{}://{}", config.public.scheme, config.public.host),
        jpeg_quality = config.optimizer.jpeg_quality,
        max_entries = ?config.cache.max_entries,
        "Configuration loaded successfully"
    );

    // Create Pingora server
    let mut server = Server::new(Some(ServerOpt::default())).expect("Failed to create Pingora server");
    if let Some(server_conf) = Arc::get_mut(&mut server.configuration) {
        server_conf.threads = config.server.threads;
    }
    server.bootstrap();

    let proxy = ShrinkrayProxy::new(&config).unwrap_or_else(|e| {
        eprintln!("Failed to initialize proxy: {}", e);
        std::process::exit(1);
    });

    // Create HTTP proxy service
    let mut proxy_service = pingora_proxy::http_proxy_service(&server.configuration, proxy);

    let listen_addr = config.server.listen_addr();
    proxy_service.add_tcp(&listen_addr);

    tracing::info!(
        address = %listen_addr,
        threads = config.server.threads,
        metrics_path = ?config.server.metrics_path,
        "Starting Shrinkray proxy"
    );

    // Register service with server
    server.add_service(proxy_service);

    // Run server forever (blocks until shutdown)
    server.run_forever();
}
