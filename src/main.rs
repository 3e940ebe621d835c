use clap::Parser;
use pingora::server::configuration::Opt;
use pingora::server::Server;
use std::path::PathBuf;
use std::sync::Arc;

use img_sizer::config::Config;
use img_sizer::proxy::ImageSizerProxy;
use img_sizer::rate_limit::RateLimitManager;
use img_sizer::service::SizerService;
use img_sizer::storage::{HttpFetcher, S3Store};

/// img-sizer - on-the-fly JPEG resizing and cropping built with Cloudflare's Pingora
#[derive(Parser, Debug)]
#[command(name = "img-sizer")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Daemon mode
    #[arg(short = 'd', long)]
    daemon: bool,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Upgrade workers gracefully
    #[arg(long)]
    upgrade: bool,
}

fn exit_with(message: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", message, err);
    std::process::exit(1);
}

fn main() {
    if let Err(e) = img_sizer::logging::init_subscriber() {
        exit_with("Failed to initialize logging subsystem", e);
    }

    let args = Args::parse();

    let config = Config::load(&args.config)
        .unwrap_or_else(|e| exit_with("Failed to load configuration", e));

    tracing::info!(
        config_file = %args.config.display(),
        server_address = %config.server.address,
        server_port = config.server.port,
        allowed_sources = config.allowed_sources.len(),
        allowed_dimensions = config.allowed_dimensions.len(),
        allow_all_dimensions = config.allow_all_dimensions,
        rate_limit_enabled = config.rate_limit.enabled,
        "Configuration loaded successfully"
    );

    if args.test {
        println!("Configuration file {} is valid", args.config.display());
        return;
    }

    // The SDK loader is async; the client itself is usable from any runtime
    let bootstrap = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| exit_with("Failed to create bootstrap runtime", e));
    let object_store = bootstrap.block_on(S3Store::from_config(&config.storage));
    drop(bootstrap);

    let url_fetcher = HttpFetcher::new(config.request_timeout())
        .unwrap_or_else(|e| exit_with("Failed to create HTTP client", e));

    let service = SizerService::from_config(&config, Arc::new(object_store), Arc::new(url_fetcher))
        .unwrap_or_else(|e| exit_with("Failed to build image service", e));

    let rate_limit_manager = RateLimitManager::from_config(&config.rate_limit).map(Arc::new);

    // Build Pingora server options
    let opt = Opt {
        daemon: args.daemon,
        upgrade: args.upgrade,
        ..Default::default()
    };

    let mut server =
        Server::new(Some(opt)).unwrap_or_else(|e| exit_with("Failed to create Pingora server", e));
    server.bootstrap();

    let proxy = ImageSizerProxy::new(Arc::new(service), rate_limit_manager);

    let mut proxy_service = pingora_proxy::http_proxy_service(&server.configuration, proxy);
    proxy_service.threads = Some(config.server.threads);

    let listen_addr = config.server.listen_addr();
    proxy_service.add_tcp(&listen_addr);

    tracing::info!(
        address = %listen_addr,
        threads = config.server.threads,
        "Starting img-sizer"
    );

    server.add_service(proxy_service);

    // Run server forever (blocks until shutdown)
    server.run_forever();
}
