use std::process::ExitCode;
use std::sync::Arc;

use cluster_scheduler::api;
use cluster_scheduler::config::Settings;
use cluster_scheduler::disks::HttpDisksClient;
use cluster_scheduler::driver::{Driver, LoggingResourceManagerClient};
use cluster_scheduler::registry::HttpRegistryClient;
use cluster_scheduler::scheduler::Scheduler;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&settings.log_level))
        .init();

    tracing::info!(
        mesos_master = %settings.mesos_master,
        framework = %settings.framework_name,
        "starting cluster scheduler"
    );

    let registry = Arc::new(HttpRegistryClient::connect(&settings.registry_endpoint));
    let disks = Arc::new(HttpDisksClient::new(&settings.disks_endpoint));
    // The resource-manager wire protocol (spec §1) is assumed provided by an
    // external client library; this stand-in logs what would be dispatched.
    let resource_manager = Arc::new(LoggingResourceManagerClient);

    let scheduler = Arc::new(
        Scheduler::new(registry, disks, resource_manager)
            .with_cluster_root(settings.cluster_root.clone()),
    );
    let driver = Driver::spawn(scheduler.clone());

    let app = api::router(scheduler);
    let addr: std::net::SocketAddr = match settings.http_listen_addr.parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(error = %e, addr = %settings.http_listen_addr, "invalid HTTP_LISTEN_ADDR");
            driver.stop().await;
            return ExitCode::from(2);
        }
    };

    let result = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    driver.stop().await;

    match result {
        Ok(()) => {
            tracing::info!("driver stopped, exiting cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "admission API aborted");
            ExitCode::from(1)
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
