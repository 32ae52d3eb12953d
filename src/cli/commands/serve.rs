//! Webhook server with its worker pool

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::info;

use kwalitee::adapters::{GitHubConnector, build_registry};
use kwalitee::api::Dispatcher;
use kwalitee::config::Config;
use kwalitee::core::ports::VerdictStore;
use kwalitee::server;
use kwalitee::worker::{Worker, WorkerPool};

use super::open_store;

/// Timeout of a single hosting API request
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Start the worker pool and serve webhooks until stopped
pub fn serve(mut config: Config, bind: Option<String>, workers: Option<usize>) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(workers) = workers {
        config.server.workers = workers;
    }
    let config = Arc::new(config);

    let store: Arc<dyn VerdictStore> = Arc::new(open_store(&config)?);
    let connector = Arc::new(
        GitHubConnector::new(&config.hosting.api_url, HTTP_TIMEOUT)
            .context("Failed to build the hosting API client")?,
    );
    let analyzers = Arc::new(build_registry(&config.analyzers, config.server.worker_timeout()));
    info!("Registered {} analyzer(s)", analyzers.len());

    let worker = Worker::new(Arc::clone(&store), connector, analyzers, Arc::clone(&config));
    let (queue, pool) = WorkerPool::start(
        Arc::new(worker),
        config.server.workers,
        config.server.worker_timeout(),
    )
    .context("Failed to start worker threads")?;

    let dispatcher = Dispatcher::new(store, Arc::new(queue), Arc::clone(&config));
    server::serve(&config.server.bind, &dispatcher)?;

    drop(dispatcher);
    pool.join();
    Ok(())
}
