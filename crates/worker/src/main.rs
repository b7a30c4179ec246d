use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codegrade_dispatch::{PgJobSignals, Sweep};
use codegrade_pipeline::{
    HttpSourceFetcher, HttpStatusNotifier, JobRunner, LlmReviewEngine, MoodleReporter,
    StatusNotifier,
};
use codegrade_worker::{WorkerConfig, WorkerLoop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codegrade_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(
        worker_count = config.worker_count,
        idle_timeout_secs = config.idle_timeout.as_secs(),
        "Loaded worker configuration"
    );

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = codegrade_db::create_pool(&database_url).await?;
    codegrade_db::health_check(&pool).await?;
    codegrade_db::run_migrations(&pool).await?;
    tracing::info!("Database ready");

    // Collaborators are constructed once and shared across loops.
    let fetcher = Arc::new(HttpSourceFetcher::with_timeout(config.fetch_timeout));
    let reviewer = Arc::new(LlmReviewEngine::new(
        config.review_api_url.clone(),
        config.review_api_key.clone(),
    ));
    let reporter = Arc::new(MoodleReporter::new(
        config.moodle_api_url.clone(),
        config.moodle_api_token.clone(),
    ));
    let notifier: Option<Arc<dyn StatusNotifier>> = config.status_report_url.as_ref().map(|url| {
        Arc::new(HttpStatusNotifier::new(
            url.clone(),
            config.status_report_key.clone(),
        )) as Arc<dyn StatusNotifier>
    });

    let runner = Arc::new(JobRunner::new(
        pool.clone(),
        fetcher,
        reviewer,
        reporter,
        notifier,
    ));

    let cancel = CancellationToken::new();
    let mut handles = Vec::new();

    // Sweep: the correctness backstop for lost signals and dead workers.
    let sweep = Sweep::new(pool.clone(), config.sweep.clone());
    let sweep_cancel = cancel.clone();
    handles.push(tokio::spawn(async move {
        sweep.run(sweep_cancel).await;
    }));

    // Worker loops, each with its own dispatch listener connection.
    for id in 0..config.worker_count {
        let signals = PgJobSignals::connect(&pool).await?;
        let worker = WorkerLoop::new(
            id,
            pool.clone(),
            Box::new(signals),
            Arc::clone(&runner),
            config.idle_timeout,
        );
        let worker_cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            worker.run(worker_cancel).await;
        }));
    }

    tracing::info!("Worker process started; waiting for jobs");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received; draining in-flight jobs");
    cancel.cancel();

    for handle in handles {
        let _ = handle.await;
    }

    pool.close().await;
    tracing::info!("Worker process stopped");
    Ok(())
}
