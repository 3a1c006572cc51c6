//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use sitebook::adapters::ai::OpenAiAdapter;
use sitebook::adapters::persistence::{MemoryRepo, SqliteRepo};
use sitebook::adapters::ui::tui::TuiInputPort;
use sitebook::ports::{AiPort, ExpenseRepoPort, InputPort, MilestoneRepoPort};
use sitebook::shared::config::{AppConfig, StorageKind};
use sitebook::usecases::{CategoryClassifier, ExpenseService, MilestoneSequencer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    sitebook::adapters::ui::init_ui();

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config could not be loaded, using defaults");
            AppConfig::default()
        }
    };

    // --- Store (one backend serves both repo ports) ---
    let (expense_repo, milestone_repo) = open_store(&cfg).await?;

    // --- Classifier: model-backed when a key is set, keyword rules otherwise ---
    let classifier = if cfg.is_ai_configured() {
        info!(
            model = %cfg.ai_model_or_default(),
            url = %cfg.ai_api_url_or_default(),
            timeout_secs = cfg.ai_timeout().as_secs(),
            "AI categorization enabled with OpenAI adapter"
        );
        let adapter: Arc<dyn AiPort> = Arc::new(
            OpenAiAdapter::new(
                cfg.ai_api_url_or_default(),
                cfg.ai_api_key().unwrap_or_default(),
                cfg.ai_model_or_default(),
                cfg.ai_timeout(),
            )
            .map_err(|e| anyhow::anyhow!("{}", e))?,
        );
        CategoryClassifier::new(adapter, cfg.classifier_config())
    } else {
        warn!("SITEBOOK_AI_API_KEY not set, categorizing with keyword rules only");
        CategoryClassifier::fallback_only()
    };

    // --- Services ---
    let expenses = Arc::new(ExpenseService::new(expense_repo, classifier));
    let milestones = Arc::new(MilestoneSequencer::new(milestone_repo));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        cfg.project_id_or_default(),
        expenses,
        milestones,
    ));

    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

async fn open_store(
    cfg: &AppConfig,
) -> anyhow::Result<(Arc<dyn ExpenseRepoPort>, Arc<dyn MilestoneRepoPort>)> {
    match cfg.storage_or_default() {
        StorageKind::Sqlite => {
            let data_path = PathBuf::from(cfg.data_dir_or_default());
            let repo = Arc::new(
                SqliteRepo::connect(&data_path)
                    .await
                    .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
            );
            info!(path = %repo.path().display(), "using SQLite store");
            Ok((
                Arc::clone(&repo) as Arc<dyn ExpenseRepoPort>,
                repo as Arc<dyn MilestoneRepoPort>,
            ))
        }
        StorageKind::Memory => {
            warn!("using in-memory store; nothing is persisted");
            let repo = Arc::new(MemoryRepo::new());
            Ok((
                Arc::clone(&repo) as Arc<dyn ExpenseRepoPort>,
                repo as Arc<dyn MilestoneRepoPort>,
            ))
        }
    }
}
