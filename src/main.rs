use anyhow::Context;
use bookshelf_app::modules;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        "bookshelf bootstrap starting"
    );

    // No traffic is served without a working connection.
    let db = bookshelf_db::connect(&settings.database)
        .await
        .with_context(|| "failed to connect to database")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &db);
    registry
        .init_modules(&InitCtx {
            settings: &settings,
        })
        .await?;

    let served = bookshelf_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    db.shutdown().await;

    served
}
