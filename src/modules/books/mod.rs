pub mod api;
pub mod models;
pub mod service;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use folio_kernel::{settings::Settings, InitCtx, Module};

use api::BookController;
use service::{BookService, InMemoryBookService};

/// Books module: read-only lookup of books by id
pub struct BooksModule {
    service: Arc<dyn BookService>,
}

impl BooksModule {
    pub fn new(service: Arc<dyn BookService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            seed = ?ctx.settings.catalog.seed_file,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        api::router(BookController::new(Arc::clone(&self.service)))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(api::openapi())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Build the catalog named by the settings and wrap it in a module
pub fn create_module(settings: &Settings) -> anyhow::Result<Arc<dyn Module>> {
    let catalog = match &settings.catalog.seed_file {
        Some(path) => InMemoryBookService::from_seed_file(path)
            .with_context(|| format!("failed to load book catalog from {}", path.display()))?,
        None => InMemoryBookService::with_default_catalog(),
    };

    tracing::info!(books = catalog.len(), "book catalog ready");

    Ok(Arc::new(BooksModule::new(Arc::new(catalog))))
}
