use std::sync::Arc;
use actix_web::web;
use bucket_storage::BucketStore;

pub mod greeting_service;
pub mod upload_service;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// State shared by every worker. The store is the only process-wide resource.
pub struct AppState {
    pub(crate) store: Arc<dyn BucketStore>,
    pub(crate) greeting_name: String,
}

impl AppState {
    pub fn new(store: Arc<dyn BucketStore>, greeting_name: String) -> Self {
        Self { store, greeting_name }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(greeting_service::hello)
        .service(web::resource("/upload").to(upload_service::upload_dispatch));
}
