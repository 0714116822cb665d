use actix_web::{get, web, HttpResponse, Responder};
use bucket_storage::StorageResult;
use crate::services::{AppState, TEXT_PLAIN};

/// Greets the caller and leaves a copy of the greeting in the bucket.
///
/// A storage failure is logged and does not affect the response.
#[get("/")]
pub async fn hello(shared_state: web::Data<AppState>) -> impl Responder {
    let greeting = format!("Hello {}!\n", shared_state.greeting_name);

    if let Err(e) = store_greeting(&shared_state, &greeting).await {
        tracing::error!(error = ?e, "Cannot store greeting");
    }

    HttpResponse::Ok().content_type(TEXT_PLAIN).body(greeting)
}

async fn store_greeting(shared_state: &AppState, greeting: &str) -> StorageResult<()> {
    let mut writer = shared_state.store.new_writer("greeting");
    writer.set_content_type("text/plain");
    writer.write(greeting.as_bytes()).await?;
    writer.close().await
}
