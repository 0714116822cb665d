use actix_multipart::Multipart;
use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use crate::errors::UploadErr;
use crate::services::{AppState, TEXT_PLAIN};

/// Cap on the bytes read from all form fields of one upload (16 MiB).
pub const MAX_UPLOAD_BYTES: usize = 2 << 23;
pub const SOURCE_FILE_FIELD: &str = "sourceFile";
pub const UPLOAD_FORM: &str = include_str!("../static/upload_form.html");
pub const UPLOAD_CREATED: &str = "Successfully Uploaded File\n";

/// POST stores the submitted file, every other method gets the upload form.
pub async fn upload_dispatch(
    req: HttpRequest,
    payload: web::Payload,
    shared_state: web::Data<AppState>,
) -> Result<HttpResponse, UploadErr> {
    if req.method() == Method::POST {
        process_upload(Multipart::new(req.headers(), payload), &shared_state).await
    } else {
        Ok(serve_form())
    }
}

fn serve_form() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(UPLOAD_FORM)
}

struct SourceFile {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

async fn process_upload(multipart: Multipart, shared_state: &AppState) -> Result<HttpResponse, UploadErr> {
    let upload = read_source_file(multipart).await?;
    tracing::info!(
        size = upload.data.len(),
        file_name = ?upload.file_name,
        content_type = ?upload.content_type,
        "File uploaded"
    );

    let mut writer = shared_state
        .store
        .new_writer(upload.file_name.as_deref().unwrap_or("upload"));
    if let Some(content_type) = &upload.content_type {
        writer.set_content_type(content_type);
    }

    if let Err(e) = writer.write(&upload.data).await {
        tracing::error!(error = ?e, "Cannot write object");
        return Err(e.into());
    }
    if let Err(e) = writer.close().await {
        tracing::error!(error = ?e, "Cannot close object");
        return Err(e.into());
    }

    Ok(HttpResponse::Created().content_type(TEXT_PLAIN).body(UPLOAD_CREATED))
}

/// Walks the form until the `sourceFile` field and buffers its body.
///
/// Fields in front of it are drained and count towards the size cap.
async fn read_source_file(mut multipart: Multipart) -> Result<SourceFile, UploadErr> {
    let mut total_size = 0usize;

    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|e| {
            tracing::warn!(error = %e, "Cannot parse multipart form");
            UploadErr::Malformed(e)
        })?;

        let is_source = field.name() == Some(SOURCE_FILE_FIELD);
        let mut data = Vec::new();

        while let Some(chunk) = field.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) if is_source => {
                    tracing::error!(error = %e, "Cannot read data");
                    return Err(UploadErr::Read(e));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Cannot parse multipart form");
                    return Err(UploadErr::Malformed(e));
                }
            };

            total_size += chunk.len();
            if total_size > MAX_UPLOAD_BYTES {
                tracing::warn!(total_size, limit = MAX_UPLOAD_BYTES, "Upload too large");
                return Err(UploadErr::TooLarge { limit: MAX_UPLOAD_BYTES });
            }
            if is_source {
                data.extend_from_slice(&chunk);
            }
        }

        if is_source {
            return Ok(SourceFile {
                file_name: field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string),
                content_type: field.content_type().map(|mime| mime.to_string()),
                data,
            });
        }
    }

    tracing::warn!(field = SOURCE_FILE_FIELD, "Cannot find form file");
    Err(UploadErr::MissingField(SOURCE_FILE_FIELD))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use bucket_storage::MemoryBucket;
    use futures_util::future::join;
    use crate::services::routes;
    use crate::services::test_support::{FailAt, FailingBucket};
    use super::*;

    const BOUNDARY: &str = "upload-test-boundary";

    fn part(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
        body
    }

    fn finish(mut body: Vec<u8>) -> Vec<u8> {
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/upload")
            .insert_header((header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}")))
            .set_payload(body)
    }

    fn state(store: Arc<dyn bucket_storage::BucketStore>) -> web::Data<AppState> {
        web::Data::new(AppState::new(store, "World".to_string()))
    }

    #[actix_web::test]
    async fn test_get_serves_form() {
        let app = test::init_service(App::new().app_data(state(Arc::new(MemoryBucket::new()))).configure(routes)).await;

        let req = test::TestRequest::get()
            .uri("/upload")
            .insert_header((header::ACCEPT, "application/json"))
            .set_payload("ignored body")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, UPLOAD_FORM.as_bytes());
        assert!(UPLOAD_FORM.contains("name=\"sourceFile\""));
    }

    #[actix_web::test]
    async fn test_other_methods_serve_form() {
        let app = test::init_service(App::new().app_data(state(Arc::new(MemoryBucket::new()))).configure(routes)).await;

        let req = test::TestRequest::put().uri("/upload").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, UPLOAD_FORM.as_bytes());
    }

    #[actix_web::test]
    async fn test_upload_license_file() {
        let bucket = MemoryBucket::new();
        let app = test::init_service(App::new().app_data(state(Arc::new(bucket.clone()))).configure(routes)).await;

        let body = finish(part(SOURCE_FILE_FIELD, "license.txt", "text/plain", b"0123456789"));
        let resp = test::call_service(&app, upload_request(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(test::read_body(resp).await, UPLOAD_CREATED.as_bytes());

        let keys = bucket.keys().await;
        assert_eq!(keys.len(), 1);
        assert_ne!(keys[0], "license.txt");
        let stored = bucket.get(&keys[0]).await.unwrap();
        assert_eq!(stored.data.len(), 10);
        assert_eq!(stored.content_type.as_deref(), Some("text/plain"));
    }

    #[actix_web::test]
    async fn test_upload_empty_file() {
        let bucket = MemoryBucket::new();
        let app = test::init_service(App::new().app_data(state(Arc::new(bucket.clone()))).configure(routes)).await;

        let body = finish(part(SOURCE_FILE_FIELD, "empty.bin", "application/octet-stream", b""));
        let resp = test::call_service(&app, upload_request(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let keys = bucket.keys().await;
        assert_eq!(keys.len(), 1);
        assert!(bucket.get(&keys[0]).await.unwrap().data.is_empty());
    }

    #[actix_web::test]
    async fn test_fields_before_source_file_are_skipped() {
        let bucket = MemoryBucket::new();
        let app = test::init_service(App::new().app_data(state(Arc::new(bucket.clone()))).configure(routes)).await;

        let mut body = part("caption", "caption.txt", "text/plain", b"not stored");
        body.extend(part(SOURCE_FILE_FIELD, "photo.png", "image/png", b"\x89PNG"));
        let resp = test::call_service(&app, upload_request(finish(body)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let keys = bucket.keys().await;
        assert_eq!(keys.len(), 1);
        let stored = bucket.get(&keys[0]).await.unwrap();
        assert_eq!(stored.data, b"\x89PNG");
        assert_eq!(stored.content_type.as_deref(), Some("image/png"));
    }

    #[actix_web::test]
    async fn test_wrong_field_is_bad_request() {
        let bucket = MemoryBucket::new();
        let app = test::init_service(App::new().app_data(state(Arc::new(bucket.clone()))).configure(routes)).await;

        let body = finish(part("wrongField", "license.txt", "text/plain", b"0123456789"));
        let resp = test::call_service(&app, upload_request(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(bucket.is_empty().await);
    }

    #[actix_web::test]
    async fn test_missing_field_asks_for_no_writer() {
        let bucket = FailingBucket::new(FailAt::Write);
        let app = test::init_service(App::new().app_data(state(bucket.clone())).configure(routes)).await;

        let body = finish(part("wrongField", "license.txt", "text/plain", b"0123456789"));
        let resp = test::call_service(&app, upload_request(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bucket.writers(), 0);
    }

    #[actix_web::test]
    async fn test_non_multipart_post_is_bad_request() {
        let bucket = MemoryBucket::new();
        let app = test::init_service(App::new().app_data(state(Arc::new(bucket.clone()))).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/upload")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{}")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(bucket.is_empty().await);
    }

    #[actix_web::test]
    async fn test_storage_failure_hides_details() {
        for fail_at in [FailAt::Write, FailAt::Close] {
            let bucket = FailingBucket::new(fail_at);
            let app = test::init_service(App::new().app_data(state(bucket.clone())).configure(routes)).await;

            let body = finish(part(SOURCE_FILE_FIELD, "license.txt", "text/plain", b"0123456789"));
            let resp = test::call_service(&app, upload_request(body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = test::read_body(resp).await;
            assert!(body.is_empty());
            assert_eq!(bucket.writers(), 1);
        }
    }

    #[actix_web::test]
    async fn test_truncated_upload_is_server_error() {
        let bucket = MemoryBucket::new();
        let app = test::init_service(App::new().app_data(state(Arc::new(bucket.clone()))).configure(routes)).await;

        // No closing boundary after the file body
        let mut body = part(SOURCE_FILE_FIELD, "license.txt", "text/plain", b"0123456789");
        body.truncate(body.len() - 4);
        let resp = test::call_service(&app, upload_request(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(bucket.is_empty().await);
    }

    #[actix_web::test]
    async fn test_upload_at_limit_is_accepted() {
        let bucket = MemoryBucket::new();
        let app = test::init_service(App::new().app_data(state(Arc::new(bucket.clone()))).configure(routes)).await;

        let data = vec![b'a'; MAX_UPLOAD_BYTES];
        let body = finish(part(SOURCE_FILE_FIELD, "big.bin", "application/octet-stream", &data));
        let resp = test::call_service(&app, upload_request(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let keys = bucket.keys().await;
        assert_eq!(bucket.get(&keys[0]).await.unwrap().data.len(), MAX_UPLOAD_BYTES);
    }

    #[actix_web::test]
    async fn test_upload_over_limit_is_rejected() {
        let bucket = MemoryBucket::new();
        let app = test::init_service(App::new().app_data(state(Arc::new(bucket.clone()))).configure(routes)).await;

        let data = vec![b'a'; MAX_UPLOAD_BYTES + 1];
        let body = finish(part(SOURCE_FILE_FIELD, "big.bin", "application/octet-stream", &data));
        let resp = test::call_service(&app, upload_request(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(bucket.is_empty().await);
    }

    #[actix_web::test]
    async fn test_concurrent_uploads_get_distinct_keys() {
        let bucket = MemoryBucket::new();
        let app = test::init_service(App::new().app_data(state(Arc::new(bucket.clone()))).configure(routes)).await;

        let first = upload_request(finish(part(SOURCE_FILE_FIELD, "same.txt", "text/plain", b"first"))).to_request();
        let second = upload_request(finish(part(SOURCE_FILE_FIELD, "same.txt", "text/plain", b"second"))).to_request();
        let (a, b) = join(test::call_service(&app, first), test::call_service(&app, second)).await;
        assert_eq!(a.status(), StatusCode::CREATED);
        assert_eq!(b.status(), StatusCode::CREATED);

        let keys = bucket.keys().await;
        assert_eq!(keys.len(), 2);
        let mut payloads = Vec::new();
        for key in &keys {
            payloads.push(bucket.get(key).await.unwrap().data);
        }
        payloads.sort();
        assert_eq!(payloads, vec![b"first".to_vec(), b"second".to_vec()]);
    }
}
