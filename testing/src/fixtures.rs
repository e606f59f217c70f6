use collection::{Collection, CollectionWrapper, Datum, Error, FILE_REL, Item, Link, MEDIA_TYPE};
use config::{ClientConfig, PollingConfig};
use integration::PDF_MEDIA_TYPE;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use wiremock::{MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_KEY_ID: u32 = 1234;

/// Poll interval used against mock servers.
pub const TEST_POLL_INTERVAL: Duration = Duration::from_millis(5);

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

pub fn unique_loan_number() -> String {
    unique_id("loan")
}

/// Raising-mode configuration aimed at `server` with a fast polling budget
/// of 30 attempts.
pub fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(TEST_API_KEY, TEST_KEY_ID)
        .with_base_url(server.uri())
        .with_polling(PollingConfig::new(30, TEST_POLL_INTERVAL))
}

pub fn review_item(review_id: u32, loan_number: &str) -> Item {
    Item::new(format!("/reviews/{review_id}"))
        .with_datum(Datum::new("review_id", review_id.to_string()))
        .with_datum(Datum::new("loan_number", loan_number))
}

/// Image job item carrying one `file` link per href.
pub fn image_job_item(job_id: u32, file_hrefs: &[String]) -> Item {
    file_hrefs.iter().fold(
        Item::new(format!("/loan_images/{job_id}"))
            .with_datum(Datum::new("status", "created")),
        |item, href| item.with_link(Link::new(FILE_REL, href.clone()))
    )
}

pub fn items_body(items: Vec<Item>) -> String {
    envelope_body(Collection::with_items(items))
}

pub fn error_body(title: &str, code: &str, message: &str) -> String {
    envelope_body(Collection::with_error(Error::new(title, code, message)))
}

fn envelope_body(collection: Collection) -> String {
    serde_json::to_string(&CollectionWrapper { collection }).unwrap()
}

pub fn collection_response(status: u16, body: String) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body, MEDIA_TYPE)
}

pub fn items_response(items: Vec<Item>) -> ResponseTemplate {
    collection_response(200, items_body(items))
}

pub fn error_response(status: u16, code: &str, message: &str) -> ResponseTemplate {
    collection_response(status, error_body("Error", code, message))
}

/// The service's answer while a generated document is still being built.
pub fn not_ready_response() -> ResponseTemplate {
    collection_response(
        409,
        error_body("Not Ready", "created", "The requested file is still being generated")
    )
}

pub fn pdf_response(bytes: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(bytes.to_vec(), PDF_MEDIA_TYPE)
}

pub fn sample_pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n".to_vec()
}

/// Write `contents` to `name` under `dir`.
pub fn write_input_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
