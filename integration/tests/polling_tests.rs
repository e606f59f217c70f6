use config::PollingConfig;
use integration::{CancellationToken, ErrorKind, ImageRequest, IntegrationError, PollState, Session};
use std::time::Duration;
use testing::{
    SignatureMatcher, TEST_POLL_INTERVAL, error_response, image_job_item, items_response,
    not_ready_response, pdf_response, sample_pdf, test_config
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

async fn mount_job(server: &MockServer, file_hrefs: &[String]) {
    Mock::given(method("POST"))
        .and(path("/loan_images"))
        .and(SignatureMatcher::default())
        .respond_with(items_response(vec![image_job_item(1, file_hrefs)]))
        .expect(1)
        .mount(server)
        .await;
}

fn file_link(server: &MockServer, name: &str) -> String {
    format!("{}/files/{name}", server.uri())
}

fn request() -> ImageRequest {
    ImageRequest::new(42, ["1003", "closing_disclosure"])
}

#[tokio::test]
async fn test_document_ready_after_five_not_ready_polls() {
    let server = MockServer::start().await;
    let href = file_link(&server, "1");
    mount_job(&server, &[href.clone()]).await;

    Mock::given(method("GET"))
        .and(path("/files/1"))
        .and(SignatureMatcher::default())
        .respond_with(not_ready_response())
        .up_to_n_times(5)
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/1"))
        .and(SignatureMatcher::default())
        .respond_with(pdf_response(&sample_pdf()))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(test_config(&server)).unwrap();
    let report = session.request_review_images(&request()).await.unwrap();

    assert_eq!(report.files.len(), 1);
    let file = &report.files[0];
    assert_eq!(file.href, href);
    assert_eq!(file.attempts, 5);
    assert!(matches!(file.state, PollState::Ready { attempts: 5, artifact: Some(_) }));

    let artifact = file.artifact().unwrap().to_path_buf();
    assert_eq!(std::fs::read(&artifact).unwrap(), sample_pdf());
    assert_eq!(session.downloaded_files(), vec![artifact.as_path()]);

    assert!(session.success());
    assert!(session.error().is_none());
    assert_eq!(session.item().map(|item| item.href.as_str()), Some("/loan_images/1"));
}

#[tokio::test]
async fn test_budget_exhaustion_reports_not_ready() {
    let server = MockServer::start().await;
    let href = file_link(&server, "slow");
    mount_job(&server, &[href.clone()]).await;

    Mock::given(method("GET"))
        .and(path("/files/slow"))
        .respond_with(not_ready_response())
        .expect(30)
        .mount(&server)
        .await;

    let mut session = Session::new(test_config(&server)).unwrap();
    let err = session.request_review_images(&request()).await.unwrap_err();

    match err {
        IntegrationError::ResourceNotReady {
            href: failed,
            attempts,
            error
        } => {
            assert_eq!(failed, href);
            assert_eq!(attempts, 30);
            assert_eq!(error.map(|e| e.code), Some("created".to_string()));
        }
        other => panic!("unexpected error: {other}")
    }
    assert!(!session.file_received());
}

#[tokio::test]
async fn test_budget_is_configurable() {
    let server = MockServer::start().await;
    mount_job(&server, &[file_link(&server, "slow")]).await;

    Mock::given(method("GET"))
        .and(path("/files/slow"))
        .respond_with(not_ready_response())
        .expect(3)
        .mount(&server)
        .await;

    let config = test_config(&server).with_polling(PollingConfig::new(3, TEST_POLL_INTERVAL));
    let mut session = Session::new(config).unwrap();
    let err = session.request_review_images(&request()).await.unwrap_err();
    assert!(matches!(err, IntegrationError::ResourceNotReady { attempts: 3, .. }));
}

#[tokio::test]
async fn test_other_error_aborts_polling() {
    let server = MockServer::start().await;
    mount_job(&server, &[file_link(&server, "broken")]).await;

    Mock::given(method("GET"))
        .and(path("/files/broken"))
        .respond_with(error_response(500, "generation_failed", "Could not render document"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(test_config(&server)).unwrap();
    let err = session.request_review_images(&request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(err.service_error().map(|e| e.code.as_str()), Some("generation_failed"));
    assert!(!session.file_received());
}

#[tokio::test]
async fn test_asynchronous_request_skips_polling() {
    let server = MockServer::start().await;
    let href = file_link(&server, "later");
    mount_job(&server, &[href.clone()]).await;

    Mock::given(method("GET"))
        .respond_with(pdf_response(&sample_pdf()))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = Session::new(test_config(&server)).unwrap();
    let report = session
        .request_review_images(&request().asynchronous())
        .await
        .unwrap();

    assert_eq!(report.deferred_links().collect::<Vec<_>>(), vec![href.as_str()]);
    assert_eq!(report.files[0].attempts, 0);
    assert!(!session.file_received());
    assert!(session.success());
}

#[tokio::test]
async fn test_every_file_link_is_polled() {
    let server = MockServer::start().await;
    mount_job(&server, &[file_link(&server, "a"), file_link(&server, "b")]).await;

    Mock::given(method("GET"))
        .and(path("/files/a"))
        .respond_with(pdf_response(b"%PDF-a"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b"))
        .respond_with(not_ready_response())
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b"))
        .respond_with(pdf_response(b"%PDF-b"))
        .mount(&server)
        .await;

    let mut session = Session::new(test_config(&server)).unwrap();
    let report = session.request_review_images(&request()).await.unwrap();

    let attempts: Vec<u32> = report.files.iter().map(|file| file.attempts).collect();
    assert_eq!(attempts, vec![0, 2]);

    let artifacts: Vec<_> = report.artifacts().map(|path| path.to_path_buf()).collect();
    assert_eq!(artifacts.len(), 2);
    assert_eq!(session.downloaded_files().len(), 2);

    session.close().unwrap();
    assert!(artifacts.iter().all(|path| !path.exists()));
}

#[tokio::test]
async fn test_envelope_poll_response_is_ready_without_artifact() {
    let server = MockServer::start().await;
    mount_job(&server, &[file_link(&server, "meta")]).await;

    Mock::given(method("GET"))
        .and(path("/files/meta"))
        .respond_with(items_response(Vec::new()))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(test_config(&server)).unwrap();
    let report = session.request_review_images(&request()).await.unwrap();

    assert_eq!(
        report.files[0].state,
        PollState::Ready {
            attempts: 0,
            artifact: None
        }
    );
    assert_eq!(report.artifacts().count(), 0);
}

#[tokio::test]
async fn test_job_without_file_links() {
    let server = MockServer::start().await;
    mount_job(&server, &[]).await;

    let mut session = Session::new(test_config(&server)).unwrap();
    let report = session.request_review_images(&request()).await.unwrap();

    assert!(report.is_empty());
    assert!(session.item().is_some());
}

#[tokio::test]
async fn test_exhaustion_recorded_when_not_raising() {
    let server = MockServer::start().await;
    let href = file_link(&server, "slow");
    mount_job(&server, &[href.clone()]).await;

    Mock::given(method("GET"))
        .and(path("/files/slow"))
        .respond_with(not_ready_response())
        .mount(&server)
        .await;

    let config = test_config(&server)
        .with_raise_errors(false)
        .with_polling(PollingConfig::new(4, TEST_POLL_INTERVAL));
    let mut session = Session::new(config).unwrap();
    let report = session.request_review_images(&request()).await.unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].href, href);
    assert_eq!(report.files[0].state, PollState::Exhausted { attempts: 4 });
    assert!(!session.success());
    assert_eq!(session.error().map(|e| e.code.as_str()), Some("created"));
    assert!(session.item().is_some());
}

#[tokio::test]
async fn test_failed_link_kept_in_report_when_not_raising() {
    let server = MockServer::start().await;
    let ready = file_link(&server, "a");
    let broken = file_link(&server, "b");
    mount_job(&server, &[ready.clone(), broken.clone()]).await;

    Mock::given(method("GET"))
        .and(path("/files/a"))
        .respond_with(pdf_response(&sample_pdf()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b"))
        .respond_with(error_response(500, "generation_failed", "Could not render document"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = Session::new(test_config(&server).with_raise_errors(false)).unwrap();
    let report = session.request_review_images(&request()).await.unwrap();

    assert_eq!(report.files.len(), 2);
    assert_eq!(report.files[0].href, ready);
    assert!(matches!(report.files[0].state, PollState::Ready { attempts: 0, artifact: Some(_) }));
    assert_eq!(report.files[1].href, broken);
    assert_eq!(report.files[1].state, PollState::Failed { attempts: 0 });

    let artifact = report.files[0].artifact().unwrap();
    assert_eq!(session.downloaded_files(), vec![artifact]);
    assert!(!session.success());
    assert_eq!(session.error().map(|e| e.code.as_str()), Some("generation_failed"));
    assert_eq!(session.items().len(), 1);
}

#[tokio::test]
async fn test_links_after_failure_still_polled_when_not_raising() {
    let server = MockServer::start().await;
    mount_job(&server, &[file_link(&server, "b"), file_link(&server, "a")]).await;

    Mock::given(method("GET"))
        .and(path("/files/b"))
        .respond_with(error_response(500, "generation_failed", "Could not render document"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a"))
        .respond_with(not_ready_response())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a"))
        .respond_with(pdf_response(&sample_pdf()))
        .mount(&server)
        .await;

    let mut session = Session::new(test_config(&server).with_raise_errors(false)).unwrap();
    let report = session.request_review_images(&request()).await.unwrap();

    let states: Vec<&PollState> = report.files.iter().map(|file| &file.state).collect();
    assert!(matches!(
        states.as_slice(),
        [PollState::Failed { attempts: 0 }, PollState::Ready { attempts: 1, artifact: Some(_) }]
    ));
    assert_eq!(report.artifacts().count(), 1);
    assert_eq!(session.error().map(|e| e.code.as_str()), Some("generation_failed"));
}

#[tokio::test]
async fn test_cancelled_before_first_poll() {
    let server = MockServer::start().await;
    mount_job(&server, &[file_link(&server, "1")]).await;

    Mock::given(method("GET"))
        .respond_with(pdf_response(&sample_pdf()))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut session = Session::new(test_config(&server)).unwrap();
    let err = session
        .request_review_images_with_cancel(&request(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, IntegrationError::Cancelled { attempts: 0, .. }));
    assert!(!session.file_received());
}

#[tokio::test]
async fn test_cancelled_while_waiting() {
    let server = MockServer::start().await;
    mount_job(&server, &[file_link(&server, "slow")]).await;

    Mock::given(method("GET"))
        .and(path("/files/slow"))
        .respond_with(not_ready_response())
        .mount(&server)
        .await;

    let config = test_config(&server).with_polling(PollingConfig::new(1000, TEST_POLL_INTERVAL));
    let mut session = Session::new(config).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = session
        .request_review_images_with_cancel(&request(), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(!session.file_received());
}
