mod common;

use axum_classify::errors::AppError;
use axum_classify::services::ImageSource;
use axum_classify::ServiceSettings;
use bytes::Bytes;
use common::{png_bytes, settings, StubBehaviour, TestApp};
use httpmock::prelude::*;
use std::time::Duration;

fn upload() -> ImageSource {
    ImageSource::Upload(Some(Bytes::from(png_bytes())))
}

#[tokio::test]
async fn six_tokens_buy_six_classifications() {
    let app = TestApp::new(StubBehaviour::Succeed);
    app.register("alice", "wonderland").await;
    assert_eq!(app.tokens("alice").await, 6);

    for expected_left in (0..6).rev() {
        let output = app
            .state
            .classification
            .classify("alice", "wonderland", upload())
            .await
            .unwrap();
        assert_eq!(output.remaining_tokens, expected_left);
        assert!(output.predictions.len() <= 3);
        assert!(output
            .predictions
            .iter()
            .all(|p| (0.0..=100.0).contains(&p.confidence)));
    }
    assert_eq!(app.tokens("alice").await, 0);
    assert_eq!(app.classifier.calls(), 6);

    let seventh = app
        .state
        .classification
        .classify("alice", "wonderland", upload())
        .await;
    assert!(matches!(seventh, Err(AppError::TokensExhausted)));
    assert_eq!(app.classifier.calls(), 6);
    assert_eq!(app.tokens("alice").await, 0);
}

#[tokio::test]
async fn bad_credentials_never_touch_tokens_or_classifier() {
    let app = TestApp::new(StubBehaviour::Succeed);
    app.register("bob", "builder").await;

    let wrong = app.state.classification.classify("bob", "wrecker", upload()).await;
    assert!(matches!(wrong, Err(AppError::WrongPassword)));

    let unknown = app.state.classification.classify("nobody", "builder", upload()).await;
    assert!(matches!(unknown, Err(AppError::UnknownUser)));

    assert_eq!(app.tokens("bob").await, 6);
    assert_eq!(app.classifier.calls(), 0);
}

#[tokio::test]
async fn input_errors_leave_balance_unchanged() {
    let app = TestApp::new(StubBehaviour::Succeed);
    app.register("carol", "pw").await;

    let cases = vec![
        ImageSource::Upload(None),
        ImageSource::Upload(Some(Bytes::new())),
        ImageSource::Upload(Some(Bytes::from_static(b"GIF89a but not really"))),
        ImageSource::Url(None),
        ImageSource::Url(Some(String::new())),
        ImageSource::Url(Some("ftp://example.com/cat.png".into())),
    ];
    for source in cases {
        let result = app.state.classification.classify("carol", "pw", source).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    assert_eq!(app.tokens("carol").await, 6);
    assert_eq!(app.classifier.calls(), 0);
}

#[tokio::test]
async fn unfetchable_url_leaves_balance_unchanged() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/gone.jpg");
            then.status(404);
        })
        .await;

    let app = TestApp::new(StubBehaviour::Succeed);
    app.register("dave", "pw").await;

    let result = app
        .state
        .classification
        .classify("dave", "pw", ImageSource::Url(Some(server.url("/gone.jpg"))))
        .await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert_eq!(app.tokens("dave").await, 6);
}

#[tokio::test]
async fn classify_by_url_spends_one_token() {
    let server = MockServer::start_async().await;
    let png = png_bytes();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/cat.png");
            then.status(200).header("content-type", "image/png").body(&png);
        })
        .await;

    let app = TestApp::new(StubBehaviour::Succeed);
    app.register("erin", "pw").await;

    let output = app
        .state
        .classification
        .classify("erin", "pw", ImageSource::Url(Some(server.url("/cat.png"))))
        .await
        .unwrap();
    assert_eq!(output.predictions[0].label, "tabby");
    assert_eq!(output.remaining_tokens, 5);
    assert_eq!(app.tokens("erin").await, 5);
}

#[tokio::test]
async fn classifier_failure_leaves_balance_unchanged() {
    let app = TestApp::new(StubBehaviour::Fail);
    app.register("frank", "pw").await;

    let result = app.state.classification.classify("frank", "pw", upload()).await;
    assert!(matches!(result, Err(AppError::Upstream(_))));
    assert_eq!(app.classifier.calls(), 1);
    assert_eq!(app.tokens("frank").await, 6);
}

#[tokio::test]
async fn classifier_timeout_leaves_balance_unchanged() {
    let app = TestApp::with_settings(
        StubBehaviour::Hang,
        ServiceSettings {
            classify_timeout: Duration::from_millis(100),
            ..settings()
        },
    );
    app.register("grace", "pw").await;

    let result = app.state.classification.classify("grace", "pw", upload()).await;
    assert!(matches!(result, Err(AppError::UpstreamTimeout(_))));
    assert_eq!(app.tokens("grace").await, 6);
}

#[tokio::test]
async fn concurrent_requests_cannot_overspend_last_token() {
    let app = TestApp::with_settings(
        StubBehaviour::Succeed,
        ServiceSettings {
            initial_tokens: 1,
            ..settings()
        },
    );
    app.register("heidi", "pw").await;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..10 {
        let classification = app.state.classification.clone();
        tasks.spawn(async move { classification.classify("heidi", "pw", upload()).await });
    }

    let mut succeeded = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(output) => {
                succeeded += 1;
                assert_eq!(output.remaining_tokens, 0);
            }
            Err(AppError::TokensExhausted) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(app.tokens("heidi").await, 0);
}

#[tokio::test]
async fn refill_restores_access_after_exhaustion() {
    let app = TestApp::with_settings(
        StubBehaviour::Succeed,
        ServiceSettings {
            initial_tokens: 0,
            ..settings()
        },
    );
    app.register("ivan", "pw").await;

    assert!(matches!(
        app.state.classification.classify("ivan", "pw", upload()).await,
        Err(AppError::TokensExhausted)
    ));

    assert!(matches!(
        app.state.meter.refill("ivan", "wrong", 3).await,
        Err(AppError::UnauthorizedAdmin)
    ));
    assert_eq!(app.tokens("ivan").await, 0);

    assert_eq!(app.state.meter.refill("ivan", common::ADMIN_SECRET, 3).await.unwrap(), 3);
    let output = app.state.classification.classify("ivan", "pw", upload()).await.unwrap();
    assert_eq!(output.remaining_tokens, 2);
}
