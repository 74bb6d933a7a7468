//! Hugging Face transport and retry behaviour against a local mock server.

use edgequake_doc2study::pipeline::transport::HuggingFaceTransport;
use edgequake_doc2study::{
    Artifact, ArtifactOrigin, AttemptError, GenerationConfig, GenerationRequest, GenerationTask,
    Generator, ProviderClient, ProviderError, ProviderId, ProviderPayload, ProviderTransport,
    RawResponse, RetryPolicy,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUMMARIZER: &str = "/facebook/bart-large-cnn";
const TEXTGEN: &str = "/microsoft/DialoGPT-medium";

fn fast_config(server: &MockServer) -> GenerationConfig {
    GenerationConfig::builder()
        .huggingface_api_key("hf_test")
        .huggingface_base_url(server.uri())
        .loading_backoff_ms(1)
        .retry_backoff_ms(1)
        .request_timeout_secs(5)
        .build()
        .unwrap()
}

fn fast_client() -> ProviderClient {
    ProviderClient::new(RetryPolicy {
        max_attempts: 3,
        loading_backoff_ms: 1,
        retry_backoff_ms: 1,
    })
}

#[tokio::test]
async fn posts_inputs_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUMMARIZER))
        .and(header("authorization", "Bearer hf_test"))
        .and(body_json(json!({ "inputs": "some text" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "summary_text": "short" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = HuggingFaceTransport::new(
        ProviderId::HuggingFaceSummarizer,
        &server.uri(),
        "facebook/bart-large-cnn",
        Some("hf_test".into()),
        5,
    )
    .unwrap();

    let raw = transport
        .send(&ProviderPayload::Inputs("some text".into()))
        .await
        .unwrap();
    assert_eq!(raw, RawResponse::Json(json!([{ "summary_text": "short" }])));
}

#[tokio::test]
async fn model_loading_is_retried_three_times_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUMMARIZER))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "Model facebook/bart-large-cnn is currently loading",
            "estimated_time": 20.0
        })))
        .expect(3)
        .mount(&server)
        .await;

    let transport = HuggingFaceTransport::new(
        ProviderId::HuggingFaceSummarizer,
        &server.uri(),
        "facebook/bart-large-cnn",
        Some("hf_test".into()),
        5,
    )
    .unwrap();

    let err = fast_client()
        .invoke(&transport, &ProviderPayload::Inputs("doc".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::ModelLoading { .. }), "got: {err:?}");
}

#[tokio::test]
async fn server_error_then_success_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SUMMARIZER))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SUMMARIZER))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "summary_text": "Recovered." }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let generator = Generator::from_config(&fast_config(&server)).unwrap();
    let outcome = generator
        .generate(GenerationRequest::new(
            GenerationTask::Summarize,
            "Any document text.",
        ))
        .await;

    assert_eq!(outcome.artifact, Artifact::Summary("Recovered.".into()));
    assert_eq!(
        outcome.origin,
        ArtifactOrigin::Provider(ProviderId::HuggingFaceSummarizer)
    );
}

#[tokio::test]
async fn non_loading_api_error_is_not_loading() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXTGEN))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Input is too long" })),
        )
        .expect(3)
        .mount(&server)
        .await;

    let generator = Generator::from_config(&fast_config(&server)).unwrap();
    let outcome = generator
        .generate(GenerationRequest::new(
            GenerationTask::Flashcards,
            "Too short.",
        ))
        .await;

    assert_eq!(outcome.origin, ArtifactOrigin::Fallback);
    match &outcome.attempts[0].error {
        AttemptError::Provider(ProviderError::Api { message, .. }) => {
            assert_eq!(message, "Input is too long")
        }
        other => panic!("unexpected attempt error: {other:?}"),
    }
}

#[tokio::test]
async fn text_generation_reply_is_parsed_into_flashcards() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TEXTGEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "generated_text": "Q: What is Rust?\nA: A systems language\nnoise\nQ: Who maintains it?\nA: The Rust project"
        }])))
        .mount(&server)
        .await;

    let generator = Generator::from_config(&fast_config(&server)).unwrap();
    let cards = generator
        .run(GenerationTask::Flashcards, "Rust is a systems programming language.")
        .await
        .into_flashcards()
        .unwrap();

    assert_eq!(cards.len(), 2);
    assert_eq!(cards[1].answer, "The Rust project");
}
