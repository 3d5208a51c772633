use scanlabel::api_connection::{
    connection::ApiConnectionError,
    endpoints::{ChatCompletionRequest, ChatMessage, Provider, ResponseFormat},
};
use scanlabel::config::Settings;
use scanlabel::health_classifier::HealthLevel;
use scanlabel::nutrient_normalizer::NutritionRecord;
use scanlabel::recommender::{
    AlternativeRecommender, AlternativesGenerator, GenerationError, OpenRouterGenerator,
    Provenance, RecommendationRequest,
};
use dotenv::dotenv;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn setup_test_environment() -> Settings {
    dotenv().ok();
    Settings::from_env().unwrap_or_default()
}

fn cola_request() -> RecommendationRequest {
    RecommendationRequest {
        product_name: "Coca-Cola Classic".to_string(),
        brand: "Coca-Cola Company".to_string(),
        nutrition: NutritionRecord {
            energy: 42.0,
            sugars: 10.6,
            fat: 0.0,
            salt: 0.01,
            fiber: 0.0,
            proteins: 0.0,
        },
        health_level: HealthLevel::Unhealthy,
        detected_issues: vec!["Sugar".to_string(), "Caramel Color".to_string()],
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Reads one request, headers plus `Content-Length` body, before replying.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        let Some(header_end) = find_subsequence(&buf, b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= header_end + 4 + content_length {
            return;
        }
    }
}

/// Serves the same canned HTTP response to every connection and returns the
/// OpenRouter-style base URL to point settings at.
async fn spawn_canned_server(status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind local port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let response = format!(
                    concat!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\n",
                        "Content-Length: {}\r\nConnection: close\r\n\r\n{}"
                    ),
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{}/api/v1", addr)
}

fn local_settings(base_url: String) -> Settings {
    Settings {
        openrouter_api_key: Some("sk-or-test".to_string()),
        openrouter_base_url: base_url,
        openrouter_timeout_secs: 5,
        ..Settings::default()
    }
}

fn completion_with_content(content: &str) -> String {
    serde_json::json!({
        "id": "gen-1",
        "model": "test/model",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn test_missing_api_key_error() {
    let settings = Settings {
        openrouter_api_key: None,
        ..Settings::default()
    };
    let result = Provider::openrouter(&settings);
    assert!(matches!(result, Err(ApiConnectionError::MissingApiKey(_))));
    if let Err(ApiConnectionError::MissingApiKey(key_name)) = result {
        assert_eq!(key_name, "OPENROUTER_API_KEY");
    }

    let recommender = AlternativeRecommender::from_settings(&settings);
    assert!(!recommender.has_ai());
    let set = recommender.recommend(&cola_request()).await;
    assert_eq!(set.source, Provenance::RuleBasedFallback);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let settings = Settings {
        openrouter_api_key: Some("sk-or-test".to_string()),
        openrouter_base_url: "http://127.0.0.1:9/api/v1".to_string(),
        openrouter_timeout_secs: 2,
        ..Settings::default()
    };
    let provider = Provider::openrouter(&settings).expect("provider with key");
    let request = ChatCompletionRequest {
        model: provider.model().to_string(),
        messages: vec![ChatMessage::user("Hello")],
        response_format: None,
        temperature: None,
        max_tokens: None,
    };
    let result = provider.call_chat_completion(request).await;
    assert!(matches!(result, Err(ApiConnectionError::NetworkError(_))));
}

#[tokio::test]
async fn test_unreachable_endpoint_falls_back_to_rules() {
    let settings = Settings {
        openrouter_api_key: Some("sk-or-test".to_string()),
        openrouter_base_url: "http://127.0.0.1:9/api/v1".to_string(),
        openrouter_timeout_secs: 2,
        ..Settings::default()
    };
    let recommender = AlternativeRecommender::from_settings(&settings);
    assert!(recommender.has_ai());

    let set = recommender.recommend(&cola_request()).await;
    assert_eq!(set.source, Provenance::RuleBasedFallback);
    assert_eq!(set.alternatives.len(), 4);
    assert_eq!(set.product_name, "Coca-Cola Classic");
    assert!(set.summary.contains("high sugar content (10.6g)"));
}

#[tokio::test]
async fn test_server_error_status_is_api_error() {
    let body = r#"{"error":{"message":"upstream exploded","code":500}}"#.to_string();
    let base_url = spawn_canned_server("500 Internal Server Error", body).await;
    let settings = local_settings(base_url);

    let provider = Provider::openrouter(&settings).expect("provider with key");
    let request = ChatCompletionRequest {
        model: provider.model().to_string(),
        messages: vec![ChatMessage::user("Hello")],
        response_format: None,
        temperature: None,
        max_tokens: None,
    };
    match provider.call_chat_completion(request).await {
        Err(ApiConnectionError::ApiError { status, error_body }) => {
            assert_eq!(status.as_u16(), 500);
            assert!(error_body.contains("upstream exploded"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }

    let set = AlternativeRecommender::from_settings(&settings)
        .recommend(&cola_request())
        .await;
    assert_eq!(set.source, Provenance::RuleBasedFallback);
    assert_eq!(set.alternatives.len(), 4);
}

#[tokio::test]
async fn test_non_json_reply_falls_back_to_rules() {
    let base_url = spawn_canned_server("200 OK", completion_with_content("not json")).await;
    let settings = local_settings(base_url);

    let generator = OpenRouterGenerator::from_settings(&settings).expect("generator with key");
    let result = generator.generate(&cola_request()).await;
    assert!(matches!(result, Err(GenerationError::Parse(_))));

    let set = AlternativeRecommender::from_settings(&settings)
        .recommend(&cola_request())
        .await;
    assert_eq!(set.source, Provenance::RuleBasedFallback);
    assert_eq!(set.alternatives.len(), 4);
    assert!(set.summary.contains("high sugar content (10.6g)"));
}

#[tokio::test]
async fn test_valid_reply_is_ai_powered() {
    let content = serde_json::json!({
        "summary": "Very high in sugar.",
        "alternatives": [
            { "name": "Sparkling Water", "brand": "Aqua", "why_better": "No sugar" },
            { "name": "Unsweetened Iced Tea", "key_benefits": ["No added sugar"] },
            { "name": "Kombucha", "brand": "Booch" }
        ]
    })
    .to_string();
    let base_url = spawn_canned_server("200 OK", completion_with_content(&content)).await;
    let settings = local_settings(base_url);

    let set = AlternativeRecommender::from_settings(&settings)
        .recommend(&cola_request())
        .await;
    assert_eq!(set.source, Provenance::AiPowered);
    assert_eq!(set.alternatives.len(), 3);
    assert_eq!(set.alternatives[0].name, "Sparkling Water");
    assert_eq!(set.alternatives[1].brand, "Generic");
    assert_eq!(set.general_tips.len(), 4);
}

#[tokio::test]
#[ignore]
async fn test_successful_json_object_call() {
    let settings = setup_test_environment();
    if !settings.has_api_key() {
        println!("Skipping test_successful_json_object_call: OPENROUTER_API_KEY not set.");
        return;
    }

    let provider = Provider::openrouter(&settings).expect("provider");
    let request = ChatCompletionRequest {
        model: provider.model().to_string(),
        messages: vec![ChatMessage::user(
            "Return a JSON object with a single key \"capital\" holding the capital of France.",
        )],
        response_format: Some(ResponseFormat::json_object()),
        temperature: Some(0.0),
        max_tokens: Some(100),
    };

    let result = provider.call_chat_completion(request).await;
    assert!(result.is_ok(), "API call failed: {:?}", result.err());
    let response = result.unwrap();
    let content = response.first_content().expect("non-empty content");
    assert!(content.to_lowercase().contains("paris"));
}

#[tokio::test]
#[ignore]
async fn test_live_ai_recommendations() {
    let settings = setup_test_environment();
    if !settings.has_api_key() {
        println!("Skipping test_live_ai_recommendations: OPENROUTER_API_KEY not set.");
        return;
    }

    let recommender = AlternativeRecommender::from_settings(&settings);
    let set = recommender.recommend(&cola_request()).await;
    assert!((3..=5).contains(&set.alternatives.len()));
    println!("Source: {:?}", set.source);
    for alternative in &set.alternatives {
        println!("  {} ({}): {}", alternative.name, alternative.brand, alternative.why_better);
    }
}
