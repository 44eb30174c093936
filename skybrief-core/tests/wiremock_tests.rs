//! HTTP-level tests for the OpenWeather and completions clients using wiremock.

use std::time::Duration;

use skybrief_core::{
    NarrativeSource, Narrator, TextGenerator, WeatherError, WeatherProvider, WeatherService,
    build_snapshot, narrative::CompletionsClient, provider::openweather::OpenWeatherProvider,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

const API_KEY: &str = "test-key";

fn current_weather_body() -> serde_json::Value {
    serde_json::json!({
        "coord": {"lon": 13.41, "lat": 52.52},
        "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
        "base": "stations",
        "main": {
            "temp": 278.15,
            "feels_like": 275.4,
            "temp_min": 277.0,
            "temp_max": 279.3,
            "pressure": 1020,
            "humidity": 70
        },
        "visibility": 10000,
        "wind": {"speed": 3.6, "deg": 240},
        "dt": 1_705_320_000,
        "name": "Berlin",
        "cod": 200
    })
}

fn forecast_body() -> serde_json::Value {
    // Two 3-hour steps on 2024-01-15 and one on 2024-01-16 (UTC).
    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": 3,
        "list": [
            {"dt": 1_705_320_000, "main": {"temp": 278.15, "temp_min": 277.0, "temp_max": 279.0}, "weather": [{"description": "broken clouds"}]},
            {"dt": 1_705_330_800, "main": {"temp": 276.15, "temp_min": 275.0, "temp_max": 277.0}, "weather": [{"description": "broken clouds"}]},
            {"dt": 1_705_406_400, "main": {"temp": 274.15, "temp_min": 273.0, "temp_max": 275.0}, "weather": [{"description": "light snow"}]}
        ],
        "city": {"name": "Berlin", "timezone": 3600}
    })
}

fn weather_client(server: &MockServer, timeout: Duration) -> OpenWeatherProvider {
    #[allow(clippy::expect_used)]
    OpenWeatherProvider::with_settings(API_KEY.to_string(), &server.uri(), timeout)
        .expect("Failed to create client")
}

fn completions_client(server: &MockServer, timeout: Duration) -> CompletionsClient {
    #[allow(clippy::expect_used)]
    CompletionsClient::with_settings(
        "sk-test".to_string(),
        &server.uri(),
        "gpt-3.5-turbo-instruct",
        timeout,
    )
    .expect("Failed to create client")
}

// ============================================================================
// OpenWeather
// ============================================================================

#[tokio::test]
async fn current_weather_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Berlin"))
        .and(query_param("appid", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body()))
        .expect(1)
        .mount(&server)
        .await;

    let raw = weather_client(&server, Duration::from_secs(5))
        .current("Berlin")
        .await
        .unwrap();
    let snapshot = build_snapshot(&raw, "Berlin").unwrap();

    assert!((snapshot.temperature_c - 5.0).abs() < 1e-9);
    assert_eq!(snapshot.humidity_pct, 70);
    assert_eq!(snapshot.pressure_hpa, 1020);
    assert_eq!(snapshot.condition, "broken clouds");
}

#[tokio::test]
async fn unknown_city_body_is_passed_through_as_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&server)
        .await;

    let raw = weather_client(&server, Duration::from_secs(5))
        .current("Atlantis")
        .await
        .unwrap();
    let err = build_snapshot(&raw, "Atlantis").unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("city not found"));
}

#[tokio::test]
async fn non_json_error_body_reports_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = weather_client(&server, Duration::from_secs(5))
        .current("Berlin")
        .await
        .unwrap_err();

    match err {
        WeatherError::Provider { code, message } => {
            assert_eq!(code, "502");
            assert!(message.contains("Bad Gateway"));
        }
        other => panic!("Expected provider error, got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_success_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = weather_client(&server, Duration::from_secs(5))
        .current("Berlin")
        .await
        .unwrap_err();
    assert!(matches!(err, WeatherError::Parse(_)));
}

#[tokio::test]
async fn slow_provider_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_weather_body())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = weather_client(&server, Duration::from_millis(100))
        .current("Berlin")
        .await
        .unwrap_err();
    assert!(matches!(err, WeatherError::Network(_)), "got: {err:?}");
}

#[tokio::test]
async fn forecast_uses_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", "52.52"))
        .and(query_param("lon", "13.41"))
        .and(query_param("appid", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;

    let raw = weather_client(&server, Duration::from_secs(5))
        .forecast(52.52, 13.41)
        .await
        .unwrap();
    let days = skybrief_core::aggregate(&raw).unwrap();

    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date.to_string(), "2024-01-15");
    assert!((days[0].avg_temp_c - 4.0).abs() < 1e-9);
    assert_eq!(days[1].dominant_condition, "light snow");
}

// ============================================================================
// Completions
// ============================================================================

#[tokio::test]
async fn completion_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-3.5-turbo-instruct",
            "max_tokens": 80
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "cmpl-1",
            "object": "text_completion",
            "choices": [{"text": "\n\nIt is chilly and cloudy.", "index": 0, "finish_reason": "stop"}]
        })))
        .mount(&server)
        .await;

    let text = completions_client(&server, Duration::from_secs(5))
        .generate("Describe the weather.", 80)
        .await
        .unwrap();
    assert_eq!(text, "It is chilly and cloudy.");
}

#[tokio::test]
async fn completion_server_error_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = completions_client(&server, Duration::from_secs(5))
        .generate("Describe the weather.", 80)
        .await
        .unwrap_err();
    assert!(matches!(err, WeatherError::Provider { ref code, .. } if code == "429"));
}

#[tokio::test]
async fn completion_without_choices_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&server)
        .await;

    let err = completions_client(&server, Duration::from_secs(5))
        .generate("Describe the weather.", 80)
        .await
        .unwrap_err();
    assert!(matches!(err, WeatherError::Parse(_)));
}

// ============================================================================
// End to end
// ============================================================================

async fn mount_weather(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn report_with_generated_narrative() {
    let server = MockServer::start().await;
    mount_weather(&server).await;
    Mock::given(method("POST"))
        .and(path("/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"text": "Bring a warm coat."}]
        })))
        .mount(&server)
        .await;

    let narrator = Narrator::new(
        Box::new(completions_client(&server, Duration::from_secs(5))),
        80,
        Duration::from_secs(5),
    );
    let service = WeatherService::new(
        Box::new(weather_client(&server, Duration::from_secs(5))),
        narrator,
    );

    let report = service.report("Berlin").await.unwrap();
    let narrative = report.narrative.unwrap();
    assert_eq!(narrative.source, NarrativeSource::Generated);
    assert_eq!(narrative.text, "Bring a warm coat.");
    assert_eq!(report.forecast.unwrap().len(), 2);
}

#[tokio::test]
async fn report_falls_back_when_completion_times_out() {
    let server = MockServer::start().await;
    mount_weather(&server).await;
    Mock::given(method("POST"))
        .and(path("/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"choices": [{"text": "too late"}]}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let narrator = Narrator::new(
        Box::new(completions_client(&server, Duration::from_millis(100))),
        80,
        Duration::from_secs(5),
    );
    let service = WeatherService::new(
        Box::new(weather_client(&server, Duration::from_secs(5))),
        narrator,
    );

    let report = service.report("Berlin").await.unwrap();
    let narrative = report.narrative.unwrap();
    assert_eq!(narrative.source, NarrativeSource::Fallback);
    assert_eq!(
        narrative.text,
        "The weather in Berlin is broken clouds with a temperature of 5.0°C."
    );
    assert!(report.forecast.is_ok());
}
