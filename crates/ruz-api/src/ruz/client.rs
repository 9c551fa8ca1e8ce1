//! `RuzClient` - RUZ API client implementation.

use std::sync::LazyLock;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::instrument;
use url::Url;

use super::api::LocalRuzApi;
use super::error::{Result, RuzError};
use super::params::{PersonType, ScheduleParams, SearchType, format_api_date};
use super::types::{Lesson, StudentInfo};

/// Base URL of the RUZ API.
pub const RUZ_BASE_URL: &str = "http://ruz.hse.ru/api/";

/// Environment variable enabling TLS certificate verification.
pub const VERIFY_SSL_ENV: &str = "RUZ_VERIFY_SSL";

/// Search endpoint.
const SEARCH_ENDPOINT: &str = "search";

/// Student info endpoint.
const STUDENT_INFO_ENDPOINT: &str = "studentinfo";

/// Schedule endpoint prefix.
const SCHEDULE_ENDPOINT: &str = "schedule";

/// Default User-Agent.
const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Number of body bytes included in trace logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Process-wide TLS verification flag, read once from [`VERIFY_SSL_ENV`].
///
/// Unset means verification is OFF.
static VERIFY_SSL: LazyLock<bool> = LazyLock::new(|| {
    std::env::var(VERIFY_SSL_ENV)
        .ok()
        .as_deref()
        .is_some_and(is_truthy)
});

/// Interprets a boolean-like environment value.
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// RUZ API client.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct RuzClient {
    /// HTTP client (no idle connection pooling).
    http_client: Client,
    /// Base URL, always ending with `/`.
    base_url: Url,
}

/// Builder for `RuzClient`.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct RuzClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
    verify_tls: Option<bool>,
}

impl RuzClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
            verify_tls: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the User-Agent (default: `ruz-api/<version>`).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Overrides the `RUZ_VERIFY_SSL` environment flag.
    #[must_use]
    pub const fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = Some(verify);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - The default base URL fails to parse.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<RuzClient> {
        let mut base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(RUZ_BASE_URL);
            result.map_err(|e| RuzError::InvalidArgument(format!("invalid base URL: {e}")))?
        };
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let verify_tls = self.verify_tls.unwrap_or(*VERIFY_SSL);
        if !verify_tls {
            tracing::warn!(
                env = VERIFY_SSL_ENV,
                "TLS certificate verification is disabled; set {VERIFY_SSL_ENV}=1 to enable it"
            );
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| String::from(DEFAULT_USER_AGENT));

        // Idle connections are never kept, so each call owns its connection.
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(RuzError::Client)?;

        Ok(RuzClient {
            http_client,
            base_url,
        })
    }
}

impl RuzClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> RuzClientBuilder {
        RuzClientBuilder::new()
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the `lng`/`start`/`finish` query for `schedule`.
    pub(crate) fn build_schedule_query(
        params: &ScheduleParams,
        today: chrono::NaiveDate,
    ) -> Result<Vec<(&'static str, String)>> {
        let (start, finish) = params.resolve_with_today(today)?;
        Ok(vec![
            ("lng", params.language.code().to_string()),
            ("start", format_api_date(start)),
            ("finish", format_api_date(finish)),
        ])
    }

    /// Sends a GET request and decodes the JSON body.
    ///
    /// A JSON object with an `error` key fails with [`RuzError::BadRequest`]
    /// whatever the HTTP status is.
    #[instrument(skip_all)]
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.base_url.join(path).map_err(|e| {
            RuzError::InvalidArgument(format!("failed to join URL path {path:?}: {e}"))
        })?;

        tracing::debug!(%url, "RUZ API request");

        let network_err = |source: reqwest::Error| RuzError::Network {
            path: String::from(path),
            source,
        };

        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(network_err)?;
        let status = response.status();
        let body = response.text().await.map_err(network_err)?;

        tracing::debug!(%path, %status, body_len = body.len(), "Response body received");
        tracing::trace!(
            %path,
            body_preview = body.get(..body.floor_char_boundary(BODY_PREVIEW_LEN)).unwrap_or_default(),
            "Response body preview"
        );

        let value: JsonValue = serde_json::from_str(&body).map_err(|source| RuzError::Decode {
            path: String::from(path),
            source,
        })?;

        if value.get("error").is_some() {
            tracing::warn!(%path, %status, "RUZ API returned an error payload");
            return Err(RuzError::BadRequest {
                path: String::from(path),
                status: status.as_u16(),
                payload: value,
            });
        }

        if !status.is_success() {
            tracing::warn!(%path, %status, "Non-success status with a JSON body");
        }

        serde_json::from_value(value).map_err(|source| RuzError::Decode {
            path: String::from(path),
            source,
        })
    }
}

impl LocalRuzApi for RuzClient {
    #[instrument(skip_all)]
    async fn search(&self, query: &str, search_type: SearchType) -> Result<Vec<JsonValue>> {
        let query = [
            ("term", String::from(query)),
            ("type", String::from(search_type.as_str())),
        ];
        self.get_json(SEARCH_ENDPOINT, &query).await
    }

    #[instrument(skip_all)]
    async fn student_info(&self, email: &str) -> Result<StudentInfo> {
        let query = [("email", String::from(email))];
        self.get_json(STUDENT_INFO_ENDPOINT, &query).await
    }

    #[instrument(skip_all)]
    async fn schedule(
        &self,
        person_type: PersonType,
        person_id: u64,
        params: &ScheduleParams,
    ) -> Result<Vec<Lesson>> {
        let query = Self::build_schedule_query(params, chrono::Local::now().date_naive())?;
        let path = format!("{SCHEDULE_ENDPOINT}/{person_type}/{person_id}");
        tracing::debug!(%person_type, person_id, ?query, "Fetching schedule");
        self.get_json(&path, &query).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]
    #![allow(clippy::panic)]

    use chrono::NaiveDate;
    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;

    fn mock_client(mock_server: &wiremock::MockServer) -> RuzClient {
        let base_url = format!("{}/api/", mock_server.uri());
        RuzClient::builder()
            .base_url(base_url.parse().unwrap())
            .user_agent("test/0.0.0")
            .verify_tls(true)
            .build()
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_builder_default_base_url() {
        // Arrange & Act
        let client = RuzClient::builder().verify_tls(true).build().unwrap();

        // Assert
        assert_eq!(client.base_url().as_str(), RUZ_BASE_URL);
    }

    #[test]
    fn test_builder_appends_trailing_slash() {
        // Arrange
        let url = Url::parse("http://localhost:8080/api").unwrap();

        // Act
        let client = RuzClient::builder()
            .base_url(url)
            .verify_tls(true)
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/api/");
        assert_eq!(
            client.base_url().join("search").unwrap().as_str(),
            "http://localhost:8080/api/search"
        );
    }

    #[test]
    fn test_builder_warns_when_tls_verification_disabled() {
        let (subscriber, handle) = subscriber::mock()
            .event(expect::event().at_level(tracing::Level::WARN))
            .run_with_handle();

        with_default(subscriber, || {
            RuzClient::builder().verify_tls(false).build().unwrap();
        });

        handle.assert_finished();
    }

    #[test]
    fn test_builder_silent_when_tls_verification_enabled() {
        let (subscriber, handle) = subscriber::mock().only().run_with_handle();

        with_default(subscriber, || {
            RuzClient::builder().verify_tls(true).build().unwrap();
        });

        handle.assert_finished();
    }

    #[test]
    fn test_is_truthy() {
        for v in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(is_truthy(v), "{v}");
        }
        for v in ["", "0", "false", "no", "off", "enabled"] {
            assert!(!is_truthy(v), "{v}");
        }
    }

    #[test]
    fn test_build_schedule_query_with_day_offset() {
        // Arrange
        let params = ScheduleParams::new().start(date(2021, 1, 1)).days(3);

        // Act
        let query = RuzClient::build_schedule_query(&params, date(2030, 1, 1)).unwrap();

        // Assert
        assert_eq!(
            query,
            vec![
                ("lng", String::from("1")),
                ("start", String::from("2021.01.01")),
                ("finish", String::from("2021.01.04")),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/ruz/search_student.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/search"))
            .and(wiremock::matchers::query_param("term", "Иванов"))
            .and(wiremock::matchers::query_param("type", "student"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server);

        // Act
        let results = client
            .search("Иванов", SearchType::default())
            .await
            .unwrap();

        // Assert
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["label"], "Иванов Иван Иванович");
    }

    #[tokio::test]
    async fn test_search_sends_auditorium_type() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/search"))
            .and(wiremock::matchers::query_param("type", "auditorium"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server);

        // Act
        let results = client.search("301", SearchType::Auditorium).await.unwrap();

        // Assert
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_student_info_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/ruz/student_info.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/studentinfo"))
            .and(wiremock::matchers::query_param("email", "iivanov@edu.hse.ru"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server);

        // Act
        let info = client.student_info("iivanov@edu.hse.ru").await.unwrap();

        // Assert
        assert_eq!(info.id, 123_456);
        assert_eq!(info.uns.as_deref(), Some("180001"));
    }

    #[tokio::test]
    async fn test_schedule_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/ruz/schedule_student.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/schedule/student/12345"))
            .and(wiremock::matchers::query_param("lng", "1"))
            .and(wiremock::matchers::query_param("start", "2021.01.01"))
            .and(wiremock::matchers::query_param("finish", "2021.01.04"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server);
        let params = ScheduleParams::new().start(date(2021, 1, 1)).days(3);

        // Act
        let lessons = client
            .schedule(PersonType::Student, 12345, &params)
            .await
            .unwrap();

        // Assert
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].discipline, "Алгоритмы и структуры данных (рус)");
        assert_eq!(lessons[1].campus(), "П");
    }

    #[tokio::test]
    async fn test_lecturer_schedule_in_english() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/schedule/lecturer/4455"))
            .and(wiremock::matchers::query_param("lng", "2"))
            .and(wiremock::matchers::query_param("start", "2021.09.01"))
            .and(wiremock::matchers::query_param("finish", "2021.09.08"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server);
        let params = ScheduleParams::new()
            .start(date(2021, 9, 1))
            .language(crate::ruz::Language::English);

        // Act
        let lessons = client
            .schedule(PersonType::Lecturer, 4455, &params)
            .await
            .unwrap();

        // Assert
        assert!(lessons.is_empty());
    }

    #[tokio::test]
    async fn test_error_payload_returns_bad_request() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let error_body = r#"{"error": "Студент не найден"}"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server);

        // Act
        let result = client.student_info("nobody@edu.hse.ru").await;

        // Assert
        match result {
            Err(RuzError::BadRequest {
                path,
                status,
                payload,
            }) => {
                assert_eq!(path, "studentinfo");
                assert_eq!(status, 200);
                assert_eq!(payload["error"], "Студент не найден");
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_payload_with_http_error_status() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(500).set_body_string(r#"{"error": "boom"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server);

        // Act
        let result = client.search("x", SearchType::Group).await;

        // Assert
        assert!(matches!(
            result,
            Err(RuzError::BadRequest { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_non_json_body_returns_decode_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"),
            )
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server);

        // Act
        let result = client.search("x", SearchType::Student).await;

        // Assert
        assert!(matches!(result, Err(RuzError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_unexpected_lesson_shape_returns_decode_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string(r#"[{"auditorium": "М 1/1"}]"#),
            )
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server);
        let params = ScheduleParams::new().start(date(2021, 1, 1));

        // Act
        let result = client.schedule(PersonType::Student, 1, &params).await;

        // Assert
        match result {
            Err(RuzError::Decode { path, .. }) => assert_eq!(path, "schedule/student/1"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_returns_network_error() {
        // Arrange: nothing listens on port 1
        let client = RuzClient::builder()
            .base_url(Url::parse("http://127.0.0.1:1/api/").unwrap())
            .verify_tls(true)
            .build()
            .unwrap();

        // Act
        let result = client.search("x", SearchType::Student).await;

        // Assert
        assert!(matches!(result, Err(RuzError::Network { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_client() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/search"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("[]"))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server);

        // Act
        let (a, b) = tokio::join!(
            client.search("a", SearchType::Student),
            client.search("b", SearchType::Lecturer),
        );

        // Assert
        assert!(a.unwrap().is_empty());
        assert!(b.unwrap().is_empty());
    }
}
