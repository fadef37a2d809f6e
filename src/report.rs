use crate::filters::{Filter, FilterSet};
use crate::listings_client::{self, ListingsClient};
use crate::schemas::listings_response::ListingsResponse;
use crate::settings::{ApiSettings, RetrySettings};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Turns fetched listings into output lines.
///
/// Without filters every response is rendered as its pretty-printed body.
/// With filters only matching requisitions are rendered, one JSON line each,
/// and a requisition id is rendered at most once over the reporter's lifetime.
pub struct Reporter {
    filters: Option<FilterSet<Filter>>,
    seen: HashSet<String>,
}

impl Reporter {
    pub fn new(filters: Option<FilterSet<Filter>>) -> Self {
        Self {
            filters,
            seen: HashSet::new(),
        }
    }

    pub fn lines(&mut self, response: &ListingsResponse) -> Result<Vec<String>, serde_json::Error> {
        let payload = response.payload();
        info!(
            "Fetched listings at {} in {}ms on attempt {}: {} body with {} entries",
            response.fetched_at.to_rfc3339(),
            response.elapsed_ms,
            response.attempt + 1,
            payload.kind(),
            payload.entries().len()
        );
        info!("Listings body: {}", response.body);

        let Some(filters) = &self.filters else {
            return Ok(vec![serde_json::to_string_pretty(&response.body)?]);
        };

        let (requisitions, skipped) = payload.requisitions();
        if skipped > 0 {
            warn!("{} listing entries could not be read as requisitions", skipped);
        }

        let selected = filters.select(&requisitions);
        let total = selected.len();
        let mut lines = Vec::new();
        for requisition in selected {
            if !self.seen.insert(requisition.id.clone()) {
                continue;
            }
            debug!(
                "Match {}: grade {} at {:.2}% for {}",
                requisition.id,
                requisition.grade.as_str(),
                requisition.interest_rate,
                requisition.destination.as_str()
            );
            lines.push(serde_json::to_string(requisition)?);
        }

        info!(
            "{} of {} requisitions match the filters ({} new)",
            total,
            requisitions.len(),
            lines.len()
        );
        Ok(lines)
    }
}

/// Fetches and reports the listings every `interval` until `shutdown`
/// resolves. Shutdown is honoured during a fetch as well as between fetches;
/// fetch errors are logged and polling goes on.
pub async fn poll_listings<S, E>(
    client: &ListingsClient,
    api: &ApiSettings,
    retry: &RetrySettings,
    interval: Duration,
    reporter: &mut Reporter,
    shutdown: S,
    mut emit: E,
) -> Result<(), serde_json::Error>
where
    S: Future,
    E: FnMut(String),
{
    let mut shutdown = Box::pin(shutdown);

    loop {
        tokio::select! {
            result = listings_client::fetch_listings(client, api, retry) => {
                match result {
                    Ok(response) => reporter.lines(&response)?.into_iter().for_each(&mut emit),
                    Err(e) => error!(
                        "Listings fetch failed: {}. Retrying in {}s...",
                        e,
                        interval.as_secs()
                    ),
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted during fetch, stopping");
                return Ok(());
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => {
                info!("Interrupted, stopping");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::requisition::Grade;
    use chrono::Utc;
    use serde_json::{json, Value};

    fn response(body: Value) -> ListingsResponse {
        ListingsResponse {
            body,
            attempt: 0,
            fetched_at: Utc::now(),
            elapsed_ms: 12,
        }
    }

    fn listing(id: &str, grade: &str) -> Value {
        json!({
            "id": id,
            "url": format!("https://app.example.com/requisitions/{}", id),
            "grade": grade,
            "interest_rate": 14.0,
            "score": 700,
            "destination": "Negocio",
            "term": 12,
            "amount": 20000.0,
            "remaining_funding_amount": 4000.0,
            "loan_number": 1
        })
    }

    fn ids(lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .map(|line| serde_json::from_str::<Value>(line).unwrap()["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn without_filters_renders_the_raw_body() {
        let mut reporter = Reporter::new(None);
        let body = json!({"data": [listing("a", "A1")], "total": 1});

        let lines = reporter.lines(&response(body.clone())).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(serde_json::from_str::<Value>(&lines[0]).unwrap(), body);
        // No de-duplication of raw bodies
        assert_eq!(reporter.lines(&response(body)).unwrap().len(), 1);
    }

    #[test]
    fn repeated_ids_are_reported_once() {
        let filters = FilterSet {
            filters: vec![Filter {
                maximum_risk_grade: Some(Grade::B7),
                ..Filter::default()
            }],
        };
        let mut reporter = Reporter::new(Some(filters));

        let first = reporter
            .lines(&response(json!([listing("a", "A1"), listing("b", "B2"), listing("x", "C3")])))
            .unwrap();
        assert_eq!(ids(&first), vec!["a", "b"]);

        let second = reporter
            .lines(&response(json!([listing("b", "B2"), listing("c", "A4"), listing("a", "A1")])))
            .unwrap();
        assert_eq!(ids(&second), vec!["c"]);
    }

    fn api_for(server: &wiremock::MockServer) -> ApiSettings {
        ApiSettings {
            base_url: server.uri(),
            app_url: "https://app.example.com/".to_string(),
            cookie: String::new(),
            user_agent: None,
            request_timeout_secs: 30,
        }
    }

    fn no_retry() -> RetrySettings {
        RetrySettings {
            retry_attempts: 0,
            base_delay_ms: 1,
            max_delay_secs: 1,
        }
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_slow_fetch() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(20)),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let client = ListingsClient::new(&api).unwrap();
        let mut reporter = Reporter::new(None);
        let mut emitted = Vec::new();

        let polled = tokio::time::timeout(
            Duration::from_secs(5),
            poll_listings(
                &client,
                &api,
                &no_retry(),
                Duration::from_secs(60),
                &mut reporter,
                tokio::time::sleep(Duration::from_millis(100)),
                |line| emitted.push(line),
            ),
        )
        .await;

        assert!(matches!(polled, Ok(Ok(()))));
        assert!(emitted.is_empty());
    }

    #[tokio::test]
    async fn polls_until_shutdown_and_deduplicates() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([listing("a", "A1")])),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let client = ListingsClient::new(&api).unwrap();
        let mut reporter = Reporter::new(Some(FilterSet {
            filters: vec![Filter::default()],
        }));
        let mut emitted = Vec::new();

        poll_listings(
            &client,
            &api,
            &no_retry(),
            Duration::from_millis(20),
            &mut reporter,
            tokio::time::sleep(Duration::from_millis(300)),
            |line| emitted.push(line),
        )
        .await
        .unwrap();

        assert!(server.received_requests().await.unwrap().len() >= 2);
        assert_eq!(ids(&emitted), vec!["a"]);
    }

    #[test]
    fn empty_filter_set_reports_nothing() {
        let mut reporter = Reporter::new(Some(FilterSet { filters: vec![] }));
        let lines = reporter.lines(&response(json!([listing("a", "A1")]))).unwrap();
        assert!(lines.is_empty());
    }
}
