use crate::{VanError, VanResult};
use rand::Rng;
use reqwest::{header::HeaderMap, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// How many times a request is re-sent and how long each attempt may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub timeout: Duration,
    /// Delay before the first retry. Doubles on every following retry, plus
    /// up to one `base_delay` of random jitter.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            timeout: Duration::from_secs(30),
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn no_retries(timeout: Duration) -> Self {
        Self {
            retries: 0,
            timeout,
            base_delay: Duration::ZERO,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(attempt));
        let max_jitter = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let jitter = rand::thread_rng().gen_range(0..=max_jitter);
        backoff.saturating_add(Duration::from_millis(jitter))
    }
}

/// Transport failures, rate limiting and server errors are worth another try.
/// Anything else will fail the same way again.
fn is_retryable(error: &VanError) -> bool {
    match error {
        VanError::Transport(_) => true,
        VanError::StatusCode(status, _) => {
            status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
        }
        _ => false,
    }
}

/// Send a request, retrying per `policy`.
/// Throws error on any status other than `expected`.
pub async fn send_with_retries<T: Serialize + ?Sized>(
    client: &Client,
    method: Method,
    url: &str,
    data: Option<&T>,
    headers: HeaderMap,
    expected: StatusCode,
    policy: &RetryPolicy,
) -> VanResult<Response> {
    let mut attempt = 0;
    loop {
        let result = send_once(
            client,
            method.clone(),
            url,
            data,
            headers.clone(),
            expected,
            policy.timeout,
        )
        .await;

        match result {
            Err(error) if attempt < policy.retries && is_retryable(&error) => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    %method,
                    url,
                    attempt = attempt + 1,
                    retries = policy.retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Retrying NGP VAN request after error: {error}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

async fn send_once<T: Serialize + ?Sized>(
    client: &Client,
    method: Method,
    url: &str,
    data: Option<&T>,
    headers: HeaderMap,
    expected: StatusCode,
    timeout: Duration,
) -> VanResult<Response> {
    let mut request = client.request(method, url).headers(headers).timeout(timeout);
    if let Some(data) = data {
        request = request.json(data);
    }

    let response = request.send().await?;
    if response.status() == expected {
        Ok(response)
    } else {
        Err(VanError::StatusCode(
            response.status(),
            response.text().await.unwrap_or_default(),
        ))
    }
}

/// GET a JSON resource. Only 200 counts as success.
pub async fn get_json<R: DeserializeOwned>(
    client: &Client,
    url: &str,
    headers: HeaderMap,
    policy: &RetryPolicy,
) -> VanResult<R> {
    let response = send_with_retries::<()>(
        client,
        Method::GET,
        url,
        None,
        headers,
        StatusCode::OK,
        policy,
    )
    .await?;
    Ok(response.json::<R>().await?)
}

/// POST a JSON body, discarding the response body.
pub async fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    data: &T,
    headers: HeaderMap,
    expected: StatusCode,
    policy: &RetryPolicy,
) -> VanResult<()> {
    send_with_retries(
        client,
        Method::POST,
        url,
        Some(data),
        headers,
        expected,
        policy,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retried() {
        assert!(is_retryable(&VanError::StatusCode(
            StatusCode::SERVICE_UNAVAILABLE,
            String::new()
        )));
        assert!(is_retryable(&VanError::StatusCode(
            StatusCode::TOO_MANY_REQUESTS,
            String::new()
        )));
        assert!(!is_retryable(&VanError::StatusCode(
            StatusCode::BAD_REQUEST,
            String::new()
        )));
        assert!(!is_retryable(&VanError::StatusCode(StatusCode::OK, String::new())));
        assert!(!is_retryable(&VanError::MissingCredentials(vec![
            "NGP_VAN_API_KEY"
        ])));
    }

    #[test]
    fn delay_backs_off_exponentially_with_bounded_jitter() {
        let policy = RetryPolicy {
            retries: 3,
            timeout: Duration::from_secs(1),
            base_delay: Duration::from_millis(10),
        };

        for attempt in 0..3 {
            let delay = policy.delay(attempt);
            let floor = Duration::from_millis(10 * 2_u64.pow(attempt));
            assert!(delay >= floor, "{delay:?} < {floor:?}");
            assert!(delay <= floor + Duration::from_millis(10));
        }
    }

    #[test]
    fn no_retries_has_no_delay() {
        let policy = RetryPolicy::no_retries(Duration::from_secs(5));

        assert_eq!(policy.retries, 0);
        assert_eq!(policy.delay(0), Duration::ZERO);
    }
}
