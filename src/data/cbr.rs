//! HTTP client for the CBR daily rates endpoint.

use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::{Client, ClientBuilder};
use thiserror::Error;

use crate::domain::{ReportConfig, RetryPolicy};

/// Date format the endpoint expects in `date_req`.
pub const REQUEST_DATE_FORMAT: &str = "%d/%m/%Y";

const USER_AGENT: &str = concat!("cbr-rates/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request for {date} timed out")]
    Timeout { date: NaiveDate },
    #[error("request for {date} failed: {message}")]
    Transport { date: NaiveDate, message: String },
    #[error("request for {date} failed with status {status}")]
    Status { date: NaiveDate, status: u16 },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            FetchError::Client(_) => false,
        }
    }
}

/// Anything that can produce the raw daily document for a date.
///
/// `Sync` because dates are fetched from a worker pool.
pub trait RateSource: Sync {
    fn fetch(&self, date: NaiveDate) -> Result<Vec<u8>, FetchError>;
}

/// Blocking client for `XML_daily_eng.asp`.
pub struct CbrClient {
    client: Client,
    base_url: String,
    request_delay: Duration,
}

impl CbrClient {
    pub fn new(config: &ReportConfig) -> Result<Self, FetchError> {
        Self::with_builder(Client::builder(), config)
    }

    fn with_builder(builder: ClientBuilder, config: &ReportConfig) -> Result<Self, FetchError> {
        let client = builder
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            request_delay: config.request_delay,
        })
    }

    /// Full request URL for `date`.
    pub fn url_for(&self, date: NaiveDate) -> String {
        format!("{}?date_req={}", self.base_url, date.format(REQUEST_DATE_FORMAT))
    }
}

impl RateSource for CbrClient {
    fn fetch(&self, date: NaiveDate) -> Result<Vec<u8>, FetchError> {
        // Politeness delay towards cbr.ru.
        if !self.request_delay.is_zero() {
            thread::sleep(self.request_delay);
        }

        let url = self.url_for(date);
        log::debug!("GET {url}");

        let resp = self.client.get(&url).send().map_err(|e| classify(date, e))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                date,
                status: resp.status().as_u16(),
            });
        }

        let body = resp.bytes().map_err(|e| classify(date, e))?;
        Ok(body.to_vec())
    }
}

fn classify(date: NaiveDate, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout { date }
    } else {
        FetchError::Transport {
            date,
            message: err.to_string(),
        }
    }
}

/// Fetch `date`, retrying transient failures with exponential backoff.
pub fn fetch_with_retry(
    source: &dyn RateSource,
    date: NaiveDate,
    retry: &RetryPolicy,
) -> Result<Vec<u8>, FetchError> {
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match source.fetch(date) {
            Ok(bytes) => return Ok(bytes),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                attempt += 1;
                let wait = retry.backoff_before(attempt);
                log::warn!("{err}; retrying in {wait:?} (attempt {attempt}/{max_attempts})");
                thread::sleep(wait);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::sync::{Mutex, mpsc};

    /// Replays a fixed sequence of results, then keeps returning the last one.
    struct Scripted {
        results: Mutex<Vec<Result<Vec<u8>, FetchError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut results: Vec<Result<Vec<u8>, FetchError>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl RateSource for Scripted {
        fn fetch(&self, _date: NaiveDate) -> Result<Vec<u8>, FetchError> {
            *self.calls.lock().unwrap() += 1;
            let mut results = self.results.lock().unwrap();
            if results.len() > 1 {
                results.pop().unwrap()
            } else {
                results[0].clone()
            }
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()
    }

    fn no_wait(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::ZERO,
        }
    }

    #[test]
    fn retries_transient_failures_until_success() {
        let source = Scripted::new(vec![
            Err(FetchError::Timeout { date: day() }),
            Err(FetchError::Status { date: day(), status: 503 }),
            Ok(b"<ok/>".to_vec()),
        ]);
        let body = fetch_with_retry(&source, day(), &no_wait(3)).unwrap();
        assert_eq!(body, b"<ok/>");
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let source = Scripted::new(vec![Err(FetchError::Transport {
            date: day(),
            message: "connection reset".to_string(),
        })]);
        let err = fetch_with_retry(&source, day(), &no_wait(3)).unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let source = Scripted::new(vec![Err(FetchError::Status { date: day(), status: 404 })]);
        let err = fetch_with_retry(&source, day(), &no_wait(5)).unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn retryable_classification() {
        assert!(FetchError::Status { date: day(), status: 429 }.is_retryable());
        assert!(FetchError::Status { date: day(), status: 502 }.is_retryable());
        assert!(!FetchError::Status { date: day(), status: 400 }.is_retryable());
        assert!(!FetchError::Client("tls".to_string()).is_retryable());
    }

    /// Config pointing at a loopback server, with no delay before requests.
    fn local_config(addr: SocketAddr, timeout: Duration) -> ReportConfig {
        let mut config = ReportConfig::with_end_date(day());
        config.base_url = format!("http://{addr}/scripts/XML_daily_eng.asp");
        config.timeout = timeout;
        config.request_delay = Duration::ZERO;
        config
    }

    fn local_client(config: &ReportConfig) -> CbrClient {
        // Ignore any HTTP_PROXY in the environment.
        CbrClient::with_builder(Client::builder().no_proxy(), config).unwrap()
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut seen = Vec::new();
        let mut buf = [0u8; 1024];
        while let Ok(n) = stream.read(&mut buf) {
            if n == 0 {
                break;
            }
            seen.extend_from_slice(&buf[..n]);
            if seen.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        String::from_utf8_lossy(&seen).into_owned()
    }

    /// Answers a single request with `response` and hands back the request head.
    fn serve_once(response: &'static str) -> (SocketAddr, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let request = read_request(&mut stream);
                let _ = stream.write_all(response.as_bytes());
                let _ = tx.send(request);
            }
        });
        (addr, rx)
    }

    /// Accepts a single connection, reads the request and never answers.
    fn serve_silently(hold: Duration) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                read_request(&mut stream);
                thread::sleep(hold);
            }
        });
        addr
    }

    #[test]
    fn fetch_returns_body_on_success() {
        let (addr, requests) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/xml\r\nContent-Length: 10\r\nConnection: close\r\n\r\n<ValCurs/>",
        );
        let client = local_client(&local_config(addr, Duration::from_secs(5)));

        let body = client.fetch(day()).unwrap();
        assert_eq!(body, b"<ValCurs/>");

        let request = requests.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(
            request.starts_with("GET /scripts/XML_daily_eng.asp?date_req=03/02/2025 "),
            "unexpected request: {request}"
        );
    }

    #[test]
    fn server_error_status_is_retryable() {
        let (addr, _requests) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let client = local_client(&local_config(addr, Duration::from_secs(5)));

        let err = client.fetch(day()).unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }), "{err:?}");
        assert!(err.is_retryable());
    }

    #[test]
    fn not_found_status_is_not_retryable() {
        let (addr, _requests) =
            serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let client = local_client(&local_config(addr, Duration::from_secs(5)));

        let err = client.fetch(day()).unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }), "{err:?}");
        assert!(!err.is_retryable());
    }

    #[test]
    fn unanswered_request_times_out() {
        let addr = serve_silently(Duration::from_secs(3));
        let client = local_client(&local_config(addr, Duration::from_millis(200)));

        let err = client.fetch(day()).unwrap_err();
        assert!(matches!(err, FetchError::Timeout { date } if date == day()), "{err:?}");
        assert!(err.is_retryable());
    }

    #[test]
    fn url_uses_day_month_year() {
        let config = ReportConfig::with_end_date(day());
        let client = CbrClient::new(&config).unwrap();
        assert_eq!(
            client.url_for(day()),
            "https://www.cbr.ru/scripts/XML_daily_eng.asp?date_req=03/02/2025"
        );
    }
}
