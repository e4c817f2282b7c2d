use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;

pub type Client = ClientWithMiddleware;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
/// Transient failures (5xx, timeouts, connection errors) get exactly one more attempt.
pub const MAX_RETRIES: u32 = 1;

pub fn create_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let inner = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);
    Ok(ClientBuilder::new(inner)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}
