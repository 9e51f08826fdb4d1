use std::sync::Arc;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::ResultExt;
use std::num::NonZeroU32;
use tracing::debug;

use crate::{
    models::{bar::RawBar, interval::IntradayInterval, overview::RawOverview},
    providers::{
        ClientBuildSnafu, MissingEnvVarSnafu, ProviderError, ProviderInitError, ReqwestSnafu,
        TimeSeriesSource,
        alpha_vantage::{
            params::{Function, construct_params},
            response::{SeriesLayout, parse_overview, parse_series},
        },
    },
};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

pub struct AlphaVantageProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl AlphaVantageProvider {
    /// Creates a new Alpha Vantage provider.
    ///
    /// Reads the API key from the `ALPHAVANTAGE_API_KEY` environment variable
    /// and paces requests at the free-tier rate of 5 per minute.
    pub fn new() -> Result<Self, ProviderInitError> {
        Self::from_env(API_KEY_ENV)
    }

    /// Same as [`AlphaVantageProvider::new`] with a custom variable name.
    pub fn from_env(var: &str) -> Result<Self, ProviderInitError> {
        let key = get_env_var(var).context(MissingEnvVarSnafu)?;
        Self::with_api_key(SecretString::new(key.into()))
    }

    pub fn with_api_key(api_key: SecretString) -> Result<Self, ProviderInitError> {
        let client = Client::builder().build().context(ClientBuildSnafu)?;
        let limiter = RateLimiter::direct(Quota::per_minute(nonzero!(5u32)));
        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
            limiter: Some(Arc::new(limiter)),
        })
    }

    /// Points the provider at another endpoint (a proxy or a local fake).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides client-side pacing. `0` disables the limiter.
    pub fn with_requests_per_minute(mut self, per_minute: u32) -> Self {
        self.limiter = NonZeroU32::new(per_minute)
            .map(|n| Arc::new(RateLimiter::direct(Quota::per_minute(n))));
        self
    }

    async fn query(
        &self,
        function: Function,
        symbol: &str,
        interval: Option<IntradayInterval>,
    ) -> Result<String, ProviderError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let mut query_params = construct_params(function, symbol, interval);
        query_params.push(("apikey".to_string(), self.api_key.expose_secret().to_string()));

        debug!(function = function.as_str(), symbol, "alpha vantage request");
        let response = self
            .client
            .get(&self.base_url)
            .query(&query_params)
            .send()
            .await
            .context(ReqwestSnafu)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(ProviderError::api(format!("{status}: {error_msg}")));
        }

        response.text().await.context(ReqwestSnafu)
    }
}

#[async_trait]
impl TimeSeriesSource for AlphaVantageProvider {
    async fn fetch_overview(&self, symbol: &str) -> Result<RawOverview, ProviderError> {
        let body = self.query(Function::Overview, symbol, None).await?;
        parse_overview(&body)
    }

    async fn fetch_daily(&self, symbol: &str) -> Result<Vec<RawBar>, ProviderError> {
        let body = self.query(Function::TimeSeriesDaily, symbol, None).await?;
        parse_series(&body, SeriesLayout::Daily)
    }

    async fn fetch_intraday(
        &self,
        symbol: &str,
        interval: IntradayInterval,
    ) -> Result<Vec<RawBar>, ProviderError> {
        let body = self
            .query(Function::TimeSeriesIntraday, symbol, Some(interval))
            .await?;
        parse_series(&body, SeriesLayout::Intraday)
    }
}
