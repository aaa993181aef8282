// External crates
use anyhow::{Context, Result};
use binance_sdk::common::models::Interval as binance_interval;
use binance_sdk::config::ConfigurationRestApi;
use binance_sdk::models::RestApiRateLimit;
use binance_sdk::spot::{
    SpotRestApi,
    rest_api::{KlinesIntervalEnum, KlinesItemInner, KlinesParams, RestApi},
};
use binance_sdk::{errors, errors::ConnectorError as connection_error};
use chrono::Utc;
use thiserror::Error;
use tokio::time::{Duration, sleep};

// Local crates
use crate::config::binance::{BINANCE, BinanceApiConfig};
#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::domain::Bar;
use crate::utils::TimeUtils;

#[derive(Debug, Error)]
pub enum KlineError {
    #[error("Invalid length")]
    InvalidLength,
    #[error("Invalid type: {0}")]
    InvalidType(String),
    #[error("Binance API connection failed: {0}.")]
    ConnectionFailed(String),
    #[error("Unsupported interval: {0}ms")]
    UnsupportedInterval(i64),
}

pub fn try_interval_from_ms(ms: i64) -> Result<KlinesIntervalEnum, KlineError> {
    match ms {
        TimeUtils::MS_IN_S => Ok(KlinesIntervalEnum::Interval1s),
        TimeUtils::MS_IN_MIN => Ok(KlinesIntervalEnum::Interval1m),
        TimeUtils::MS_IN_3_MIN => Ok(KlinesIntervalEnum::Interval3m),
        TimeUtils::MS_IN_5_MIN => Ok(KlinesIntervalEnum::Interval5m),
        TimeUtils::MS_IN_15_MIN => Ok(KlinesIntervalEnum::Interval15m),
        TimeUtils::MS_IN_30_MIN => Ok(KlinesIntervalEnum::Interval30m),
        TimeUtils::MS_IN_H => Ok(KlinesIntervalEnum::Interval1h),
        TimeUtils::MS_IN_2_H => Ok(KlinesIntervalEnum::Interval2h),
        TimeUtils::MS_IN_4_H => Ok(KlinesIntervalEnum::Interval4h),
        TimeUtils::MS_IN_6_H => Ok(KlinesIntervalEnum::Interval6h),
        TimeUtils::MS_IN_8_H => Ok(KlinesIntervalEnum::Interval8h),
        TimeUtils::MS_IN_12_H => Ok(KlinesIntervalEnum::Interval12h),
        TimeUtils::MS_IN_D => Ok(KlinesIntervalEnum::Interval1d),
        TimeUtils::MS_IN_3_D => Ok(KlinesIntervalEnum::Interval3d),
        TimeUtils::MS_IN_W => Ok(KlinesIntervalEnum::Interval1w),
        TimeUtils::MS_IN_1_M => Ok(KlinesIntervalEnum::Interval1M),
        _ => Err(KlineError::UnsupportedInterval(ms)),
    }
}

// Prices and volumes arrive as strings
fn string_item_to_float(item: Option<KlinesItemInner>, field: &str) -> Result<f64, KlineError> {
    match item {
        Some(KlinesItemInner::String(s)) => s
            .parse::<f64>()
            .map_err(|_| KlineError::InvalidType(format!("{field} = '{s}'"))),
        Some(_) => Err(KlineError::InvalidType(field.to_string())),
        None => Err(KlineError::InvalidLength),
    }
}

impl TryFrom<Vec<KlinesItemInner>> for Bar {
    type Error = KlineError;

    fn try_from(vec_inner_klines: Vec<KlinesItemInner>) -> Result<Self, Self::Error> {
        let mut items = vec_inner_klines.into_iter();
        let open_time_ms = match items.next().ok_or(KlineError::InvalidLength)? {
            KlinesItemInner::Integer(a) => a,
            _ => return Err(KlineError::InvalidType("open_time".to_string())),
        };
        let open = string_item_to_float(items.next(), "open")?;
        let high = string_item_to_float(items.next(), "high")?;
        let low = string_item_to_float(items.next(), "low")?;
        let close = string_item_to_float(items.next(), "close")?;
        let volume = string_item_to_float(items.next(), "volume")?;

        Ok(Bar::new(open_time_ms, open, high, low, close, volume))
    }
}

fn convert_klines(data: Vec<Vec<KlinesItemInner>>) -> Result<Vec<Bar>, KlineError> {
    data.into_iter().map(Bar::try_from).collect()
}

async fn configure_binance_client() -> Result<RestApi, anyhow::Error> {
    let config = BinanceApiConfig::default();
    let rest_conf = ConfigurationRestApi::builder()
        .timeout(config.timeout_ms)
        .retries(config.retries)
        .backoff(config.backoff_ms)
        .build()?;
    // Create the Spot REST API client
    let rest_client = SpotRestApi::production(rest_conf);
    Ok(rest_client)
}

/// Seconds until the next minute starts, when Binance resets the weight counter.
fn secs_to_next_minute(now_secs: i64) -> u64 {
    let secs_into_min = now_secs.rem_euclid(60) as u64;
    if secs_into_min == 0 { 60 } else { 60 - secs_into_min }
}

async fn handle_rate_limits(
    rate_limits: &Option<Vec<RestApiRateLimit>>,
    symbol: &str,
    concurrent_kline_call_weight: u32,
    bn_weight_limit_minute: u32,
) {
    let Some(value) = rate_limits else {
        return;
    };
    for rate_limit in value {
        if rate_limit.interval_num == 1 && rate_limit.interval == binance_interval::Minute {
            let current_weight = rate_limit.count;
            let required_headroom =
                bn_weight_limit_minute.saturating_sub(concurrent_kline_call_weight);
            #[cfg(debug_assertions)]
            if DEBUG_FLAGS.print_fetch_progress {
                log::info!(
                    "Binance min-weight: {} (headroom: {})",
                    current_weight,
                    required_headroom
                );
            }
            if current_weight > required_headroom {
                let sleep_duration = Duration::from_secs(secs_to_next_minute(Utc::now().timestamp()));
                log::info!(
                    "{} Current weight ({}) > required headroom ({}), sleeping {:?}",
                    symbol,
                    current_weight,
                    required_headroom,
                    sleep_duration
                );
                sleep(sleep_duration).await;
            }
        }
    }
}

async fn fetch_binance_klines_with_limits(
    rest_client: &RestApi,
    params: KlinesParams,
    symbol: &str,
) -> Result<(Option<Vec<RestApiRateLimit>>, Vec<Vec<KlinesItemInner>>), anyhow::Error> {
    match rest_client.klines(params).await {
        Ok(r) => {
            let rate_limits = r.rate_limits.clone();
            let data = r.data().await?;
            Ok((rate_limits, data))
        }
        Err(e) => {
            if let Some(conn_err) = e.downcast_ref::<errors::ConnectorError>() {
                match conn_err {
                    connection_error::ConnectorClientError(msg) => {
                        log::error!("{} Client error: check request parameters. {}", symbol, msg);
                    }
                    connection_error::TooManyRequestsError(msg) => {
                        log::error!("{} Rate limit exceeded. {}", symbol, msg);
                    }
                    connection_error::RateLimitBanError(msg) => {
                        log::error!("{} IP address banned due to excessive rate limits. {}", symbol, msg);
                    }
                    errors::ConnectorError::ServerError { msg, status_code } => {
                        log::error!("{} Server error: {} (status code: {:?})", symbol, msg, status_code);
                    }
                    errors::ConnectorError::NetworkError(msg) => {
                        log::error!("{} Network error. {}", symbol, msg);
                    }
                    connection_error::BadRequestError(msg) => {
                        log::error!("{} Bad request. {}", symbol, msg);
                    }
                    other => {
                        log::error!("{} Unexpected connector error: {:?}", symbol, other);
                    }
                }
                Err(anyhow::Error::new(KlineError::ConnectionFailed(conn_err.to_string()))
                    .context(format!("Binance API call failed for {}", symbol)))
            } else {
                Err(anyhow::Error::new(KlineError::ConnectionFailed(e.to_string()))
                    .context(format!("Unexpected error during API call for {}", symbol)))
            }
        }
    }
}

/// Bars of `symbol` with open time in `[from_ms, to_ms]`, oldest first.
/// Pages forward from `from_ms`, `klines_limit` bars per call.
pub async fn load_bars(
    symbol: &str,
    interval_ms: i64,
    from_ms: i64,
    to_ms: i64,
    max_simultaneous_kline_calls: u32,
) -> Result<Vec<Bar>> {
    // Fail before any network work on a bad interval
    try_interval_from_ms(interval_ms)?;
    let rest_client = configure_binance_client().await?;

    let limit_klines_returned = BINANCE.limits.klines_limit;
    let concurrent_kline_call_weight =
        BINANCE.limits.kline_call_weight * max_simultaneous_kline_calls;
    let mut start_time = from_ms;
    let mut all_bars: Vec<Bar> = Vec::new();

    for _page in 0..BINANCE.limits.max_pages_per_fetch {
        let params = KlinesParams::builder(symbol.to_string(), try_interval_from_ms(interval_ms)?)
            .limit(limit_klines_returned)
            .start_time(Some(start_time))
            .end_time(Some(to_ms))
            .build()?;

        let (rate_limits, new_klines) =
            fetch_binance_klines_with_limits(&rest_client, params, symbol).await?;
        handle_rate_limits(
            &rate_limits,
            symbol,
            concurrent_kline_call_weight,
            BINANCE.limits.weight_limit_minute,
        )
        .await;

        let page = convert_klines(new_klines)
            .with_context(|| format!("{} convert_klines failed", symbol))?;
        let page_len = page.len();
        let Some(last) = page.last() else {
            break;
        };
        start_time = last.open_time_ms + interval_ms;
        all_bars.extend(page);

        if page_len < limit_klines_returned as usize || start_time > to_ms {
            break;
        }
    }

    Ok(all_bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(open_time: i64, close: &str) -> Vec<KlinesItemInner> {
        vec![
            KlinesItemInner::Integer(open_time),
            KlinesItemInner::String("1.0".to_string()),
            KlinesItemInner::String("2.0".to_string()),
            KlinesItemInner::String("0.5".to_string()),
            KlinesItemInner::String(close.to_string()),
            KlinesItemInner::String("1234.5".to_string()),
            KlinesItemInner::Integer(open_time + 59_999),
        ]
    }

    #[test]
    fn converts_raw_klines() {
        let bars = convert_klines(vec![raw(0, "1.5"), raw(60_000, "1.75")]).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1], Bar::new(60_000, 1.0, 2.0, 0.5, 1.75, 1234.5));
    }

    #[test]
    fn rejects_malformed_klines() {
        assert!(matches!(Bar::try_from(raw(0, "abc")), Err(KlineError::InvalidType(_))));
        assert!(matches!(Bar::try_from(Vec::new()), Err(KlineError::InvalidLength)));
        let mut bad_time = raw(0, "1.0");
        bad_time[0] = KlinesItemInner::String("0".to_string());
        assert!(matches!(Bar::try_from(bad_time), Err(KlineError::InvalidType(_))));
    }

    #[test]
    fn maps_intervals() {
        assert!(try_interval_from_ms(TimeUtils::MS_IN_H).is_ok());
        assert!(matches!(
            try_interval_from_ms(7),
            Err(KlineError::UnsupportedInterval(7))
        ));
    }

    #[test]
    fn waits_until_next_minute() {
        assert_eq!(secs_to_next_minute(120), 60);
        assert_eq!(secs_to_next_minute(125), 55);
        assert_eq!(secs_to_next_minute(179), 1);
    }
}
