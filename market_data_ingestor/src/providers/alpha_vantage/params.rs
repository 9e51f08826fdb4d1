use crate::models::interval::IntradayInterval;

/// Alpha Vantage query functions used by the sync engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Overview,
    TimeSeriesDaily,
    TimeSeriesIntraday,
}

impl Function {
    pub fn as_str(self) -> &'static str {
        match self {
            Function::Overview => "OVERVIEW",
            Function::TimeSeriesDaily => "TIME_SERIES_DAILY",
            Function::TimeSeriesIntraday => "TIME_SERIES_INTRADAY",
        }
    }
}

/// Builds the query string for one request, minus the API key.
///
/// Series requests always ask for `outputsize=full`; the merge walk decides
/// how much of the history is new.
pub fn construct_params(
    function: Function,
    symbol: &str,
    interval: Option<IntradayInterval>,
) -> Vec<(String, String)> {
    let mut query = vec![
        ("function".to_string(), function.as_str().to_string()),
        ("symbol".to_string(), symbol.to_string()),
    ];

    match function {
        Function::Overview => {}
        Function::TimeSeriesDaily => {
            query.push(("outputsize".to_string(), "full".to_string()));
        }
        Function::TimeSeriesIntraday => {
            let interval = interval.unwrap_or_default();
            query.push(("interval".to_string(), interval.as_str().to_string()));
            query.push(("outputsize".to_string(), "full".to_string()));
        }
    }

    query
}
