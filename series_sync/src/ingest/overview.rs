//! Mapping of a vendor overview payload onto [`OverviewRow`].

use chrono::NaiveDateTime;
use market_data_ingestor::models::overview::RawOverview;

use crate::coerce;
use crate::models::OverviewRow;

pub(crate) fn overview_row(symbol: &str, raw: &RawOverview, now: NaiveDateTime) -> OverviewRow {
    let text = |name: &str| raw.field(name).and_then(coerce::text);
    let number = |name: &str| raw.field(name).and_then(coerce::number);

    OverviewRow {
        symbol: symbol.to_string(),
        name: text("Name"),
        asset_type: text("AssetType"),
        description: text("Description"),
        exchange: text("Exchange"),
        currency: text("Currency"),
        country: text("Country"),
        sector: text("Sector"),
        industry: text("Industry"),
        fiscal_year_end: text("FiscalYearEnd"),
        latest_quarter: raw.field("LatestQuarter").and_then(coerce::date),
        market_capitalization: raw.field("MarketCapitalization").and_then(coerce::integer),
        ebitda: number("EBITDA"),
        pe_ratio: number("PERatio"),
        peg_ratio: number("PEGRatio"),
        earnings_per_share: number("EPS"),
        revenue_per_share_ttm: number("RevenuePerShareTTM"),
        profit_margin: number("ProfitMargin"),
        operating_margin_ttm: number("OperatingMarginTTM"),
        return_on_assets_ttm: number("ReturnOnAssetsTTM"),
        return_on_equity_ttm: number("ReturnOnEquityTTM"),
        revenue_ttm: number("RevenueTTM"),
        gross_profit_ttm: number("GrossProfitTTM"),
        quarterly_earnings_growth_yoy: number("QuarterlyEarningsGrowthYOY"),
        quarterly_revenue_growth_yoy: number("QuarterlyRevenueGrowthYOY"),
        week_52_high: number("52WeekHigh"),
        week_52_low: number("52WeekLow"),
        last_refreshed: now,
    }
}
