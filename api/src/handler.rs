use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use common::{
    format::{format_change_pct, format_price_axis, format_time_label, format_usd},
    models::{AssetSnapshot, HistorySample, TimeRange},
    Error as CommonError,
};
use serde::{Deserialize, Serialize};
use synchronizer::{SyncHandle, ViewModel};
use tracing::{debug, error};

// Wrapper so common::Error can be turned into a response
pub struct ApiError(CommonError);

impl From<CommonError> for ApiError {
    fn from(err: CommonError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            CommonError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            CommonError::ParseError(msg) => (StatusCode::BAD_REQUEST, msg),
            CommonError::ApiError { status, body } => (
                StatusCode::BAD_GATEWAY,
                format!("Market data API error: {} - {}", status, body),
            ),
            CommonError::HttpError(e) => (
                StatusCode::BAD_GATEWAY,
                format!("External API request failed: {}", e),
            ),
            CommonError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            CommonError::InternalError(msg) => {
                error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// Current view model: listing, selection, range and chart series
pub async fn get_view(State(sync): State<SyncHandle>) -> Json<ViewModel> {
    Json(sync.view())
}

#[derive(Debug, Deserialize)]
pub struct AssetQuery {
    pub search: Option<String>,
}

// Asset picker: listing filtered by name or symbol
pub async fn list_assets(
    State(sync): State<SyncHandle>,
    Query(query): Query<AssetQuery>,
) -> Json<Vec<AssetSnapshot>> {
    let term = query.search.unwrap_or_default();
    Json(sync.filtered_assets(&term))
}

#[derive(Debug, Serialize)]
pub struct RangeOption {
    pub range: TimeRange,
    pub active: bool,
}

pub async fn list_ranges(State(sync): State<SyncHandle>) -> Json<Vec<RangeOption>> {
    let current = sync.view().time_range;
    let ranges = TimeRange::ALL
        .into_iter()
        .map(|range| RangeOption {
            range,
            active: range == current,
        })
        .collect();
    Json(ranges)
}

#[derive(Debug, Serialize)]
pub struct TickerRow {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub icon_ref: String,
    pub price: String,
    pub change_24h: String,
    pub rising: bool,
    pub market_cap: String,
    pub selected: bool,
}

fn ticker_row(asset: &AssetSnapshot, selection: Option<&str>) -> TickerRow {
    TickerRow {
        id: asset.id.clone(),
        name: asset.name.clone(),
        symbol: asset.symbol.to_uppercase(),
        icon_ref: asset.icon_ref.clone(),
        price: format_usd(asset.price),
        change_24h: format_change_pct(asset.change_24h_pct),
        rising: asset.change_24h_pct >= 0.0,
        market_cap: format_usd(asset.market_cap),
        selected: selection == Some(asset.id.as_str()),
    }
}

// Displayed assets as formatted table rows
pub async fn list_tickers(State(sync): State<SyncHandle>) -> Json<Vec<TickerRow>> {
    let view = sync.view();
    let selection = view.selection.as_deref();
    let rows = view
        .displayed_assets
        .iter()
        .map(|asset| ticker_row(asset, selection))
        .collect();
    Json(rows)
}

#[derive(Debug, Serialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub time_label: String,
    pub price_label: String,
    /// Full price for the hover tooltip
    pub price_usd: String,
}

fn chart_point(sample: HistorySample, range: TimeRange) -> ChartPoint {
    ChartPoint {
        timestamp: sample.timestamp,
        price: sample.price,
        time_label: format_time_label(sample.timestamp, range),
        price_label: format_price_axis(sample.price),
        price_usd: format_usd(sample.price),
    }
}

#[derive(Debug, Serialize)]
pub struct Chart {
    pub asset_id: Option<String>,
    pub range: TimeRange,
    pub loading: bool,
    pub points: Vec<ChartPoint>,
}

// History series with axis labels for the current range
pub async fn get_chart(State(sync): State<SyncHandle>) -> Json<Chart> {
    let view = sync.view();
    let range = view.time_range;

    let points = view
        .history
        .map(|series| {
            series
                .samples
                .into_iter()
                .map(|sample| chart_point(sample, range))
                .collect()
        })
        .unwrap_or_default();

    Json(Chart {
        asset_id: view.selection,
        range,
        loading: view.is_history_loading,
        points,
    })
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub asset_id: String,
}

pub async fn put_selection(
    State(sync): State<SyncHandle>,
    Json(body): Json<SelectionRequest>,
) -> Result<Json<ViewModel>, ApiError> {
    debug!("Selecting asset {}", body.asset_id);
    sync.select(body.asset_id).await?;
    Ok(Json(sync.view()))
}

#[derive(Debug, Deserialize)]
pub struct RangeRequest {
    pub range: String,
}

pub async fn put_range(
    State(sync): State<SyncHandle>,
    Json(body): Json<RangeRequest>,
) -> Result<Json<ViewModel>, ApiError> {
    let range: TimeRange = body.range.parse()?;
    debug!("Switching time range to {}", range);
    sync.set_range(range).await?;
    Ok(Json(sync.view()))
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub id: String,
    pub displayed: bool,
}

pub async fn toggle_display(
    State(sync): State<SyncHandle>,
    Path(asset_id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let displayed = sync.toggle_display(asset_id.clone()).await?;
    Ok(Json(ToggleResponse {
        id: asset_id,
        displayed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_codes() {
        let cases = [
            (CommonError::NotFound("doge".into()), StatusCode::NOT_FOUND),
            (CommonError::ParseError("2W".into()), StatusCode::BAD_REQUEST),
            (
                CommonError::ApiError {
                    status: 503,
                    body: String::new(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                CommonError::InternalError("stopped".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn ticker_rows_are_formatted() {
        let asset = AssetSnapshot {
            id: "bitcoin".into(),
            name: "Bitcoin".into(),
            symbol: "btc".into(),
            icon_ref: String::new(),
            price: 64321.5,
            change_24h_pct: -1.254,
            market_cap: 1_266_000_000_000.0,
        };

        let row = ticker_row(&asset, Some("bitcoin"));
        assert_eq!(row.symbol, "BTC");
        assert_eq!(row.price, "$64,321.50");
        assert_eq!(row.change_24h, "-1.25%");
        assert!(!row.rising);
        assert_eq!(row.market_cap, "$1,266,000,000,000.00");
        assert!(row.selected);

        assert!(!ticker_row(&asset, Some("ethereum")).selected);
    }

    #[test]
    fn chart_points_carry_axis_and_tooltip_labels() {
        use chrono::TimeZone;

        let sample = HistorySample {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 6, 14, 30, 0).unwrap(),
            price: 64321.5,
        };

        let point = chart_point(sample, TimeRange::OneDay);
        assert_eq!(point.time_label, "02:30 PM");
        assert_eq!(point.price_label, "$64.3k");
        assert_eq!(point.price_usd, "$64,321.50");
    }

    #[test]
    fn range_options_serialize_wire_labels() {
        let option = RangeOption {
            range: TimeRange::SixMonths,
            active: true,
        };
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json, serde_json::json!({ "range": "6M", "active": true }));
    }
}
