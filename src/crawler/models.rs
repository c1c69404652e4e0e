use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Which listing category is being crawled. Selects the API category slug
/// and the label table used by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Rent,
    Sell,
}

impl ListingKind {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "rent" => Ok(Self::Rent),
            "sell" => Ok(Self::Sell),
            other => anyhow::bail!("unknown listing type: {other} (expected rent or sell)"),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Rent => "residential-rent",
            Self::Sell => "residential-sell",
        }
    }
}

/// Canonical field names the extractor may populate. Closed set; anything
/// the page shows outside of these is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Rahn,
    Rent,
    Convertable,
    SuitableFor,
    AdvBy,
    Floor,
    TotalPrice,
    MeterPrice,
    Space,
    Year,
    Rooms,
    Cabinet,
    Parking,
    Elevator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Price in millions of toman.
    Price(f64),
    Flag(bool),
}

/// Keys never set by any extraction rule are simply absent.
pub type FieldMap = HashMap<FieldKey, FieldValue>;

/// One fully-populated posting. Built in a single pass from the post page
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Listing {
    pub token: String,
    pub url: String,
    pub title: String,
    pub sub_title: Option<String>,
    pub description: String,
    /// Microsecond epoch of the batch this post arrived in; doubles as the
    /// pagination cursor.
    pub last_post_sort_date: i64,
    pub post_date: DateTime<Utc>,
    pub rahn: Option<f64>,
    pub rent: Option<f64>,
    pub total_price: Option<f64>,
    pub meter_price: Option<f64>,
    pub convertable: Option<String>,
    pub suitable_for: Option<String>,
    pub adv_by: Option<String>,
    pub floor: Option<String>,
    pub space: Option<String>,
    pub year: Option<String>,
    pub rooms: Option<String>,
    pub parking: bool,
    pub elevator: bool,
    pub cabinet: bool,
}

// --- List endpoint response ---
//
// Only the branches we read are modeled; everything else in the payload is
// ignored. Missing branches deserialize to None and the post is skipped.

#[derive(Debug, Deserialize)]
pub struct ListResponse {
    pub web_widgets: WebWidgets,
}

#[derive(Debug, Deserialize)]
pub struct WebWidgets {
    #[serde(default)]
    pub post_list: Vec<PostWidget>,
}

#[derive(Debug, Deserialize)]
pub struct PostWidget {
    #[serde(default)]
    pub data: PostData,
    #[serde(default)]
    pub action_log: Option<ActionLog>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostData {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActionLog {
    pub server_side_info: Option<ServerSideInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSideInfo {
    pub info: Option<ServerInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ServerInfo {
    pub extra_data: Option<ExtraData>,
}

#[derive(Debug, Deserialize)]
pub struct ExtraData {
    pub last_post_sort_date: Option<i64>,
}

impl ListResponse {
    pub fn tokens(&self) -> Vec<String> {
        self.web_widgets
            .post_list
            .iter()
            .filter_map(|w| w.data.token.clone())
            .collect()
    }

    /// Sort date of the most recent post in the batch. The list endpoint
    /// orders newest first, so the first entry carries the next cursor.
    pub fn last_post_sort_date(&self) -> Option<i64> {
        self.web_widgets
            .post_list
            .first()?
            .action_log
            .as_ref()?
            .server_side_info
            .as_ref()?
            .info
            .as_ref()?
            .extra_data
            .as_ref()?
            .last_post_sort_date
    }
}
