use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, REFERER};
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::Config;
use crate::crawler::models::ListResponse;

// The API rejects clients that do not look like a browser.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/106.0.0.0 Safari/537.36";

pub fn build_client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(REFERER, HeaderValue::from_static("https://divar.ir/"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .expect("failed to build http client")
}

/// One page of the list endpoint: POST with the search schema and the sort
/// date of the oldest batch seen so far as the cursor.
pub async fn fetch_list_page(
    client: &Client,
    cfg: &Config,
    cursor_us: i64,
) -> anyhow::Result<ListResponse> {
    let url = format!("{}/{}/{}", cfg.api_base, cfg.city, cfg.kind.category());
    let body = json!({
        "json_schema": list_schema(cfg),
        "last-post-date": cursor_us,
    });

    let res = client.post(&url).json(&body).send().await?;
    Ok(res.json::<ListResponse>().await?)
}

fn list_schema(cfg: &Config) -> Value {
    let mut schema = json!({
        "category": { "value": cfg.kind.category() },
        "cities": [cfg.city],
    });
    if !cfg.districts.is_empty() {
        schema["districts"] = json!({ "vacancies": cfg.districts });
    }
    schema
}

pub async fn fetch_post_html(client: &Client, url: &str) -> anyhow::Result<String> {
    let res = client.get(url).send().await?;
    Ok(res.text().await?)
}
