//! Google Sheets backend
//!
//! Talks to the Sheets REST v4 API with a service account. Access tokens are
//! obtained with a signed JWT assertion and cached until shortly before they
//! expire.

use super::columns::COLUMN_COUNT;
use super::range::{RangeWrite, SheetRange};
use super::{SheetStore, StoreError};
use crate::config::GoogleSheetsConfig;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const TOKEN_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the token's reported expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    TOKEN_LIFETIME_SECS as u64
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetInfo {
    #[serde(default)]
    sheets: Vec<Value>,
}

pub struct GoogleSheetsStore {
    http_client: Client,
    config: GoogleSheetsConfig,
    signing_key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsStore {
    pub fn new(config: GoogleSheetsConfig, request_timeout: Duration) -> Result<Self, StoreError> {
        let signing_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("invalid service account private key: {e}")))?;

        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        info!(
            spreadsheet_id = %config.spreadsheet_id,
            sheet = %config.sheet_name,
            "Google Sheets store initialized"
        );

        Ok(Self {
            http_client,
            config,
            signing_key,
            token: Mutex::new(None),
        })
    }

    fn spreadsheet_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.spreadsheet_id
        )
    }

    fn a1(&self, range: &SheetRange) -> String {
        a1_range(&self.config.sheet_name, range)
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let iat = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.config.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.config.token_url,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| StoreError::Auth(format!("failed to sign token assertion: {e}")))?;

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!("token exchange returned {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Auth(format!("unreadable token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        debug!(expires_in = token.expires_in, "Obtained Sheets access token");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let token = self.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body["error"]["message"]
            .as_str()
            .unwrap_or("no error detail")
            .to_string();
        Err(StoreError::Rejected { status, message })
    }
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Unavailable(format!("request timed out: {err}"))
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

/// `'Sheet name'!A1:B2`, with embedded quotes doubled.
fn a1_range(sheet_name: &str, range: &SheetRange) -> String {
    format!("'{}'!{}", sheet_name.replace('\'', "''"), range)
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsStore {
    async fn sheet_count(&self) -> Result<usize, StoreError> {
        let request = self
            .http_client
            .get(self.spreadsheet_url())
            .query(&[("fields", "sheets.properties.sheetId")]);
        let info: SpreadsheetInfo = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Schema(format!("unreadable spreadsheet metadata: {e}")))?;
        Ok(info.sheets.len())
    }

    async fn read(&self, range: &SheetRange) -> Result<Vec<Vec<String>>, StoreError> {
        let url = format!(
            "{}/values/{}",
            self.spreadsheet_url(),
            urlencoding::encode(&self.a1(range))
        );
        let request = self
            .http_client
            .get(url)
            .query(&[("majorDimension", "ROWS")]);
        let body: ValueRange = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("unreadable values response: {e}")))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn write_batch(&self, writes: Vec<RangeWrite>) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }

        let data: Vec<Value> = writes
            .iter()
            .map(|write| {
                json!({
                    "range": self.a1(&write.range),
                    "majorDimension": "ROWS",
                    "values": [write.values],
                })
            })
            .collect();

        let request = self
            .http_client
            .post(format!("{}/values:batchUpdate", self.spreadsheet_url()))
            .json(&json!({
                "valueInputOption": "RAW",
                "data": data,
            }));
        self.send(request).await?;

        debug!(ranges = writes.len(), "Sheets batch update applied");
        Ok(())
    }

    async fn format_header(&self) -> Result<(), StoreError> {
        let request = self
            .http_client
            .post(format!("{}:batchUpdate", self.spreadsheet_url()))
            .json(&json!({
                "requests": [{
                    "repeatCell": {
                        "range": {
                            "sheetId": self.config.sheet_tab_id,
                            "startRowIndex": 0,
                            "endRowIndex": 1,
                            "startColumnIndex": 0,
                            "endColumnIndex": COLUMN_COUNT,
                        },
                        "cell": {
                            "userEnteredFormat": {
                                "backgroundColor": { "red": 0.2, "green": 0.2, "blue": 0.2 },
                                "textFormat": {
                                    "foregroundColor": { "red": 1.0, "green": 1.0, "blue": 1.0 },
                                    "bold": true
                                }
                            }
                        },
                        "fields": "userEnteredFormat(backgroundColor,textFormat)"
                    }
                }]
            }));
        self.send(request).await?;
        Ok(())
    }
}
