use std::path::Path;

use anyhow::{bail, Context};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::{details::FundDetails, Result};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

pub const RECORDED_HEADER: &str = "Recorded";
pub const EFFECTIVE_DATE_HEADER: &str = "Effective Date";
pub const FUND_VALUE_HEADER: &str = "Fund Value";

static RECORDED_FMT: &[BorrowedFormatItem] =
    format_description!("[day]/[month]/[year] [hour]:[minute]");

/// The fields of a Google service account JSON key that are needed to get a token.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read key file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a service account key", path.display()))
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    properties: Properties,
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Properties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Spreadsheet title and the title of its first worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetInfo {
    pub title: String,
    pub first_sheet: String,
}

/// Minimal Sheets v4 REST client authorised with a service account bearer token.
#[derive(Debug)]
pub struct SheetsClient {
    http: Client,
    api_base: String,
    token: String,
}

impl SheetsClient {
    pub fn authenticate(key: &ServiceAccountKey, api_base: &str) -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            iss: &key.client_email,
            scope: SHEETS_SCOPE,
            aud: &key.token_uri,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("invalid private key in service account file")?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .context("failed to sign token request")?;

        debug!(email = %key.client_email, token_uri = %key.token_uri, "requesting access token");
        let token: TokenResponse = http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .context("service account authentication failed")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.access_token,
        })
    }

    pub fn info(&self, spreadsheet_id: &str) -> Result<SpreadsheetInfo> {
        let url = format!(
            "{}/v4/spreadsheets/{}?fields=properties.title,sheets.properties.title",
            self.api_base,
            urlencoding::encode(spreadsheet_id)
        );
        let s: Spreadsheet = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .with_context(|| format!("failed to fetch spreadsheet {spreadsheet_id}"))?;
        let first_sheet = s
            .sheets
            .into_iter()
            .next()
            .map(|sh| sh.properties.title)
            .with_context(|| format!("spreadsheet {spreadsheet_id} has no worksheets"))?;
        Ok(SpreadsheetInfo {
            title: s.properties.title,
            first_sheet,
        })
    }

    pub fn header_row(&self, spreadsheet_id: &str, sheet: &str) -> Result<Vec<String>> {
        let url = self.values_url(spreadsheet_id, &format!("{}!1:1", quote_sheet(sheet)));
        let range: ValueRange = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .with_context(|| format!("failed to read the header row of {sheet}"))?;
        Ok(range.values.into_iter().next().unwrap_or_default())
    }

    pub fn append_row(&self, spreadsheet_id: &str, sheet: &str, cells: &[String]) -> Result<()> {
        let url = format!(
            "{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.values_url(spreadsheet_id, &format!("{}!A1", quote_sheet(sheet)))
        );
        self.http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "majorDimension": "ROWS", "values": [cells] }))
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("failed to append a row to {sheet}"))?;
        Ok(())
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.api_base,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        )
    }
}

fn quote_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// One spreadsheet row, addressed by column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub recorded: String,
    pub effective_date: String,
    pub fund_value: String,
}

impl Row {
    pub fn new(details: &FundDetails, recorded_at: OffsetDateTime) -> Result<Self> {
        Ok(Self {
            recorded: recorded_at.format(RECORDED_FMT)?,
            effective_date: details.effective_date.clone().unwrap_or_default(),
            fund_value: details.fund_value.clone(),
        })
    }

    /// Lays the row out under `headers`; unknown columns are left blank.
    pub fn cells(&self, headers: &[String]) -> Result<Vec<String>> {
        for required in [RECORDED_HEADER, EFFECTIVE_DATE_HEADER, FUND_VALUE_HEADER] {
            if !headers.iter().any(|h| h.trim() == required) {
                bail!("sheet has no \"{required}\" column (header row: {headers:?})");
            }
        }
        Ok(headers
            .iter()
            .map(|h| match h.trim() {
                RECORDED_HEADER => self.recorded.clone(),
                EFFECTIVE_DATE_HEADER => self.effective_date.clone(),
                FUND_VALUE_HEADER => self.fund_value.clone(),
                _ => String::new(),
            })
            .collect())
    }
}

/// Current local time. Must be called before any other thread exists, otherwise the
/// offset cannot be read safely and UTC is used.
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| {
        warn!("local UTC offset unavailable, recording time in UTC");
        OffsetDateTime::now_utc()
    })
}

/// Appends `details` to the first worksheet of `spreadsheet_id` and returns the
/// spreadsheet title.
pub fn publish(
    details: &FundDetails,
    recorded_at: OffsetDateTime,
    key_file: &Path,
    spreadsheet_id: &str,
    api_base: &str,
) -> Result<String> {
    let key = ServiceAccountKey::from_file(key_file)?;
    let client = SheetsClient::authenticate(&key, api_base)?;
    let info = client.info(spreadsheet_id)?;
    info!(title = %info.title, sheet = %info.first_sheet, "publishing to spreadsheet");

    let headers = client.header_row(spreadsheet_id, &info.first_sheet)?;
    let row = Row::new(details, recorded_at)?;
    client.append_row(spreadsheet_id, &info.first_sheet, &row.cells(&headers)?)?;
    Ok(info.title)
}
