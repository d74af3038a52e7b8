//! Google Sheets v4 client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::SheetsConfig;
use crate::google_auth::{fetch_access_token, ServiceAccountKey};
use crate::meal::{MealSheet, SheetOpener, Slot};
use crate::{Error, Result};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Extract the spreadsheet key from a `.../spreadsheets/d/<key>/...` URL.
pub fn spreadsheet_id_from_url(url: &str) -> Result<String> {
    let key = url
        .split_once("/spreadsheets/d/")
        .map(|(_, rest)| {
            rest.split(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
                .next()
                .unwrap_or_default()
        })
        .filter(|key| !key.is_empty())
        .ok_or_else(|| Error::Config(format!("No spreadsheet key in GSPREAD_URL: {}", url)))?;
    Ok(key.to_string())
}

/// Convert 1-based (row, column) to A1 notation.
pub fn a1(row: u32, column: u32) -> String {
    let mut letters = Vec::new();
    let mut n = column;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect::<String>() + &row.to_string()
}

/// Qualify `range` with a quoted worksheet title.
fn sheet_range(title: &str, range: &str) -> String {
    format!("'{}'!{}", title.replace('\'', "''"), range)
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValues<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [[&'a str; 1]; 1],
}

/// Authorized Sheets API client. Lives for a single invocation.
#[derive(Clone)]
pub struct SheetsClient {
    http_client: reqwest::Client,
    access_token: String,
}

impl SheetsClient {
    /// Authenticate as the service account.
    pub async fn authorize(http_client: reqwest::Client, key: &ServiceAccountKey) -> Result<Self> {
        let access_token = fetch_access_token(&http_client, key).await?;
        Ok(Self {
            http_client,
            access_token,
        })
    }

    /// Open a spreadsheet by its browser URL.
    pub fn open_by_url(&self, url: &str) -> Result<Spreadsheet> {
        Ok(Spreadsheet {
            client: self.clone(),
            id: spreadsheet_id_from_url(url)?,
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Sheets(format!("{} - {}", status, body)));
        }
        Ok(response)
    }
}

/// A spreadsheet document.
pub struct Spreadsheet {
    client: SheetsClient,
    id: String,
}

impl Spreadsheet {
    /// Select a worksheet by its exact title.
    pub async fn worksheet(&self, title: &str) -> Result<Worksheet> {
        let url = format!("{}/{}", SHEETS_API, self.id);
        let request = self
            .client
            .http_client
            .get(&url)
            .query(&[("fields", "sheets.properties.title")]);
        let metadata: SpreadsheetMetadata = self.client.send(request).await?.json().await?;

        if !metadata.sheets.iter().any(|s| s.properties.title == title) {
            return Err(Error::NotFound(format!("Worksheet '{}'", title)));
        }

        Ok(Worksheet {
            client: self.client.clone(),
            spreadsheet_id: self.id.clone(),
            title: title.to_string(),
        })
    }
}

/// A single worksheet (tab) of a spreadsheet.
pub struct Worksheet {
    client: SheetsClient,
    spreadsheet_id: String,
    title: String,
}

impl Worksheet {
    pub fn title(&self) -> &str {
        &self.title
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_API,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl MealSheet for Worksheet {
    async fn read_slots(&self, row: u32) -> Result<Vec<Option<String>>> {
        let first = Slot::ALL[0].column();
        let last = Slot::ALL[Slot::ALL.len() - 1].column();
        let range = sheet_range(&self.title, &format!("{}:{}", a1(row, first), a1(row, last)));

        let request = self.client.http_client.get(self.values_url(&range));
        let values: ValueRange = self.client.send(request).await?.json().await?;

        // Trailing empty cells are omitted by the API.
        let mut cells: Vec<Option<String>> = values
            .values
            .first()
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default();
        cells.resize(Slot::ALL.len(), None);

        debug!("Read {} in '{}': {:?}", range, self.title, cells);
        Ok(cells)
    }

    async fn write_cell(&self, row: u32, column: u32, value: &str) -> Result<()> {
        let range = sheet_range(&self.title, &a1(row, column));
        let body = UpdateValues {
            range: &range,
            major_dimension: "ROWS",
            values: [[value]],
        };

        let request = self
            .client
            .http_client
            .put(self.values_url(&range))
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&body);
        self.client.send(request).await?;

        debug!("Wrote {} to {}", value, range);
        Ok(())
    }
}

/// Opens worksheets of the spreadsheet at `GSPREAD_URL`, signing in with
/// `GSPREAD_SERVICE_ACCOUNT` on every call.
pub struct GoogleSheets {
    http_client: reqwest::Client,
}

impl GoogleSheets {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl SheetOpener for GoogleSheets {
    async fn open(&self, title: &str) -> Result<Box<dyn MealSheet>> {
        let config = SheetsConfig::from_env()?;
        let sheets =
            SheetsClient::authorize(self.http_client.clone(), &config.service_account).await?;
        let worksheet = sheets
            .open_by_url(&config.spreadsheet_url)?
            .worksheet(title)
            .await?;

        info!("Opened worksheet '{}'", worksheet.title());
        Ok(Box::new(worksheet))
    }
}
