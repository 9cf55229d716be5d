use async_trait::async_trait;
use google_sheets4::Sheets;
use google_sheets4::api::{Scope, ValueRange};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use serde_json::Value;
use std::path::Path;
use tracing::info;
use yup_oauth2::ServiceAccountAuthenticator;

use crate::config::SheetsSection;

pub type SheetsHub = Sheets<HttpsConnector<HttpConnector>>;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("service account key: {0}")]
    Key(#[source] std::io::Error),

    #[error("service account authenticator: {0}")]
    Auth(#[source] std::io::Error),

    #[error("Google Sheets: {0}")]
    Api(#[from] google_sheets4::Error),
}

/// Destination for confirmed checksheet rows.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Write `row` below the last used row; returns the 1-based row number.
    async fn append_row(&self, row: &[String]) -> Result<u32, SheetError>;
}

pub async fn create_hub(key_path: &Path) -> Result<SheetsHub, SheetError> {
    let key = yup_oauth2::read_service_account_key(key_path)
        .await
        .map_err(SheetError::Key)?;

    let auth = ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .map_err(SheetError::Auth)?;

    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_webpki_roots()
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Sheets::new(client, auth))
}

/// Quote a tab name for A1 notation: `QC 'A'` → `'QC ''A'''`.
fn a1_sheet(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Appends at column A of the first empty row of one tab.
pub struct SheetsSink {
    hub: SheetsHub,
    spreadsheet_id: String,
    sheet_name: String,
}

impl SheetsSink {
    pub async fn connect(cfg: &SheetsSection) -> Result<Self, SheetError> {
        let hub = create_hub(&cfg.service_account_key).await?;
        info!(spreadsheet = %cfg.spreadsheet_id, sheet = %cfg.sheet_name, "Sheets hub ready");
        Ok(Self {
            hub,
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            sheet_name: cfg.sheet_name.clone(),
        })
    }
}

#[async_trait]
impl RowSink for SheetsSink {
    async fn append_row(&self, row: &[String]) -> Result<u32, SheetError> {
        let sheet = a1_sheet(&self.sheet_name);

        let (_, used) = self
            .hub
            .spreadsheets()
            .values_get(&self.spreadsheet_id, &sheet)
            .add_scope(Scope::Spreadsheet)
            .doit()
            .await?;
        let next_row = used.values.map_or(0, |rows| rows.len()) as u32 + 1;

        let range = format!("{sheet}!A{next_row}");
        let body = ValueRange {
            values: Some(vec![row.iter().cloned().map(Value::String).collect()]),
            ..Default::default()
        };

        self.hub
            .spreadsheets()
            .values_update(body, &self.spreadsheet_id, &range)
            .value_input_option("USER_ENTERED")
            .add_scope(Scope::Spreadsheet)
            .doit()
            .await?;

        info!(sheet = %self.sheet_name, row = next_row, cells = row.len(), "Row appended");
        Ok(next_row)
    }
}
