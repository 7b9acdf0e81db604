use serde::Deserialize;
use url::Url;

use super::{GoogleApiClient, GoogleApiError};
use crate::workflows::onboarding::roster::{Grid, RosterError, RosterSource};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Grid,
}

/// Reads roster grids through the Sheets v4 `values.get` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleSheetsClient {
    api: GoogleApiClient,
}

impl GoogleSheetsClient {
    pub fn new(api: GoogleApiClient) -> Self {
        Self { api }
    }
}

impl RosterSource for GoogleSheetsClient {
    fn fetch_grid(&self, spreadsheet_id: &str, range: &str) -> Result<Grid, RosterError> {
        let url = values_url(spreadsheet_id, range)?;
        let response: ValueRange = self.api.get_json(url)?;
        Ok(response.values)
    }
}

fn values_url(spreadsheet_id: &str, range: &str) -> Result<Url, GoogleApiError> {
    let mut url = Url::parse(SHEETS_API)?;
    url.path_segments_mut()
        .map_err(|_| GoogleApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .extend([spreadsheet_id, "values", range]);
    Ok(url)
}
