use std::fmt;

use anyhow::Error;
use scraper::Html;
use tracing::debug;

use crate::{selector, Result, EFFECTIVE_DATE_LABEL, FUND_VALUE_PREFIX};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundDetails {
    /// Heading text without the pound sign and thousands separators, e.g. `12345.67`.
    pub fund_value: String,
    pub effective_date: Option<String>,
}

impl fmt::Display for FundDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.effective_date {
            Some(date) => write!(f, "{}: {}", date, self.fund_value),
            None => f.write_str(&self.fund_value),
        }
    }
}

/// Scans the `<h3>` headings of the details page. The last heading of each kind wins.
pub fn extract_details(html: &str) -> Result<FundDetails> {
    let doc = Html::parse_document(html);
    let h3 = selector("h3")?;

    let mut fund_value = None;
    let mut effective_date = None;

    for heading in doc.select(&h3) {
        let text = heading.text().collect::<String>();
        let text = text.trim();
        if let Some(value) = text.strip_prefix(FUND_VALUE_PREFIX) {
            fund_value = Some(value.replace(',', "").trim().to_string());
        } else if let Some(date) = text.strip_prefix(EFFECTIVE_DATE_LABEL) {
            effective_date = Some(date.trim().to_string());
        }
    }
    debug!(?fund_value, ?effective_date, "details page scanned");

    let fund_value =
        fund_value.ok_or_else(|| Error::msg("fund value heading not found on the details page"))?;
    Ok(FundDetails {
        fund_value,
        effective_date,
    })
}
