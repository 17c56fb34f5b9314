//! CSV instrument import.
//!
//! Expected header: `symbol,company_name,current_price,sector,industry,description`.
//! Only the first two columns are required; blank cells become `None`.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::error::StockfolioError;
use crate::domain::instrument_cache::InstrumentInput;

#[derive(Debug, Deserialize)]
struct InstrumentRow {
    symbol: String,
    company_name: String,
    #[serde(default)]
    current_price: Option<String>,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn read_instruments<R: Read>(reader: R) -> Result<Vec<InstrumentInput>, StockfolioError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut inputs = Vec::new();

    for (index, result) in rdr.deserialize::<InstrumentRow>().enumerate() {
        let line = index + 2;
        let row = result.map_err(|e| {
            StockfolioError::validation(format!("CSV parse error on line {}: {}", line, e))
        })?;
        let current_price = blank_to_none(row.current_price)
            .map(|p| {
                Decimal::from_str(&p).map_err(|e| {
                    StockfolioError::validation(format!(
                        "invalid current_price on line {}: {}",
                        line, e
                    ))
                })
            })
            .transpose()?;
        inputs.push(InstrumentInput {
            symbol: Some(row.symbol),
            company_name: Some(row.company_name),
            current_price,
            sector: blank_to_none(row.sector),
            industry: blank_to_none(row.industry),
            description: blank_to_none(row.description),
            ..InstrumentInput::default()
        });
    }

    Ok(inputs)
}

pub fn read_instruments_file(path: &Path) -> Result<Vec<InstrumentInput>, StockfolioError> {
    let file = std::fs::File::open(path)?;
    read_instruments(file)
}
