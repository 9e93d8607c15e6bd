//! Universe configuration — the list of listings a scan covers.
//!
//! Universes are TOML files:
//!
//! ```toml
//! name = "nifty_50"
//! market = "India"
//!
//! [[members]]
//! symbol = "RELIANCE"
//! company = "Reliance Industries"
//! industry = "Energy"
//! ticker = "RELIANCE.NS"
//! ```
//!
//! `min_price` optionally overrides the configured price floor for every
//! member (US lists trade far below the Indian default of 50).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("parse universe TOML: {0}")]
    Parse(String),

    #[error("universe '{0}' has no members")]
    Empty(String),

    #[error("universe '{name}' lists '{symbol}' more than once")]
    DuplicateSymbol { name: String, symbol: String },

    #[error("unknown built-in universe '{0}'")]
    UnknownBuiltin(String),
}

/// One tradable listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub symbol: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub industry: String,
    /// Provider ticker when it differs from the display symbol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
}

impl Listing {
    pub fn new(symbol: &str, company: &str, industry: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            company: company.to_string(),
            industry: industry.to_string(),
            ticker: None,
        }
    }

    /// Ticker to request from the series provider.
    pub fn provider_ticker(&self) -> &str {
        self.ticker.as_deref().unwrap_or(&self.symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub name: String,
    #[serde(default)]
    pub market: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    pub members: Vec<Listing>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|e| UniverseError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let universe: Self =
            toml::from_str(content).map_err(|e| UniverseError::Parse(e.to_string()))?;
        universe.validate()?;
        Ok(universe)
    }

    pub fn to_toml(&self) -> Result<String, UniverseError> {
        toml::to_string_pretty(self).map_err(|e| UniverseError::Parse(e.to_string()))
    }

    fn validate(&self) -> Result<(), UniverseError> {
        if self.members.is_empty() {
            return Err(UniverseError::Empty(self.name.clone()));
        }
        let mut seen = HashSet::new();
        for member in &self.members {
            if !seen.insert(member.symbol.as_str()) {
                return Err(UniverseError::DuplicateSymbol {
                    name: self.name.clone(),
                    symbol: member.symbol.clone(),
                });
            }
        }
        Ok(())
    }

    /// Built-in universes by name.
    pub fn builtin(name: &str) -> Result<Self, UniverseError> {
        match name {
            "dow_30" | "dow30" => Ok(Self::dow_30()),
            other => Err(UniverseError::UnknownBuiltin(other.to_string())),
        }
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &["dow_30"]
    }

    /// The 30 Dow Jones Industrial Average constituents.
    pub fn dow_30() -> Self {
        let members = [
            ("AAPL", "Apple", "Information Technology"),
            ("AMGN", "Amgen", "Health Care"),
            ("AMZN", "Amazon", "Consumer Discretionary"),
            ("AXP", "American Express", "Financials"),
            ("BA", "Boeing", "Industrials"),
            ("CAT", "Caterpillar", "Industrials"),
            ("CRM", "Salesforce", "Information Technology"),
            ("CSCO", "Cisco Systems", "Information Technology"),
            ("CVX", "Chevron", "Energy"),
            ("DIS", "Walt Disney", "Communication Services"),
            ("GS", "Goldman Sachs", "Financials"),
            ("HD", "Home Depot", "Consumer Discretionary"),
            ("HON", "Honeywell", "Industrials"),
            ("IBM", "IBM", "Information Technology"),
            ("JNJ", "Johnson & Johnson", "Health Care"),
            ("JPM", "JPMorgan Chase", "Financials"),
            ("KO", "Coca-Cola", "Consumer Staples"),
            ("MCD", "McDonald's", "Consumer Discretionary"),
            ("MMM", "3M", "Industrials"),
            ("MRK", "Merck", "Health Care"),
            ("MSFT", "Microsoft", "Information Technology"),
            ("NKE", "Nike", "Consumer Discretionary"),
            ("NVDA", "Nvidia", "Information Technology"),
            ("PG", "Procter & Gamble", "Consumer Staples"),
            ("SHW", "Sherwin-Williams", "Materials"),
            ("TRV", "Travelers", "Financials"),
            ("UNH", "UnitedHealth Group", "Health Care"),
            ("V", "Visa", "Financials"),
            ("VZ", "Verizon", "Communication Services"),
            ("WMT", "Walmart", "Consumer Staples"),
        ];
        Self {
            name: "dow_30".into(),
            market: "US".into(),
            min_price: Some(5.0),
            members: members
                .iter()
                .map(|(s, c, i)| Listing::new(s, c, i))
                .collect(),
        }
    }

    /// First `n` members (all when `None`).
    pub fn take(&self, n: Option<usize>) -> &[Listing] {
        match n {
            Some(n) => &self.members[..n.min(self.members.len())],
            None => &self.members,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Industries present, in first-seen order.
    pub fn industries(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.members
            .iter()
            .map(|m| m.industry.as_str())
            .filter(|i| seen.insert(*i))
            .collect()
    }
}
