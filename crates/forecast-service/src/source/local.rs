//! File-backed daily bars

use super::{BarSource, DailySeries};
use async_trait::async_trait;
use forecast_core::{ForecastError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads and writes `{data_dir}/{symbol}-daily.json`
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    data_dir: PathBuf,
}

impl LocalFileSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File holding `symbol`'s series; the name is lower-cased
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}-daily.json", symbol.to_lowercase()))
    }

    /// Persist a series, creating the data directory if needed
    pub async fn store(&self, series: &DailySeries) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let path = self.path_for(&series.symbol);
        let json = serde_json::to_string_pretty(series)?;
        tokio::fs::write(&path, json).await?;
        info!(path = %path.display(), bars = series.bars.len(), "Stored daily series");
        Ok(path)
    }
}

#[async_trait]
impl BarSource for LocalFileSource {
    async fn daily(&self, symbol: &str) -> Result<DailySeries> {
        let path = self.path_for(symbol);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ForecastError::upstream(format!(
                    "no daily data for {symbol} at {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let mut series: DailySeries = serde_json::from_str(&json)?;
        if series.symbol.is_empty() {
            series.symbol = symbol.to_uppercase();
        }
        if series.source.is_empty() {
            series.source = format!("file: {}", path.display());
        }
        series.bars.sort_by_key(|bar| bar.timestamp);

        debug!(symbol, bars = series.bars.len(), "Read daily series");
        Ok(series)
    }

    fn name(&self) -> &str {
        "local"
    }
}
