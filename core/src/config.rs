use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::report::bucket::Granularity;

pub const HOME_ENV: &str = "CHARITY_LEDGER_HOME";
const DEFAULT_DIR_NAME: &str = ".charity-ledger";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where collection files live; the base directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub default_granularity: Granularity,
    /// Trailing window, in months, for the volunteer and trash trends.
    pub trend_months: u32,
    pub recent_limit: usize,
    pub currency_symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_granularity: Granularity::Monthly,
            trend_months: 6,
            recent_limit: 10,
            currency_symbol: "$".into(),
        }
    }
}

impl Config {
    /// Loads `<base>/config.json`, falling back to defaults when absent.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, base_dir: &Path) -> Result<()> {
        fs::create_dir_all(base_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(base_dir.join(CONFIG_FILE_NAME), content)?;
        Ok(())
    }

    pub fn data_dir(&self, base_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        }
    }

    pub fn format_amount(&self, amount: f64) -> String {
        if amount < 0.0 {
            format!("-{}{:.2}", self.currency_symbol, -amount)
        } else {
            format!("{}{:.2}", self.currency_symbol, amount)
        }
    }
}

/// `$CHARITY_LEDGER_HOME`, or `~/.charity-ledger`.
pub fn base_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home_dir.join(DEFAULT_DIR_NAME))
}
