use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// settings.toml に永続化する既定値。CLI フラグが常に優先される。
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// ワーカースレッド数。0 なら論理コア数。
    #[serde(default)]
    pub threads: usize,
    /// α の明示指定。0.0 なら log log x ヒューリスティックに任せる。
    #[serde(default)]
    pub alpha: f64,
    /// ウェーブ境界でのステータス表示。
    #[serde(default)]
    pub status: bool,
    /// システムメモリの何%までセグメントに使ってよいか (10.0 ~ 90.0)。
    #[serde(default = "default_memory_usage_percent")]
    pub memory_usage_percent: f64,
}

fn default_memory_usage_percent() -> f64 {
    50.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 0,
            alpha: 0.0,
            status: false,
            memory_usage_percent: default_memory_usage_percent(),
        }
    }
}

impl Config {
    /// alpha 設定を Option に正規化する（0 以下や非有限は「自動」）。
    pub fn alpha_override(&self) -> Option<f64> {
        if self.alpha.is_finite() && self.alpha >= 1.0 {
            Some(self.alpha)
        } else {
            None
        }
    }
}

const SETTINGS_FILE: &str = "settings.toml";

pub fn load_or_create_config() -> Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    if Path::new(SETTINGS_FILE).exists() {
        let mut file = File::open(SETTINGS_FILE)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let cfg = toml::from_str(&contents)?;
        Ok(cfg)
    } else {
        let cfg = Config::default();
        save_config(&cfg)?;
        Ok(cfg)
    }
}

pub fn save_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let toml_str = toml::to_string_pretty(cfg)?;
    let file = File::create(SETTINGS_FILE)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(toml_str.as_bytes())?;
    Ok(())
}
