use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::layout::Strategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub vertical_spacing: f32,
    pub min_horizontal_spacing: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub port_stub: f32,
    pub margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            vertical_spacing: 180.0,
            min_horizontal_spacing: 320.0,
            node_width: 240.0,
            node_height: 100.0,
            node_spacing: 80.0,
            rank_spacing: 80.0,
            port_stub: 18.0,
            margin: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub layout: LayoutConfig,
    pub strategy: Strategy,
    pub fallback_to_ranks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            strategy: Strategy::Ranks,
            fallback_to_ranks: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    strategy: Option<Strategy>,
    fallback_to_ranks: Option<bool>,
    layout: Option<LayoutFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutFile {
    vertical_spacing: Option<f32>,
    min_horizontal_spacing: Option<f32>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    port_stub: Option<f32>,
    margin: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    let mut config = Config::default();

    if let Some(strategy) = parsed.strategy {
        config.strategy = strategy;
    }
    if let Some(fallback) = parsed.fallback_to_ranks {
        config.fallback_to_ranks = fallback;
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.vertical_spacing {
            target.vertical_spacing = v;
        }
        if let Some(v) = layout.min_horizontal_spacing {
            target.min_horizontal_spacing = v;
        }
        if let Some(v) = layout.node_width {
            target.node_width = v;
        }
        if let Some(v) = layout.node_height {
            target.node_height = v;
        }
        if let Some(v) = layout.node_spacing {
            target.node_spacing = v;
        }
        if let Some(v) = layout.rank_spacing {
            target.rank_spacing = v;
        }
        if let Some(v) = layout.port_stub {
            target.port_stub = v;
        }
        if let Some(v) = layout.margin {
            target.margin = v;
        }
    }

    validate(&config.layout)?;
    Ok(config)
}

fn validate(layout: &LayoutConfig) -> anyhow::Result<()> {
    let positive = [
        ("verticalSpacing", layout.vertical_spacing),
        ("minHorizontalSpacing", layout.min_horizontal_spacing),
        ("nodeWidth", layout.node_width),
        ("nodeHeight", layout.node_height),
    ];
    for (name, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            anyhow::bail!("layout.{name} must be a positive number, got {value}");
        }
    }
    let non_negative = [
        ("nodeSpacing", layout.node_spacing),
        ("rankSpacing", layout.rank_spacing),
        ("portStub", layout.port_stub),
        ("margin", layout.margin),
    ];
    for (name, value) in non_negative {
        if !(value.is_finite() && value >= 0.0) {
            anyhow::bail!("layout.{name} must not be negative, got {value}");
        }
    }
    Ok(())
}
