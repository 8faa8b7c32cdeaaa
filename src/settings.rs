use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::fare::FareRates;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "es" | "spanish" | "español" => Some(Language::Es),
            _ => None,
        }
    }
}

/// Whether distance fares may be shown before the trip is recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DistancePreview {
    #[default]
    OnSubmit,
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub rates: FareRates,
    pub language: Language,
    pub distance_preview: DistancePreview,
    pub display_refresh: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rates: FareRates::default(),
            language: Language::default(),
            distance_preview: DistancePreview::default(),
            display_refresh: true,
        }
    }
}

impl Settings {
    /// Applies `TAXIMETER_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rate_vars: [(&str, &mut f64); 4] = [
            ("TAXIMETER_STOPPED_RATE", &mut self.rates.stopped_rate_per_second),
            ("TAXIMETER_MOVING_RATE", &mut self.rates.moving_rate_per_second),
            ("TAXIMETER_DISTANCE_RATE", &mut self.rates.distance_rate_per_km),
            ("TAXIMETER_DISTANCE_BASE", &mut self.rates.distance_base_fare),
        ];
        for (name, slot) in rate_vars {
            if let Some(raw) = lookup(name) {
                *slot = raw
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("{name} must be a number, got '{raw}'"))?;
            }
        }

        if let Some(raw) = lookup("TAXIMETER_LANG") {
            self.language = Language::parse(&raw)
                .ok_or_else(|| anyhow!("TAXIMETER_LANG must be 'en' or 'es', got '{raw}'"))?;
        }

        Ok(())
    }
}

/// Settings loaded once at startup and read-only afterwards.
///
/// `stored` mirrors settings.json; `data` is what the process runs with,
/// i.e. `stored` plus environment overrides. Only `stored` is ever written.
pub struct SettingsStore {
    path: PathBuf,
    stored: Settings,
    data: Settings,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed settings at {}: {err}", path.display());
                Settings::default()
            })
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            stored: data.clone(),
            data,
        })
    }

    /// Reads the file, applies environment overrides and validates the rates.
    pub fn load(path: PathBuf) -> Result<Self> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    pub fn load_with<F>(path: PathBuf, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut store = Self::new(path)?;
        store.data.apply_overrides(lookup)?;
        store.data.rates.validate()?;
        Ok(store)
    }

    pub fn settings(&self) -> &Settings {
        &self.data
    }

    pub fn rates(&self) -> FareRates {
        self.data.rates
    }

    /// Writes the file-backed settings so they can be edited, unless a file
    /// is already there. Environment overrides are not written.
    pub fn write_defaults_if_missing(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        self.persist(&self.stored)
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
