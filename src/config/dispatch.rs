//! Dispatch configuration structures.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::error::AppResult;
use crate::core::model::{default_priority_weights, HospitalRegistration, PriorityWeights};
use crate::core::queue_policy::QueuePolicy;

/// Environment variable naming a JSON config file.
pub const CONFIG_PATH_ENV: &str = "RAPIDAID_CONFIG";

/// Environment variable overriding the default scheduling policy.
pub const DEFAULT_POLICY_ENV: &str = "RAPIDAID_DEFAULT_POLICY";

/// Keyword tiers for severity classification, most severe first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Keywords that make a request critical.
    pub critical: Vec<String>,
    /// Keywords that make a request high priority.
    pub high: Vec<String>,
    /// Keywords that make a request medium priority.
    pub medium: Vec<String>,
    /// Keywords that make a request low priority. Unmatched text is low anyway.
    pub low: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect();
        Self {
            critical: words(&[
                "heart attack",
                "cardiac arrest",
                "unconscious",
                "severe bleeding",
                "difficulty breathing",
                "chest pain",
            ]),
            high: words(&["broken bone", "fracture", "severe pain", "head injury", "burn"]),
            medium: words(&["dizziness", "nausea", "fever", "moderate pain", "cuts"]),
            low: Vec::new(),
        }
    }
}

/// Queue policy defaults applied when a hospital has no stored preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Policy name: `priority`, `fcfs`, `sjf` or `hrrn`.
    pub default_policy: String,
    /// Severity weights stored with new preferences.
    pub default_weights: PriorityWeights,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_policy: "priority".into(),
            default_weights: default_priority_weights(),
        }
    }
}

/// Admission controller tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// How many times a lost debit race is retried before surfacing a conflict.
    pub max_conflict_retries: u32,
    /// Upper bound on waiting for a hospital's ledger lock, in milliseconds.
    pub lock_timeout_ms: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 2,
            lock_timeout_ms: 250,
        }
    }
}

/// Root dispatch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Severity keyword tiers.
    pub classifier: ClassifierConfig,
    /// Queue policy defaults.
    pub scheduling: SchedulingConfig,
    /// Admission tuning.
    pub admission: AdmissionConfig,
    /// Travel time estimate per kilometer.
    pub minutes_per_km: f64,
    /// Age after which the sweeper cancels a pending request.
    pub stale_pending_secs: u64,
    /// Hospitals registered at startup.
    pub hospitals: Vec<HospitalRegistration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            scheduling: SchedulingConfig::default(),
            admission: AdmissionConfig::default(),
            minutes_per_km: 3.0,
            stale_pending_secs: 3600,
            hospitals: Vec::new(),
        }
    }
}

impl SchedulingConfig {
    /// Validate the default policy and weights.
    pub fn validate(&self) -> Result<(), String> {
        self.default_policy
            .parse::<QueuePolicy>()
            .map_err(|e| e.to_string())?;
        if self.default_weights.is_empty() {
            return Err("default_weights must not be empty".into());
        }
        Ok(())
    }
}

impl AdmissionConfig {
    /// Validate admission tuning values.
    pub fn validate(&self) -> Result<(), String> {
        if self.lock_timeout_ms == 0 {
            return Err("lock_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }
}

impl DispatchConfig {
    /// Validate all sections and the seeded hospitals.
    pub fn validate(&self) -> Result<(), String> {
        if !self.minutes_per_km.is_finite() || self.minutes_per_km <= 0.0 {
            return Err("minutes_per_km must be a positive number".into());
        }
        if self.stale_pending_secs == 0 {
            return Err("stale_pending_secs must be greater than 0".into());
        }
        self.scheduling
            .validate()
            .map_err(|e| format!("scheduling invalid: {e}"))?;
        self.admission
            .validate()
            .map_err(|e| format!("admission invalid: {e}"))?;

        let mut seen = HashSet::new();
        for hospital in &self.hospitals {
            if !seen.insert(hospital.id) {
                return Err(format!("duplicate hospital id {}", hospital.id));
            }
            hospital
                .validate()
                .map_err(|e| format!("hospital `{}` invalid: {e}", hospital.id))?;
        }
        Ok(())
    }

    /// Parse dispatch configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from a JSON file and validate.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json_str(&raw)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("loading config file {}", path.display()))
    }

    /// Load configuration from the environment.
    ///
    /// Reads `.env` if present, then the JSON file named by
    /// [`CONFIG_PATH_ENV`] (defaults otherwise), then applies
    /// [`DEFAULT_POLICY_ENV`].
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        if let Ok(policy) = std::env::var(DEFAULT_POLICY_ENV) {
            cfg.scheduling.default_policy = policy;
        }
        cfg.validate()
            .map_err(anyhow::Error::msg)
            .context("validating dispatch config from environment")?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DispatchConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_default_policy() {
        let mut cfg = DispatchConfig::default();
        cfg.scheduling.default_policy = "round_robin".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("round_robin"), "{err}");
    }
}
