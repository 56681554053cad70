//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ie::{MatchParams, RegionSelector};
use serde::{Deserialize, Serialize};

use crate::navigator::{AxisConfig, NavigatorConfig};
use crate::resource::Resource;

/// Longest accepted wait or interval, in seconds (one day).
pub const MAX_WAIT_S: f32 = 86_400.0;

/// Longest accepted single key hold (ten minutes).
pub const MAX_HOLD_MS: u64 = 600_000;

/// On-disk configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target window application name (from `xcap::Window::app_name()`).
    ///
    /// If multiple windows share the same app name, the first match is used.
    pub app_name: String,

    /// Resource whose templates are loaded.
    pub resource: Resource,

    /// Template root; searched for automatically when unset.
    pub assets_dir: Option<PathBuf>,

    pub matching: MatchConfig,

    /// Slack (px) when deciding whether the selector sits on the gathering row.
    pub align_tolerance_px: u32,

    pub behaviour: Behaviour,
    pub timing: Timing,
    pub navigator: NavigatorConfig,
    pub waypoints: WaypointConfig,

    /// Scroll attempts per alignment before giving up.
    pub max_adjust_steps: u32,

    /// Wheel delta per adjustment step (negative scrolls down).
    pub scroll_unit: i32,

    pub interact_key: char,

    /// Horizontal pointer move used to sweep the camera while searching.
    /// The sign alternates on every nudge.
    pub nudge_px: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub threshold: f32,
    pub scales: Vec<f32>,
    /// Part of the frame searched for the interaction prompt.
    pub prompt_region: RegionSelector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Behaviour {
    /// Only trigger when the selector sits on the gathering row.
    pub require_alignment: bool,
    /// Never walk; wait for a prompt where we stand.
    pub dont_move: bool,
    /// Walk back to the starting point after every harvest.
    pub return_to_origin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Wait between ticks when there is nothing to do.
    pub poll_delay_s: f32,
    /// Wait while the action cooldown is running.
    pub cooldown_poll_s: f32,
    /// Minimum time between two interaction presses.
    pub action_cooldown_s: f32,
    /// Time the harvest animation needs after pressing the interaction key.
    pub post_trigger_hold_s: f32,
    /// Pause after each scroll step.
    pub scroll_delay_s: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointConfig {
    pub merge_radius_px: u32,
    pub min_revisit_s: f32,
}

impl Default for Config {
    fn default() -> Self {
        let mut cfg = Self {
            app_name: "steam_app_230410".to_string(),
            resource: Resource::LunaOre,
            assets_dir: None,
            matching: MatchConfig::default(),
            align_tolerance_px: 16,
            behaviour: Behaviour::default(),
            timing: Timing::default(),
            navigator: NavigatorConfig::default(),
            waypoints: WaypointConfig::default(),
            max_adjust_steps: 10,
            scroll_unit: -120,
            interact_key: 'f',
            nudge_px: 300,
        };
        cfg.set_resource(Resource::LunaOre);
        cfg
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        let params = MatchParams::default();
        Self {
            threshold: params.threshold,
            scales: params.scales,
            prompt_region: RegionSelector::default(),
        }
    }
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            require_alignment: true,
            dont_move: false,
            return_to_origin: false,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_delay_s: 0.12,
            cooldown_poll_s: 0.05,
            action_cooldown_s: 0.8,
            post_trigger_hold_s: 6.0,
            scroll_delay_s: 0.25,
        }
    }
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            merge_radius_px: 80,
            min_revisit_s: 60.0,
        }
    }
}

impl MatchConfig {
    pub fn params(&self) -> MatchParams {
        MatchParams {
            threshold: self.threshold,
            scales: self.scales.clone(),
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("config_dir() unavailable")?;
        Ok(base.join("autogather.json"))
    }

    /// Switch to `resource` and adopt its catalog navigation tolerances.
    pub fn set_resource(&mut self, resource: Resource) {
        let (lateral, forward) = resource.tolerance();
        self.resource = resource;
        self.navigator.lateral.tolerance_px = lateral;
        self.navigator.forward.tolerance_px = forward;
    }

    /// Load configuration from disk, falling back to defaults on missing file.
    pub fn load_or_default() -> Self {
        match Self::try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load config; using defaults");
                Self::default()
            }
        }
    }

    /// Try to load configuration from the default location.
    pub fn try_load() -> Result<Self> {
        Self::try_load_from(&Self::path()?)
    }

    /// Try to load configuration from `path`; a missing file yields defaults.
    pub fn try_load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        Ok(cfg)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        let m = &self.matching;
        if !m.threshold.is_finite() || !(-1.0..=1.0).contains(&m.threshold) {
            bail!("matching.threshold must be within [-1, 1], got {}", m.threshold);
        }
        if m.scales.is_empty() {
            bail!("matching.scales must not be empty");
        }
        if let Some(s) = m.scales.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            bail!("matching.scales must be positive, got {s}");
        }
        match m.prompt_region {
            RegionSelector::RightFraction { fraction } if !(fraction > 0.0 && fraction <= 1.0) => {
                bail!("matching.prompt_region.fraction must be within (0, 1], got {fraction}");
            }
            RegionSelector::Fraction { rect, .. } if !(rect.x1 < rect.x2 && rect.y1 < rect.y2) => {
                bail!("matching.prompt_region.rect is empty");
            }
            _ => {}
        }

        validate_axis("navigator.forward", &self.navigator.forward)?;
        validate_axis("navigator.lateral", &self.navigator.lateral)?;
        if self.navigator.max_hold_ms > MAX_HOLD_MS {
            bail!("navigator.max_hold_ms must be at most {MAX_HOLD_MS}, got {}", self.navigator.max_hold_ms);
        }
        let step = self.navigator.teach_step;
        if !step.is_finite() || step < 0.0 {
            bail!("navigator.teach_step must be non-negative, got {step}");
        }
        if self.navigator.max_hold_ms < self.navigator.min_hold_ms {
            bail!(
                "navigator.max_hold_ms ({}) is below min_hold_ms ({})",
                self.navigator.max_hold_ms,
                self.navigator.min_hold_ms
            );
        }

        let t = &self.timing;
        for (name, secs) in [
            ("timing.poll_delay_s", t.poll_delay_s),
            ("timing.cooldown_poll_s", t.cooldown_poll_s),
            ("timing.action_cooldown_s", t.action_cooldown_s),
            ("timing.post_trigger_hold_s", t.post_trigger_hold_s),
            ("timing.scroll_delay_s", t.scroll_delay_s),
            ("navigator.settle_s", self.navigator.settle_s),
            ("waypoints.min_revisit_s", self.waypoints.min_revisit_s),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                bail!("{name} must be a non-negative number of seconds, got {secs}");
            }
            if secs > MAX_WAIT_S {
                bail!("{name} must be at most {MAX_WAIT_S} seconds, got {secs}");
            }
        }

        if self.interact_key.is_whitespace() || self.interact_key.is_control() {
            bail!("interact_key must be a printable character");
        }
        Ok(())
    }
}

fn validate_axis(name: &str, axis: &AxisConfig) -> Result<()> {
    if !axis.ms_per_px.is_finite() || axis.ms_per_px <= 0.0 {
        bail!("{name}.ms_per_px must be positive, got {}", axis.ms_per_px);
    }
    let c = &axis.compensation;
    if let Some(m) = std::iter::once(c.default)
        .chain(c.bands.iter().map(|b| b.multiplier))
        .find(|m| !m.is_finite() || *m < 0.0)
    {
        bail!("{name}.compensation multipliers must be non-negative, got {m}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.matching.threshold, 0.56);
        assert_eq!(cfg.matching.scales.len(), 7);
        assert_eq!(cfg.navigator.lateral.tolerance_px, 150);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: Config = serde_json::from_str(
            r#"{"resource": "baru_rich_ore", "timing": {"post_trigger_hold_s": 2.5}}"#,
        )
        .unwrap();
        assert_eq!(cfg.resource, Resource::BaruRichOre);
        assert_eq!(cfg.timing.post_trigger_hold_s, 2.5);
        assert_eq!(cfg.timing.action_cooldown_s, 0.8);
        assert_eq!(cfg.interact_key, 'f');
    }

    #[test]
    fn set_resource_applies_tolerances() {
        let mut cfg = Config::default();
        cfg.set_resource(Resource::BaruRichOre);
        assert_eq!(cfg.navigator.lateral.tolerance_px, 200);
        assert_eq!(cfg.navigator.forward.tolerance_px, 250);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.matching.scales.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.navigator.lateral.ms_per_px = 0.0;
        assert!(cfg.validate().unwrap_err().to_string().contains("lateral"));

        let mut cfg = Config::default();
        cfg.timing.post_trigger_hold_s = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.navigator.max_hold_ms = 10;
        cfg.navigator.min_hold_ms = 20;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.navigator.teach_step = -0.2;
        assert!(cfg.validate().unwrap_err().to_string().contains("teach_step"));
    }

    #[test]
    fn validate_rejects_unbounded_waits() {
        let mut cfg = Config::default();
        cfg.timing.post_trigger_hold_s = 1e20;
        assert!(cfg.validate().unwrap_err().to_string().contains("post_trigger_hold_s"));

        let mut cfg = Config::default();
        cfg.navigator.max_hold_ms = u64::MAX;
        assert!(cfg.validate().unwrap_err().to_string().contains("max_hold_ms"));

        let mut cfg = Config::default();
        cfg.timing.poll_delay_s = MAX_WAIT_S;
        cfg.navigator.max_hold_ms = MAX_HOLD_MS;
        cfg.validate().unwrap();
    }

    #[test]
    fn save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("autogather-config-{}", std::process::id()))
            .join("autogather.json");
        let mut cfg = Config::default();
        cfg.behaviour.dont_move = true;
        cfg.nudge_px = -40;
        cfg.save_to(&path).unwrap();

        let loaded = Config::try_load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("autogather-definitely-missing.json");
        assert_eq!(Config::try_load_from(&path).unwrap(), Config::default());
    }
}
