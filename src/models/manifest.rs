//! The `media.json` document read by signage players.

use serde::{Deserialize, Serialize};

use super::Schedule;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub defaults: ManifestDefaults,
    #[serde(default)]
    pub overrides: Vec<ManifestOverride>,
}

impl Manifest {
    #[must_use]
    pub fn with_timezone(tz: &str) -> Self {
        Self {
            defaults: ManifestDefaults::with_timezone(tz),
            overrides: Vec::new(),
        }
    }

    /// Merges `update` into the override for `update.src`, appending a new
    /// entry when none exists.
    pub fn upsert_override(&mut self, update: ManifestOverride) {
        if let Some(existing) = self.overrides.iter_mut().find(|o| o.src == update.src) {
            existing.merge(update);
        } else {
            self.overrides.push(update);
        }
    }

    /// Returns true when an override was removed.
    pub fn remove_override(&mut self, src: &str) -> bool {
        let before = self.overrides.len();
        self.overrides.retain(|o| o.src != src);
        self.overrides.len() != before
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDefaults {
    pub image_duration_ms: u64,
    pub html_duration_ms: u64,
    pub fit_mode: String,
    pub bg_color: String,
    pub mute: bool,
    pub volume: f64,
    pub schedule: Schedule,
}

impl ManifestDefaults {
    #[must_use]
    pub fn with_timezone(tz: &str) -> Self {
        Self {
            image_duration_ms: 10_000,
            html_duration_ms: 15_000,
            fit_mode: "fit".to_string(),
            bg_color: "#000000".to_string(),
            mute: true,
            volume: 1.0,
            schedule: Schedule::all_week(tz),
        }
    }

    pub fn apply(&mut self, update: DefaultsUpdate) {
        if let Some(v) = update.image_duration_ms {
            self.image_duration_ms = v;
        }
        if let Some(v) = update.html_duration_ms {
            self.html_duration_ms = v;
        }
        if let Some(v) = update.fit_mode {
            self.fit_mode = v;
        }
        if let Some(v) = update.bg_color {
            self.bg_color = v;
        }
        if let Some(v) = update.mute {
            self.mute = v;
        }
        if let Some(v) = update.volume {
            self.volume = v;
        }
        if let Some(v) = update.schedule {
            self.schedule = v;
        }
    }
}

/// Partial update for [`ManifestDefaults`]; absent keys keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultsUpdate {
    pub image_duration_ms: Option<u64>,
    pub html_duration_ms: Option<u64>,
    pub fit_mode: Option<String>,
    pub bg_color: Option<String>,
    pub mute: Option<bool>,
    pub volume: Option<f64>,
    pub schedule: Option<Schedule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestOverride {
    #[serde(default)]
    pub src: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

impl ManifestOverride {
    fn merge(&mut self, update: Self) {
        if update.kind.is_some() {
            self.kind = update.kind;
        }
        if update.fit_mode.is_some() {
            self.fit_mode = update.fit_mode;
        }
        if update.image_duration_ms.is_some() {
            self.image_duration_ms = update.image_duration_ms;
        }
        if update.html_duration_ms.is_some() {
            self.html_duration_ms = update.html_duration_ms;
        }
        if update.mute.is_some() {
            self.mute = update.mute;
        }
        if update.volume.is_some() {
            self.volume = update.volume;
        }
        if update.schedule.is_some() {
            self.schedule = update.schedule;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_serialize_in_camel_case() {
        let manifest = Manifest::with_timezone("UTC");
        let json = serde_json::to_value(&manifest).unwrap();

        assert_eq!(json["defaults"]["imageDurationMs"], 10_000);
        assert_eq!(json["defaults"]["htmlDurationMs"], 15_000);
        assert_eq!(json["defaults"]["fitMode"], "fit");
        assert_eq!(json["defaults"]["schedule"]["tz"], "UTC");
        assert!(json["overrides"].as_array().unwrap().is_empty());
    }

    #[test]
    fn apply_only_touches_provided_keys() {
        let mut defaults = ManifestDefaults::with_timezone("UTC");
        defaults.apply(DefaultsUpdate {
            volume: Some(0.5),
            mute: Some(false),
            ..DefaultsUpdate::default()
        });

        assert!((defaults.volume - 0.5).abs() < f64::EPSILON);
        assert!(!defaults.mute);
        assert_eq!(defaults.image_duration_ms, 10_000);
        assert_eq!(defaults.fit_mode, "fit");
    }

    #[test]
    fn upsert_merges_existing_override() {
        let mut manifest = Manifest::with_timezone("UTC");
        manifest.upsert_override(ManifestOverride {
            src: "/media/a.png".to_string(),
            fit_mode: Some("fill".to_string()),
            ..ManifestOverride::default()
        });
        manifest.upsert_override(ManifestOverride {
            src: "/media/a.png".to_string(),
            image_duration_ms: Some(3000),
            ..ManifestOverride::default()
        });

        assert_eq!(manifest.overrides.len(), 1);
        assert_eq!(manifest.overrides[0].fit_mode.as_deref(), Some("fill"));
        assert_eq!(manifest.overrides[0].image_duration_ms, Some(3000));

        assert!(manifest.remove_override("/media/a.png"));
        assert!(!manifest.remove_override("/media/a.png"));
        assert!(manifest.overrides.is_empty());
    }
}
