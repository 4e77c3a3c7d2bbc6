use anyhow::{Context, Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Meta {
    pub name: Option<String>,
}

/// Gesture policy. Every field may be omitted in a profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Thresholds {
    /// Max wrist x shift (px) for the leftmost hand to be adopted as primary.
    pub identity_stability_px: f32,
    pub pinch_min_px: f32,
    pub pinch_max_px: f32,
    /// Samples in the circle window; detection fires only when full.
    pub circle_window: usize,
    pub circle_min_path_px: f32,
    /// Mean distance from the window centroid must stay below this.
    pub circle_max_spread_px: f32,
    pub swipe_min_px: f32,
    pub unlock_dwell_ms: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            identity_stability_px: 50.0,
            pinch_min_px: 30.0,
            pinch_max_px: 200.0,
            circle_window: 30,
            circle_min_path_px: 500.0,
            circle_max_spread_px: 15.0,
            swipe_min_px: 100.0,
            unlock_dwell_ms: 1000,
        }
    }
}

impl Thresholds {
    pub fn unlock_dwell(&self) -> Duration {
        Duration::from_millis(self.unlock_dwell_ms)
    }
}

/// How incoming landmark coordinates map onto frame pixels.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameSettings {
    pub width: u32,
    pub height: u32,
    /// Points arrive in [0,1] and are scaled by width/height.
    pub normalized: bool,
    /// Flip horizontally so x grows to the user's right.
    pub mirror: bool,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            normalized: false,
            mirror: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackend {
    Pactl,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    pub backend: AudioBackend,
    pub sink: String,
    pub sim_min_db: f32,
    pub sim_max_db: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            backend: AudioBackend::Pactl,
            sink: "@DEFAULT_SINK@".to_string(),
            sim_min_db: -65.25,
            sim_max_db: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    Uinput,
    None,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaSettings {
    pub backend: MediaBackend,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            backend: MediaBackend::Uinput,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Profile {
    pub meta: Meta,
    pub thresholds: Thresholds,
    pub frame: FrameSettings,
    pub audio: AudioSettings,
    pub media: MediaSettings,
}

#[derive(Debug, Clone)]
pub struct ConfigState {
    pub active_name: String,
    pub profile: Profile,
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("handctl"))
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl ConfigState {
    /// Install the built-in default profile if needed, then load the profile
    /// named by the active pointer (or `override_name` when given).
    pub fn load_or_install_default(override_name: Option<&str>) -> Result<Self> {
        let cfgdir = config_dir()?;
        let profdir = cfgdir.join("profiles");
        fs::create_dir_all(&profdir)
            .with_context(|| format!("failed to create {}", profdir.display()))?;

        let def_path = profdir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = cfgdir.join("active");
        if !active_ptr.exists() {
            let mut f = fs::File::create(&active_ptr)?;
            f.write_all(b"default")?;
        }

        let active_name = match override_name {
            Some(n) => n.to_string(),
            None => fs::read_to_string(&active_ptr)?.trim().to_string(),
        };
        let profile = load_profile(&profdir.join(format!("{active_name}.toml")))?;

        Ok(Self {
            active_name,
            profile,
            config_dir: cfgdir,
            profiles_dir: profdir,
            active_ptr,
        })
    }

    pub fn active_path(&self) -> PathBuf {
        self.profiles_dir.join(format!("{}.toml", self.active_name))
    }

    /// Re-read the active profile. On error the current profile is kept.
    pub fn reload(&mut self) -> Result<()> {
        self.profile = load_profile(&self.active_path())?;
        Ok(())
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let p = self.profiles_dir.join(format!("{name}.toml"));
        if !p.exists() {
            return Err(anyhow!("profile not found: {}", p.display()));
        }
        let profile = load_profile(&p)?;
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        self.profile = profile;
        Ok(())
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let path = e.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }

    pub fn doctor_report(&self) -> serde_json::Value {
        serde_json::json!({
            "uinput_present": Path::new("/dev/uinput").exists(),
            "input_group_member": check_in_input_group(),
            "pactl_available": crate::audio::pactl_available(),
            "config_dir": self.config_dir,
            "profiles_dir": self.profiles_dir,
            "active_profile": self.active_name,
            "audio_backend": format!("{:?}", self.profile.audio.backend).to_lowercase(),
            "media_backend": format!("{:?}", self.profile.media.backend).to_lowercase(),
            "hints": {
                "udev_rule": "/etc/udev/rules.d/80-uinput.rules",
                "add_user_to_input_group": "sudo usermod -aG input $USER && newgrp input"
            }
        })
    }
}

fn load_profile(path: &Path) -> Result<Profile> {
    let txt = fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    parse_profile(&txt).with_context(|| format!("failed to load {}", path.display()))
}

pub fn parse_profile(txt: &str) -> Result<Profile> {
    let profile: Profile = toml::from_str(txt).map_err(|e| anyhow!("parse error: {e}"))?;
    validate_thresholds(&profile.thresholds)?;
    if profile.frame.width == 0 || profile.frame.height == 0 {
        return Err(anyhow!("frame.width and frame.height must be positive"));
    }
    if profile.audio.sim_min_db >= profile.audio.sim_max_db {
        return Err(anyhow!("audio.sim_min_db must be below audio.sim_max_db"));
    }
    Ok(profile)
}

pub fn validate_thresholds(t: &Thresholds) -> Result<()> {
    let positive = [
        ("identity_stability_px", t.identity_stability_px),
        ("pinch_max_px", t.pinch_max_px),
        ("circle_min_path_px", t.circle_min_path_px),
        ("circle_max_spread_px", t.circle_max_spread_px),
        ("swipe_min_px", t.swipe_min_px),
    ];
    for (name, v) in positive {
        if !(v.is_finite() && v > 0.0) {
            return Err(anyhow!("thresholds.{name} must be a positive number"));
        }
    }
    if !(t.pinch_min_px.is_finite() && t.pinch_min_px >= 0.0) {
        return Err(anyhow!("thresholds.pinch_min_px must not be negative"));
    }
    if t.pinch_min_px >= t.pinch_max_px {
        return Err(anyhow!(
            "thresholds.pinch_min_px ({}) must be below pinch_max_px ({})",
            t.pinch_min_px,
            t.pinch_max_px
        ));
    }
    if t.circle_window < 2 {
        return Err(anyhow!("thresholds.circle_window must be at least 2"));
    }
    if t.unlock_dwell_ms == 0 {
        return Err(anyhow!("thresholds.unlock_dwell_ms must be positive"));
    }
    Ok(())
}

fn check_in_input_group() -> bool {
    let Ok(s) = fs::read_to_string("/etc/group") else {
        return false;
    };
    let user = whoami::username();
    s.lines()
        .filter(|line| line.starts_with("input:"))
        .any(|line| {
            line.split(':')
                .nth(3)
                .unwrap_or("")
                .split(',')
                .any(|u| u == user)
        })
}
