use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Per-session UI preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub live_data: bool,
    #[serde(rename = "devUI")]
    pub dev_ui: bool,
    pub sidenav: bool,
    pub view_info: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl Default for Preferences {
    /// Standalone defaults: canned data, developer UI visible.
    fn default() -> Self {
        Self {
            live_data: false,
            dev_ui: true,
            sidenav: false,
            view_info: false,
            client_id: None,
        }
    }
}

impl Preferences {
    /// Values pinned while running inside the host client.
    pub fn embedded() -> Self {
        Self {
            live_data: true,
            dev_ui: false,
            sidenav: false,
            view_info: true,
            client_id: None,
        }
    }

    pub fn show_sidenav(&self) -> bool {
        self.sidenav && self.dev_ui
    }

    pub fn toggle(&mut self, preference: Preference) {
        let flag = match preference {
            Preference::LiveData => &mut self.live_data,
            Preference::DevUi => &mut self.dev_ui,
            Preference::Sidenav => &mut self.sidenav,
            Preference::ViewInfo => &mut self.view_info,
        };
        *flag = !*flag;
    }

    /// Reads preferences from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preference {
    #[serde(rename = "liveData")]
    LiveData,
    #[serde(rename = "devUI")]
    DevUi,
    #[serde(rename = "sidenav")]
    Sidenav,
    #[serde(rename = "viewInfo")]
    ViewInfo,
}

impl Preference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LiveData => "liveData",
            Self::DevUi => "devUI",
            Self::Sidenav => "sidenav",
            Self::ViewInfo => "viewInfo",
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "liveData" => Ok(Self::LiveData),
            "devUI" => Ok(Self::DevUi),
            "sidenav" => Ok(Self::Sidenav),
            "viewInfo" => Ok(Self::ViewInfo),
            other => Err(format!("unknown preference: {other}")),
        }
    }
}
