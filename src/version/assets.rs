//! Platform classification of release assets

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::version::types::Asset;

/// Default host that asset paths are relative to
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://desktop.dl.hagicode.com/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetType {
    WindowsSetup,
    WindowsPortable,
    WindowsStore,
    MacosApple,
    MacosIntel,
    LinuxAppimage,
    LinuxDeb,
    LinuxTarball,
    Unknown,
}

impl AssetType {
    /// Infer the asset type from its file name. Rules are checked in order,
    /// so `app-setup.exe` is a setup and not a portable build.
    pub fn infer(filename: &str) -> Self {
        let name = filename.to_lowercase();

        if name.contains("setup") && name.ends_with(".exe") {
            AssetType::WindowsSetup
        } else if name.ends_with(".exe") {
            AssetType::WindowsPortable
        } else if name.ends_with(".appx") {
            AssetType::WindowsStore
        } else if (name.contains("arm64") && name.ends_with(".dmg"))
            || name.contains("arm64-mac.zip")
        {
            AssetType::MacosApple
        } else if name.ends_with(".dmg") || name.contains("-mac.zip") {
            AssetType::MacosIntel
        } else if name.ends_with(".appimage") {
            AssetType::LinuxAppimage
        } else if name.contains("_amd64.deb") {
            AssetType::LinuxDeb
        } else if name.contains(".tar.gz") {
            AssetType::LinuxTarball
        } else {
            AssetType::Unknown
        }
    }

    pub fn platform(self) -> Option<Platform> {
        match self {
            AssetType::WindowsSetup | AssetType::WindowsPortable | AssetType::WindowsStore => {
                Some(Platform::Windows)
            }
            AssetType::MacosApple | AssetType::MacosIntel => Some(Platform::Macos),
            AssetType::LinuxAppimage | AssetType::LinuxDeb | AssetType::LinuxTarball => {
                Some(Platform::Linux)
            }
            AssetType::Unknown => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetType::WindowsSetup => "Installer",
            AssetType::WindowsPortable => "Portable",
            AssetType::WindowsStore => "Microsoft Store",
            AssetType::MacosApple => "Apple Silicon",
            AssetType::MacosIntel => "Intel",
            AssetType::LinuxAppimage => "AppImage",
            AssetType::LinuxDeb => "Debian package",
            AssetType::LinuxTarball => "Tarball",
            AssetType::Unknown => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Macos,
    Linux,
}

impl Platform {
    pub fn recommended_type(self) -> AssetType {
        match self {
            Platform::Windows => AssetType::WindowsSetup,
            Platform::Macos => AssetType::MacosApple,
            Platform::Linux => AssetType::LinuxAppimage,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Windows => "Windows",
            Platform::Macos => "macOS",
            Platform::Linux => "Linux",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDownload {
    pub url: String,
    pub size: String,
    pub filename: String,
    pub asset_type: AssetType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformGroup {
    pub platform: Platform,
    pub downloads: Vec<PlatformDownload>,
}

impl PlatformGroup {
    /// The recommended download, or the first one when none matches
    pub fn recommended(&self) -> Option<&PlatformDownload> {
        let wanted = self.platform.recommended_type();
        self.downloads
            .iter()
            .find(|d| d.asset_type == wanted)
            .or_else(|| self.downloads.first())
    }
}

/// Group assets by platform in first-seen order, skipping unclassified
/// files. Within a group the recommended type comes first.
pub fn group_by_platform(assets: &[Asset], base_url: &str) -> Vec<PlatformGroup> {
    let mut groups: IndexMap<Platform, Vec<PlatformDownload>> = IndexMap::new();

    for asset in assets {
        let asset_type = AssetType::infer(&asset.name);
        let Some(platform) = asset_type.platform() else {
            continue;
        };
        groups.entry(platform).or_default().push(PlatformDownload {
            url: format!("{}{}", base_url, asset.path),
            size: format_file_size(asset.size),
            filename: asset.name.clone(),
            asset_type,
        });
    }

    groups
        .into_iter()
        .map(|(platform, mut downloads)| {
            let wanted = platform.recommended_type();
            // Stable: non-recommended downloads keep their order
            downloads.sort_by_key(|d| d.asset_type != wanted);
            PlatformGroup {
                platform,
                downloads,
            }
        })
        .collect()
}

/// `1.5 GB` from one GiB up, whole `MB` below.
pub fn format_file_size(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes = bytes as f64;
    if bytes >= GIB {
        format!("{:.1} GB", bytes / GIB)
    } else {
        format!("{:.0} MB", bytes / MIB)
    }
}
