//! Static table of texture locations.

use crate::quality::AssetDescriptor;

const SSS: &str = "https://www.solarsystemscope.com/textures/download";
const POLYHAVEN: &str = "https://dl.polyhaven.org/file/ph-assets/HDRIs/hdr";

/// Every texture the scene knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKey {
    Starfield,
    SunSurface,
    EarthMap,
    EarthNormal,
    EarthSpecular,
    EarthClouds,
    MercuryMap,
    MoonMap,
    MarsMap,
    MarsNormal,
    JupiterMap,
    AsteroidMap,
    EnvironmentHdr,
}

impl AssetKey {
    pub const ALL: [AssetKey; 13] = [
        AssetKey::Starfield,
        AssetKey::SunSurface,
        AssetKey::EarthMap,
        AssetKey::EarthNormal,
        AssetKey::EarthSpecular,
        AssetKey::EarthClouds,
        AssetKey::MercuryMap,
        AssetKey::MoonMap,
        AssetKey::MarsMap,
        AssetKey::MarsNormal,
        AssetKey::JupiterMap,
        AssetKey::AsteroidMap,
        AssetKey::EnvironmentHdr,
    ];

    /// Short name used for thread names and log lines.
    pub fn name(self) -> &'static str {
        match self {
            AssetKey::Starfield => "starfield",
            AssetKey::SunSurface => "sun",
            AssetKey::EarthMap => "earth-map",
            AssetKey::EarthNormal => "earth-normal",
            AssetKey::EarthSpecular => "earth-specular",
            AssetKey::EarthClouds => "earth-clouds",
            AssetKey::MercuryMap => "mercury",
            AssetKey::MoonMap => "moon",
            AssetKey::MarsMap => "mars-map",
            AssetKey::MarsNormal => "mars-normal",
            AssetKey::JupiterMap => "jupiter",
            AssetKey::AsteroidMap => "asteroid",
            AssetKey::EnvironmentHdr => "environment",
        }
    }

    /// Tiered download locations for this texture.
    pub fn descriptor(self) -> AssetDescriptor {
        let sss = |file: &str| -> [(String, String); 2] {
            [
                ("8k".to_string(), format!("{SSS}/8k_{file}")),
                ("4k".to_string(), format!("{SSS}/4k_{file}")),
            ]
        };
        let pairs = match self {
            AssetKey::Starfield => sss("stars_milky_way.jpg"),
            AssetKey::SunSurface => sss("sun.jpg"),
            AssetKey::EarthMap => sss("earth_daymap.jpg"),
            AssetKey::EarthNormal => sss("earth_normal_map.jpg"),
            AssetKey::EarthSpecular => sss("earth_specular_map.jpg"),
            AssetKey::EarthClouds => sss("earth_clouds.jpg"),
            AssetKey::MercuryMap => sss("mercury.jpg"),
            AssetKey::MoonMap => sss("moon.jpg"),
            AssetKey::MarsMap => sss("mars.jpg"),
            AssetKey::MarsNormal => sss("mars_normal_map.jpg"),
            AssetKey::JupiterMap => sss("jupiter.jpg"),
            AssetKey::AsteroidMap => [
                ("4k".to_string(), format!("{SSS}/4k_ceres_fictional.jpg")),
                ("2k".to_string(), format!("{SSS}/2k_ceres_fictional.jpg")),
            ],
            AssetKey::EnvironmentHdr => [
                (
                    "4k".to_string(),
                    format!("{POLYHAVEN}/4k/kloofendal_48d_partly_cloudy_4k.hdr"),
                ),
                (
                    "2k".to_string(),
                    format!("{POLYHAVEN}/2k/kloofendal_48d_partly_cloudy_2k.hdr"),
                ),
            ],
        };
        AssetDescriptor::Tiered(pairs.into())
    }
}
