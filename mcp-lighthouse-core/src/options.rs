//! Per-audit options handed to the audit engine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Emulated form factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
}

impl Device {
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Desktop => "desktop",
            Device::Mobile => "mobile",
        }
    }

    /// Viewport width and height in CSS pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Device::Desktop => (1350, 940),
            Device::Mobile => (360, 640),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(Device::Desktop),
            "mobile" => Ok(Device::Mobile),
            other => Err(format!("unknown device '{}', expected desktop or mobile", other)),
        }
    }
}

/// Audit category key as the engine names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Performance,
    Accessibility,
    BestPractices,
    Seo,
    Pwa,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Performance,
        Category::Accessibility,
        Category::BestPractices,
        Category::Seo,
        Category::Pwa,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::Accessibility => "accessibility",
            Category::BestPractices => "best-practices",
            Category::Seo => "seo",
            Category::Pwa => "pwa",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Screen emulation passed to the engine. Device scale factor is always 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenEmulation {
    pub mobile: bool,
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: u32,
    pub disabled: bool,
}

impl ScreenEmulation {
    pub fn for_device(device: Device) -> Self {
        let (width, height) = device.dimensions();
        Self {
            mobile: device != Device::Desktop,
            width,
            height,
            device_scale_factor: 1,
            disabled: false,
        }
    }
}

/// Network/CPU simulation triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Throttling {
    pub rtt_ms: f64,
    pub throughput_kbps: f64,
    pub cpu_slowdown_multiplier: f64,
}

impl Throttling {
    pub const ENABLED: Throttling = Throttling {
        rtt_ms: 150.0,
        throughput_kbps: 1638.4,
        cpu_slowdown_multiplier: 4.0,
    };

    pub const DISABLED: Throttling = Throttling {
        rtt_ms: 0.0,
        throughput_kbps: 10.0 * 1024.0,
        cpu_slowdown_multiplier: 1.0,
    };

    pub fn profile(enabled: bool) -> Self {
        if enabled {
            Self::ENABLED
        } else {
            Self::DISABLED
        }
    }
}

/// Everything the engine needs for one run besides the URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOptions {
    pub port: u16,
    pub form_factor: Device,
    pub screen_emulation: ScreenEmulation,
    /// `None` audits every category.
    pub only_categories: Option<Vec<Category>>,
    pub throttling: Throttling,
    pub disable_storage_reset: bool,
}

impl AuditOptions {
    pub fn new(
        port: u16,
        device: Device,
        categories: Option<&[Category]>,
        throttling: bool,
        disable_storage_reset: bool,
    ) -> Self {
        Self {
            port,
            form_factor: device,
            screen_emulation: ScreenEmulation::for_device(device),
            only_categories: categories.map(<[Category]>::to_vec),
            throttling: Throttling::profile(throttling),
            disable_storage_reset,
        }
    }
}
