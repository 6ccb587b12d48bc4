use serde::Deserialize;

use crate::error::Result;

/// Attribute on `<body>` that may carry a JSON override of [`PageConfig`].
pub const CONFIG_ATTRIBUTE: &str = "data-page-config";

/// Whether the page is laid out for a phone or a larger screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportClass {
    Mobile,
    Desktop,
}

/// A value that differs between mobile and desktop layouts.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct PerViewport<T> {
    pub mobile: T,
    pub desktop: T,
}

impl<T: Copy> PerViewport<T> {
    pub fn pick(&self, class: ViewportClass) -> T {
        match class {
            ViewportClass::Mobile => self.mobile,
            ViewportClass::Desktop => self.desktop,
        }
    }
}

/// Every tunable used by the page behaviors. Missing fields fall back to the
/// values the site ships with.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub mobile_breakpoint: f64,
    pub splash_delay_ms: PerViewport<u32>,
    pub reveal_delay_ms: PerViewport<u32>,
    pub stagger_step_ms: PerViewport<u32>,
    pub fade_seconds: PerViewport<f64>,
    pub nav_scroll_defer_ms: u32,
    pub anchor_offset: f64,
    pub header_threshold: f64,
    pub back_to_top_threshold: f64,
    pub reveal_threshold: f64,
    pub progress_throttle_ms: u32,
    pub header_throttle_ms: u32,
    pub back_to_top_throttle_ms: u32,
    pub back_to_top_label: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            mobile_breakpoint: 768.0,
            splash_delay_ms: PerViewport { mobile: 1800, desktop: 2500 },
            reveal_delay_ms: PerViewport { mobile: 500, desktop: 800 },
            stagger_step_ms: PerViewport { mobile: 30, desktop: 50 },
            fade_seconds: PerViewport { mobile: 0.5, desktop: 0.8 },
            nav_scroll_defer_ms: 50,
            anchor_offset: 80.0,
            header_threshold: 50.0,
            back_to_top_threshold: 300.0,
            reveal_threshold: 0.2,
            progress_throttle_ms: 16,
            header_throttle_ms: 100,
            back_to_top_throttle_ms: 100,
            back_to_top_label: "Back to top".to_string(),
        }
    }
}

impl PageConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Parses an optional override, logging and falling back to defaults when
    /// it is malformed.
    pub fn from_attribute(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => PageConfig::default(),
            Some(raw) => PageConfig::from_json(raw).unwrap_or_else(|err| {
                log::warn!("Ignoring {}: {}", CONFIG_ATTRIBUTE, err);
                PageConfig::default()
            }),
        }
    }

    pub fn classify(&self, viewport_width: f64) -> ViewportClass {
        if viewport_width <= self.mobile_breakpoint {
            ViewportClass::Mobile
        } else {
            ViewportClass::Desktop
        }
    }

    pub fn is_mobile(&self, viewport_width: f64) -> bool {
        self.classify(viewport_width) == ViewportClass::Mobile
    }
}
