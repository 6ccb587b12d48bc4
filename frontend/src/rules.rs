/// Scroll metrics read once per dispatch so every derived update agrees.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ScrollSnapshot {
    pub scroll_y: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

impl ScrollSnapshot {
    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.scroll_y, self.document_height, self.viewport_height)
    }
}

/// Width of the progress bar in percent. A page that cannot scroll reports 0.
pub fn progress_percent(scroll_y: f64, document_height: f64, viewport_height: f64) -> f64 {
    let max_scroll = document_height - viewport_height;
    if max_scroll.is_nan() || max_scroll <= 0.0 || !scroll_y.is_finite() {
        return 0.0;
    }
    let percent = scroll_y / max_scroll * 100.0;
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn header_scrolled(scroll_y: f64, threshold: f64) -> bool {
    scroll_y > threshold
}

pub fn back_to_top_visible(scroll_y: f64, threshold: f64) -> bool {
    scroll_y > threshold
}

/// Document offset to scroll to so that a target sits `offset` pixels below
/// the top of the viewport.
pub fn anchor_scroll_target(element_top: f64, offset: f64) -> f64 {
    (element_top - offset).max(0.0)
}

/// CSS value for the progress bar width.
pub fn progress_width(percent: f64) -> String {
    format!("{}%", percent)
}

/// In-page links are those whose target starts with `#` and names something.
pub fn in_page_target(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}
