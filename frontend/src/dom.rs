use std::fmt::Debug;

use crate::error::{PageError, Result};
use crate::rules::ScrollSnapshot;

pub const HEADER: &str = ".header";
pub const HERO: &str = ".hero";
pub const LATER_SECTIONS: &str = ".services, .about, .testimonials, .booking, .contact, .footer";
pub const SPLASH_ID: &str = "splash-screen";
pub const MENU_BUTTON: &str = ".mobile-menu-btn";
pub const CLOSE_BUTTON: &str = ".close-menu-btn";
pub const NAV: &str = ".nav";
pub const NAV_LINKS: &str = ".nav-list a";
pub const OVERLAY: &str = ".menu-overlay";
pub const PROGRESS_ID: &str = "scroll-progress";
pub const REVEAL_TARGETS: &str = ".service-card, .about-content, .testimonials-card";
pub const BACK_TO_TOP_ID: &str = "back-to-top";

pub const ACTIVE: &str = "active";
pub const SCROLLED: &str = "scrolled";
pub const VISIBLE: &str = "visible";
pub const SPLASH_HIDDEN: &str = "splash-hidden";

/// The slice of the browser the page behaviors touch. Implemented on top of
/// `web_sys` for the real page and in memory for tests.
pub trait Dom {
    type Node: Clone + PartialEq + Debug;

    fn query(&self, selector: &str) -> Option<Self::Node>;
    /// Matches in document order.
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;
    fn by_id(&self, id: &str) -> Option<Self::Node>;
    fn body(&self) -> Option<Self::Node>;

    fn add_class(&mut self, node: &Self::Node, class: &str);
    fn remove_class(&mut self, node: &Self::Node, class: &str);
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
    /// An empty value clears the inline property.
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);

    fn scroll_snapshot(&self) -> ScrollSnapshot;
    fn viewport_width(&self) -> f64;
    /// Distance from the top of the document to the top of `node`.
    fn document_top(&self, node: &Self::Node) -> f64;
    fn offset_height(&self, node: &Self::Node) -> f64;
    fn scroll_to(&mut self, top: f64, smooth: bool);

    /// Creates the back-to-top button and appends it to `<body>`.
    fn append_back_to_top(&mut self, id: &str, label: &str) -> Option<Self::Node>;
}

/// Element lookup table resolved once at boot.
#[derive(Clone, Debug)]
pub struct PageElements<N> {
    pub body: N,
    pub header: N,
    pub nav: N,
    pub menu_button: N,
    pub close_button: Option<N>,
    pub overlay: Option<N>,
    pub splash: Option<N>,
    pub progress: Option<N>,
    pub nav_links: Vec<N>,
    pub reveal_targets: Vec<N>,
    /// Fade-in order: header, hero, then the remaining sections.
    pub sections: Vec<N>,
    pub back_to_top: Option<N>,
}

impl<N: Clone + PartialEq> PageElements<N> {
    pub fn collect<D: Dom<Node = N>>(dom: &D) -> Result<Self> {
        let body = dom.body().ok_or(PageError::MissingElement("body"))?;
        let header = dom.query(HEADER).ok_or(PageError::MissingElement(HEADER))?;
        let nav = dom.query(NAV).ok_or(PageError::MissingElement(NAV))?;
        let menu_button = dom.query(MENU_BUTTON).ok_or(PageError::MissingElement(MENU_BUTTON))?;

        let mut sections = vec![header.clone()];
        sections.extend(dom.query(HERO));
        for section in dom.query_all(LATER_SECTIONS) {
            if !sections.contains(&section) {
                sections.push(section);
            }
        }

        Ok(PageElements {
            body,
            header,
            nav,
            menu_button,
            close_button: dom.query(CLOSE_BUTTON),
            overlay: dom.query(OVERLAY),
            splash: dom.by_id(SPLASH_ID),
            progress: dom.by_id(PROGRESS_ID),
            nav_links: dom.query_all(NAV_LINKS),
            reveal_targets: dom.query_all(REVEAL_TARGETS),
            sections,
            back_to_top: None,
        })
    }

    /// Class-carrying parts of the mobile menu.
    pub fn menu_parts(&self) -> Vec<N> {
        let mut parts = vec![self.nav.clone(), self.menu_button.clone()];
        parts.extend(self.overlay.clone());
        parts
    }
}
