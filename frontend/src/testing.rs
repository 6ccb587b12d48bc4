//! In-memory page and virtual clock for driving a [`PageController`] without a
//! browser.

use std::collections::{BTreeSet, HashMap};

use crate::config::PageConfig;
use crate::controller::{EventOutcome, HostRequest, IntersectionEntry, PageController};
use crate::error::Result;
use crate::rules::ScrollSnapshot;
use crate::schedule::{TaskId, TimerRequest};
use crate::Dom;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, Default)]
pub struct FakeNode {
    pub id: Option<String>,
    pub classes: BTreeSet<String>,
    /// Extra selectors this node answers to, e.g. `.nav-list a`.
    pub selectors: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub styles: HashMap<String, String>,
    pub top: f64,
    pub height: f64,
}

#[derive(Clone, Debug)]
pub struct FakeDom {
    pub nodes: Vec<FakeNode>,
    pub body: Option<NodeId>,
    pub scroll_y: f64,
    pub document_height: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Every `scroll_to` call as `(top, smooth)`.
    pub scrolls: Vec<(f64, bool)>,
}

impl FakeDom {
    pub fn new(viewport_width: f64, viewport_height: f64, document_height: f64) -> Self {
        let mut dom = FakeDom {
            nodes: Vec::new(),
            body: None,
            scroll_y: 0.0,
            document_height,
            viewport_width,
            viewport_height,
            scrolls: Vec::new(),
        };
        dom.body = Some(dom.push(FakeNode::default()));
        dom
    }

    /// The landing page markup: header, hero, six sections, splash, mobile
    /// menu, progress bar and three content cards.
    pub fn landing_page(viewport_width: f64) -> Self {
        let mut dom = FakeDom::new(viewport_width, 800.0, 4800.0);
        dom.element("header", 0.0, 80.0);
        dom.element("hero", 80.0, 700.0);
        let sections = ["services", "about", "testimonials", "booking", "contact", "footer"];
        for (index, class) in sections.iter().enumerate() {
            let node = dom.element(class, 780.0 + index as f64 * 650.0, 650.0);
            dom.nodes[node.0].id = Some(class.to_string());
        }
        dom.with_id("splash-screen");
        dom.element("mobile-menu-btn", 0.0, 40.0);
        dom.element("close-menu-btn", 0.0, 40.0);
        dom.element("nav", 0.0, 80.0);
        dom.element("menu-overlay", 0.0, 800.0);
        for target in ["#services", "#about", "#booking", "#contact"] {
            let link = dom.push(FakeNode {
                selectors: vec![".nav-list a".to_string()],
                ..FakeNode::default()
            });
            dom.nodes[link.0].attributes.insert("href".to_string(), target.to_string());
        }
        dom.with_id("scroll-progress");
        dom.element("service-card", 900.0, 300.0);
        dom.element("about-content", 1500.0, 400.0);
        dom.element("testimonials-card", 2100.0, 300.0);
        dom
    }

    pub fn push(&mut self, node: FakeNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn element(&mut self, class: &str, top: f64, height: f64) -> NodeId {
        let mut node = FakeNode { top, height, ..FakeNode::default() };
        node.classes.insert(class.to_string());
        self.push(node)
    }

    pub fn with_id(&mut self, id: &str) -> NodeId {
        self.push(FakeNode { id: Some(id.to_string()), ..FakeNode::default() })
    }

    pub fn remove_id(&mut self, id: &str) {
        for node in &mut self.nodes {
            if node.id.as_deref() == Some(id) {
                node.id = None;
            }
        }
    }

    pub fn node(&self, id: NodeId) -> &FakeNode {
        &self.nodes[id.0]
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.nodes[id.0].styles.get(property).map(String::as_str)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attributes.get(name).map(String::as_str)
    }

    fn matches(node: &FakeNode, selector: &str) -> bool {
        if let Some(class) = selector.strip_prefix('.').filter(|rest| !rest.contains(' ')) {
            return node.classes.contains(class);
        }
        if let Some(id) = selector.strip_prefix('#') {
            return node.id.as_deref() == Some(id);
        }
        node.selectors.iter().any(|own| own == selector)
    }
}

impl Dom for FakeDom {
    type Node = NodeId;

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let parts: Vec<&str> = selector.split(',').map(str::trim).collect();
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| parts.iter().any(|part| FakeDom::matches(node, part)))
            .map(|(index, _)| NodeId(index))
            .collect()
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.id.as_deref() == Some(id))
            .map(NodeId)
    }

    fn body(&self) -> Option<NodeId> {
        self.body
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        self.nodes[node.0].classes.insert(class.to_string());
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        self.nodes[node.0].classes.remove(class);
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.nodes[node.0].classes.contains(class)
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        self.nodes[node.0].attributes.insert(name.to_string(), value.to_string());
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) {
        let styles = &mut self.nodes[node.0].styles;
        if value.is_empty() {
            styles.remove(property);
        } else {
            styles.insert(property.to_string(), value.to_string());
        }
    }

    fn scroll_snapshot(&self) -> ScrollSnapshot {
        ScrollSnapshot {
            scroll_y: self.scroll_y,
            document_height: self.document_height,
            viewport_height: self.viewport_height,
        }
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn document_top(&self, node: &NodeId) -> f64 {
        self.nodes[node.0].top
    }

    fn offset_height(&self, node: &NodeId) -> f64 {
        self.nodes[node.0].height
    }

    fn scroll_to(&mut self, top: f64, smooth: bool) {
        self.scrolls.push((top, smooth));
        self.scroll_y = top;
    }

    fn append_back_to_top(&mut self, id: &str, label: &str) -> Option<NodeId> {
        let mut node = FakeNode { id: Some(id.to_string()), ..FakeNode::default() };
        node.attributes.insert("aria-label".to_string(), label.to_string());
        Some(self.push(node))
    }
}

/// A controller over a [`FakeDom`] plus a virtual clock that services its
/// timer and animation-frame requests.
pub struct FakeSession {
    pub controller: PageController<FakeDom>,
    now: u64,
    timers: BTreeSet<(u64, TaskId)>,
    frame_pending: bool,
    pub unobserved: Vec<NodeId>,
}

impl FakeSession {
    pub fn boot(dom: FakeDom, config: PageConfig) -> Result<Self> {
        let controller = PageController::boot(dom, config)?;
        let mut session = FakeSession {
            controller,
            now: 0,
            timers: BTreeSet::new(),
            frame_pending: false,
            unobserved: Vec::new(),
        };
        session.pump();
        Ok(session)
    }

    pub fn dom(&self) -> &FakeDom {
        self.controller.dom()
    }

    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    /// Moves the user's scroll position and dispatches a scroll event.
    pub fn scroll(&mut self, scroll_y: f64) {
        self.controller.dom_mut().scroll_y = scroll_y;
        self.controller.on_scroll();
        self.pump();
    }

    pub fn click_menu_button(&mut self) -> EventOutcome {
        let outcome = self.controller.on_menu_button_click();
        self.pump();
        outcome
    }

    pub fn click_close_button(&mut self) -> EventOutcome {
        let outcome = self.controller.on_close_button_click();
        self.pump();
        outcome
    }

    pub fn click_overlay(&mut self) {
        self.controller.on_overlay_click();
        self.pump();
    }

    pub fn press(&mut self, key: &str) {
        self.controller.on_keydown(key);
        self.pump();
    }

    pub fn click_nav_link(&mut self, href: &str) -> EventOutcome {
        let outcome = self.controller.on_nav_link_click(href);
        self.pump();
        outcome
    }

    pub fn click_anchor(&mut self, href: &str) -> EventOutcome {
        let outcome = self.controller.on_anchor_click(href);
        self.pump();
        outcome
    }

    pub fn click_back_to_top(&mut self) {
        self.controller.on_back_to_top_click();
        self.pump();
    }

    pub fn intersect(&mut self, target: NodeId, ratio: f64) {
        let entry = IntersectionEntry { target, is_intersecting: ratio > 0.0, ratio };
        self.controller.on_intersection(&[entry]);
        self.pump();
    }

    /// Runs every timer due within `ms` in deadline order, then paints a frame.
    pub fn advance(&mut self, ms: u64) {
        let until = self.now + ms;
        loop {
            let Some((due, id)) = self.timers.first().copied() else {
                break;
            };
            if due > until {
                break;
            }
            self.timers.remove(&(due, id));
            self.now = due;
            self.controller.on_timer(id);
            self.pump();
        }
        self.now = until;
        self.paint();
    }

    pub fn paint(&mut self) {
        if std::mem::take(&mut self.frame_pending) {
            self.controller.on_animation_frame();
            self.pump();
        }
    }

    pub fn shutdown(&mut self) {
        self.controller.shutdown();
        self.pump();
    }

    fn pump(&mut self) {
        for request in self.controller.drain_requests() {
            match request {
                HostRequest::Timer(TimerRequest::Arm { id, delay_ms }) => {
                    self.timers.insert((self.now + u64::from(delay_ms), id));
                }
                HostRequest::Timer(TimerRequest::Cancel(id)) => {
                    self.timers.retain(|&(_, armed)| armed != id);
                }
                HostRequest::AnimationFrame => self.frame_pending = true,
                HostRequest::Unobserve(node) => self.unobserved.push(node),
            }
        }
    }
}
