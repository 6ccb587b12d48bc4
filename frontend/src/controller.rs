use std::collections::HashMap;

use log::{debug, info};

use crate::config::{PageConfig, ViewportClass};
use crate::dom::{self, Dom, PageElements};
use crate::error::Result;
use crate::rules::{self, ScrollSnapshot};
use crate::schedule::{Channel, Scheduler, Task, TaskId, TimerRequest};
use crate::throttle::{Admission, Throttle};

// Browsers report ratios like 0.19999 for a 0.2 threshold crossing.
const RATIO_EPSILON: f64 = 1e-3;

/// Work the controller needs the browser to do on its behalf.
#[derive(Clone, Debug, PartialEq)]
pub enum HostRequest<N> {
    Timer(TimerRequest),
    AnimationFrame,
    Unobserve(N),
}

/// Whether the host should suppress the browser's default action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    PreventDefault,
    Proceed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionEntry<N> {
    pub target: N,
    pub is_intersecting: bool,
    pub ratio: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplashPhase {
    Showing,
    Hiding,
    Done,
}

#[derive(Debug)]
struct Throttles {
    progress: Throttle,
    header: Throttle,
    back_to_top: Throttle,
}

impl Throttles {
    fn get(&mut self, channel: Channel) -> &mut Throttle {
        match channel {
            Channel::Progress => &mut self.progress,
            Channel::Header => &mut self.header,
            Channel::BackToTop => &mut self.back_to_top,
        }
    }
}

/// Owns every piece of transient page state and reacts to browser events.
///
/// Each `on_*` method is one event rule. Side effects that need the browser's
/// clock or observers are queued as [`HostRequest`]s and collected with
/// [`PageController::drain_requests`] after every call.
pub struct PageController<D: Dom> {
    dom: D,
    config: PageConfig,
    viewport: ViewportClass,
    elements: PageElements<D::Node>,
    anchors: HashMap<String, D::Node>,
    menu_open: bool,
    splash: SplashPhase,
    throttles: Throttles,
    scheduler: Scheduler,
    deferred_scroll: Option<TaskId>,
    frame_requested: bool,
    pending_progress: Option<f64>,
    requests: Vec<HostRequest<D::Node>>,
}

impl<D: Dom> PageController<D> {
    /// Resolves the page elements, starts the opening sequence and injects the
    /// back-to-top button.
    pub fn boot(mut dom: D, config: PageConfig) -> Result<Self> {
        let mut elements = PageElements::collect(&dom)?;
        let viewport = config.classify(dom.viewport_width());

        for section in &elements.sections {
            dom.set_style(section, "opacity", "0");
            dom.set_style(section, "transform", "translateY(0)");
            dom.set_style(section, "will-change", "opacity, transform");
        }

        elements.back_to_top =
            dom.append_back_to_top(dom::BACK_TO_TOP_ID, &config.back_to_top_label);

        let throttles = Throttles {
            progress: Throttle::new(config.progress_throttle_ms),
            header: Throttle::new(config.header_throttle_ms),
            back_to_top: Throttle::new(config.back_to_top_throttle_ms),
        };

        let mut controller = PageController {
            dom,
            viewport,
            elements,
            anchors: HashMap::new(),
            menu_open: false,
            splash: SplashPhase::Showing,
            throttles,
            scheduler: Scheduler::new(),
            deferred_scroll: None,
            frame_requested: false,
            pending_progress: None,
            requests: Vec::new(),
            config,
        };

        controller.set_menu(false);
        let splash_delay = controller.config.splash_delay_ms.pick(viewport);
        controller.scheduler.schedule(Task::HideSplash, splash_delay);

        let snapshot = controller.dom.scroll_snapshot();
        for channel in [Channel::Progress, Channel::Header, Channel::BackToTop] {
            controller.apply(channel, snapshot);
        }

        info!(
            "Page behavior ready ({:?}, {} sections, {} reveal targets)",
            viewport,
            controller.elements.sections.len(),
            controller.elements.reveal_targets.len()
        );
        Ok(controller)
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn elements(&self) -> &PageElements<D::Node> {
        &self.elements
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn splash_phase(&self) -> SplashPhase {
        self.splash
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending_len()
    }

    /// Everything queued for the host since the last drain, in order.
    pub fn drain_requests(&mut self) -> Vec<HostRequest<D::Node>> {
        self.flush_timers();
        std::mem::take(&mut self.requests)
    }

    pub fn on_scroll(&mut self) {
        let snapshot = self.dom.scroll_snapshot();
        for channel in [Channel::Progress, Channel::Header, Channel::BackToTop] {
            self.throttled(channel, snapshot);
        }
    }

    pub fn on_animation_frame(&mut self) {
        self.frame_requested = false;
        if let (Some(percent), Some(progress)) =
            (self.pending_progress.take(), self.elements.progress.as_ref())
        {
            self.dom.set_style(progress, "width", &rules::progress_width(percent));
        }
    }

    pub fn on_timer(&mut self, id: TaskId) {
        let Some(task) = self.scheduler.fire(id) else {
            return;
        };
        match task {
            Task::HideSplash => self.hide_splash(),
            Task::RevealSections => self.reveal_sections(),
            Task::FadeInSection(index) => self.fade_in(index),
            Task::DeferredScroll(href) => {
                if self.deferred_scroll == Some(id) {
                    self.deferred_scroll = None;
                }
                let offset = self.dom.offset_height(&self.elements.header);
                self.scroll_to_anchor(&href, offset);
            }
            Task::ReleaseThrottle(channel) => {
                if self.throttles.get(channel).release() {
                    let snapshot = self.dom.scroll_snapshot();
                    self.throttled(channel, snapshot);
                }
            }
        }
    }

    pub fn on_menu_button_click(&mut self) -> EventOutcome {
        self.open_menu();
        EventOutcome::PreventDefault
    }

    pub fn on_close_button_click(&mut self) -> EventOutcome {
        self.close_menu();
        EventOutcome::PreventDefault
    }

    pub fn on_overlay_click(&mut self) {
        self.close_menu();
    }

    pub fn on_keydown(&mut self, key: &str) {
        if key == "Escape" && self.menu_open {
            self.close_menu();
        }
    }

    /// Links inside the navigation list. On narrow viewports the menu closes
    /// first and the scroll waits for the closing animation.
    pub fn on_nav_link_click(&mut self, href: &str) -> EventOutcome {
        if !self.config.is_mobile(self.dom.viewport_width()) {
            return self.on_anchor_click(href);
        }

        self.close_menu();
        if rules::in_page_target(href).is_none() {
            return EventOutcome::Proceed;
        }

        if let Some(previous) = self.deferred_scroll.take() {
            self.scheduler.cancel(previous);
        }
        let id = self
            .scheduler
            .schedule(Task::DeferredScroll(href.to_string()), self.config.nav_scroll_defer_ms);
        self.deferred_scroll = Some(id);
        EventOutcome::PreventDefault
    }

    pub fn on_anchor_click(&mut self, href: &str) -> EventOutcome {
        if !href.starts_with('#') {
            return EventOutcome::Proceed;
        }
        let offset = self.config.anchor_offset;
        self.scroll_to_anchor(href, offset);
        EventOutcome::PreventDefault
    }

    pub fn on_back_to_top_click(&mut self) {
        self.dom.scroll_to(0.0, true);
    }

    /// Reveals content cards once enough of them is on screen and asks the
    /// host to stop watching them.
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry<D::Node>]) {
        let threshold = self.config.reveal_threshold;
        for entry in entries {
            if !entry.is_intersecting || entry.ratio + RATIO_EPSILON < threshold {
                continue;
            }
            if !self.dom.has_class(&entry.target, dom::VISIBLE) {
                self.dom.add_class(&entry.target, dom::VISIBLE);
                debug!("Revealed {:?}", entry.target);
            }
            self.requests.push(HostRequest::Unobserve(entry.target.clone()));
        }
    }

    /// Cancels every outstanding timer. The page keeps its current look.
    pub fn shutdown(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        self.deferred_scroll = None;
        self.throttles.progress.reset();
        self.throttles.header.reset();
        self.throttles.back_to_top.reset();
        info!("Page behavior stopped, {} pending tasks cancelled", cancelled);
    }

    fn throttled(&mut self, channel: Channel, snapshot: ScrollSnapshot) {
        let throttle = self.throttles.get(channel);
        if throttle.admit() == Admission::Run {
            let window = throttle.window_ms();
            self.scheduler.schedule(Task::ReleaseThrottle(channel), window);
            self.apply(channel, snapshot);
        }
    }

    fn apply(&mut self, channel: Channel, snapshot: ScrollSnapshot) {
        match channel {
            Channel::Progress => {
                if self.elements.progress.is_none() {
                    return;
                }
                self.pending_progress = Some(snapshot.progress_percent());
                if !self.frame_requested {
                    self.frame_requested = true;
                    self.requests.push(HostRequest::AnimationFrame);
                }
            }
            Channel::Header => {
                let header = self.elements.header.clone();
                let scrolled = rules::header_scrolled(snapshot.scroll_y, self.config.header_threshold);
                self.toggle_class(&header, dom::SCROLLED, scrolled);
            }
            Channel::BackToTop => {
                if let Some(button) = self.elements.back_to_top.clone() {
                    let visible = rules::back_to_top_visible(
                        snapshot.scroll_y,
                        self.config.back_to_top_threshold,
                    );
                    self.toggle_class(&button, dom::VISIBLE, visible);
                }
            }
        }
    }

    fn toggle_class(&mut self, node: &D::Node, class: &str, on: bool) {
        let present = self.dom.has_class(node, class);
        if on && !present {
            self.dom.add_class(node, class);
        } else if !on && present {
            self.dom.remove_class(node, class);
        }
    }

    fn open_menu(&mut self) {
        self.set_menu(true);
        info!("Mobile menu opened");
    }

    fn close_menu(&mut self) {
        if self.menu_open {
            info!("Mobile menu closed");
        }
        self.set_menu(false);
    }

    // Class state, aria-expanded and the scroll lock always move together.
    fn set_menu(&mut self, open: bool) {
        self.menu_open = open;
        for part in self.elements.menu_parts() {
            self.toggle_class(&part, dom::ACTIVE, open);
        }
        let menu_button = self.elements.menu_button.clone();
        self.dom
            .set_attribute(&menu_button, "aria-expanded", if open { "true" } else { "false" });
        self.sync_scroll_lock();
    }

    fn sync_scroll_lock(&mut self) {
        let locked = self.menu_open || self.splash != SplashPhase::Done;
        let body = self.elements.body.clone();
        self.dom.set_style(&body, "overflow", if locked { "hidden" } else { "" });
    }

    fn hide_splash(&mut self) {
        if self.splash != SplashPhase::Showing {
            return;
        }
        self.splash = SplashPhase::Hiding;
        if let Some(splash) = self.elements.splash.clone() {
            self.dom.add_class(&splash, dom::SPLASH_HIDDEN);
        }
        let delay = self.config.reveal_delay_ms.pick(self.viewport);
        self.scheduler.schedule(Task::RevealSections, delay);
    }

    fn reveal_sections(&mut self) {
        if self.splash == SplashPhase::Done {
            return;
        }
        self.splash = SplashPhase::Done;
        self.sync_scroll_lock();
        let step = self.config.stagger_step_ms.pick(self.viewport);
        for index in 0..self.elements.sections.len() {
            let delay = step.saturating_mul(index as u32);
            self.scheduler.schedule(Task::FadeInSection(index), delay);
        }
    }

    fn fade_in(&mut self, index: usize) {
        let Some(section) = self.elements.sections.get(index).cloned() else {
            return;
        };
        let seconds = self.config.fade_seconds.pick(self.viewport);
        self.dom.set_style(&section, "transition", &format!("opacity {}s ease", seconds));
        self.dom.set_style(&section, "opacity", "1");
    }

    fn resolve_anchor(&mut self, href: &str) -> Option<D::Node> {
        if let Some(node) = self.anchors.get(href) {
            return Some(node.clone());
        }
        let node = self.dom.by_id(rules::in_page_target(href)?)?;
        self.anchors.insert(href.to_string(), node.clone());
        Some(node)
    }

    fn scroll_to_anchor(&mut self, href: &str, offset: f64) {
        match self.resolve_anchor(href) {
            Some(target) => {
                let top = rules::anchor_scroll_target(self.dom.document_top(&target), offset);
                self.dom.scroll_to(top, true);
            }
            None => debug!("No scroll target for {}", href),
        }
    }

    fn flush_timers(&mut self) {
        let timers = self.scheduler.drain_requests();
        if !timers.is_empty() {
            let mut merged: Vec<HostRequest<D::Node>> =
                timers.into_iter().map(HostRequest::Timer).collect();
            merged.append(&mut self.requests);
            self.requests = merged;
        }
    }
}
