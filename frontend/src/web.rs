use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use log::{error, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, EventTarget, HtmlElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, KeyboardEvent,
    ScrollBehavior, ScrollToOptions, Window,
};

use crate::config::{PageConfig, CONFIG_ATTRIBUTE};
use crate::controller::{EventOutcome, HostRequest, IntersectionEntry, PageController};
use crate::dom::Dom;
use crate::error::{PageError, Result};
use crate::rules::ScrollSnapshot;
use crate::schedule::{TaskId, TimerRequest};

const BACK_TO_TOP_ICON: &str = r#"<i class="fas fa-arrow-up"></i>"#;
const IN_PAGE_ANCHORS: &str = r##"a[href^="#"]"##;

/// [`Dom`] backed by the live document.
pub struct WebDom {
    window: Window,
    document: Document,
}

impl WebDom {
    pub fn new(window: Window, document: Document) -> Self {
        WebDom { window, document }
    }

    fn scroll_y(&self) -> f64 {
        self.window
            .scroll_y()
            .ok()
            .or_else(|| self.document.document_element().map(|root| root.scroll_top() as f64))
            .unwrap_or(0.0)
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.get(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&mut self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn set_attribute(&mut self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn set_style(&mut self, node: &Element, property: &str, value: &str) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            let _ = element.style().set_property(property, value);
        }
    }

    fn scroll_snapshot(&self) -> ScrollSnapshot {
        let document_height = self
            .document
            .document_element()
            .map(|root| root.scroll_height() as f64)
            .unwrap_or(0.0);
        let viewport_height = self
            .window
            .inner_height()
            .ok()
            .and_then(|height| height.as_f64())
            .unwrap_or(0.0);
        ScrollSnapshot { scroll_y: self.scroll_y(), document_height, viewport_height }
    }

    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|width| width.as_f64())
            .unwrap_or(0.0)
    }

    fn document_top(&self, node: &Element) -> f64 {
        node.get_bounding_client_rect().top() + self.scroll_y()
    }

    fn offset_height(&self, node: &Element) -> f64 {
        node.dyn_ref::<HtmlElement>()
            .map(|element| element.offset_height() as f64)
            .unwrap_or(0.0)
    }

    fn scroll_to(&mut self, top: f64, smooth: bool) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        if smooth {
            options.set_behavior(ScrollBehavior::Smooth);
        }
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn append_back_to_top(&mut self, id: &str, label: &str) -> Option<Element> {
        let button = self.document.create_element("button").ok()?;
        button.set_id(id);
        button.set_inner_html(BACK_TO_TOP_ICON);
        let _ = button.set_attribute("aria-label", label);
        self.document.body()?.append_child(&button).ok()?;
        Some(button)
    }
}

type Controller = PageController<WebDom>;

/// Glue between the controller and the browser: listeners, timers, the
/// intersection observer. Lives for the rest of the page session.
struct Runtime {
    controller: RefCell<Controller>,
    window: Window,
    timers: RefCell<HashMap<TaskId, Timeout>>,
    /// The last timer that fired. It is dropped by the next one, once its own
    /// callback has returned.
    retired: RefCell<Option<Timeout>>,
    observer: RefCell<Option<IntersectionObserver>>,
    listeners: RefCell<Vec<Closure<dyn FnMut(Event)>>>,
}

impl Runtime {
    fn dispatch<R>(self: &Rc<Self>, handler: impl FnOnce(&mut Controller) -> R) -> R {
        let (result, requests) = {
            let mut controller = self.controller.borrow_mut();
            let result = handler(&mut controller);
            (result, controller.drain_requests())
        };
        self.service(requests);
        result
    }

    fn service(self: &Rc<Self>, requests: Vec<HostRequest<Element>>) {
        for request in requests {
            match request {
                HostRequest::Timer(TimerRequest::Arm { id, delay_ms }) => {
                    let runtime = Rc::clone(self);
                    let timeout = Timeout::new(delay_ms, move || {
                        runtime.dispatch(|controller| controller.on_timer(id));
                        let fired = runtime.timers.borrow_mut().remove(&id);
                        let previous = runtime.retired.replace(fired);
                        drop(previous);
                    });
                    self.timers.borrow_mut().insert(id, timeout);
                }
                HostRequest::Timer(TimerRequest::Cancel(id)) => {
                    // dropping a gloo Timeout clears it
                    self.timers.borrow_mut().remove(&id);
                }
                HostRequest::AnimationFrame => {
                    let runtime = Rc::clone(self);
                    let frame = Closure::once_into_js(move || {
                        runtime.dispatch(|controller| controller.on_animation_frame());
                    });
                    if let Err(err) = self.window.request_animation_frame(frame.unchecked_ref()) {
                        error!("requestAnimationFrame failed: {:?}", err);
                    }
                }
                HostRequest::Unobserve(element) => {
                    if let Some(observer) = self.observer.borrow().as_ref() {
                        observer.unobserve(&element);
                    }
                }
            }
        }
    }

    fn listen(
        self: &Rc<Self>,
        target: &EventTarget,
        event: &str,
        passive: bool,
        mut handler: impl FnMut(&Rc<Runtime>, &Event) + 'static,
    ) -> Result<()> {
        let runtime = Rc::clone(self);
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| handler(&runtime, &event));
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        self.listeners.borrow_mut().push(callback);
        Ok(())
    }

    fn listen_click(
        self: &Rc<Self>,
        target: &EventTarget,
        mut handler: impl FnMut(&mut Controller) -> EventOutcome + 'static,
    ) -> Result<()> {
        self.listen(target, "click", false, move |runtime, event| {
            if runtime.dispatch(&mut handler) == EventOutcome::PreventDefault {
                event.prevent_default();
            }
        })
    }

    fn observe_reveal_targets(self: &Rc<Self>, threshold: f64, targets: &[Element]) -> Result<()> {
        let runtime = Rc::clone(self);
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                let entries: Vec<IntersectionEntry<Element>> = entries
                    .iter()
                    .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                    .map(|entry| IntersectionEntry {
                        target: entry.target(),
                        is_intersecting: entry.is_intersecting(),
                        ratio: entry.intersection_ratio(),
                    })
                    .collect();
                runtime.dispatch(|controller| controller.on_intersection(&entries));
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_root_margin("0px");
        init.set_threshold(&JsValue::from_f64(threshold));
        let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        for target in targets {
            observer.observe(target);
        }
        *self.observer.borrow_mut() = Some(observer);
        callback.forget();
        Ok(())
    }
}

/// Boots the page behaviors against the current document.
pub fn start() -> Result<()> {
    let window = web_sys::window().ok_or_else(|| PageError::Js("no window".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| PageError::Js("no document".to_string()))?;
    let raw_config = document
        .body()
        .and_then(|body| body.get_attribute(CONFIG_ATTRIBUTE));
    let config = PageConfig::from_attribute(raw_config.as_deref());

    let controller = PageController::boot(WebDom::new(window.clone(), document.clone()), config)?;
    let elements = controller.elements().clone();
    let reveal_threshold = controller.config().reveal_threshold;

    let runtime = Rc::new(Runtime {
        controller: RefCell::new(controller),
        window: window.clone(),
        timers: RefCell::new(HashMap::new()),
        retired: RefCell::new(None),
        observer: RefCell::new(None),
        listeners: RefCell::new(Vec::new()),
    });
    // boot already queued the splash timer and the first paint
    runtime.dispatch(|_| ());

    runtime.listen(&window, "scroll", true, |runtime, _| {
        runtime.dispatch(|controller| controller.on_scroll());
    })?;

    runtime.listen_click(&elements.menu_button, |controller| controller.on_menu_button_click())?;
    if let Some(close_button) = &elements.close_button {
        runtime.listen_click(close_button, |controller| controller.on_close_button_click())?;
    }
    if let Some(overlay) = &elements.overlay {
        runtime.listen_click(overlay, |controller| {
            controller.on_overlay_click();
            EventOutcome::Proceed
        })?;
    }
    runtime.listen(&document, "keydown", false, |runtime, event| {
        if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
            let key = event.key();
            runtime.dispatch(|controller| controller.on_keydown(&key));
        }
    })?;

    for link in &elements.nav_links {
        let href = link.get_attribute("href").unwrap_or_default();
        runtime.listen_click(link, move |controller| controller.on_nav_link_click(&href))?;
    }

    let anchors = runtime.controller.borrow().dom().query_all(IN_PAGE_ANCHORS);
    for anchor in anchors.iter().filter(|anchor| !elements.nav_links.contains(anchor)) {
        let href = anchor.get_attribute("href").unwrap_or_default();
        runtime.listen_click(anchor, move |controller| controller.on_anchor_click(&href))?;
    }

    if let Some(button) = &elements.back_to_top {
        runtime.listen_click(button, |controller| {
            controller.on_back_to_top_click();
            EventOutcome::Proceed
        })?;
    }

    runtime.observe_reveal_targets(reveal_threshold, &elements.reveal_targets)?;

    info!("Listening on {} in-page anchors", anchors.len());
    Ok(())
}

/// Runs [`start`] once the document is parsed.
pub fn start_when_ready() {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        error!("Page behavior needs a browser document");
        return;
    };

    if document.ready_state() != "loading" {
        report(start());
        return;
    }

    let on_ready = Closure::once(move || report(start()));
    if let Err(err) = document
        .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())
    {
        error!("Could not wait for DOMContentLoaded: {:?}", err);
    }
    on_ready.forget();
}

fn report(result: Result<()>) {
    if let Err(err) = result {
        error!("Page behavior disabled: {}", err);
    }
}
