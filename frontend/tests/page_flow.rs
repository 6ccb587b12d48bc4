use page_behavior::controller::SplashPhase;
use page_behavior::testing::{FakeDom, FakeSession};
use page_behavior::{EventOutcome, PageConfig};
use pretty_assertions::assert_eq;

fn session(viewport_width: f64) -> FakeSession {
    FakeSession::boot(FakeDom::landing_page(viewport_width), PageConfig::default()).unwrap()
}

/// Boots and lets the opening sequence finish.
fn settled(viewport_width: f64) -> FakeSession {
    let mut session = session(viewport_width);
    session.advance(4_000);
    assert_eq!(session.controller.splash_phase(), SplashPhase::Done);
    session
}

fn body_locked(session: &FakeSession) -> bool {
    let body = session.controller.elements().body;
    session.dom().style(body, "overflow") == Some("hidden")
}

fn has_class(session: &FakeSession, node: page_behavior::testing::NodeId, class: &str) -> bool {
    session.dom().node(node).classes.contains(class)
}

fn assert_menu_consistent(session: &FakeSession) {
    let elements = session.controller.elements();
    let open = session.controller.menu_open();
    assert_eq!(has_class(session, elements.nav, "active"), open);
    assert_eq!(has_class(session, elements.menu_button, "active"), open);
    assert_eq!(has_class(session, elements.overlay.unwrap(), "active"), open);
    let expanded = session.dom().attribute(elements.menu_button, "aria-expanded");
    assert_eq!(expanded, Some(if open { "true" } else { "false" }));
    assert_eq!(body_locked(session), open);
}

#[test]
fn desktop_opening_sequence() {
    let mut session = session(1280.0);
    let elements = session.controller.elements().clone();
    let splash = elements.splash.unwrap();

    session.advance(2_499);
    assert!(!has_class(&session, splash, "splash-hidden"));
    assert!(body_locked(&session));

    session.advance(1);
    assert!(has_class(&session, splash, "splash-hidden"));
    assert!(body_locked(&session));

    session.advance(800);
    assert!(!body_locked(&session));
    let header = elements.sections[0];
    let hero = elements.sections[1];
    assert_eq!(session.dom().style(header, "opacity"), Some("1"));
    assert_eq!(session.dom().style(header, "transition"), Some("opacity 0.8s ease"));
    assert_eq!(session.dom().style(hero, "opacity"), Some("0"));

    session.advance(50);
    assert_eq!(session.dom().style(hero, "opacity"), Some("1"));

    let footer = *elements.sections.last().unwrap();
    assert_eq!(session.dom().style(footer, "opacity"), Some("0"));
    session.advance(300);
    assert_eq!(session.dom().style(footer, "opacity"), Some("1"));
    assert_eq!(session.controller.pending_tasks(), 0);
}

#[test]
fn mobile_opening_sequence_is_shorter() {
    let mut session = session(500.0);
    let elements = session.controller.elements().clone();

    session.advance(1_800);
    assert!(has_class(&session, elements.splash.unwrap(), "splash-hidden"));
    session.advance(500);
    assert!(!body_locked(&session));
    assert_eq!(session.dom().style(elements.header, "transition"), Some("opacity 0.5s ease"));

    session.advance(7 * 30);
    for section in &elements.sections {
        assert_eq!(session.dom().style(*section, "opacity"), Some("1"));
    }
}

#[test]
fn page_without_splash_still_reveals() {
    let mut dom = FakeDom::landing_page(1280.0);
    dom.remove_id("splash-screen");
    let mut session = FakeSession::boot(dom, PageConfig::default()).unwrap();
    session.advance(4_000);
    assert!(!body_locked(&session));
}

#[test]
fn one_scroll_drives_every_indicator() {
    let mut session = settled(1280.0);
    let elements = session.controller.elements().clone();
    let progress = elements.progress.unwrap();
    let button = elements.back_to_top.unwrap();

    session.scroll(1_000.0);
    session.paint();
    assert_eq!(session.dom().style(progress, "width"), Some("25%"));
    assert!(has_class(&session, elements.header, "scrolled"));
    assert!(has_class(&session, button, "visible"));
}

#[test]
fn indicators_respect_their_thresholds() {
    let mut session = settled(1280.0);
    let elements = session.controller.elements().clone();
    let button = elements.back_to_top.unwrap();

    for (scroll_y, scrolled, visible) in [
        (50.0, false, false),
        (51.0, true, false),
        (300.0, true, false),
        (301.0, true, true),
        (0.0, false, false),
    ] {
        session.scroll(scroll_y);
        session.advance(200);
        assert_eq!(has_class(&session, elements.header, "scrolled"), scrolled, "at {}", scroll_y);
        assert_eq!(has_class(&session, button, "visible"), visible, "at {}", scroll_y);
    }
}

#[test]
fn burst_of_scrolls_settles_on_the_last_reading() {
    let mut session = settled(1280.0);
    let elements = session.controller.elements().clone();
    let progress = elements.progress.unwrap();

    session.scroll(1_000.0);
    session.scroll(2_000.0);
    session.scroll(0.0);
    // inside the window the first reading still shows
    assert!(has_class(&session, elements.header, "scrolled"));

    session.advance(100);
    assert!(!has_class(&session, elements.header, "scrolled"));
    assert!(!has_class(&session, elements.back_to_top.unwrap(), "visible"));
    assert_eq!(session.dom().style(progress, "width"), Some("0%"));

    session.advance(1_000);
    assert_eq!(session.armed_timers(), 0);
}

#[test]
fn long_scroll_burst_leaves_no_timers_behind() {
    let mut session = settled(1280.0);
    for step in 0..500 {
        session.scroll(f64::from(step % 40) * 100.0);
        session.advance(7);
    }
    assert!(session.armed_timers() > 0);

    session.advance(1_000);
    assert_eq!(session.armed_timers(), 0);
    assert_eq!(session.controller.pending_tasks(), 0);
}

#[test]
fn short_page_reports_zero_progress() {
    let mut dom = FakeDom::landing_page(1280.0);
    dom.document_height = dom.viewport_height;
    let mut session = FakeSession::boot(dom, PageConfig::default()).unwrap();
    session.advance(4_000);
    session.scroll(0.0);
    session.paint();
    let progress = session.controller.elements().progress.unwrap();
    assert_eq!(session.dom().style(progress, "width"), Some("0%"));
}

#[test]
fn menu_transitions_keep_lock_and_aria_in_step() {
    let mut session = settled(500.0);
    assert!(!session.controller.menu_open());
    assert_menu_consistent(&session);

    assert_eq!(session.click_menu_button(), EventOutcome::PreventDefault);
    assert!(session.controller.menu_open());
    assert_menu_consistent(&session);

    session.press("Escape");
    assert!(!session.controller.menu_open());
    assert_menu_consistent(&session);

    session.press("Escape");
    assert_menu_consistent(&session);

    session.click_menu_button();
    session.click_overlay();
    assert!(!session.controller.menu_open());
    assert_menu_consistent(&session);

    session.click_menu_button();
    assert_eq!(session.click_close_button(), EventOutcome::PreventDefault);
    assert!(!session.controller.menu_open());
    assert_menu_consistent(&session);
}

#[test]
fn menu_opened_during_splash_stays_locked_after_it() {
    let mut session = session(500.0);
    session.click_menu_button();
    session.advance(4_000);
    assert!(session.controller.menu_open());
    assert_menu_consistent(&session);
}

#[test]
fn menu_closed_during_splash_keeps_page_locked_until_reveal() {
    let mut session = session(500.0);
    session.click_menu_button();
    session.click_close_button();
    assert!(!session.controller.menu_open());
    assert!(body_locked(&session));

    // mobile: hide at 1800, sections reveal 500 later
    session.advance(2_299);
    assert!(body_locked(&session));
    session.advance(1);
    assert_menu_consistent(&session);
}

#[test]
fn mobile_nav_link_closes_menu_then_scrolls() {
    let mut session = settled(500.0);
    session.click_menu_button();

    assert_eq!(session.click_nav_link("#contact"), EventOutcome::PreventDefault);
    assert!(!session.controller.menu_open());
    assert_menu_consistent(&session);
    assert!(session.dom().scrolls.is_empty());

    session.advance(49);
    assert!(session.dom().scrolls.is_empty());

    session.advance(1);
    // contact starts at 3380, the header is 80 tall
    assert_eq!(session.dom().scrolls, vec![(3_300.0, true)]);
}

#[test]
fn second_mobile_nav_click_replaces_the_pending_scroll() {
    let mut session = settled(500.0);
    session.click_menu_button();
    session.click_nav_link("#contact");
    session.advance(20);
    session.click_nav_link("#about");
    session.advance(100);
    assert_eq!(session.dom().scrolls, vec![(1_350.0, true)]);
}

#[test]
fn desktop_nav_link_scrolls_immediately() {
    let mut session = settled(1280.0);
    assert_eq!(session.click_nav_link("#contact"), EventOutcome::PreventDefault);
    assert_eq!(session.dom().scrolls, vec![(3_300.0, true)]);
}

#[test]
fn anchor_to_missing_target_does_nothing() {
    let mut session = settled(1280.0);
    assert_eq!(session.click_anchor("#gallery"), EventOutcome::PreventDefault);
    assert!(session.dom().scrolls.is_empty());
}

#[test]
fn back_to_top_returns_to_origin() {
    let mut session = settled(1280.0);
    session.scroll(2_000.0);
    session.click_back_to_top();
    assert_eq!(session.dom().scrolls, vec![(0.0, true)]);
    assert_eq!(session.dom().scroll_y, 0.0);
}

#[test]
fn cards_reveal_once() {
    let mut session = settled(1280.0);
    let card = session.controller.elements().reveal_targets[1];

    session.intersect(card, 0.1);
    assert!(!has_class(&session, card, "visible"));
    assert!(session.unobserved.is_empty());

    session.intersect(card, 0.35);
    assert!(has_class(&session, card, "visible"));
    assert_eq!(session.unobserved, vec![card]);

    session.intersect(card, 0.0);
    assert!(has_class(&session, card, "visible"));
}

#[test]
fn shutdown_cancels_pending_work() {
    let mut session = session(1280.0);
    session.click_menu_button();
    session.click_menu_button();
    session.shutdown();
    assert_eq!(session.armed_timers(), 0);

    session.advance(10_000);
    let splash = session.controller.elements().splash.unwrap();
    assert!(!has_class(&session, splash, "splash-hidden"));
}

#[test]
fn config_overrides_thresholds() {
    let config = PageConfig::from_json(r#"{"header_threshold": 200, "anchor_offset": 0}"#).unwrap();
    let mut session = FakeSession::boot(FakeDom::landing_page(1280.0), config).unwrap();
    session.advance(4_000);

    session.scroll(150.0);
    assert!(!has_class(&session, session.controller.elements().header, "scrolled"));

    session.click_anchor("#contact");
    assert_eq!(session.dom().scrolls.last(), Some(&(3_380.0, true)));
}
