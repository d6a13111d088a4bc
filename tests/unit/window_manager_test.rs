#[path = "../common/mod.rs"]
mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{FakeFactory, RecordingEndpoint, SessionLog};
use tabshell::channel::{ControlEndpoint, ControlMessage, ControlNotification};
use tabshell::config::WindowConfig;
use tabshell::managers::window_manager::{BrowserLikeWindowManager, ManagerEvent};
use tabshell::policy::{Disposition, FrameContext, OpenDecision};
use tabshell::session::{NavCaps, SessionEvent, SessionSignal};
use tabshell::types::tab::TabId;

fn manager_with(config: WindowConfig) -> (BrowserLikeWindowManager, SessionLog) {
    let (factory, log) = FakeFactory::new();
    (BrowserLikeWindowManager::new(config, Box::new(factory)), log)
}

fn handshake(manager: &mut BrowserLikeWindowManager) -> RecordingEndpoint {
    let endpoint = RecordingEndpoint::new();
    let boxed: Box<dyn ControlEndpoint> = Box::new(endpoint.clone());
    manager.handle_message(ControlMessage::ControlReady, Some(boxed));
    endpoint
}

fn signal(manager: &mut BrowserLikeWindowManager, id: TabId, signal: SessionSignal) {
    manager.handle_signal(SessionEvent { id, signal });
}

#[test]
fn test_handshake_opens_start_page_in_fresh_tab() {
    let config = WindowConfig {
        start_page: "https://start.test/".into(),
        ..WindowConfig::default()
    };
    let (mut manager, log) = manager_with(config);
    let endpoint = handshake(&mut manager);

    assert_eq!(manager.tab_order().len(), 1);
    let id = manager.tab_order()[0];
    assert_eq!(manager.active(), Some(id));
    assert_eq!(log.borrow()[&id].navigations, vec!["https://start.test/"]);
    assert!(manager.is_wired(id));
    // Handshake produced at least the active-update and tabs-update.
    let delivered = endpoint.delivered.borrow();
    assert!(delivered.iter().any(|n| matches!(n, ControlNotification::ActiveUpdate { .. })));
    assert!(delivered.iter().any(|n| matches!(n, ControlNotification::TabsUpdate { .. })));
}

#[test]
fn test_empty_start_page_creates_unnavigated_blank_tab() {
    let (mut manager, log) = manager_with(WindowConfig::default());
    handshake(&mut manager);

    let id = manager.tab_order()[0];
    assert!(log.borrow()[&id].navigations.is_empty());
    assert!(!manager.is_wired(id));
    let snapshot = manager.snapshot();
    assert_eq!(snapshot.confs[&id].title, "about:blank");
}

#[test]
fn test_commands_before_handshake_mutate_but_notify_nothing() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    manager.handle_message(
        ControlMessage::NewTab { url: None, session_options: None },
        None,
    );
    assert_eq!(manager.tab_order().len(), 1);
}

#[test]
fn test_url_change_updates_address_bar_only() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let id = manager.tab_order()[0];

    manager.handle_message(ControlMessage::UrlChange { url: "https://typed.test".into() }, None);
    let snapshot = manager.snapshot();
    assert_eq!(snapshot.confs[&id].url, "https://typed.test");
    assert_eq!(snapshot.confs[&id].href, "");
}

#[test]
fn test_url_enter_navigates_active_tab_and_wires_once() {
    let (mut manager, log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let id = manager.tab_order()[0];

    manager.handle_message(ControlMessage::UrlEnter { url: "https://x.test".into() }, None);
    assert!(manager.is_wired(id));
    manager.handle_message(ControlMessage::UrlEnter { url: "https://x.test".into() }, None);

    // Re-entering the same URL navigates again but never re-wires.
    assert_eq!(log.borrow()[&id].navigations.len(), 2);
    signal(&mut manager, id, SessionSignal::LoadStarted);
    assert!(manager.snapshot().confs[&id].is_loading);
    signal(&mut manager, id, SessionSignal::LoadFinished);
    assert!(!manager.snapshot().confs[&id].is_loading);
}

#[test]
fn test_load_url_without_active_surface_is_ignored() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    manager.load_url("https://x.test");
    assert!(manager.tab_order().is_empty());
}

#[test]
fn test_navigation_scenario_builds_expected_snapshot() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];

    manager.load_url("https://x.test");
    signal(&mut manager, a, SessionSignal::LoadStarted);
    signal(&mut manager, a, SessionSignal::Navigated { url: "https://x.test".into(), is_main_frame: true });
    signal(&mut manager, a, SessionSignal::TitleChanged { title: "X".into() });
    signal(&mut manager, a, SessionSignal::LoadFinished);

    let snapshot = manager.snapshot();
    let tab = &snapshot.confs[&a];
    assert_eq!(tab.url, "https://x.test");
    assert_eq!(tab.href, "https://x.test");
    assert_eq!(tab.title, "X");
    assert!(!tab.is_loading);
}

#[test]
fn test_url_updated_observation_and_document_ready_focus() {
    let (mut manager, log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];
    manager.load_url("https://x.test");

    let seen: Rc<RefCell<Vec<ManagerEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    manager.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    signal(&mut manager, a, SessionSignal::Navigated { url: "https://x.test/p".into(), is_main_frame: true });
    assert!(seen.borrow().iter().any(|e| matches!(
        e,
        ManagerEvent::UrlUpdated { surface, href } if *surface == a && href == "https://x.test/p"
    )));

    signal(&mut manager, a, SessionSignal::DocumentReady);
    assert!(log.borrow()[&a].actions.contains(&"focus"));
}

#[test]
fn test_caps_always_refresh_from_live_session() {
    let (mut manager, log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];
    manager.load_url("https://x.test");

    log.borrow_mut().get_mut(&a).unwrap().caps =
        NavCaps { can_go_back: true, can_go_forward: true };
    // Patch targets the title only; caps must still be refreshed.
    signal(&mut manager, a, SessionSignal::TitleChanged { title: "X".into() });
    let tab = manager.snapshot().confs[&a].clone();
    assert!(tab.can_go_back && tab.can_go_forward);

    log.borrow_mut().get_mut(&a).unwrap().caps = NavCaps::default();
    signal(&mut manager, a, SessionSignal::TitleChanged { title: "Y".into() });
    let tab = manager.snapshot().confs[&a].clone();
    assert!(!tab.can_go_back && !tab.can_go_forward);
}

#[test]
fn test_actions_forward_to_active_session() {
    let (mut manager, log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];
    manager.load_url("https://x.test");

    for action in ["back", "forward", "reload", "stop"] {
        manager.handle_message(ControlMessage::Act { action_name: action.into() }, None);
    }
    assert_eq!(log.borrow()[&a].actions, vec!["back", "forward", "reload", "stop"]);
}

#[test]
fn test_reload_suppressed_when_nothing_loaded() {
    let (mut manager, log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];

    manager.perform_action("reload");
    assert!(log.borrow()[&a].actions.is_empty());
}

#[test]
fn test_unsupported_action_is_skipped() {
    let (mut manager, log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];

    manager.perform_action("self-destruct");
    assert!(log.borrow()[&a].actions.is_empty());
}

#[test]
fn test_new_tab_message_uses_given_session_options() {
    let (mut manager, log) = manager_with(WindowConfig::default());
    handshake(&mut manager);

    let options = tabshell::session::SessionOptions { incognito: true, ..Default::default() };
    manager.handle_message(
        ControlMessage::NewTab { url: Some("https://x.test".into()), session_options: Some(options) },
        None,
    );
    let id = *manager.tab_order().last().unwrap();
    assert!(log.borrow()[&id].options.incognito);
    assert_eq!(log.borrow()[&id].navigations, vec!["https://x.test"]);
}

#[test]
fn test_new_tab_reports_previous_active_to_observers() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let first = manager.tab_order()[0];

    let seen: Rc<RefCell<Vec<ManagerEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    manager.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    manager.new_tab(Some("https://x.test"), None, None);
    assert!(seen.borrow().iter().any(|e| matches!(
        e,
        ManagerEvent::NewTab { opened_url, previous_active }
            if opened_url == "https://x.test" && *previous_active == Some(first)
    )));
}

#[test]
fn test_close_middle_active_tab_activates_successor() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];
    let b = manager.new_tab(None, None, None);
    let c = manager.new_tab(None, None, None);

    manager.handle_message(ControlMessage::SwitchTab { id: b }, None);
    assert_eq!(manager.active(), Some(b));

    manager.handle_message(ControlMessage::CloseTab { id: b }, None);
    assert_eq!(manager.active(), Some(c));
    assert_eq!(manager.tab_order(), &[a, c]);
    assert!(manager.snapshot().confs.get(&b).is_none());
}

#[test]
fn test_close_last_active_tab_wraps_to_first() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];
    let b = manager.new_tab(None, None, None);
    let c = manager.new_tab(None, None, None);
    assert_eq!(manager.active(), Some(c));

    manager.close_tab(c);
    assert_eq!(manager.active(), Some(a));
    assert_eq!(manager.tab_order(), &[a, b]);
}

#[test]
fn test_close_inactive_tab_leaves_active_pointer() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];
    let b = manager.new_tab(None, None, None);

    manager.close_tab(a);
    assert_eq!(manager.active(), Some(b));
    assert_eq!(manager.tab_order(), &[b]);
}

#[test]
fn test_close_sole_tab_creates_fresh_blank_tab() {
    let config = WindowConfig {
        blank_page: "https://blank.test/".into(),
        ..WindowConfig::default()
    };
    let (mut manager, log) = manager_with(config);
    handshake(&mut manager);
    let a = manager.tab_order()[0];

    manager.close_tab(a);
    assert_eq!(manager.tab_order().len(), 1);
    let fresh = manager.tab_order()[0];
    assert_ne!(fresh, a);
    assert_eq!(manager.active(), Some(fresh));
    assert_eq!(log.borrow()[&fresh].navigations, vec!["https://blank.test/"]);
    assert!(log.borrow()[&a].destroyed);
}

#[test]
fn test_close_stale_id_is_guarded_noop() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    let endpoint = handshake(&mut manager);
    let a = manager.tab_order()[0];

    let before = endpoint.delivered.borrow().len();
    manager.close_tab(TabId(999));
    assert_eq!(manager.tab_order(), &[a]);
    assert_eq!(manager.active(), Some(a));
    // The snapshot is still republished so the control surface converges.
    assert_eq!(endpoint.delivered.borrow().len(), before + 1);
}

#[test]
fn test_open_as_new_tab_splices_after_opener() {
    let (mut manager, log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];
    let b = manager.new_tab(None, None, None);

    let ctx = FrameContext { opener: Some(a), is_main_frame: true, user_gesture: true };
    let decision = manager.on_new_window("https://a.test/x", Disposition::ForegroundTab, ctx);
    assert_eq!(decision, OpenDecision::OpenAsNewTab);

    let opened = *manager
        .tab_order()
        .iter()
        .find(|id| **id != a && **id != b)
        .unwrap();
    assert_eq!(manager.tab_order(), &[a, opened, b]);
    assert_eq!(log.borrow()[&opened].navigations, vec!["https://a.test/x"]);
}

#[test]
fn test_new_window_disposition_opens_no_tab() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    handshake(&mut manager);

    let ctx = FrameContext { opener: manager.active(), is_main_frame: true, user_gesture: true };
    let decision = manager.on_new_window("https://a.test/x", Disposition::NewWindow, ctx);
    assert_eq!(decision, OpenDecision::AllowWindow);
    assert_eq!(manager.tab_order().len(), 1);
}

#[test]
fn test_custom_policy_bypasses_builtin_decision() {
    let config = WindowConfig {
        open_policy: Some(Box::new(|_, _, _| OpenDecision::Deny)),
        ..WindowConfig::default()
    };
    let (mut manager, _log) = manager_with(config);
    handshake(&mut manager);

    let ctx = FrameContext { opener: manager.active(), is_main_frame: true, user_gesture: true };
    // Built-in policy would open a tab for this; the override denies.
    let decision = manager.on_new_window("https://a.test/x", Disposition::ForegroundTab, ctx);
    assert_eq!(decision, OpenDecision::Deny);
    assert_eq!(manager.tab_order().len(), 1);
}

#[test]
fn test_snapshots_are_well_formed() {
    let (mut manager, _log) = manager_with(WindowConfig::default());
    let endpoint = handshake(&mut manager);
    manager.new_tab(Some("https://x.test"), None, None);
    let b = manager.new_tab(None, None, None);
    manager.close_tab(b);

    for notification in endpoint.delivered.borrow().iter() {
        if let ControlNotification::TabsUpdate { confs, tabs } = notification {
            let mut unique = tabs.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), tabs.len(), "duplicate ids in {tabs:?}");
            for id in tabs {
                assert!(confs.contains_key(id), "missing record for {id}");
            }
        }
    }
}

#[test]
fn test_tab_lookup_reports_missing_and_terminated() {
    use tabshell::types::errors::SurfaceError;

    let (mut manager, _log) = manager_with(WindowConfig::default());
    handshake(&mut manager);
    let a = manager.tab_order()[0];

    assert!(manager.tab(a).is_ok());
    assert!(matches!(manager.tab(TabId(999)), Err(SurfaceError::NotFound(999))));

    manager.shutdown();
    assert!(matches!(manager.tab(a), Err(SurfaceError::Terminated)));
}

#[test]
fn test_shutdown_destroys_surfaces_and_ignores_later_commands() {
    let (mut manager, log) = manager_with(WindowConfig::default());
    let endpoint = handshake(&mut manager);
    let a = manager.tab_order()[0];

    let seen: Rc<RefCell<Vec<ManagerEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    manager.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    manager.shutdown();
    assert!(manager.is_terminated());
    assert!(log.borrow()[&a].destroyed);
    assert!(manager.tab_order().is_empty());
    assert!(seen.borrow().contains(&ManagerEvent::Closed));

    let before = endpoint.delivered.borrow().len();
    manager.handle_message(ControlMessage::NewTab { url: None, session_options: None }, None);
    assert!(manager.tab_order().is_empty());
    assert_eq!(endpoint.delivered.borrow().len(), before);

    // Idempotent.
    manager.shutdown();
}
