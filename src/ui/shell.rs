//! Browser-like window shell using `wry` + `tao`.
//!
//! Architecture:
//! - One tao window. The control surface is a wry webview pinned to a
//!   fixed strip at the top; each tab is a child webview laid out
//!   below it, with only the active one visible.
//! - Control surface → manager: `window.ipc.postMessage` with the
//!   SyncChannel JSON messages, forwarded through the event-loop
//!   proxy.
//! - Manager → control surface: notifications evaluated as
//!   `window.__shell_notify(<json>)`.
//! - Content-surface lifecycle signals arrive through wry handlers
//!   and an injected document script (favicons, document-ready), and
//!   are replayed into the manager as `SessionEvent`s.

use std::cell::RefCell;
use std::rc::Rc;

use tao::dpi::{LogicalPosition, LogicalSize};
use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use tao::window::{Window, WindowBuilder};
use tracing::{debug, info, warn};
use wry::{Rect, WebView, WebViewBuilder};

use crate::channel::{ControlEndpoint, ControlMessage, ControlNotification};
use crate::config::WindowConfig;
use crate::managers::window_manager::BrowserLikeWindowManager;
use crate::policy::{self, Disposition, FrameContext, OpenDecision};
use crate::session::{
    NavCaps, PageSession, SessionEvent, SessionFactory, SessionOptions, SessionSignal,
    SurfaceBounds,
};
use crate::types::tab::TabId;

const CONTROL_HTML: &str = include_str!("../../resources/ui/control.html");

/// Script injected into every content document: reports favicon
/// candidates and document readiness back over IPC.
const PAGE_PROBE_JS: &str = r#"
(function () {
  function report() {
    var candidates = [];
    document.querySelectorAll('link[rel~="icon"]').forEach(function (l) {
      if (l.href) candidates.push(l.href);
    });
    window.ipc.postMessage(JSON.stringify({ kind: 'favicons', candidates: candidates }));
    window.ipc.postMessage(JSON.stringify({ kind: 'ready' }));
  }
  if (document.readyState === 'loading') {
    document.addEventListener('DOMContentLoaded', report);
  } else {
    report();
  }
})();
"#;

#[derive(Debug)]
enum UserEvent {
    /// Raw SyncChannel command JSON from the control surface.
    Control(String),
    /// Lifecycle signal from a content surface.
    Session(SessionEvent),
    /// Policy rerouted a window-open request into the tab model.
    OpenTab { opener: TabId, url: String },
    /// Manager→control notification to evaluate on the control view.
    Notify(ControlNotification),
}

type PolicyFn = dyn Fn(&str, Disposition, &FrameContext) -> OpenDecision;

/// Reply handle delivering notifications through the event loop.
struct ProxyEndpoint {
    proxy: EventLoopProxy<UserEvent>,
}

impl ControlEndpoint for ProxyEndpoint {
    fn notify(&self, notification: &ControlNotification) {
        let _ = self.proxy.send_event(UserEvent::Notify(notification.clone()));
    }
}

/// Back/forward history mirror for one wry session. wry exposes no
/// capability query, so the navigation handler maintains a cursor.
#[derive(Debug, Default)]
struct History {
    entries: Vec<String>,
    cursor: Option<usize>,
    /// Set by go_back/go_forward so the next navigation moves the
    /// cursor instead of pushing a new entry.
    traversal: Option<isize>,
}

impl History {
    fn on_navigated(&mut self, url: &str) {
        if let Some(delta) = self.traversal.take() {
            if let Some(cursor) = self.cursor {
                let moved = cursor as isize + delta;
                if moved >= 0 && (moved as usize) < self.entries.len() {
                    self.cursor = Some(moved as usize);
                    return;
                }
            }
        }
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }
        self.entries.push(url.to_string());
        self.cursor = Some(self.entries.len() - 1);
    }

    fn current(&self) -> Option<&str> {
        self.cursor.map(|c| self.entries[c].as_str())
    }

    fn caps(&self) -> NavCaps {
        match self.cursor {
            Some(cursor) => NavCaps {
                can_go_back: cursor > 0,
                can_go_forward: cursor + 1 < self.entries.len(),
            },
            None => NavCaps::default(),
        }
    }
}

/// One content surface backed by a wry child webview.
struct WrySession {
    id: TabId,
    webview: WebView,
    history: Rc<RefCell<History>>,
}

impl PageSession for WrySession {
    fn id(&self) -> TabId {
        self.id
    }

    fn navigate(&mut self, url: &str) {
        if let Err(err) = self.webview.load_url(url) {
            warn!(surface = %self.id, %err, "load_url failed");
        }
    }

    fn current_url(&self) -> Option<String> {
        self.history.borrow().current().map(str::to_string)
    }

    fn caps(&self) -> NavCaps {
        self.history.borrow().caps()
    }

    fn go_back(&mut self) {
        let mut history = self.history.borrow_mut();
        if history.caps().can_go_back {
            history.traversal = Some(-1);
            drop(history);
            let _ = self.webview.evaluate_script("history.back();");
        }
    }

    fn go_forward(&mut self) {
        let mut history = self.history.borrow_mut();
        if history.caps().can_go_forward {
            history.traversal = Some(1);
            drop(history);
            let _ = self.webview.evaluate_script("history.forward();");
        }
    }

    fn reload(&mut self) {
        let _ = self.webview.evaluate_script("location.reload();");
    }

    fn stop(&mut self) {
        let _ = self.webview.evaluate_script("window.stop();");
    }

    fn focus(&mut self) {
        if let Err(err) = self.webview.focus() {
            debug!(surface = %self.id, %err, "focus failed");
        }
    }

    fn set_bounds(&mut self, bounds: SurfaceBounds) {
        let rect = Rect {
            position: LogicalPosition::new(bounds.x, bounds.y).into(),
            size: LogicalSize::new(bounds.width, bounds.height).into(),
        };
        let _ = self.webview.set_bounds(rect);
    }

    fn set_visible(&mut self, visible: bool) {
        let _ = self.webview.set_visible(visible);
    }

    fn destroy(&mut self) {
        // The webview is released when the registry drops the session;
        // detach it from the visible stack immediately.
        let _ = self.webview.set_visible(false);
    }
}

/// Builds wry child webviews for content surfaces.
struct WrySessionFactory {
    window: Rc<Window>,
    proxy: EventLoopProxy<UserEvent>,
    policy: Rc<PolicyFn>,
    next_id: u64,
    debug: bool,
}

impl WrySessionFactory {
    fn new(
        window: Rc<Window>,
        proxy: EventLoopProxy<UserEvent>,
        policy: Rc<PolicyFn>,
        debug: bool,
    ) -> Self {
        Self { window, proxy, policy, next_id: 0, debug }
    }
}

impl SessionFactory for WrySessionFactory {
    fn create(&mut self, options: &SessionOptions) -> Box<dyn PageSession> {
        self.next_id += 1;
        let id = TabId(self.next_id);
        let history = Rc::new(RefCell::new(History::default()));

        let nav_history = Rc::clone(&history);
        let nav_proxy = self.proxy.clone();
        let load_proxy = self.proxy.clone();
        let title_proxy = self.proxy.clone();
        let ipc_proxy = self.proxy.clone();
        let nw_proxy = self.proxy.clone();
        let nw_policy = Rc::clone(&self.policy);

        let mut builder = WebViewBuilder::new()
            .with_visible(false)
            .with_devtools(self.debug)
            .with_initialization_script(PAGE_PROBE_JS)
            .with_navigation_handler(move |url| {
                nav_history.borrow_mut().on_navigated(&url);
                let _ = nav_proxy.send_event(UserEvent::Session(SessionEvent {
                    id,
                    signal: SessionSignal::Navigated { url, is_main_frame: true },
                }));
                true
            })
            .with_on_page_load_handler(move |event, _url| {
                let signal = match event {
                    wry::PageLoadEvent::Started => SessionSignal::LoadStarted,
                    wry::PageLoadEvent::Finished => SessionSignal::LoadFinished,
                };
                let _ = load_proxy.send_event(UserEvent::Session(SessionEvent { id, signal }));
            })
            .with_document_title_changed_handler(move |title| {
                let _ = title_proxy.send_event(UserEvent::Session(SessionEvent {
                    id,
                    signal: SessionSignal::TitleChanged { title },
                }));
            })
            .with_ipc_handler(move |message: wry::http::Request<String>| {
                if let Some(signal) = parse_probe_message(message.body()) {
                    let _ = ipc_proxy.send_event(UserEvent::Session(SessionEvent { id, signal }));
                }
            })
            .with_new_window_req_handler(move |url, _features| {
                // wry does not surface a disposition; every request
                // from page script is treated as a foreground open.
                let ctx = FrameContext {
                    opener: Some(id),
                    is_main_frame: true,
                    user_gesture: true,
                };
                match nw_policy(&url, Disposition::ForegroundTab, &ctx) {
                    OpenDecision::AllowWindow => wry::NewWindowResponse::Allow,
                    OpenDecision::Deny => wry::NewWindowResponse::Deny,
                    OpenDecision::OpenAsNewTab => {
                        let _ = nw_proxy.send_event(UserEvent::OpenTab { opener: id, url });
                        wry::NewWindowResponse::Deny
                    }
                }
            });

        if let Some(agent) = &options.user_agent {
            builder = builder.with_user_agent(agent);
        }
        if options.incognito {
            builder = builder.with_incognito(true);
        }
        if let Some(script) = &options.initialization_script {
            builder = builder.with_initialization_script(script);
        }

        let webview = build_webview(builder, self.window.as_ref())
            .expect("Failed to create content webview");

        Box::new(WrySession { id, webview, history })
    }
}

#[cfg(target_os = "linux")]
fn build_webview(builder: WebViewBuilder<'_>, window: &Window) -> wry::Result<WebView> {
    use tao::platform::unix::WindowExtUnix;
    use wry::WebViewBuilderExtUnix;
    let vbox = window.default_vbox().expect("Failed to get GTK vbox");
    builder.build_gtk(vbox)
}

#[cfg(not(target_os = "linux"))]
fn build_webview(builder: WebViewBuilder<'_>, window: &Window) -> wry::Result<WebView> {
    builder.build_as_child(window)
}

fn parse_probe_message(raw: &str) -> Option<SessionSignal> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    match value.get("kind")?.as_str()? {
        "favicons" => {
            let candidates = value
                .get("candidates")
                .and_then(|c| c.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            Some(SessionSignal::FaviconsUpdated { candidates })
        }
        "ready" => Some(SessionSignal::DocumentReady),
        _ => None,
    }
}

/// Runs the browser-like window until it is closed.
pub fn run(mut config: WindowConfig) {
    let event_loop: EventLoop<UserEvent> = EventLoopBuilder::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let window = WindowBuilder::new()
        .with_title(&config.window_options.title)
        .with_resizable(config.window_options.resizable)
        .with_inner_size(LogicalSize::new(config.width as f64, config.height as f64))
        .build(&event_loop)
        .expect("Failed to create window");
    let window = Rc::new(window);

    // The policy is shared between the manager and the per-session
    // new-window hooks, which need a synchronous answer.
    let policy: Rc<PolicyFn> = match config.open_policy.take() {
        Some(custom) => Rc::from(custom),
        None => Rc::new(policy::decide),
    };

    let control_height = config.control_height;
    let debug = config.debug;
    let control_bounds = Rect {
        position: LogicalPosition::new(0, 0).into(),
        size: LogicalSize::new(config.width, control_height).into(),
    };

    let control_proxy = proxy.clone();
    let mut control_builder = WebViewBuilder::new()
        .with_bounds(control_bounds)
        .with_devtools(debug)
        .with_ipc_handler(move |message: wry::http::Request<String>| {
            let _ = control_proxy.send_event(UserEvent::Control(message.body().clone()));
        });
    control_builder = if config.control_url.is_empty() {
        control_builder.with_html(CONTROL_HTML)
    } else {
        control_builder.with_url(&config.control_url)
    };
    if let Some(agent) = &config.control_session_options.user_agent {
        control_builder = control_builder.with_user_agent(agent);
    }
    if let Some(script) = &config.control_session_options.initialization_script {
        control_builder = control_builder.with_initialization_script(script);
    }
    let control_webview = build_webview(control_builder, window.as_ref())
        .expect("Failed to create control webview");

    let factory = WrySessionFactory::new(
        Rc::clone(&window),
        proxy.clone(),
        Rc::clone(&policy),
        debug,
    );
    let mut manager = BrowserLikeWindowManager::new(config, Box::new(factory));
    manager.subscribe(|event| debug!(?event, "manager event"));

    info!("browser-like window up, waiting for control-ready");

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::WindowEvent { event: WindowEvent::CloseRequested, .. } => {
                manager.shutdown();
                *control_flow = ControlFlow::Exit;
            }

            Event::WindowEvent { event: WindowEvent::Resized(size), .. } => {
                let logical: LogicalSize<u32> = size.to_logical(window.scale_factor());
                manager.resize(logical.width, logical.height);
                let _ = control_webview.set_bounds(Rect {
                    position: LogicalPosition::new(0, 0).into(),
                    size: LogicalSize::new(logical.width, control_height).into(),
                });
            }

            Event::UserEvent(user_event) => match user_event {
                UserEvent::Control(raw) => match ControlMessage::from_json(&raw) {
                    Ok(message) => {
                        let reply: Option<Box<dyn ControlEndpoint>> =
                            matches!(message, ControlMessage::ControlReady).then(|| {
                                Box::new(ProxyEndpoint { proxy: proxy.clone() })
                                    as Box<dyn ControlEndpoint>
                            });
                        manager.handle_message(message, reply);
                    }
                    Err(err) => warn!(%err, "malformed control message"),
                },
                UserEvent::Session(event) => manager.handle_signal(event),
                UserEvent::OpenTab { opener, url } => {
                    manager.new_tab(Some(&url), Some(opener), None);
                }
                UserEvent::Notify(notification) => {
                    let script = format!(
                        "window.__shell_notify && window.__shell_notify({});",
                        notification.to_json()
                    );
                    let _ = control_webview.evaluate_script(&script);
                }
            },

            _ => {}
        }
    });
}
