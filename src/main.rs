//! tabshell binary: opens one browser-like window.

#[cfg(feature = "gui")]
fn main() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut config = tabshell::config::WindowConfig::default();
    if let Some(start_page) = std::env::args().nth(1) {
        config.start_page = start_page;
    }
    config.debug = cfg!(debug_assertions);

    tabshell::ui::run(config);
}

#[cfg(not(feature = "gui"))]
fn main() {
    eprintln!("tabshell was built without the `gui` feature");
}
