//! LinkHub demo runner.
//!
//! Loads a page (the built-in sample, or the HTML file given as the first
//! argument), opens the on-disk storage area, and walks through the main
//! features from two tabs. Set `LINKHUB_LOG=debug` for detailed logs.

use std::error::Error;
use std::time::{Duration, Instant};

use linkhub::app::LinkHub;
use linkhub::database::Database;
use linkhub::managers::recent_manager::RecentManagerTrait;
use linkhub::managers::shortcut_manager::KeyPress;
use linkhub::platform;
use linkhub::services::card_registry::CardRegistryTrait;
use linkhub::services::export_import::ExportFormat;
use linkhub::services::favorites_renderer::HtmlSurface;
use linkhub::services::link_opener::LogOpener;
use linkhub::services::local_storage::{LocalStorage, SqliteBackend};
use linkhub::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use linkhub::services::theme_engine::ThemeEngineTrait;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SAMPLE_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<div id="linksGrid" class="links-grid">
  <div class="card" data-category="dev">
    <a href="https://github.com"><img class="icon-image" src="/icons/github.svg">
      <span class="title">GitHub</span><span class="description">Code hosting</span></a>
  </div>
  <div class="card" data-category="dev">
    <a href="https://docs.rs"><span class="title">Docs.rs</span>
      <span class="description">Rust crate documentation</span></a>
  </div>
  <div class="card" data-category="news" data-url="https://news.ycombinator.com" data-title="Hacker News">
    <a href="https://news.ycombinator.com"><span class="description">Tech news</span></a>
  </div>
</div>
</body></html>"#;

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("LINKHUB_LOG"))
        .init();

    let page = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE_PAGE.to_string(),
    };

    let mut settings = SettingsEngine::new(None);
    let config = settings.load()?;
    println!(
        "LinkHub v{} (config: {})",
        env!("CARGO_PKG_VERSION"),
        settings.get_config_path().display()
    );

    let db = Database::open(platform::get_storage_db_path())?;
    let backend = SqliteBackend::new(db, &config.interaction.page_origin);
    let storage = LocalStorage::new(backend, config.limits.storage_quota_bytes);

    let mut tab = LinkHub::new(
        config.clone(),
        storage.clone(),
        HtmlSurface::new(),
        LogOpener::default(),
    );
    let mut other_tab = LinkHub::new(
        config,
        storage.open_tab(),
        HtmlSurface::new(),
        LogOpener::default(),
    );

    section("Initialize");
    let report = tab.initialize(&page);
    other_tab.initialize(&page);
    println!("  modules: {:?}, failed: {:?}", report.completed, report.failed_modules());
    println!("  cards: {}, favorites: {}", tab.registry().len(), tab.store().len());
    println!("  theme: {}", tab.theme().current().as_str());

    section("Favorites");
    let urls: Vec<String> = tab.registry().all().iter().map(|c| c.url.clone()).collect();
    for url in &urls {
        if tab.store().position(url).is_some() {
            continue;
        }
        let now_favorite = tab.toggle_favorite(url)?;
        println!("  {} -> favorite: {}", url, now_favorite);
    }
    if tab.store().len() > 1 {
        tab.drag_start(0);
        tab.drag_over(1);
        tab.drop_favorite();
        tab.drag_end();
    }
    println!("{}", tab.renderer().surface().to_html());

    section("Cross-tab sync");
    let sync = other_tab.sync_from_storage();
    println!(
        "  other tab reloaded favorites: {}, now {}",
        sync.favorites,
        other_tab.store().len()
    );

    section("Search");
    let start = Instant::now();
    let debounce = Duration::from_millis(tab.config().defaults.search_debounce_ms);
    tab.set_filter("dev");
    tab.search_input("rust", start);
    tab.tick(start + debounce);
    println!("  query 'rust' in 'dev': {} visible", tab.visible().visible.len());
    tab.handle_key(&KeyPress::ctrl("h"));
    println!("  after ctrl+h: {} visible", tab.visible().visible.len());

    section("Recent");
    if let Some(url) = urls.first() {
        tab.open_card(url)?;
    }
    for link in tab.recent().get(5) {
        println!("  {} ({})", link.title, link.url);
    }

    section("Export");
    let (name, csv) = tab.export_favorites(ExportFormat::Csv);
    println!("  {}:\n{}", name, csv);

    for toast in tab.drain_toasts() {
        println!("  [{:?}] {}", toast.kind, toast.message);
    }
    Ok(())
}
