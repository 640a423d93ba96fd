use crate::scrapers::session::{BrowserSession, SessionFactory, SessionSettings};
use anyhow::{Context, Result};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const CHROME_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--disable-setuid-sandbox",
    "--disable-gpu",
    "--disable-extensions",
    "--no-first-run",
    "--no-default-browser-check",
    "--mute-audio",
];

const HIDE_WEBDRIVER: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined, configurable: true})";

/// Launches headless Chrome sessions
#[derive(Debug, Default)]
pub struct ChromeSessionFactory;

/// One Chrome process with a single tab. Dropping it kills the process.
struct ChromeSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl SessionFactory for ChromeSessionFactory {
    fn launch(
        &self,
        settings: &SessionSettings,
        user_agent: &str,
    ) -> Result<Box<dyn BrowserSession>> {
        info!("Launching headless Chrome...");
        if let Some(path) = &settings.browser_path {
            info!("Using Chrome binary: {}", path.display());
        }

        let lang = format!("--lang={}", settings.locale);
        let mut args: Vec<&OsStr> = CHROME_ARGS.iter().map(OsStr::new).collect();
        args.push(OsStr::new(&lang));

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(settings.browser_path.clone())
            .idle_browser_timeout(settings.command_timeout * 6)
            .args(args)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        match open_tab(&browser, settings, user_agent) {
            Ok(tab) => Ok(Box::new(ChromeSession {
                _browser: browser,
                tab,
            })),
            Err(e) => {
                warn!("Discarding partially started Chrome: {:#}", e);
                drop(browser);
                Err(e)
            }
        }
    }
}

/// Registered before any navigation so it runs ahead of the page's own scripts
fn hide_webdriver_on_new_document() -> Page::AddScriptToEvaluateOnNewDocument {
    Page::AddScriptToEvaluateOnNewDocument {
        source: HIDE_WEBDRIVER.to_string(),
        world_name: None,
        include_command_line_api: None,
        run_immediately: None,
    }
}

fn accept_language(locale: &str) -> String {
    let primary = locale.split('-').next().unwrap_or(locale);
    format!("{locale},{primary};q=0.9")
}

fn open_tab(
    browser: &Browser,
    settings: &SessionSettings,
    user_agent: &str,
) -> Result<Arc<Tab>> {
    let tab = browser.new_tab().context("Failed to open tab")?;
    // Also bounds script evaluation: every CDP call waits at most this long
    tab.set_default_timeout(settings.command_timeout);

    tab.call_method(hide_webdriver_on_new_document())
        .context("Failed to register webdriver override")?;

    tab.set_user_agent(user_agent, Some(&accept_language(&settings.locale)), None)
        .context("Failed to set user agent")?;
    debug!("User agent: {}", user_agent);

    Ok(tab)
}

impl BrowserSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to open {url}"))?
            .wait_until_navigated()
            .context("Page did not finish loading")?;
        Ok(())
    }

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        match self.tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!("No element matched {} within {:?}: {:#}", selector, timeout, e);
                Ok(false)
            }
        }
    }

    fn content(&mut self) -> Result<String> {
        self.tab.get_content().context("Failed to read page HTML")
    }

    fn close(&mut self) -> Result<()> {
        self.tab.close(true).context("Failed to close tab")?;
        Ok(())
    }
}
