//! Browser session lifecycle.
//!
//! A [`SessionManager`] owns at most one live browser session. It starts one
//! lazily on [`SessionManager::acquire`] and tears it down on
//! [`SessionManager::release`] (or on drop), so each search starts clean.
//!
//! The browser itself sits behind [`SessionFactory`] and [`BrowserSession`],
//! which lets tests drive the manager with canned pages.

use anyhow::Result;
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

/// Pick a plausible desktop user agent
pub fn random_user_agent() -> &'static str {
    let idx = rand::rng().random_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// How a browser session is launched
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Browser binary override; auto-detected when `None`
    pub browser_path: Option<PathBuf>,
    /// Cap on page load and script execution; applied as the tab's default
    /// timeout, which bounds every browser command including evaluation
    pub command_timeout: Duration,
    pub locale: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            browser_path: None,
            command_timeout: Duration::from_secs(10),
            locale: "fr-FR".to_string(),
        }
    }
}

/// The browser operations a search needs
pub trait BrowserSession: Send {
    /// Load `url` and wait for navigation to finish
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Wait up to `timeout` for an element matching `selector`.
    /// `Ok(false)` means none appeared in time.
    fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Snapshot of the rendered document
    fn content(&mut self) -> Result<String>;

    fn close(&mut self) -> Result<()>;
}

/// Starts new browser sessions
pub trait SessionFactory: Send + Sync {
    fn launch(
        &self,
        settings: &SessionSettings,
        user_agent: &str,
    ) -> Result<Box<dyn BrowserSession>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Ready,
}

pub struct SessionManager {
    factory: Arc<dyn SessionFactory>,
    settings: SessionSettings,
    session: Option<Box<dyn BrowserSession>>,
    state: SessionState,
}

impl SessionManager {
    pub fn new(factory: Arc<dyn SessionFactory>, settings: SessionSettings) -> Self {
        Self {
            factory,
            settings,
            session: None,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The live session, started on first use
    pub fn acquire(&mut self) -> Result<&mut dyn BrowserSession> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.start()?,
        };

        self.state = SessionState::Ready;
        Ok(&mut **self.session.insert(session))
    }

    fn start(&mut self) -> Result<Box<dyn BrowserSession>> {
        self.state = SessionState::Starting;
        info!("Creating a new browser session");
        let started = Instant::now();

        match self.factory.launch(&self.settings, random_user_agent()) {
            Ok(session) => {
                info!(
                    "Browser session created in {:.2} seconds",
                    started.elapsed().as_secs_f64()
                );
                Ok(session)
            }
            Err(e) => {
                self.state = SessionState::Idle;
                error!("Failed to create browser session: {:#}", e);
                Err(e)
            }
        }
    }

    /// Terminate the session if there is one. Teardown errors are logged only.
    pub fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            match session.close() {
                Ok(()) => info!("Browser session closed"),
                Err(e) => error!("Failed to close browser session: {:#}", e),
            }
        }
        self.state = SessionState::Idle;
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.release();
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{FakeFactory, Script};
    use super::*;

    #[test]
    fn acquire_is_idempotent_while_alive() {
        let factory = FakeFactory::new(Script::default());
        let mut manager = SessionManager::new(factory.clone(), SessionSettings::default());
        assert_eq!(manager.state(), SessionState::Idle);

        manager.acquire().unwrap();
        manager.acquire().unwrap();

        assert_eq!(manager.state(), SessionState::Ready);
        assert_eq!(factory.counters.launches(), 1);
    }

    #[test]
    fn release_closes_and_allows_a_fresh_start() {
        let factory = FakeFactory::new(Script::default());
        let mut manager = SessionManager::new(factory.clone(), SessionSettings::default());

        manager.acquire().unwrap();
        manager.release();
        assert_eq!(manager.state(), SessionState::Idle);
        assert_eq!(factory.counters.closes(), 1);

        manager.acquire().unwrap();
        assert_eq!(factory.counters.launches(), 2);
    }

    #[test]
    fn launch_failure_returns_to_idle() {
        let factory = FakeFactory::new(Script {
            fail_launch: true,
            ..Script::default()
        });
        let mut manager = SessionManager::new(factory.clone(), SessionSettings::default());

        assert!(manager.acquire().is_err());
        assert_eq!(manager.state(), SessionState::Idle);
        assert_eq!(factory.counters.launches(), 0);
    }

    #[test]
    fn teardown_errors_are_swallowed() {
        let factory = FakeFactory::new(Script {
            fail_close: true,
            ..Script::default()
        });
        let mut manager = SessionManager::new(factory.clone(), SessionSettings::default());

        manager.acquire().unwrap();
        manager.release();
        manager.release();

        assert_eq!(manager.state(), SessionState::Idle);
        assert_eq!(factory.counters.closes(), 1);
    }

    #[test]
    fn drop_releases_the_session() {
        let factory = FakeFactory::new(Script::default());
        {
            let mut manager = SessionManager::new(factory.clone(), SessionSettings::default());
            manager.acquire().unwrap();
        }
        assert_eq!(factory.counters.closes(), 1);
    }

    #[test]
    fn user_agent_comes_from_pool() {
        assert!(USER_AGENTS.contains(&random_user_agent()));
    }
}
