//! Stealth browser session construction and teardown.
//!
//! One [`StealthSession`] owns one Chromium process and one page. Stealth
//! configuration is fixed per pipeline run: viewport, user-agent, automation
//! flags, and image loading are set at launch, and the webdriver marker is
//! scrubbed before any navigation via an on-new-document script.

use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use lodgedb_core::ScraperConfig;
use tokio::task::JoinHandle;

use crate::error::ScraperError;

/// Viewport the target site is probed with. Matches a common laptop size so
/// the rendered card layout is the one the extraction rules were written for.
const WINDOW_WIDTH: u32 = 1440;
const WINDOW_HEIGHT: u32 = 900;

/// Identification string presented to the target site.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Installed with `Page.addScriptToEvaluateOnNewDocument`, so it runs on
/// every document before the site's own scripts — never after a navigation
/// has already happened.
const WEBDRIVER_SCRUB: &str = r"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Array;
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Promise;
    delete window.cdc_adoQpoasnfa76pfcZLmcfl_Symbol;
";

/// An isolated browser-automation session with anti-detection settings.
///
/// Owns the browser process, its CDP event handler task, and a single page.
/// [`StealthSession::close`] tears all three down deterministically; the
/// launch path tears down partially-constructed sessions on every error
/// return, so no Chromium process outlives its session.
pub struct StealthSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl StealthSession {
    /// Launches a stealth-configured browser and prepares a blank page with
    /// the webdriver scrub installed.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Session`] if the browser cannot be launched
    /// or the page cannot be prepared. The browser process is torn down
    /// before the error is returned.
    pub async fn launch(config: &ScraperConfig) -> Result<Self, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .arg(format!("--user-agent={USER_AGENT}"))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--blink-settings=imagesEnabled=false")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-dev-shm-usage");

        // Builder default is headless; with_head() opts out for debugging.
        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|reason| ScraperError::Session { reason })?;

        let (browser, mut handler) =
            Browser::launch(browser_config)
                .await
                .map_err(|e| ScraperError::Session {
                    reason: format!("failed to launch browser: {e}"),
                })?;

        // Drive CDP events until the browser goes away.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                teardown(browser, handler_task).await;
                return Err(ScraperError::Session {
                    reason: format!("failed to open page: {e}"),
                });
            }
        };

        // The scrub must be registered before the first real navigation.
        let scrub = AddScriptToEvaluateOnNewDocumentParams::new(WEBDRIVER_SCRUB);
        if let Err(e) = page.execute(scrub).await {
            teardown(browser, handler_task).await;
            return Err(ScraperError::Session {
                reason: format!("failed to install webdriver scrub: {e}"),
            });
        }

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// The session's single page. Callers navigate and query through it;
    /// concurrent navigations on one session are not supported, which is
    /// why every detail worker owns its own session.
    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Tears down the page, the browser process, and the event handler.
    ///
    /// Best-effort: teardown failures are logged at debug level, not
    /// surfaced, since there is nothing actionable for the caller.
    pub async fn close(self) {
        let Self {
            browser,
            page,
            handler_task,
        } = self;

        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "page close failed during session teardown");
        }
        teardown(browser, handler_task).await;
    }
}

/// Closes the browser process and stops the handler task, reaping the child
/// so no process leaks on any return path.
async fn teardown(mut browser: Browser, handler_task: JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        tracing::debug!(error = %e, "browser close failed during session teardown");
    }
    if let Err(e) = browser.wait().await {
        tracing::debug!(error = %e, "browser wait failed during session teardown");
    }
    handler_task.abort();
}
