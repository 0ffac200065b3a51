//! Playwright browser automation
//!
//! The driver turns a [`Scenario`] into one self-contained Playwright
//! script, runs it with `node`, and maps the trailing JSON result line back
//! into Rust. A scenario always runs in a single browser session: page state
//! (3D mode, checked tree nodes, dismissed notifications) must persist
//! across steps for the assertions to mean anything.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

use regex::Regex;
use serde::Deserialize;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use crate::error::{HarnessError, HarnessResult};
use crate::scenario::{RunReport, Scenario};
use crate::step::{js_quote, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    /// Browser engine under test, from `HV_E2E_BROWSER`. Defaults to
    /// chromium.
    pub fn from_env() -> Self {
        match std::env::var("HV_E2E_BROWSER").as_deref() {
            Ok("firefox") => Browser::Firefox,
            Ok("webkit") => Browser::Webkit,
            _ => Browser::Chromium,
        }
    }

    pub fn is_chromium(self) -> bool {
        self == Browser::Chromium
    }

    /// Firefox under Playwright cannot create WebGL2 contexts, so 3D
    /// scenarios are skipped there.
    pub fn supports_webgl(self) -> bool {
        self != Browser::Firefox
    }
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub base_url: String,
    pub browser: Browser,
    pub screenshot_dir: PathBuf,
    pub headless: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            browser: Browser::default(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            headless: true,
        }
    }
}

/// Handle to the Playwright toolchain.
pub struct Driver {
    base_url: String,
    browser: Browser,
    screenshot_dir: PathBuf,
    headless: bool,
}

/// Result line the generated script prints on stdout/stderr.
#[derive(Debug, Deserialize)]
struct ScriptOutcome {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl Driver {
    pub fn new(config: DriverConfig) -> HarnessResult<Self> {
        std::fs::create_dir_all(&config.screenshot_dir)?;

        Ok(Self {
            base_url: config.base_url,
            browser: config.browser,
            screenshot_dir: config.screenshot_dir,
            headless: config.headless,
        })
    }

    /// Check that the Playwright toolchain is on PATH.
    pub fn check_installed() -> HarnessResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(HarnessError::PlaywrightNotFound),
        }
    }

    pub fn browser(&self) -> Browser {
        self.browser
    }

    pub fn screenshot_path(&self, name: &str) -> PathBuf {
        self.screenshot_dir.join(format!("{name}.png"))
    }

    /// Execute a scenario end to end in one browser session.
    pub async fn run(&self, scenario: &Scenario) -> HarnessResult<RunReport> {
        let start = Instant::now();
        let script = self.build_script(scenario);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, &script)?;

        debug!(scenario = %scenario.name, path = %script_path.display(), "running Playwright script");

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .output()
            .await?;

        let duration_ms = start.elapsed().as_millis() as u64;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = extract_failure(&stderr)
                .or_else(|| extract_failure(&stdout))
                .unwrap_or_else(|| format!("stdout: {} stderr: {}", stdout.trim(), stderr.trim()));
            warn!(scenario = %scenario.name, %message, "scenario failed");
            return Err(HarnessError::Script {
                scenario: scenario.name.clone(),
                message,
            });
        }

        info!(scenario = %scenario.name, duration_ms, "scenario passed");

        let screenshots = scenario
            .screenshot_names()
            .iter()
            .map(|name| self.screenshot_path(name))
            .collect();

        Ok(RunReport {
            scenario: scenario.name.clone(),
            duration_ms,
            screenshots,
        })
    }

    /// Render the full Playwright script for a scenario.
    pub fn build_script(&self, scenario: &Scenario) -> String {
        let mut args = scenario.launch_args.clone();
        if !self.browser.is_chromium() && !args.is_empty() {
            // Launch args are a chromium concept; other engines reject them.
            warn!(browser = self.browser.as_str(), "dropping chromium launch args");
            args.clear();
        }
        let args_js = args
            .iter()
            .map(|arg| format!("'{}'", js_quote(arg)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut script = format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect }} = require('@playwright/test');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless}, args: [{args_js}] }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = '{base_url}';

  try {{
"#,
            browser = self.browser.as_str(),
            headless = self.headless,
            width = scenario.viewport.width,
            height = scenario.viewport.height,
            base_url = js_quote(&self.base_url),
        );

        for (index, step) in scenario.steps.iter().enumerate() {
            script.push_str(&format!("\n    // step {}: {}\n", index + 1, step.label()));
            script.push_str(&self.step_js(step, index));
            script.push('\n');
        }

        script.push_str(
            r#"
    console.log(JSON.stringify({ ok: true }));
  } catch (error) {
    console.error(JSON.stringify({ ok: false, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Render one step as a Playwright script fragment.
    fn step_js(&self, step: &Step, index: usize) -> String {
        match step {
            Step::Navigate { path, wait_for_selector } => {
                let wait = wait_for_selector
                    .as_ref()
                    .map(|sel| format!("\n    await page.waitForSelector('{}');", js_quote(sel)))
                    .unwrap_or_default();
                format!("    await page.goto(baseUrl + '{}');{}", js_quote(path), wait)
            }
            Step::Reload => "    await page.reload();".to_string(),
            Step::Click { selector, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(10_000);
                format!(
                    "    await page.click('{}', {{ timeout: {} }});",
                    js_quote(selector),
                    timeout
                )
            }
            Step::Fill { selector, value } => format!(
                "    await page.fill('{}', '{}');",
                js_quote(selector),
                js_quote(value)
            ),
            Step::Press { selector, key } => match selector {
                Some(sel) => format!(
                    "    await page.locator('{}').press('{}');",
                    js_quote(sel),
                    js_quote(key)
                ),
                None => format!("    await page.keyboard.press('{}');", js_quote(key)),
            },
            Step::Wait { selector, state, timeout_ms } => format!(
                "    await page.waitForSelector('{}', {{ state: '{}', timeout: {} }});",
                js_quote(selector),
                state.as_str(),
                timeout_ms
            ),
            Step::Sleep { ms } => format!("    await page.waitForTimeout({ms});"),
            Step::Drag { button, from, to } => format!(
                "    await page.mouse.move({}, {});\n    \
                 await page.mouse.down({{ button: '{}' }});\n    \
                 await page.mouse.move({}, {}, {{ steps: 10 }});\n    \
                 await page.mouse.up({{ button: '{}' }});",
                from.x,
                from.y,
                button.as_str(),
                to.x,
                to.y,
                button.as_str()
            ),
            Step::Check { selector } => {
                format!("    await page.click('{}');", js_quote(selector))
            }
            Step::Screenshot { name, full_page } => {
                let path = self.screenshot_path(name);
                format!(
                    "    await page.screenshot({{ path: '{}', fullPage: {} }});",
                    js_quote(&path.to_string_lossy()),
                    full_page
                )
            }
            Step::MockRoute { pattern, body, content_type, times } => {
                let body_js = body.to_string();
                let times_js = times
                    .map(|n| format!(", {{ times: {n} }}"))
                    .unwrap_or_default();
                format!(
                    "    const mock_{index} = {body_js};\n    \
                     await page.route('{}', async (route) => {{\n      \
                     await route.fulfill({{ status: 200, contentType: '{}', body: JSON.stringify(mock_{index}) }});\n    \
                     }}{times_js});",
                    js_quote(pattern),
                    js_quote(content_type)
                )
            }
            Step::StartResponseWait { pattern, tag } => format!(
                "    const resp_{tag} = page.waitForResponse('{}');",
                js_quote(pattern)
            ),
            Step::AwaitResponse { tag } => format!("    await resp_{tag};"),
            Step::DismissNotifications { item_selector, close_selector } => format!(
                "    for (let i = 0; i < 20; i++) {{\n      \
                 if (await page.locator('{close}').count() === 0) break;\n      \
                 await page.locator('{close}').first().click();\n      \
                 await page.waitForTimeout(100);\n    \
                 }}\n    \
                 await expect(page.locator('{item}')).toHaveCount(0);",
                close = js_quote(close_selector),
                item = js_quote(item_selector)
            ),
            Step::AssertCount { selector, count } => format!(
                "    await expect(page.locator('{}')).toHaveCount({});",
                js_quote(selector),
                count
            ),
            Step::AssertCountAtLeast { selector, count } => format!(
                "    await expect.poll(async () => await page.locator('{}').count()).toBeGreaterThanOrEqual({});",
                js_quote(selector),
                count
            ),
            Step::AssertChecked { selector, checked } => {
                let not = if *checked { "" } else { ".not" };
                format!(
                    "    await expect(page.locator('{}')){}.toHaveClass(/\\bjstree-checked\\b/);",
                    js_quote(selector),
                    not
                )
            }
            Step::AssertVisible { selector, visible } => {
                let assertion = if *visible { "toBeVisible" } else { "toBeHidden" };
                format!(
                    "    await expect(page.locator('{}')).{}();",
                    js_quote(selector),
                    assertion
                )
            }
        }
    }
}

/// Pull the `{"ok":false,...}` result line out of mixed node output.
fn extract_failure(output: &str) -> Option<String> {
    let re = Regex::new(r#"\{\s*"ok"\s*:\s*false.*\}"#).ok()?;
    let raw = re.find(output)?.as_str();
    match serde_json::from_str::<ScriptOutcome>(raw) {
        Ok(outcome) if !outcome.ok => outcome.error,
        _ => Some(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{MouseButton, Point, WaitState};
    use crate::views;

    fn driver() -> Driver {
        let dir = tempfile::tempdir().unwrap();
        Driver::new(DriverConfig {
            base_url: "http://localhost:8080".to_string(),
            browser: Browser::Chromium,
            screenshot_dir: dir.path().to_path_buf(),
            headless: true,
        })
        .unwrap()
    }

    #[test]
    fn script_header_sets_viewport_and_imports_expect() {
        let scenario = Scenario::new("header", views::MOBILE.viewport);
        let script = driver().build_script(&scenario);

        assert!(script.contains("require('@playwright/test')"));
        assert!(script.contains("chromium.launch"));
        assert!(script.contains("width: 375, height: 667"));
        assert!(script.contains(r#"JSON.stringify({ ok: true })"#));
    }

    #[test]
    fn launch_args_are_rendered_for_chromium() {
        let mut scenario = Scenario::new("webgl-off", views::DESKTOP.viewport);
        scenario.add_launch_arg("--disable-webgl");
        scenario.add_launch_arg("--disable-webgl2");

        let script = driver().build_script(&scenario);
        assert!(script.contains("args: ['--disable-webgl', '--disable-webgl2']"));
    }

    #[test]
    fn route_mock_inlines_body_and_times() {
        let mut scenario = Scenario::new("mock", views::DESKTOP.viewport);
        scenario.push(Step::MockRoute {
            pattern: "**/gse2frame".to_string(),
            body: serde_json::json!({ "coordinates": [] }),
            content_type: "application/json".to_string(),
            times: Some(2),
        });

        let script = driver().build_script(&scenario);
        assert!(script.contains(r#"page.route('**/gse2frame'"#));
        assert!(script.contains(r#"{"coordinates":[]}"#));
        assert!(script.contains("{ times: 2 }"));
    }

    #[test]
    fn response_wait_pairs_by_tag() {
        let mut scenario = Scenario::new("glb", views::DESKTOP.viewport);
        scenario.push(Step::StartResponseWait {
            pattern: "**/zit.glb".to_string(),
            tag: "model".to_string(),
        });
        scenario.push(Step::Click {
            selector: ".js-3d-toggle".to_string(),
            timeout_ms: None,
        });
        scenario.push(Step::AwaitResponse {
            tag: "model".to_string(),
        });

        let script = driver().build_script(&scenario);
        let start = script.find("const resp_model = page.waitForResponse").unwrap();
        let click = script.find("page.click('.js-3d-toggle'").unwrap();
        let join = script.find("await resp_model;").unwrap();
        assert!(start < click && click < join);
    }

    #[test]
    fn drag_renders_press_move_release() {
        let mut scenario = Scenario::new("drag", views::DESKTOP.viewport);
        scenario.push(Step::Drag {
            button: MouseButton::Right,
            from: Point { x: 960.0, y: 540.0 },
            to: Point { x: 1110.0, y: 440.0 },
        });

        let script = driver().build_script(&scenario);
        assert!(script.contains("page.mouse.down({ button: 'right' })"));
        assert!(script.contains("page.mouse.move(1110, 440, { steps: 10 })"));
        assert!(script.contains("page.mouse.up({ button: 'right' })"));
    }

    #[test]
    fn wait_state_and_checked_assertions() {
        let mut scenario = Scenario::new("asserts", views::DESKTOP.viewport);
        scenario.push(Step::Wait {
            selector: "#loading".to_string(),
            state: WaitState::Hidden,
            timeout_ms: 60_000,
        });
        scenario.push(Step::AssertChecked {
            selector: "a[data-event-id=\"x\"]".to_string(),
            checked: false,
        });

        let script = driver().build_script(&scenario);
        assert!(script.contains("{ state: 'hidden', timeout: 60000 }"));
        assert!(script.contains(".not.toHaveClass"));
    }

    #[test]
    fn extract_failure_parses_result_line() {
        let stderr = "noise\n{\"ok\":false,\"error\":\"timeout on #date\"}\nmore";
        assert_eq!(extract_failure(stderr).as_deref(), Some("timeout on #date"));
        assert_eq!(extract_failure("no json here"), None);
    }

    #[test]
    fn browser_from_env_defaults_to_chromium() {
        // Only meaningful when the override is unset, as in CI unit runs.
        if std::env::var("HV_E2E_BROWSER").is_err() {
            assert_eq!(Browser::from_env(), Browser::Chromium);
        }
        assert!(Browser::Chromium.supports_webgl());
        assert!(!Browser::Firefox.supports_webgl());
    }
}
