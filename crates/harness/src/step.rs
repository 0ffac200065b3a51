//! Browser interaction steps
//!
//! The step list is the wire format between page objects and the driver:
//! page objects append [`Step`]s to a scenario, the driver renders each one
//! into a fragment of a Playwright script. Every user-supplied string is
//! passed through [`js_quote`] before interpolation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

/// A single browser interaction or assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a path relative to the base URL.
    Navigate {
        path: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Reload the current page.
    Reload,

    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    Fill {
        selector: String,
        value: String,
    },

    /// Press a key, optionally scoped to an element.
    Press {
        selector: Option<String>,
        key: String,
    },

    /// Wait for an element to reach a state.
    Wait {
        selector: String,
        #[serde(default)]
        state: WaitState,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Fixed settle delay. Used only where the app exposes no observable
    /// readiness signal (the 3D renderer has none).
    Sleep {
        ms: u64,
    },

    /// Press-and-hold mouse drag between two viewport points.
    Drag {
        button: MouseButton,
        from: Point,
        to: Point,
    },

    /// Toggle a tree checkbox by clicking its anchor.
    Check {
        selector: String,
    },

    /// Capture a viewport screenshot under `<screenshot_dir>/<name>.png`.
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },

    /// Install a route interception that fulfills matching requests with a
    /// fixed JSON body. Must precede the navigation that triggers the
    /// request.
    MockRoute {
        pattern: String,
        body: Value,
        content_type: String,
        #[serde(default)]
        times: Option<u32>,
    },

    /// Start waiting for a network response matching `pattern`. The promise
    /// is bound to `tag` and resolved later by [`Step::AwaitResponse`], so a
    /// fetch triggered by an intermediate action is not missed.
    StartResponseWait {
        pattern: String,
        tag: String,
    },

    AwaitResponse {
        tag: String,
    },

    /// Dismiss every visible notification and wait until none remain.
    DismissNotifications {
        item_selector: String,
        close_selector: String,
    },

    /// Assert an exact element count.
    AssertCount {
        selector: String,
        count: usize,
    },

    /// Assert that at least `count` elements match.
    AssertCountAtLeast {
        selector: String,
        count: usize,
    },

    /// Assert tree checkbox state via the checked marker class.
    AssertChecked {
        selector: String,
        checked: bool,
    },

    AssertVisible {
        selector: String,
        visible: bool,
    },
}

fn default_wait_timeout() -> u64 {
    10_000
}

impl Step {
    /// Short human-readable label, used in logs and failure messages.
    pub fn label(&self) -> String {
        match self {
            Step::Navigate { path, .. } => format!("navigate:{path}"),
            Step::Reload => "reload".to_string(),
            Step::Click { selector, .. } => format!("click:{selector}"),
            Step::Fill { selector, .. } => format!("fill:{selector}"),
            Step::Press { key, .. } => format!("press:{key}"),
            Step::Wait { selector, state, .. } => format!("wait:{selector}:{}", state.as_str()),
            Step::Sleep { ms } => format!("sleep:{ms}ms"),
            Step::Drag { button, .. } => format!("drag:{}", button.as_str()),
            Step::Check { selector } => format!("check:{selector}"),
            Step::Screenshot { name, .. } => format!("screenshot:{name}"),
            Step::MockRoute { pattern, .. } => format!("mock:{pattern}"),
            Step::StartResponseWait { pattern, .. } => format!("await-response:{pattern}"),
            Step::AwaitResponse { tag } => format!("await-response-join:{tag}"),
            Step::DismissNotifications { .. } => "dismiss-notifications".to_string(),
            Step::AssertCount { selector, count } => format!("assert-count:{selector}={count}"),
            Step::AssertCountAtLeast { selector, count } => {
                format!("assert-count:{selector}>={count}")
            }
            Step::AssertChecked { selector, checked } => {
                format!("assert-checked:{selector}={checked}")
            }
            Step::AssertVisible { selector, visible } => {
                format!("assert-visible:{selector}={visible}")
            }
        }
    }
}

/// Escape a string for interpolation inside a single-quoted JS literal.
pub fn js_quote(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_quote_escapes_quotes_and_backslashes() {
        assert_eq!(js_quote("plain"), "plain");
        assert_eq!(js_quote("it's"), "it\\'s");
        assert_eq!(js_quote(r"a\b"), r"a\\b");
        assert_eq!(js_quote("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn js_quote_keeps_css_attribute_selectors_intact() {
        let sel = r#"a.jstree-anchor[data-event-id="ivo://helio-informatics.org/SFP_AMOS_20180904_001"]"#;
        assert_eq!(js_quote(sel), sel);
    }

    #[test]
    fn labels_identify_target() {
        let step = Step::Click {
            selector: ".js-3d-toggle".to_string(),
            timeout_ms: None,
        };
        assert_eq!(step.label(), "click:.js-3d-toggle");

        let step = Step::AssertCount {
            selector: ".js-3d-toggle.active".to_string(),
            count: 0,
        };
        assert_eq!(step.label(), "assert-count:.js-3d-toggle.active=0");
    }

    #[test]
    fn steps_serialize_with_action_tag() {
        let step = Step::Sleep { ms: 500 };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["action"], "sleep");
        assert_eq!(json["ms"], 500);
    }
}
