//! Helioviewer page objects
//!
//! One trait, two variants. Desktop drives the controls directly; mobile
//! reaches the date and 3D controls through the hamburger menu and uses the
//! drawer affordances of the mobile layout. Test bodies stay view-agnostic
//! and go through [`HelioviewerFactory`].
//!
//! The selectors in [`dom`] are the implicit contract with the application
//! under test; a markup change there breaks the suite.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::events::{EventSourceCatalog, EventTree};
use crate::mock::{RouteMock, MODEL_ASSET_PATTERN};
use crate::scenario::Scenario;
use crate::step::{MouseButton, Point, Step, WaitState};
use crate::views::ViewDescriptor;

/// DOM contract consumed from the application under test.
pub mod dom {
    pub const VIEWPORT: &str = "#helioviewer-viewport";
    pub const LOADING: &str = "#loading";

    pub const NOTIFICATION: &str = "div.jGrowl-notification";
    pub const NOTIFICATION_CLOSE: &str = "div.jGrowl-notification .jGrowl-close";
    pub const WEBGL_ERROR: &str =
        "div.jGrowl-notification.error > div.jGrowl-message:has-text(\"does not support WebGL\")";

    pub const TOGGLE_3D: &str = ".js-3d-toggle";
    pub const TOGGLE_3D_ACTIVE: &str = ".js-3d-toggle.active";

    pub const DATE_INPUT: &str = "#date";
    pub const TIME_INPUT: &str = "#time";

    pub const SIDEBAR_TAB: &str = "#hv-drawer-tab-left";
    pub const SIDEBAR: &str = "#hv-drawer-left";

    pub const EVENTS_HEADER: &str = "#accordion-events .header";
    pub const EVENTS_CONTENT: &str = "#accordion-events .content";

    pub const MOBILE_MENU_BUTTON: &str = "#hv-mobile-menu-btn";
    pub const MOBILE_MENU: &str = "#hv-mobile-menu";
}

const DATE_FORMAT: &str = "%Y/%m/%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const LOADING_TIMEOUT_MS: u64 = 60_000;

/// Shared page-object core: owns the scenario and the mocked event feeds.
struct Core {
    view: ViewDescriptor,
    scenario: Scenario,
    sources: HashMap<String, EventSourceCatalog>,
}

impl Core {
    fn new(view: ViewDescriptor, scenario_name: &str) -> Self {
        Self {
            view,
            scenario: Scenario::new(scenario_name, view.viewport),
            sources: HashMap::new(),
        }
    }

    fn push(&mut self, step: Step) {
        self.scenario.push(step);
    }

    fn load(&mut self, path: &str) {
        self.push(Step::Navigate {
            path: path.to_string(),
            wait_for_selector: Some(dom::VIEWPORT.to_string()),
        });
    }

    fn wait_for_loading_complete(&mut self) {
        self.push(Step::Wait {
            selector: dom::LOADING.to_string(),
            state: WaitState::Hidden,
            timeout_ms: LOADING_TIMEOUT_MS,
        });
    }

    fn close_all_notifications(&mut self) {
        self.push(Step::DismissNotifications {
            item_selector: dom::NOTIFICATION.to_string(),
            close_selector: dom::NOTIFICATION_CLOSE.to_string(),
        });
    }

    fn fill_observation_datetime(&mut self, when: NaiveDateTime) {
        self.push(Step::Fill {
            selector: dom::DATE_INPUT.to_string(),
            value: when.format(DATE_FORMAT).to_string(),
        });
        self.push(Step::Fill {
            selector: dom::TIME_INPUT.to_string(),
            value: when.format(TIME_FORMAT).to_string(),
        });
        self.push(Step::Press {
            selector: Some(dom::TIME_INPUT.to_string()),
            key: "Enter".to_string(),
        });
    }

    fn click_3d_toggle(&mut self) {
        self.push(Step::Click {
            selector: dom::TOGGLE_3D.to_string(),
            timeout_ms: None,
        });
    }

    fn open_sidebar(&mut self) {
        self.push(Step::Click {
            selector: dom::SIDEBAR_TAB.to_string(),
            timeout_ms: None,
        });
        self.push(Step::Wait {
            selector: dom::SIDEBAR.to_string(),
            state: WaitState::Visible,
            timeout_ms: 10_000,
        });
    }

    fn open_events_drawer(&mut self) {
        self.push(Step::Click {
            selector: dom::EVENTS_HEADER.to_string(),
            timeout_ms: None,
        });
        self.push(Step::Wait {
            selector: dom::EVENTS_CONTENT.to_string(),
            state: WaitState::Visible,
            timeout_ms: 10_000,
        });
    }

    /// Mobile only: controls live behind the hamburger menu.
    fn open_mobile_menu(&mut self) {
        self.push(Step::Click {
            selector: dom::MOBILE_MENU_BUTTON.to_string(),
            timeout_ms: None,
        });
        self.push(Step::Wait {
            selector: dom::MOBILE_MENU.to_string(),
            state: WaitState::Visible,
            timeout_ms: 10_000,
        });
    }

    fn mock_event_source(&mut self, source: &str, feed: &Value) -> HarnessResult<()> {
        let catalog = EventSourceCatalog::from_value(source, feed)?;
        debug!(source, concepts = catalog.concepts.len(), "mocking event source");
        self.push(RouteMock::events(source, feed.clone()).into_step());
        self.sources.insert(source.to_string(), catalog);
        Ok(())
    }

    fn parse_tree(&mut self, source: &str) -> HarnessResult<EventTree<'_>> {
        let catalog = self
            .sources
            .get(source)
            .ok_or_else(|| HarnessError::UnknownSource(source.to_string()))?;
        Ok(EventTree::new(catalog, &mut self.scenario))
    }

    fn mock_gse2frame(&mut self, body: Value, times: u32) {
        self.push(RouteMock::gse2frame(body, times).into_step());
    }

    fn start_waiting_for_model(&mut self) {
        self.push(Step::StartResponseWait {
            pattern: MODEL_ASSET_PATTERN.to_string(),
            tag: "model".to_string(),
        });
    }

    fn await_model_loaded(&mut self) {
        self.push(Step::AwaitResponse {
            tag: "model".to_string(),
        });
    }
}

/// High-level actions every view variant exposes.
pub trait HelioviewerInterface {
    fn view(&self) -> ViewDescriptor;
    fn scenario(&self) -> &Scenario;
    fn scenario_mut(&mut self) -> &mut Scenario;
    fn into_scenario(self: Box<Self>) -> Scenario;

    /// Navigate to the app and wait for the viewport to attach.
    fn load(&mut self, path: &str);

    /// Wait until the loading indicator clears.
    fn wait_for_loading_complete(&mut self);

    /// Dismiss every open notification and wait until none remain.
    fn close_all_notifications(&mut self);

    fn set_observation_datetime(&mut self, when: NaiveDateTime);

    fn toggle_3d(&mut self);

    fn open_sidebar(&mut self);

    fn open_events_drawer(&mut self);

    /// Intercept the events feed for `source` and remember its catalog for
    /// later tree queries.
    fn mock_event_source(&mut self, source: &str, feed: &Value) -> HarnessResult<()>;

    /// Tree handle scoped to a previously mocked source.
    fn parse_tree<'a>(&'a mut self, source: &str) -> HarnessResult<EventTree<'a>>;

    fn mock_gse2frame(&mut self, body: Value, times: u32);

    /// Arm the wait for the 3D model asset fetch. Must precede the action
    /// that triggers it; join with [`Self::await_model_loaded`].
    fn start_waiting_for_model(&mut self);

    fn await_model_loaded(&mut self);

    fn assert_3d_active(&mut self);
    fn assert_3d_inactive(&mut self);
    fn assert_webgl_error_shown(&mut self);
    fn assert_no_webgl_error(&mut self);

    fn reload(&mut self);
    fn sleep(&mut self, ms: u64);
    fn drag(&mut self, button: MouseButton, from: Point, to: Point);
    fn expect_screenshot(&mut self, name: &str);
}

/// Desktop layout: controls are directly reachable.
pub struct Desktop {
    core: Core,
}

/// Mobile layout: date and 3D controls sit behind the hamburger menu.
pub struct Mobile {
    core: Core,
}

macro_rules! shared_interface_impls {
    () => {
        fn view(&self) -> ViewDescriptor {
            self.core.view
        }

        fn scenario(&self) -> &Scenario {
            &self.core.scenario
        }

        fn scenario_mut(&mut self) -> &mut Scenario {
            &mut self.core.scenario
        }

        fn into_scenario(self: Box<Self>) -> Scenario {
            self.core.scenario
        }

        fn load(&mut self, path: &str) {
            self.core.load(path);
        }

        fn wait_for_loading_complete(&mut self) {
            self.core.wait_for_loading_complete();
        }

        fn close_all_notifications(&mut self) {
            self.core.close_all_notifications();
        }

        fn mock_event_source(&mut self, source: &str, feed: &Value) -> HarnessResult<()> {
            self.core.mock_event_source(source, feed)
        }

        fn parse_tree<'a>(&'a mut self, source: &str) -> HarnessResult<EventTree<'a>> {
            self.core.parse_tree(source)
        }

        fn mock_gse2frame(&mut self, body: Value, times: u32) {
            self.core.mock_gse2frame(body, times);
        }

        fn start_waiting_for_model(&mut self) {
            self.core.start_waiting_for_model();
        }

        fn await_model_loaded(&mut self) {
            self.core.await_model_loaded();
        }

        fn assert_3d_active(&mut self) {
            self.core.push(Step::AssertCountAtLeast {
                selector: dom::TOGGLE_3D_ACTIVE.to_string(),
                count: 1,
            });
        }

        fn assert_3d_inactive(&mut self) {
            self.core.push(Step::AssertCount {
                selector: dom::TOGGLE_3D_ACTIVE.to_string(),
                count: 0,
            });
        }

        fn assert_webgl_error_shown(&mut self) {
            self.core.push(Step::AssertVisible {
                selector: dom::WEBGL_ERROR.to_string(),
                visible: true,
            });
        }

        fn assert_no_webgl_error(&mut self) {
            self.core.push(Step::AssertVisible {
                selector: dom::WEBGL_ERROR.to_string(),
                visible: false,
            });
        }

        fn reload(&mut self) {
            self.core.push(Step::Reload);
        }

        fn sleep(&mut self, ms: u64) {
            self.core.push(Step::Sleep { ms });
        }

        fn drag(&mut self, button: MouseButton, from: Point, to: Point) {
            self.core.push(Step::Drag { button, from, to });
        }

        fn expect_screenshot(&mut self, name: &str) {
            self.core.push(Step::Screenshot {
                name: name.to_string(),
                full_page: false,
            });
        }
    };
}

impl HelioviewerInterface for Desktop {
    shared_interface_impls!();

    fn set_observation_datetime(&mut self, when: NaiveDateTime) {
        self.core.fill_observation_datetime(when);
    }

    fn toggle_3d(&mut self) {
        self.core.click_3d_toggle();
    }

    fn open_sidebar(&mut self) {
        self.core.open_sidebar();
    }

    fn open_events_drawer(&mut self) {
        self.core.open_events_drawer();
    }
}

impl HelioviewerInterface for Mobile {
    shared_interface_impls!();

    fn set_observation_datetime(&mut self, when: NaiveDateTime) {
        self.core.open_mobile_menu();
        self.core.fill_observation_datetime(when);
    }

    fn toggle_3d(&mut self) {
        self.core.open_mobile_menu();
        self.core.click_3d_toggle();
    }

    fn open_sidebar(&mut self) {
        self.core.open_mobile_menu();
        self.core.open_sidebar();
    }

    fn open_events_drawer(&mut self) {
        // Reached through the sidebar; on mobile open_sidebar must have run
        // first.
        self.core.open_events_drawer();
    }
}

/// Builds the page-object variant matching a view descriptor.
pub struct HelioviewerFactory;

impl HelioviewerFactory {
    pub fn create(view: ViewDescriptor, scenario_name: &str) -> Box<dyn HelioviewerInterface> {
        let core = Core::new(view, scenario_name);
        if view.is_mobile() {
            Box::new(Mobile { core })
        } else {
            Box::new(Desktop { core })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views;
    use test_case::test_case;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test_case(views::DESKTOP; "desktop")]
    #[test_case(views::MOBILE; "mobile")]
    fn load_waits_for_viewport(view: ViewDescriptor) {
        let mut hv = HelioviewerFactory::create(view, "load");
        hv.load("/");

        match &hv.scenario().steps[0] {
            Step::Navigate { path, wait_for_selector } => {
                assert_eq!(path, "/");
                assert_eq!(wait_for_selector.as_deref(), Some(dom::VIEWPORT));
            }
            other => panic!("expected Navigate, got {:?}", other.label()),
        }
        assert_eq!(hv.scenario().viewport, view.viewport);
    }

    #[test]
    fn desktop_sets_date_directly() {
        let mut hv = HelioviewerFactory::create(views::DESKTOP, "date");
        hv.set_observation_datetime(datetime("2024-12-31 00:00:00"));

        let labels: Vec<_> = hv.scenario().steps.iter().map(Step::label).collect();
        assert_eq!(
            labels,
            vec!["fill:#date", "fill:#time", "press:Enter"]
        );

        match &hv.scenario().steps[0] {
            Step::Fill { value, .. } => assert_eq!(value, "2024/12/31"),
            other => panic!("expected Fill, got {:?}", other.label()),
        }
        match &hv.scenario().steps[1] {
            Step::Fill { value, .. } => assert_eq!(value, "00:00:00"),
            other => panic!("expected Fill, got {:?}", other.label()),
        }
    }

    #[test]
    fn mobile_opens_menu_before_date_and_3d() {
        let mut hv = HelioviewerFactory::create(views::MOBILE, "menu");
        hv.toggle_3d();

        let labels: Vec<_> = hv.scenario().steps.iter().map(Step::label).collect();
        assert_eq!(
            labels,
            vec![
                format!("click:{}", dom::MOBILE_MENU_BUTTON),
                format!("wait:{}:visible", dom::MOBILE_MENU),
                format!("click:{}", dom::TOGGLE_3D),
            ]
        );
    }

    #[test]
    fn desktop_toggles_3d_without_menu() {
        let mut hv = HelioviewerFactory::create(views::DESKTOP, "toggle");
        hv.toggle_3d();

        let labels: Vec<_> = hv.scenario().steps.iter().map(Step::label).collect();
        assert_eq!(labels, vec![format!("click:{}", dom::TOGGLE_3D)]);
    }

    #[test]
    fn notifications_are_dismissed_to_zero() {
        let mut hv = HelioviewerFactory::create(views::DESKTOP, "growl");
        hv.close_all_notifications();

        assert!(matches!(
            hv.scenario().steps[0],
            Step::DismissNotifications { .. }
        ));
    }

    #[test]
    fn parse_tree_requires_a_mocked_source() {
        let mut hv = HelioviewerFactory::create(views::DESKTOP, "tree");
        assert!(matches!(
            hv.parse_tree("CCMC"),
            Err(HarnessError::UnknownSource(_))
        ));

        let feed = serde_json::json!([
            { "name": "Active Region", "pin": "AR", "groups": [] }
        ]);
        hv.mock_event_source("CCMC", &feed).unwrap();

        let tree = hv.parse_tree("CCMC").unwrap();
        assert_eq!(tree.source(), "CCMC");
    }

    #[test]
    fn model_wait_brackets_the_toggle() {
        let mut hv = HelioviewerFactory::create(views::DESKTOP, "3d-init");
        hv.mock_gse2frame(crate::mock::gse2frame_response("2024-12-31T00:05:00.000"), 2);
        hv.start_waiting_for_model();
        hv.toggle_3d();
        hv.await_model_loaded();

        let labels: Vec<_> = hv.scenario().steps.iter().map(Step::label).collect();
        assert_eq!(
            labels,
            vec![
                "mock:**/gse2frame".to_string(),
                "await-response:**/zit.glb".to_string(),
                format!("click:{}", dom::TOGGLE_3D),
                "await-response-join:model".to_string(),
            ]
        );
    }
}
