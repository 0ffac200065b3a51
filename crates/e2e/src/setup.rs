//! Shared test setup
//!
//! Browser-driving tests are gated on the environment: they need a running
//! Helioviewer instance (`HV_BASE_URL`) and a working node/Playwright
//! toolchain, and skip cleanly when either is missing. Everything else in
//! the suite (scenario assembly, tree resolution, visual comparison) runs
//! unconditionally.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use helioviewer_harness::driver::{Browser, Driver, DriverConfig};
use helioviewer_harness::mock::{gse2frame_response, load_fixture};
use helioviewer_harness::visual::{VisualConfig, VisualTester};
use helioviewer_harness::HelioviewerInterface;

/// Best-effort tracing init; repeated calls are fine across test binaries.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Base URL of the Helioviewer instance under test, if one is configured.
pub fn target_base_url() -> Option<String> {
    std::env::var("HV_BASE_URL").ok().filter(|url| !url.is_empty())
}

/// Whether the node/Playwright toolchain is usable.
pub fn playwright_available() -> bool {
    Driver::check_installed().is_ok()
}

pub fn browser() -> Browser {
    Browser::from_env()
}

/// Driver targeting `base_url` with the suite's standard layout.
pub fn driver_for(base_url: &str) -> Driver {
    Driver::new(DriverConfig {
        base_url: base_url.to_string(),
        browser: browser(),
        screenshot_dir: PathBuf::from("test-results/screenshots"),
        headless: true,
    })
    .expect("create driver")
}

/// Visual tester over the suite's standard layout. Baselines auto-update on
/// first capture so a fresh checkout seeds them instead of erroring.
pub fn visual() -> VisualTester {
    VisualTester::new(VisualConfig {
        auto_update: true,
        ..VisualConfig::default()
    })
    .expect("create visual tester")
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load a JSON fixture by file name.
pub fn fixture(name: &str) -> Value {
    let path = fixtures_dir().join(name);
    load_fixture(&path).unwrap_or_else(|e| panic!("fixture {name}: {e}"))
}

/// An observation date with known available data.
pub fn default_observation_date() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-12-31 00:00:00", "%Y-%m-%d %H:%M:%S")
        .expect("valid timestamp")
}

pub fn observation_date(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|e| panic!("timestamp {s}: {e}"))
}

/// Bring the page into a stable 3D state.
///
/// Load, settle, pin the observation date, mock the `gse2frame` conversion
/// (the scene issues two requests), arm the wait for the model asset, enable
/// 3D, then join the model fetch. The final fixed delay stands in for a
/// render-complete signal the app does not expose; every other wait polls an
/// observable state (loading indicator, notification count, mocked
/// responses).
pub fn initialize_3d(hv: &mut dyn HelioviewerInterface) {
    hv.load("/");
    hv.wait_for_loading_complete();
    hv.close_all_notifications();

    hv.set_observation_datetime(default_observation_date());
    hv.wait_for_loading_complete();
    hv.close_all_notifications();

    hv.mock_gse2frame(gse2frame_response("2024-12-31T00:05:00.000"), 2);
    hv.start_waiting_for_model();
    hv.toggle_3d();
    hv.await_model_loaded();
    hv.sleep(1000);
}

#[cfg(test)]
mod tests {
    use super::*;
    use helioviewer_harness::views;
    use helioviewer_harness::HelioviewerFactory;

    #[test]
    fn observation_date_parses() {
        let when = default_observation_date();
        assert_eq!(when.format("%Y/%m/%d %H:%M:%S").to_string(), "2024/12/31 00:00:00");
    }

    #[test]
    fn initialize_3d_ends_with_model_join_and_settle() {
        let mut hv = HelioviewerFactory::create(views::DESKTOP, "3d-init");
        initialize_3d(hv.as_mut());

        let labels: Vec<_> = hv.scenario().steps.iter().map(|s| s.label()).collect();
        let joined = labels.join(" | ");

        assert!(joined.contains("mock:**/gse2frame"));
        assert!(joined.contains("await-response:**/zit.glb"));
        assert_eq!(labels.last().map(String::as_str), Some("sleep:1000ms"));

        // The model wait is armed before the toggle that triggers the fetch.
        let armed = labels.iter().position(|l| l.starts_with("await-response:**/zit.glb"));
        let toggled = labels.iter().position(|l| l == "click:.js-3d-toggle");
        assert!(armed < toggled);
    }
}
