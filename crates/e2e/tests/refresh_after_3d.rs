//! Refreshing the page with 3D mode enabled must not raise a spurious
//! unsupported-WebGL error, and 3D must stay active.
//!
//! Observed during manual testing: enable 3D where WebGL is supported,
//! refresh, and an error incorrectly claims WebGL is unsupported.

use test_case::test_case;

use helioviewer_e2e::setup;
use helioviewer_harness::{views, HelioviewerFactory, HelioviewerInterface, ViewDescriptor};

#[test_case(views::DESKTOP; "desktop")]
#[test_case(views::MOBILE; "mobile")]
#[tokio::test]
async fn no_webgl_error_after_refresh_with_3d_enabled(view: ViewDescriptor) {
    setup::init_tracing();

    if !setup::browser().supports_webgl() {
        eprintln!("Skipping: Firefox does not support 3D mode");
        return;
    }
    let Some(base_url) = setup::target_base_url() else {
        eprintln!("Skipping: HV_BASE_URL not set");
        return;
    };
    if !setup::playwright_available() {
        eprintln!("Skipping: Playwright toolchain not available");
        return;
    }

    let name = format!("refresh-after-3d-{}", view.name.to_lowercase());
    let mut hv = HelioviewerFactory::create(view, &name);

    hv.load("/");
    hv.wait_for_loading_complete();
    hv.close_all_notifications();

    hv.set_observation_datetime(setup::default_observation_date());
    hv.wait_for_loading_complete();
    hv.close_all_notifications();

    hv.toggle_3d();
    hv.wait_for_loading_complete();
    hv.close_all_notifications();
    hv.assert_3d_active();

    hv.reload();
    hv.wait_for_loading_complete();

    hv.assert_no_webgl_error();
    hv.assert_3d_active();

    let scenario = hv.into_scenario();
    let driver = setup::driver_for(&base_url);
    driver.run(&scenario).await.expect("scenario passes");
}
