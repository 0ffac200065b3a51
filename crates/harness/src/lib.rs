//! Helioviewer E2E Harness
//!
//! Rust-controlled browser automation for the Helioviewer web application.
//! Tests build a [`Scenario`] through view-specific page objects, the
//! [`driver::Driver`] renders it into a single self-contained Playwright
//! script and executes it with `node`, and [`visual::VisualTester`] compares
//! the screenshots it leaves behind against versioned baselines.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Test (Rust)                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  HelioviewerFactory::create(view) -> Box<dyn Interface>      │
//! │    ├── load / wait_for_loading_complete                      │
//! │    ├── set_observation_datetime / toggle_3d                  │
//! │    ├── mock_event_source / parse_tree -> EventTree           │
//! │    └── expect_screenshot                                     │
//! │  Scenario (ordered Steps)                                    │
//! │    └── Driver::run -> Playwright script -> node              │
//! │  VisualTester                                                │
//! │    └── compare(actual, baseline) -> VisualDiff               │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod driver;
pub mod error;
pub mod events;
pub mod helioviewer;
pub mod mock;
pub mod scenario;
pub mod server;
pub mod step;
pub mod views;
pub mod visual;

pub use driver::{Browser, Driver, DriverConfig};
pub use error::{HarnessError, HarnessResult};
pub use events::{EventInstance, EventSourceCatalog, EventTree};
pub use helioviewer::{HelioviewerFactory, HelioviewerInterface};
pub use scenario::{RunReport, Scenario};
pub use step::Step;
pub use views::ViewDescriptor;
pub use visual::{VisualConfig, VisualDiff, VisualTester};
