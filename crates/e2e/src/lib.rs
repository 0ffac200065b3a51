//! Helioviewer E2E suite
//!
//! The tests live under `tests/`; this crate holds the shared setup they
//! build on: environment gating, driver construction, fixture loading, and
//! the scripted 3D bring-up sequence.

pub mod setup;

pub use setup::{
    default_observation_date, driver_for, fixture, fixtures_dir, init_tracing, initialize_3d,
    target_base_url,
};
