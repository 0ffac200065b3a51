//! View descriptors
//!
//! Static parameters distinguishing mobile and desktop runs. The same test
//! body is parameterized over both descriptors; the interface factory picks
//! the matching page-object variant.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn center(&self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Immutable view configuration, shared by reference across parameterized
/// test runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub name: &'static str,
    pub tag: &'static str,
    pub viewport: Viewport,
}

impl ViewDescriptor {
    pub fn is_mobile(&self) -> bool {
        self.name == MOBILE.name
    }
}

pub const DESKTOP: ViewDescriptor = ViewDescriptor {
    name: "Desktop",
    tag: "@desktop",
    viewport: Viewport {
        width: 1920,
        height: 1080,
    },
};

pub const MOBILE: ViewDescriptor = ViewDescriptor {
    name: "Mobile",
    tag: "@mobile",
    viewport: Viewport {
        width: 375,
        height: 667,
    },
};
