//! Network mocking
//!
//! Tests intercept a handful of backend endpoints and substitute fixed JSON
//! responses, decoupling determinism from live backend state. The patterns
//! here are the full set the suite relies on: the events API per source,
//! the `gse2frame` coordinate-frame conversion endpoint, and the 3D model
//! asset fetch (awaited, not substituted).

use std::path::Path;

use serde_json::Value;

use crate::error::HarnessResult;
use crate::step::Step;

/// Glob pattern matching the events API for one source.
pub fn events_pattern(source: &str) -> String {
    format!("*/**/*action=events&sources={source}*")
}

/// Glob pattern for the coordinate-frame conversion endpoint.
pub const GSE2FRAME_PATTERN: &str = "**/gse2frame";

/// Glob pattern for the 3D model asset the scene is rendered onto.
pub const MODEL_ASSET_PATTERN: &str = "**/zit.glb";

/// A route interception fulfilled with a fixed JSON body.
#[derive(Debug, Clone)]
pub struct RouteMock {
    pub pattern: String,
    pub body: Value,
    pub content_type: String,
    /// Uninstall the route after this many fulfillments.
    pub times: Option<u32>,
}

impl RouteMock {
    pub fn json(pattern: impl Into<String>, body: Value) -> Self {
        Self {
            pattern: pattern.into(),
            body,
            content_type: "application/json".to_string(),
            times: None,
        }
    }

    /// Mock the events feed for one source.
    pub fn events(source: &str, body: Value) -> Self {
        Self::json(events_pattern(source), body)
    }

    /// Mock the `gse2frame` endpoint for a bounded number of requests.
    pub fn gse2frame(body: Value, times: u32) -> Self {
        Self {
            times: Some(times),
            ..Self::json(GSE2FRAME_PATTERN, body)
        }
    }

    pub fn into_step(self) -> Step {
        Step::MockRoute {
            pattern: self.pattern,
            body: self.body,
            content_type: self.content_type,
            times: self.times,
        }
    }
}

/// Canonical `gse2frame` response body with a single origin coordinate.
pub fn gse2frame_response(time: &str) -> Value {
    serde_json::json!({
        "coordinates": [
            { "x": 0, "y": 0, "z": 0, "time": time }
        ]
    })
}

/// Load a JSON fixture file.
pub fn load_fixture(path: &Path) -> HarnessResult<Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_pattern_embeds_source() {
        assert_eq!(
            events_pattern("CCMC"),
            "*/**/*action=events&sources=CCMC*"
        );
        assert_eq!(events_pattern("HEK"), "*/**/*action=events&sources=HEK*");
    }

    #[test]
    fn gse2frame_mock_is_bounded() {
        let mock = RouteMock::gse2frame(gse2frame_response("2024-12-31T00:05:00.000"), 2);
        assert_eq!(mock.times, Some(2));
        assert_eq!(mock.pattern, GSE2FRAME_PATTERN);

        match mock.into_step() {
            Step::MockRoute { body, times, .. } => {
                assert_eq!(times, Some(2));
                assert_eq!(body["coordinates"][0]["time"], "2024-12-31T00:05:00.000");
            }
            other => panic!("expected MockRoute, got {:?}", other.label()),
        }
    }

    #[test]
    fn fixture_loading_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(&path, r#"[{"name": "Active Region", "groups": []}]"#).unwrap();

        let value = load_fixture(&path).unwrap();
        assert_eq!(value[0]["name"], "Active Region");
    }
}
