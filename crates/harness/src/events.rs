//! Event feed model and tree operations
//!
//! The events sidebar renders a hierarchical tree per source (HEK, CCMC):
//! concept -> group (FRM) -> event instances. Instance identity is the `id`
//! field, never the display label: two instances may carry the same label
//! and must stay independently addressable. The catalog here is parsed from
//! the same JSON the route mock serves, so label resolution happens in Rust
//! against exactly what the page renders.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HarnessError, HarnessResult};
use crate::scenario::Scenario;
use crate::step::{Step, WaitState};

/// One annotated solar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInstance {
    pub label: String,
    #[serde(default)]
    pub shortlabel: String,
    /// Unique identifier, e.g. `ivo://helio-informatics.org/SFP_AMOS_..._001`.
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub frm_name: String,
    #[serde(default)]
    pub concept: String,
    #[serde(default)]
    pub active: String,
    #[serde(default)]
    pub hpc_x: f64,
    #[serde(default)]
    pub hpc_y: f64,
    #[serde(default)]
    pub hv_hpc_x: f64,
    #[serde(default)]
    pub hv_hpc_y: f64,
    #[serde(default)]
    pub hv_hpc_x_final: f64,
    #[serde(default)]
    pub hv_hpc_y_final: f64,
    #[serde(default)]
    pub hv_hpc_r_scaled: f64,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// Feature-recognition-method grouping under a concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventGroup {
    pub name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub data: Vec<EventInstance>,
}

/// Top-level concept ("Active Region", "Solar Flare Predictions", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConcept {
    pub name: String,
    #[serde(default)]
    pub pin: String,
    #[serde(default)]
    pub groups: Vec<EventGroup>,
}

/// All concepts served for one event source.
#[derive(Debug, Clone)]
pub struct EventSourceCatalog {
    pub source: String,
    pub concepts: Vec<EventConcept>,
}

impl EventSourceCatalog {
    /// Parse a catalog from the event feed JSON (a top-level array of
    /// concepts).
    pub fn from_value(source: &str, value: &Value) -> HarnessResult<Self> {
        let concepts: Vec<EventConcept> =
            serde_json::from_value(value.clone()).map_err(|e| HarnessError::FeedParse {
                feed: source.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            source: source.to_string(),
            concepts,
        })
    }

    pub fn group(&self, concept: &str, group: &str) -> HarnessResult<&EventGroup> {
        self.concepts
            .iter()
            .find(|c| c.name == concept)
            .and_then(|c| c.groups.iter().find(|g| g.name == group))
            .ok_or_else(|| HarnessError::BranchNotFound {
                concept: concept.to_string(),
                group: group.to_string(),
            })
    }

    /// Resolve an instance by display label.
    ///
    /// Tie-break rule: labels are not unique, so when several instances
    /// under the branch share the label, the FIRST one in document order
    /// wins. This is deliberate and documented, not incidental lookup
    /// behavior; the duplicate-label regression test asserts the sibling
    /// stays untouched.
    pub fn resolve_by_label(
        &self,
        concept: &str,
        group: &str,
        label: &str,
    ) -> HarnessResult<&EventInstance> {
        self.group(concept, group)?
            .data
            .iter()
            .find(|instance| instance.label == label)
            .ok_or_else(|| HarnessError::LabelNotFound {
                concept: concept.to_string(),
                group: group.to_string(),
                label: label.to_string(),
            })
    }

    /// Resolve an instance strictly by unique id.
    pub fn resolve_by_id(
        &self,
        concept: &str,
        group: &str,
        id: &str,
    ) -> HarnessResult<&EventInstance> {
        self.group(concept, group)?
            .data
            .iter()
            .find(|instance| instance.id == id)
            .ok_or_else(|| HarnessError::IdNotFound {
                concept: concept.to_string(),
                group: group.to_string(),
                id: id.to_string(),
            })
    }
}

/// Queryable tree scoped to one event source, appending interaction steps
/// to the surrounding scenario.
pub struct EventTree<'a> {
    catalog: &'a EventSourceCatalog,
    scenario: &'a mut Scenario,
}

impl<'a> EventTree<'a> {
    pub(crate) fn new(catalog: &'a EventSourceCatalog, scenario: &'a mut Scenario) -> Self {
        Self { catalog, scenario }
    }

    pub fn source(&self) -> &str {
        &self.catalog.source
    }

    fn container(&self) -> String {
        format!("#tree_{}", self.catalog.source)
    }

    fn concept_toggle(&self, concept: &str) -> String {
        format!(
            "{} li[data-concept=\"{concept}\"] > i.jstree-ocl",
            self.container()
        )
    }

    fn group_toggle(&self, concept: &str, group: &str) -> String {
        format!(
            "{} li[data-concept=\"{concept}\"] li[data-frm=\"{group}\"] > i.jstree-ocl",
            self.container()
        )
    }

    fn instance_anchor(&self, id: &str) -> String {
        format!(
            "{} a.jstree-anchor[data-event-id=\"{id}\"]",
            self.container()
        )
    }

    /// Expand a concept/group branch. Precondition for reaching leaf nodes.
    pub fn toggle_branch_frm(&mut self, concept: &str, group: &str) -> HarnessResult<()> {
        // Validate against the catalog before emitting clicks so a typo
        // fails in Rust, not as an opaque selector timeout.
        self.catalog.group(concept, group)?;

        let group_sel = self.group_toggle(concept, group);
        self.scenario.push(Step::Click {
            selector: self.concept_toggle(concept),
            timeout_ms: None,
        });
        self.scenario.push(Step::Wait {
            selector: group_sel.clone(),
            state: WaitState::Visible,
            timeout_ms: 10_000,
        });
        self.scenario.push(Step::Click {
            selector: group_sel,
            timeout_ms: None,
        });
        Ok(())
    }

    /// Toggle the checkbox of the instance whose label matches, using the
    /// first-in-document-order tie-break from
    /// [`EventSourceCatalog::resolve_by_label`]. Acts on exactly one
    /// underlying id; duplicate-labeled siblings are unaffected.
    ///
    /// Returns the id that was acted on.
    pub fn toggle_check_event_instance_by_label(
        &mut self,
        concept: &str,
        group: &str,
        label: &str,
    ) -> HarnessResult<String> {
        let id = self
            .catalog
            .resolve_by_label(concept, group, label)?
            .id
            .clone();

        let anchor = self.instance_anchor(&id);
        self.scenario.push(Step::Wait {
            selector: anchor.clone(),
            state: WaitState::Visible,
            timeout_ms: 10_000,
        });
        self.scenario.push(Step::Check { selector: anchor });
        Ok(id)
    }

    /// Assert that the instance with this unique id is checked.
    pub fn assert_event_instance_checked(
        &mut self,
        concept: &str,
        group: &str,
        id: &str,
    ) -> HarnessResult<()> {
        self.assert_checked_state(concept, group, id, true)
    }

    /// Assert that the instance with this unique id is unchecked.
    pub fn assert_event_instance_unchecked(
        &mut self,
        concept: &str,
        group: &str,
        id: &str,
    ) -> HarnessResult<()> {
        self.assert_checked_state(concept, group, id, false)
    }

    fn assert_checked_state(
        &mut self,
        concept: &str,
        group: &str,
        id: &str,
        checked: bool,
    ) -> HarnessResult<()> {
        self.catalog.resolve_by_id(concept, group, id)?;
        self.scenario.push(Step::AssertChecked {
            selector: self.instance_anchor(id),
            checked,
        });
        Ok(())
    }
}
