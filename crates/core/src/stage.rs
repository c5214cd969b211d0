//! Pipeline stage model.
//!
//! A pipeline run is a fixed, ordered set of named stages. Which stages
//! are required depends on the project's mesh type (a static mesh skips
//! rigging, animation, and sprite assembly); this module only aggregates
//! the flags, it never decides them per stage.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fixed display and execution order of pipeline stages.
pub const STAGE_ORDER: [&str; 5] = ["textures", "rigging", "animation", "export", "sprites"];

/// What kind of mesh a project is built around.
///
/// Determines the required stage set: skeletal meshes run the full
/// pipeline, static meshes only need textures and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshType {
    Skeletal,
    Static,
}

impl MeshType {
    /// Whether the named stage is required for this mesh type.
    pub fn requires(self, stage: &str) -> bool {
        match self {
            MeshType::Skeletal => true,
            MeshType::Static => matches!(stage, "textures" | "export"),
        }
    }
}

/// One named step of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    /// Determined upstream by the project's mesh type; opaque here.
    pub required: bool,
    pub completed: bool,
}

/// Ordered map of stage name to stage state.
///
/// Insertion order follows [`STAGE_ORDER`], and `IndexMap` preserves it
/// through serialization so clients render stages in pipeline order.
pub type StageMap = IndexMap<String, Stage>;

/// Build the stage map for a project that has not run yet.
pub fn initial_stage_map(mesh: MeshType) -> StageMap {
    STAGE_ORDER
        .iter()
        .map(|&name| {
            (
                name.to_string(),
                Stage {
                    name: name.to_string(),
                    required: mesh.requires(name),
                    completed: false,
                },
            )
        })
        .collect()
}

/// Overall completion predicate for a pipeline run.
///
/// A run is complete exactly when every required stage has completed.
/// Stages with `required = false` are reported for display but never
/// block completion.
pub fn is_complete(stages: &StageMap) -> bool {
    stages.values().all(|s| !s.required || s.completed)
}
