// ABOUTME: Model descriptor and model listing types for the /v1/models endpoint
// ABOUTME: Descriptors are value objects identified by their id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// Identifying metadata for one selectable remote model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier referenced in requests
    pub id: String,
    /// Creation time, unix seconds
    #[serde(default)]
    pub created: i64,
    /// Object type, always `model`
    #[serde(default = "model_object")]
    pub object: String,
    /// Owning organization
    #[serde(default)]
    pub owned_by: String,
}

fn model_object() -> String {
    "model".to_owned()
}

impl Model {
    /// Descriptor carrying only an id, for selecting a model before any listing
    #[must_use]
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created: 0,
            object: model_object(),
            owned_by: String::new(),
        }
    }
}

/// Response of `GET /v1/models`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    /// Object type, always `list`
    #[serde(default)]
    pub object: String,
    /// Available models
    #[serde(default)]
    pub data: Vec<Model>,
}

impl ModelList {
    /// Look up a model by id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Model> {
        self.data.iter().find(|model| model.id == id)
    }
}
