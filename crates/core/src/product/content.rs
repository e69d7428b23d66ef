// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::keyed::Keyed;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Content (a repository definition) a product can provide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentData {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub label: String,
    pub name: String,
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpg_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arches: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_expire: Option<i64>,
    #[serde(default)]
    pub modified_product_ids: BTreeSet<String>,
}

impl ContentData {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content_type: impl Into<String>,
        label: impl Into<String>,
        vendor: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content_type: content_type.into(),
            label: label.into(),
            vendor: vendor.into(),
            ..Self::default()
        }
    }
}

/// Association between a product and a piece of content.
///
/// Keyed by the content id; two associations are equal only if both the
/// content and the enabled flag match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductContent {
    pub content: ContentData,
    pub enabled: bool,
}

impl ProductContent {
    pub fn new(content: ContentData, enabled: bool) -> Self {
        Self { content, enabled }
    }
}

impl Keyed for ProductContent {
    fn key(&self) -> &str {
        &self.content.id
    }
}
