// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::keyed::Keyed;
use serde::{Deserialize, Serialize};

/// A named product attribute. The value may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl ProductAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: Some(value.into()) }
    }

    pub fn unset(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: None }
    }
}

impl Keyed for ProductAttribute {
    fn key(&self) -> &str {
        &self.name
    }
}
