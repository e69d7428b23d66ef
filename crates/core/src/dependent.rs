// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Set of foreign ids (e.g. products a product depends on).

use crate::error::ReconcileError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Set semantics over string ids, with the same undefined/empty distinction
/// as [`KeyedCollection`](crate::KeyedCollection).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DependentIdSet {
    ids: Option<BTreeSet<String>>,
}

impl<'de> Deserialize<'de> for DependentIdSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ids = Option::<Vec<String>>::deserialize(deserializer)?;
        let mut set = Self::undefined();
        set.set_all(ids).map_err(serde::de::Error::custom)?;
        Ok(set)
    }
}

impl DependentIdSet {
    pub fn undefined() -> Self {
        Self { ids: None }
    }

    pub fn empty() -> Self {
        Self { ids: Some(BTreeSet::new()) }
    }

    pub fn is_defined(&self) -> bool {
        self.ids.is_some()
    }

    pub fn get_all(&self) -> Option<&BTreeSet<String>> {
        self.ids.as_ref()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.as_ref().is_some_and(|ids| ids.contains(id))
    }

    pub fn len(&self) -> usize {
        self.ids.as_ref().map_or(0, BTreeSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true only if the id was not already present.
    pub fn add(&mut self, id: impl Into<String>) -> Result<bool, ReconcileError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ReconcileError::InvalidArgument("id"));
        }
        Ok(self.ids.get_or_insert_with(BTreeSet::new).insert(id))
    }

    /// Returns true only if the id was present and removed.
    pub fn remove(&mut self, id: &str) -> Result<bool, ReconcileError> {
        if id.is_empty() {
            return Err(ReconcileError::InvalidArgument("id"));
        }
        Ok(self.ids.as_mut().is_some_and(|ids| ids.remove(id)))
    }

    /// Replace the set, or make it undefined with `None`.
    pub fn set_all<I, S>(&mut self, ids: Option<I>) -> Result<(), ReconcileError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(ids) = ids else {
            self.ids = None;
            return Ok(());
        };
        let incoming: Vec<String> = ids.into_iter().map(Into::into).collect();
        if incoming.iter().any(String::is_empty) {
            return Err(ReconcileError::InvalidArgument("id"));
        }
        self.ids = Some(incoming.into_iter().collect());
        Ok(())
    }
}

#[cfg(test)]
#[path = "dependent_tests.rs"]
mod tests;
