// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyed collection reconciler.
//!
//! A [`KeyedCollection`] holds items identified by a string key. Adding an
//! item whose key is already present replaces the entries that differ from
//! it and is a no-op when an identical entry is already there, so re-applying
//! the same upstream data never reports a change.
//!
//! The collection distinguishes "undefined" (never set, or explicitly
//! cleared with `set_all(None)`) from "empty". Equality, hashing and
//! serialization all preserve that distinction: an undefined collection
//! serializes as `null`, an empty one as `[]`. Deserialization goes through
//! [`KeyedCollection::set_all`], so empty keys are rejected and duplicates
//! collapse the same way they do on any other write.

use crate::error::ReconcileError;
use serde::{Deserialize, Deserializer, Serialize};

/// An item that belongs to a [`KeyedCollection`].
pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct KeyedCollection<T> {
    items: Option<Vec<T>>,
}

impl<'de, T> Deserialize<'de> for KeyedCollection<T>
where
    T: Deserialize<'de> + Keyed + PartialEq,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Option::<Vec<T>>::deserialize(deserializer)?;
        let mut collection = Self::undefined();
        collection.set_all(items).map_err(serde::de::Error::custom)?;
        Ok(collection)
    }
}

impl<T> Default for KeyedCollection<T> {
    fn default() -> Self {
        Self { items: None }
    }
}

impl<T: Keyed + PartialEq> KeyedCollection<T> {
    pub fn undefined() -> Self {
        Self { items: None }
    }

    pub fn empty() -> Self {
        Self { items: Some(Vec::new()) }
    }

    pub fn is_defined(&self) -> bool {
        self.items.is_some()
    }

    /// All items in insertion order, or `None` when undefined.
    pub fn get_all(&self) -> Option<&[T]> {
        self.items.as_deref()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.as_deref().unwrap_or_default().iter()
    }

    pub fn len(&self) -> usize {
        self.items.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First item with the given key.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.iter().find(|item| item.key() == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Add `item`, replacing entries with the same key whose content differs.
    ///
    /// Returns whether the collection changed. Every differing entry for the
    /// key is removed, not just the first, so a collection that somehow
    /// picked up duplicate keys converges on the next write.
    pub fn add_or_replace(&mut self, item: T) -> Result<bool, ReconcileError> {
        if item.key().is_empty() {
            return Err(ReconcileError::InvalidArgument("key"));
        }

        let items = self.items.get_or_insert_with(Vec::new);

        let mut matched = false;
        let mut stale = false;
        for existing in items.iter().filter(|existing| existing.key() == item.key()) {
            matched = true;
            if *existing != item {
                stale = true;
            }
        }

        if matched && !stale {
            return Ok(false);
        }

        items.retain(|existing| existing.key() != item.key() || *existing == item);
        items.push(item);
        Ok(true)
    }

    /// Remove every item with the given key. Returns whether anything was removed.
    pub fn remove_by_key(&mut self, key: &str) -> Result<bool, ReconcileError> {
        if key.is_empty() {
            return Err(ReconcileError::InvalidArgument("key"));
        }
        let Some(items) = self.items.as_mut() else {
            return Ok(false);
        };
        let before = items.len();
        items.retain(|existing| existing.key() != key);
        Ok(items.len() != before)
    }

    /// Replace the whole collection.
    ///
    /// `None` makes the collection undefined. Otherwise the collection is
    /// cleared and every item is applied with [`add_or_replace`] in iteration
    /// order, so for duplicate keys the last distinct item wins. Input is
    /// validated up front; on error the collection is left untouched.
    ///
    /// [`add_or_replace`]: KeyedCollection::add_or_replace
    pub fn set_all<I>(&mut self, items: Option<I>) -> Result<(), ReconcileError>
    where
        I: IntoIterator<Item = T>,
    {
        let Some(items) = items else {
            self.items = None;
            return Ok(());
        };

        let incoming: Vec<T> = items.into_iter().collect();
        if incoming.iter().any(|item| item.key().is_empty()) {
            return Err(ReconcileError::InvalidArgument("key"));
        }

        self.items = Some(Vec::with_capacity(incoming.len()));
        for item in incoming {
            self.add_or_replace(item)?;
        }
        Ok(())
    }
}

impl<'a, T: Keyed + PartialEq> IntoIterator for &'a KeyedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "keyed_tests.rs"]
mod tests;
