// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Product data aggregate.
//!
//! A product owns three reconciled collections: attributes keyed by name,
//! content associations keyed by content id, and a set of dependent product
//! ids. Every mutator reports whether it changed anything, so callers can
//! tell a real upstream change from a re-import of identical data.

mod attribute;
mod content;

pub use attribute::ProductAttribute;
pub use content::{ContentData, ProductContent};

use crate::dependent::DependentIdSet;
use crate::error::ReconcileError;
use crate::keyed::KeyedCollection;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(deserialize_with = "non_empty_id")]
    id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub multiplier: Option<i64>,
    #[serde(default)]
    attributes: KeyedCollection<ProductAttribute>,
    #[serde(default)]
    product_content: KeyedCollection<ProductContent>,
    #[serde(default)]
    dependent_product_ids: DependentIdSet,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub created_ms: Option<u64>,
    #[serde(default)]
    pub updated_ms: Option<u64>,
}

fn non_empty_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let id = String::deserialize(deserializer)?;
    if id.is_empty() {
        return Err(serde::de::Error::custom(ReconcileError::InvalidArgument("id")));
    }
    Ok(id)
}

impl ProductData {
    /// A product with only its id set; every collection starts undefined.
    pub fn new(id: impl Into<String>) -> Result<Self, ReconcileError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ReconcileError::InvalidArgument("id"));
        }
        Ok(Self {
            uuid: None,
            id,
            name: None,
            multiplier: None,
            attributes: KeyedCollection::undefined(),
            product_content: KeyedCollection::undefined(),
            dependent_product_ids: DependentIdSet::undefined(),
            href: None,
            locked: false,
            created_ms: None,
            updated_ms: None,
        })
    }

    pub fn builder(id: impl Into<String>) -> ProductDataBuilder {
        ProductDataBuilder {
            id: id.into(),
            uuid: None,
            name: None,
            multiplier: None,
            href: None,
            locked: false,
            attributes: None,
            content: None,
            dependent_product_ids: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> Result<(), ReconcileError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ReconcileError::InvalidArgument("id"));
        }
        self.id = id;
        Ok(())
    }

    // -- attributes --

    pub fn attributes(&self) -> &KeyedCollection<ProductAttribute> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&ProductAttribute> {
        self.attributes.get(key)
    }

    /// Value of the named attribute; `None` if absent or set without a value.
    pub fn attribute_value(&self, key: &str) -> Option<&str> {
        self.attribute(key).and_then(|a| a.value.as_deref())
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains(key)
    }

    pub fn add_attribute(&mut self, attribute: ProductAttribute) -> Result<bool, ReconcileError> {
        self.attributes.add_or_replace(attribute)
    }

    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<bool, ReconcileError> {
        self.add_attribute(ProductAttribute::new(key, value))
    }

    pub fn remove_attribute(&mut self, key: &str) -> Result<bool, ReconcileError> {
        self.attributes.remove_by_key(key)
    }

    pub fn set_attributes<I>(&mut self, attributes: Option<I>) -> Result<(), ReconcileError>
    where
        I: IntoIterator<Item = ProductAttribute>,
    {
        self.attributes.set_all(attributes)
    }

    // -- content --

    pub fn product_content(&self) -> &KeyedCollection<ProductContent> {
        &self.product_content
    }

    pub fn find_content(&self, content_id: &str) -> Option<&ProductContent> {
        self.product_content.get(content_id)
    }

    pub fn has_content(&self, content_id: &str) -> bool {
        self.product_content.contains(content_id)
    }

    pub fn add_product_content(&mut self, pc: ProductContent) -> Result<bool, ReconcileError> {
        self.product_content.add_or_replace(pc)
    }

    pub fn add_content(
        &mut self,
        content: ContentData,
        enabled: bool,
    ) -> Result<bool, ReconcileError> {
        self.add_product_content(ProductContent::new(content, enabled))
    }

    pub fn remove_content(&mut self, content_id: &str) -> Result<bool, ReconcileError> {
        self.product_content.remove_by_key(content_id)
    }

    pub fn set_product_content<I>(&mut self, content: Option<I>) -> Result<(), ReconcileError>
    where
        I: IntoIterator<Item = ProductContent>,
    {
        self.product_content.set_all(content)
    }

    // -- dependent products --

    pub fn dependent_product_ids(&self) -> &DependentIdSet {
        &self.dependent_product_ids
    }

    pub fn add_dependent_product_id(
        &mut self,
        product_id: impl Into<String>,
    ) -> Result<bool, ReconcileError> {
        self.dependent_product_ids.add(product_id)
    }

    pub fn remove_dependent_product_id(&mut self, product_id: &str) -> Result<bool, ReconcileError> {
        self.dependent_product_ids.remove(product_id)
    }

    pub fn set_dependent_product_ids<I, S>(&mut self, ids: Option<I>) -> Result<(), ReconcileError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependent_product_ids.set_all(ids)
    }

    /// Overwrite every field with the values from `source`.
    ///
    /// Collections are re-applied through the reconciler, so a source
    /// carrying duplicate keys comes out normalized.
    pub fn populate(&mut self, source: &ProductData) -> Result<(), ReconcileError> {
        self.set_id(source.id.clone())?;
        self.uuid.clone_from(&source.uuid);
        self.name.clone_from(&source.name);
        self.multiplier = source.multiplier;
        self.href.clone_from(&source.href);
        self.locked = source.locked;
        self.created_ms = source.created_ms;
        self.updated_ms = source.updated_ms;
        self.set_attributes(source.attributes.get_all().map(<[_]>::to_vec))?;
        self.set_product_content(source.product_content.get_all().map(<[_]>::to_vec))?;
        self.set_dependent_product_ids(source.dependent_product_ids.get_all().cloned())?;
        Ok(())
    }
}

impl std::fmt::Display for ProductData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProductData [id = {}, name = {}]", self.id, self.name.as_deref().unwrap_or("-"))
    }
}

/// Builder for [`ProductData`]; collections left unset stay undefined.
pub struct ProductDataBuilder {
    id: String,
    uuid: Option<String>,
    name: Option<String>,
    multiplier: Option<i64>,
    href: Option<String>,
    locked: bool,
    attributes: Option<Vec<ProductAttribute>>,
    content: Option<Vec<ProductContent>>,
    dependent_product_ids: Option<Vec<String>>,
}

impl ProductDataBuilder {
    crate::setters! {
        set { locked: bool }
        option {
            uuid: String,
            name: String,
            multiplier: i64,
            href: String,
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.get_or_insert_with(Vec::new).push(ProductAttribute::new(name, value));
        self
    }

    pub fn content(mut self, content: ContentData, enabled: bool) -> Self {
        self.content.get_or_insert_with(Vec::new).push(ProductContent::new(content, enabled));
        self
    }

    pub fn dependent_product_id(mut self, id: impl Into<String>) -> Self {
        self.dependent_product_ids.get_or_insert_with(Vec::new).push(id.into());
        self
    }

    pub fn build(self) -> Result<ProductData, ReconcileError> {
        let mut product = ProductData::new(self.id)?;
        product.uuid = self.uuid;
        product.name = self.name;
        product.multiplier = self.multiplier;
        product.href = self.href;
        product.locked = self.locked;
        product.set_attributes(self.attributes)?;
        product.set_product_content(self.content)?;
        product.set_dependent_product_ids(self.dependent_product_ids)?;
        Ok(product)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
