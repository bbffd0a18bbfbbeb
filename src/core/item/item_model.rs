//! Item types, both as stored and as sent over the wire.

use crate::infra::{error::ClientError, validation::Valid};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// An existing item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Item {
    /// The item's id.
    pub id: i64,
    /// The item's title.
    #[schema(example = "MyItem")]
    pub title: String,
    /// The item's description.
    #[schema(example = "A very interesting item")]
    pub description: Option<String>,
}

/// A new item, also the body of a full replacement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewItem {
    /// The item's title.
    #[schema(example = "MyItem")]
    #[validate(required, length(min = 1))]
    pub title: Option<String>,
    /// The item's description.
    #[schema(example = "A very interesting item")]
    pub description: Option<String>,
}

impl NewItem {
    /// Constructs a new item with just a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The body of an update.
///
/// The outer [`Option`] tells whether the field was sent at all,
/// the inner one whether it was `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct ItemPatch {
    /// The new title.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "MyItem")]
    pub title: Option<Option<String>>,
    /// The new description, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "A very interesting item")]
    pub description: Option<Option<String>>,
}

/// Marks a field that appears in the body, even as `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// The id segment of an item path.
///
/// Anything that is not an integer is kept as an id that matches no item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemId(Option<i64>);

impl ItemId {
    /// Parses a raw path segment.
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().parse().ok())
    }

    /// The numeric id, if there is one.
    pub fn get(self) -> Option<i64> {
        self.0
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(Some(id))
    }
}

/// The columns an update may touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemField {
    /// `items.title`
    Title,
    /// `items.description`
    Description,
}

impl ItemField {
    /// The column name.
    pub const fn column(self) -> &'static str {
        match self {
            ItemField::Title => "title",
            ItemField::Description => "description",
        }
    }
}

/// A new value for one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldChange {
    /// A new title, never empty.
    Title(String),
    /// A new description, `None` clears it.
    Description(Option<String>),
}

impl FieldChange {
    /// The column this change writes to.
    pub fn field(&self) -> ItemField {
        match self {
            FieldChange::Title(_) => ItemField::Title,
            FieldChange::Description(_) => ItemField::Description,
        }
    }
}

/// A non-empty set of column changes, at most one per column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemChanges {
    changes: Vec<FieldChange>,
}

impl ItemChanges {
    /// Replaces every column.
    pub fn replace(item: Valid<NewItem>) -> Self {
        let item = item.into_inner();
        let mut changes = Vec::with_capacity(2);
        // Guaranteed by validation.
        if let Some(title) = item.title {
            changes.push(FieldChange::Title(title));
        }
        changes.push(FieldChange::Description(item.description));
        Self { changes }
    }

    /// Changes only the columns present in the patch.
    pub fn from_patch(patch: ItemPatch) -> Result<Self, ClientError> {
        let mut changes = Vec::with_capacity(2);
        match patch.title {
            Some(Some(title)) if !title.is_empty() => changes.push(FieldChange::Title(title)),
            Some(_) => {
                return Err(ClientError::BadRequest(
                    "title cannot be empty".to_string(),
                ))
            }
            None => {}
        }
        if let Some(description) = patch.description {
            changes.push(FieldChange::Description(description));
        }
        if changes.is_empty() {
            return Err(ClientError::BadRequest(
                "no valid fields to update".to_string(),
            ));
        }
        Ok(Self { changes })
    }

    /// The changes, in column order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    /// The columns that will be written.
    pub fn fields(&self) -> Vec<ItemField> {
        self.changes.iter().map(FieldChange::field).collect()
    }
}
