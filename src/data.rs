use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::MenuError;
use crate::types::{Category, Document, Ingredient, Step};

/// Store-assigned recipe identifier.
///
/// Stores may hand out plain strings, numbers, or extended-JSON object ids
/// (`{"$oid": "..."}`); all of them collapse to their string form here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawRecipeId", into = "String")]
pub struct RecipeId(String);

impl RecipeId {
    /// Wrap an identifier string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RecipeId> for String {
    fn from(value: RecipeId) -> Self {
        value.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecipeId {
    Plain(String),
    Number(i64),
    ObjectId {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl From<RawRecipeId> for RecipeId {
    fn from(raw: RawRecipeId) -> Self {
        match raw {
            RawRecipeId::Plain(value) => RecipeId(value),
            RawRecipeId::Number(value) => RecipeId(value.to_string()),
            RawRecipeId::ObjectId { oid } => RecipeId(oid),
        }
    }
}

/// A single recipe document as stored in the collection.
///
/// Missing fields decode to their empty value; fields of the wrong type are
/// decode errors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipe {
    /// Store identifier, absent for hand-written records.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecipeId>,
    /// Display name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Ingredient lines, folded into the grocery list.
    #[serde(rename = "Ingredients")]
    pub ingredients: Vec<Ingredient>,
    /// Ordered preparation steps.
    #[serde(rename = "Recipe")]
    pub steps: Vec<Step>,
    /// Category labels.
    #[serde(rename = "Category")]
    pub categories: Vec<Category>,
    /// Healthiness score as entered by the user.
    #[serde(rename = "Healthy")]
    pub healthy: i64,
    /// Preparation time in minutes.
    #[serde(rename = "Time")]
    pub time_minutes: i64,
    /// Free-form notes.
    #[serde(rename = "Notes")]
    pub notes: String,
}

impl Recipe {
    /// Decode a raw store document; `position` is the record's offset in the stream.
    pub fn decode(position: usize, document: Document) -> Result<Self, MenuError> {
        serde_json::from_value(document).map_err(|err| MenuError::Decode {
            position,
            reason: err.to_string(),
        })
    }
}

/// Recipes chosen for one run, densely indexed from zero in stream order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    recipes: Vec<Recipe>,
}

impl Selection {
    /// Append a recipe and return the selection index it was assigned.
    pub(crate) fn push(&mut self, recipe: Recipe) -> usize {
        self.recipes.push(recipe);
        self.recipes.len() - 1
    }

    /// Number of selected recipes.
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// True when nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Selection indices in ascending order (always `0..len`).
    pub fn indices(&self) -> std::ops::Range<usize> {
        0..self.recipes.len()
    }

    /// Iterate `(selection_index, recipe)` pairs in selection order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Recipe)> {
        self.recipes.iter().enumerate()
    }
}

/// Deduplicated union of ingredient strings.
///
/// Comparison is exact and case-sensitive. Iteration follows first-insertion
/// order; use [`GroceryList::sorted`] for a lexicographic view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroceryList {
    items: IndexSet<Ingredient>,
}

impl GroceryList {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an ingredient; returns `false` when it was already present.
    pub fn insert(&mut self, ingredient: impl Into<Ingredient>) -> bool {
        self.items.insert(ingredient.into())
    }

    /// Insert every ingredient of a recipe.
    pub fn add_recipe(&mut self, recipe: &Recipe) {
        for ingredient in &recipe.ingredients {
            if !self.items.contains(ingredient) {
                self.items.insert(ingredient.clone());
            }
        }
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, ingredient: &str) -> bool {
        self.items.contains(ingredient)
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no ingredient was added.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Items sorted lexicographically (byte order).
    pub fn sorted(&self) -> Vec<&str> {
        let mut items: Vec<&str> = self.iter().collect();
        items.sort_unstable();
        items
    }
}
