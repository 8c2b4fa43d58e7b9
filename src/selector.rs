//! Stream records from a store, keep the sampled positions, and fold their
//! ingredients into the grocery list.

use tracing::debug;

use crate::data::{GroceryList, Recipe, Selection};
use crate::errors::MenuError;
use crate::sampler::SampleIndexSet;
use crate::store::{RecipeStore, RecordCursor, RecordFilter};

/// Result of one selection pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Menu {
    /// Chosen recipes, indexed from zero.
    pub selection: Selection,
    /// Distinct ingredients across the selection.
    pub groceries: GroceryList,
}

/// Closes the wrapped cursor when dropped.
struct CursorGuard<'a> {
    cursor: Box<dyn RecordCursor + 'a>,
}

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        self.cursor.close();
    }
}

/// Query `store` and select the records at the positions in `sample`.
///
/// Every record is decoded, selected or not; the first malformed record
/// aborts the pass. The cursor is closed on every return path.
pub fn select_recipes(
    store: &dyn RecipeStore,
    filter: &RecordFilter,
    sample: &SampleIndexSet,
) -> Result<Menu, MenuError> {
    let mut guard = CursorGuard {
        cursor: store.find(filter)?,
    };
    let menu = select_from_cursor(guard.cursor.as_mut(), sample)?;
    debug!(
        "[weekly_menu:selector] selected {} recipes ({} grocery items) from {}",
        menu.selection.len(),
        menu.groceries.len(),
        store.id()
    );
    Ok(menu)
}

/// Selection over an already-open cursor. The caller owns closing it.
pub fn select_from_cursor(
    cursor: &mut dyn RecordCursor,
    sample: &SampleIndexSet,
) -> Result<Menu, MenuError> {
    let mut menu = Menu::default();
    let mut position = 0usize;
    while let Some(document) = cursor.next_document() {
        let recipe = Recipe::decode(position, document?)?;
        if sample.contains(position) {
            menu.groceries.add_recipe(&recipe);
            menu.selection.push(recipe);
        }
        position += 1;
    }
    Ok(menu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn store_of(names: &[&str]) -> InMemoryStore {
        let documents = names
            .iter()
            .map(|name| json!({"Name": name, "Ingredients": [format!("{name}-base"), "salt"]}))
            .collect();
        InMemoryStore::new("mem", documents)
    }

    #[test]
    fn keeps_sampled_positions_in_stream_order() {
        let store = store_of(&["a", "b", "c", "d", "e"]);
        let sample = SampleIndexSet::from_positions(5, [4, 1]).unwrap();
        let menu = select_recipes(&store, &RecordFilter::All, &sample).unwrap();

        let names: Vec<&str> = menu.selection.iter().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "e"]);
        assert_eq!(menu.selection.indices().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(menu.groceries.iter().collect::<Vec<_>>(), vec!["b-base", "salt", "e-base"]);
        assert_eq!(store.cursors_closed(), 1);
    }

    #[test]
    fn unselected_malformed_record_still_aborts() {
        let store = InMemoryStore::new(
            "mem",
            vec![json!({"Name": "ok"}), json!({"Name": 17}), json!({"Name": "fine"})],
        );
        let sample = SampleIndexSet::from_positions(3, [0]).unwrap();
        let err = select_recipes(&store, &RecordFilter::All, &sample).unwrap_err();
        assert!(matches!(err, MenuError::Decode { position: 1, .. }));
        assert_eq!(store.cursors_opened(), 1);
        assert_eq!(store.cursors_closed(), 1);
    }

    #[test]
    fn empty_sample_selects_nothing() {
        let store = store_of(&["a", "b"]);
        let sample = SampleIndexSet::from_positions(2, std::iter::empty()).unwrap();
        let menu = select_recipes(&store, &RecordFilter::All, &sample).unwrap();
        assert!(menu.selection.is_empty());
        assert!(menu.groceries.is_empty());
    }

    #[test]
    fn recipe_without_ingredients_contributes_nothing() {
        let store = InMemoryStore::new(
            "mem",
            vec![json!({"Name": "water"}), json!({"Name": "tea", "Ingredients": ["tea"]})],
        );
        let sample = SampleIndexSet::from_positions(2, [0, 1]).unwrap();
        let menu = select_recipes(&store, &RecordFilter::All, &sample).unwrap();
        assert_eq!(menu.selection.len(), 2);
        assert_eq!(menu.groceries.iter().collect::<Vec<_>>(), vec!["tea"]);
    }
}
