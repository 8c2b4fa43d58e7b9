//! HTML rendering of a menu.

use html_escape::encode_text;
use std::fmt::Write;

use crate::data::{GroceryList, Recipe, Selection};

const HEADER_COLOR: &str = "#D4E6F1";
const RECIPE_COLUMNS: [&str; 7] = [
    "Name",
    "Category",
    "Ingredients",
    "Time",
    "Healthy",
    "Notes",
    "Recipe",
];
const GROCERY_COLUMNS: [&str; 2] = ["Item", "Ingredient"];

/// Render the selection and grocery list as a standalone HTML document.
///
/// Recipes appear in selection order; grocery items are sorted
/// lexicographically and numbered from 1. All text is escaped.
pub fn render_html(selection: &Selection, groceries: &GroceryList) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<style>\n\
         table, th, td {\n  border: 1px solid black;\n}\n\
         </style>\n</head>\n<body>\n",
    );

    html.push_str("<h2>Recipes</h2>\n<table>\n");
    push_header_row(&mut html, &RECIPE_COLUMNS);
    for (_, recipe) in selection.iter() {
        push_recipe_row(&mut html, recipe);
    }
    html.push_str("</table>\n<br>\n<br>\n");

    html.push_str("<h2>Grocery List</h2>\n<table>\n");
    push_header_row(&mut html, &GROCERY_COLUMNS);
    for (idx, item) in groceries.sorted().into_iter().enumerate() {
        let _ = writeln!(
            html,
            "<tr><td align=\"center\">{}</td><td align=\"center\">{}</td></tr>",
            idx + 1,
            encode_text(item)
        );
    }
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

fn push_header_row(html: &mut String, columns: &[&str]) {
    html.push_str("<tr>");
    for column in columns {
        let _ = write!(html, "<th bgcolor=\"{HEADER_COLOR}\">{column}</th>");
    }
    html.push_str("</tr>\n");
}

fn push_recipe_row(html: &mut String, recipe: &Recipe) {
    let steps = recipe
        .steps
        .iter()
        .map(|step| encode_text(step).into_owned())
        .collect::<Vec<_>>()
        .join("<br>\n");
    // Cells on separate lines: mail bodies allow 998 octets per line.
    let _ = writeln!(
        html,
        "<tr>\n<td>{}</td>\n<td>{}</td>\n<td>{}</td>\n<td align=\"center\">{}</td>\n<td align=\"center\">{}</td>\n<td>{}</td>\n<td>{}</td>\n</tr>",
        encode_text(&recipe.name),
        encode_text(&recipe.categories.join(", ")),
        encode_text(&recipe.ingredients.join(", ")),
        recipe.time_minutes,
        recipe.healthy,
        encode_text(&recipe.notes),
        steps
    );
}
