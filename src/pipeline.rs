//! One full menu run: count, sample, select, render, deliver.

use chrono::{DateTime, Local};
use rand::Rng;
use tracing::info;

use crate::config::MenuConfig;
use crate::errors::MenuError;
use crate::mail::{MailSink, weekly_subject};
use crate::report::render_html;
use crate::sampler::sample_indices_with_rng;
use crate::selector::{Menu, select_recipes};
use crate::store::{RecipeStore, RecordFilter};

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuReport {
    /// Records in the store at query time.
    pub population: usize,
    /// Recipes requested before clamping.
    pub requested: usize,
    /// Selected recipes and their grocery list.
    pub menu: Menu,
    /// Subject line as delivered.
    pub subject: String,
    /// Rendered HTML body as delivered.
    pub html: String,
}

/// Count the store, draw a sample, and build the menu. Nothing is rendered
/// or sent.
pub fn compose_menu<R: Rng + ?Sized>(
    config: &MenuConfig,
    store: &dyn RecipeStore,
    rng: &mut R,
) -> Result<(usize, Menu), MenuError> {
    store.ping()?;
    info!("[weekly_menu:store] connected to {}", store.id());

    let filter = RecordFilter::All;
    let count = store.count(&filter)?;
    let population = usize::try_from(count).map_err(|_| MenuError::StoreUnavailable {
        store: store.id().to_string(),
        reason: format!("record count {count} does not fit in memory"),
    })?;
    info!(
        "[weekly_menu:selector] found {} available recipes in {}",
        population,
        store.id()
    );

    let sample = sample_indices_with_rng(population, config.recipe_count, rng);
    info!(
        "[weekly_menu:selector] choosing {} recipes to generate menu",
        sample.len()
    );
    let menu = select_recipes(store, &filter, &sample)?;
    Ok((population, menu))
}

/// Run the whole cycle and hand the report to `sink`.
///
/// The sink is only called once the menu and report are complete; any
/// earlier failure returns before delivery.
pub fn run_weekly_menu<R: Rng + ?Sized>(
    config: &MenuConfig,
    store: &dyn RecipeStore,
    sink: &mut dyn MailSink,
    now: &DateTime<Local>,
    rng: &mut R,
) -> Result<MenuReport, MenuError> {
    let (population, menu) = compose_menu(config, store, rng)?;
    let html = render_html(&menu.selection, &menu.groceries);
    let subject = weekly_subject(&config.subject_prefix, now);

    sink.send(config.recipient(), &subject, &html)?;
    info!(
        "[weekly_menu:mail] delivered '{}' to {} ({} recipes, {} grocery items)",
        subject,
        config.recipient(),
        menu.selection.len(),
        menu.groceries.len()
    );

    Ok(MenuReport {
        population,
        requested: config.recipe_count,
        menu,
        subject,
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::DryRunSink;
    use crate::sampler::run_rng;
    use crate::store::InMemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn config() -> MenuConfig {
        MenuConfig {
            sender: "me@example.com".into(),
            recipe_count: 2,
            ..MenuConfig::default()
        }
    }

    #[test]
    fn delivers_rendered_report_to_recipient() {
        let store = InMemoryStore::new(
            "mem",
            (0..4)
                .map(|idx| json!({"Name": format!("dish {idx}"), "Ingredients": ["salt"]}))
                .collect(),
        );
        let mut sink = DryRunSink::new("me@example.com");
        let now = Local.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let report =
            run_weekly_menu(&config(), &store, &mut sink, &now, &mut run_rng(Some(5))).unwrap();

        assert_eq!(report.population, 4);
        assert_eq!(report.menu.selection.len(), 2);
        assert_eq!(report.menu.groceries.len(), 1);
        assert_eq!(report.subject, "Recipes and grocery list for week of 06-02-2025");
        assert_eq!(sink.sent().len(), 1);
        assert_eq!(sink.sent()[0].to, "me@example.com");
        assert_eq!(sink.sent()[0].html_body, report.html);
    }

    #[test]
    fn unreachable_store_fails_before_delivery() {
        let store = InMemoryStore::unreachable("mem", "refused");
        let mut sink = DryRunSink::new("me@example.com");
        let now = Local::now();
        let err = run_weekly_menu(&config(), &store, &mut sink, &now, &mut run_rng(Some(1)))
            .unwrap_err();
        assert_eq!(err.stage(), "store");
        assert!(sink.sent().is_empty());
    }
}
