//! Declarative form population from URL query parameters.
//!
//! A page lists its [`Binding`]s in order. [`populate`] parses the URL once
//! and walks the bindings one at a time: a binding whose parameter is absent
//! or empty is skipped, otherwise its effective value is computed (possibly
//! after a fetch) and applied to the bound control before the next binding
//! starts. Fetch failures abandon only the binding that issued them, so the
//! pass always reaches the completion callback.

use std::time::Duration;

use crate::catalog::ModelCatalog;
use crate::errors::AppError;
use crate::fetch::{self, Fetcher};
use crate::form::{Applied, Form};
use crate::params;

/// Rewrites a raw parameter value into the value applied to the control.
#[derive(Debug, Clone)]
pub enum Transform {
    /// Resolve a short model identifier through the catalog at `catalog_url`;
    /// unknown identifiers pass through unchanged.
    ModelAlias { catalog_url: String },
    Map(fn(&str) -> String),
}

impl Transform {
    async fn apply<F: Fetcher>(
        &self,
        raw: &str,
        fetcher: &F,
        fetch_timeout: Duration,
    ) -> Result<String, AppError> {
        match self {
            Transform::ModelAlias { catalog_url } => {
                let document = fetch::fetch_bounded(fetcher, catalog_url, fetch_timeout).await?;
                let catalog = ModelCatalog::parse(&document);
                Ok(catalog.resolve(raw).unwrap_or(raw).to_string())
            }
            Transform::Map(f) => Ok(f(raw)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    /// Control selector. A `{value}` placeholder is replaced by the effective
    /// value, which lets one binding address a radio group option by value.
    pub selector: String,
    pub param: String,
    pub transform: Option<Transform>,
}

impl Binding {
    pub fn new(selector: &str, param: &str) -> Self {
        Self {
            selector: selector.to_string(),
            param: param.to_string(),
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Parameter absent or empty, or no control under the selector.
    Skipped,
    /// Select control had no option with the required prefix.
    NoMatchingOption,
    /// A fetch failed or timed out; nothing was applied.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub param: String,
    /// Selector after `{value}` substitution.
    pub selector: String,
    pub outcome: Outcome,
}

/// Per-binding outcomes, in processing order.
#[derive(Debug, Clone, Default)]
pub struct PopulateReport {
    pub entries: Vec<ReportEntry>,
}

impl PopulateReport {
    pub fn outcome(&self, param: &str) -> Option<Outcome> {
        self.entries
            .iter()
            .find(|e| e.param == param)
            .map(|e| e.outcome)
    }

    /// Selectors of applied bindings, in the order they were applied.
    pub fn applied_selectors(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.outcome == Outcome::Applied)
            .map(|e| e.selector.as_str())
            .collect()
    }

    fn record(&mut self, binding: &Binding, selector: String, outcome: Outcome) {
        self.entries.push(ReportEntry {
            param: binding.param.clone(),
            selector,
            outcome,
        });
    }

    pub fn is_applied(&self, param: &str) -> bool {
        self.outcome(param) == Some(Outcome::Applied)
    }
}

/// Fill `form` from the query string of `url` and hand the result to
/// `on_complete`, which runs exactly once.
///
/// Only a malformed query string is an error; it is reported before any
/// control is touched.
pub async fn populate<F, C, R>(
    url: &str,
    form: &mut Form,
    bindings: Vec<Binding>,
    fetcher: &F,
    fetch_timeout: Duration,
    on_complete: C,
) -> Result<R, AppError>
where
    F: Fetcher,
    C: FnOnce(&mut Form, &PopulateReport) -> R,
{
    let params = params::parse(url)?;
    let mut report = PopulateReport::default();

    for binding in bindings {
        let raw = match params.get(&binding.param) {
            Some(value) if !value.is_empty() => value.as_str(),
            _ => {
                log::debug!("Binding {}: no value, skipped", binding.param);
                report.record(&binding, binding.selector.clone(), Outcome::Skipped);
                continue;
            }
        };

        let (selector, outcome) = apply_binding(form, &binding, raw, fetcher, fetch_timeout).await;
        report.record(&binding, selector, outcome);
    }

    Ok(on_complete(form, &report))
}

async fn apply_binding<F: Fetcher>(
    form: &mut Form,
    binding: &Binding,
    raw: &str,
    fetcher: &F,
    fetch_timeout: Duration,
) -> (String, Outcome) {
    let value = match &binding.transform {
        Some(transform) => match transform.apply(raw, fetcher, fetch_timeout).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Binding {} abandoned: {e}", binding.param);
                return (binding.selector.clone(), Outcome::Abandoned);
            }
        },
        None => raw.to_string(),
    };
    let selector = binding.selector.replace("{value}", &value);

    let outcome = match form.apply(&selector, &value, fetcher, fetch_timeout).await {
        Some(Ok(Applied::Changed)) => {
            log::debug!("Binding {} applied to {selector}", binding.param);
            Outcome::Applied
        }
        Some(Ok(Applied::NoMatchingOption)) => {
            log::debug!("Binding {}: no option of {selector} starts with {value:?}", binding.param);
            Outcome::NoMatchingOption
        }
        Some(Err(e)) => {
            log::warn!("Binding {} abandoned: {e}", binding.param);
            Outcome::Abandoned
        }
        None => {
            log::warn!("Binding {}: no control {selector}", binding.param);
            Outcome::Skipped
        }
    };
    (selector, outcome)
}
