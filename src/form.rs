//! Form controls and the rules for applying a value to each kind.

use std::time::Duration;

use indexmap::IndexMap;

use crate::errors::AppError;
use crate::fetch::{self, Fetcher};

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// `<input type="text">` or `<input type="hidden">`.
    Input { value: String },
    /// `<input type="radio">`; `group` is the shared `name` attribute.
    Radio { group: String, value: String, checked: bool },
    TextArea { text: String },
    /// Single `<select>`; option texts in document order.
    Select { options: Vec<String>, selected: Option<usize> },
}

/// What applying a value did to a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// Select control without an option starting with the value.
    NoMatchingOption,
}

impl Control {
    pub fn input(value: &str) -> Self {
        Control::Input { value: value.to_string() }
    }

    pub fn radio(group: &str, value: &str, checked: bool) -> Self {
        Control::Radio {
            group: group.to_string(),
            value: value.to_string(),
            checked,
        }
    }

    pub fn text_area(text: &str) -> Self {
        Control::TextArea { text: text.to_string() }
    }

    /// The first option starts out selected, as a browser would render it.
    pub fn select(options: Vec<String>) -> Self {
        let selected = if options.is_empty() { None } else { Some(0) };
        Control::Select { options, selected }
    }

    /// Apply `value` according to this control's kind.
    ///
    /// Text areas given an absolute http(s) URL take the fetched document
    /// instead; a refused, failed or timed out fetch leaves the control
    /// untouched.
    pub async fn apply_value<F: Fetcher>(
        &mut self,
        value: &str,
        fetcher: &F,
        fetch_timeout: Duration,
    ) -> Result<Applied, AppError> {
        match self {
            Control::Input { value: current } => {
                *current = value.to_string();
            }
            Control::Radio { checked, .. } => {
                *checked = true;
            }
            Control::TextArea { text } => {
                *text = if fetch::is_fetchable_url(value) {
                    fetch::fetch_bounded(fetcher, value, fetch_timeout).await?
                } else {
                    value.to_string()
                };
            }
            Control::Select { options, selected } => {
                match options.iter().position(|text| text.starts_with(value)) {
                    Some(index) => *selected = Some(index),
                    None => return Ok(Applied::NoMatchingOption),
                }
            }
        }
        Ok(Applied::Changed)
    }

    /// The value a submission of this control would carry, if any.
    pub fn submitted_value(&self) -> Option<&str> {
        match self {
            Control::Input { value } => Some(value.as_str()),
            Control::Radio { value, checked, .. } => checked.then_some(value.as_str()),
            Control::TextArea { text } => Some(text.as_str()),
            Control::Select { options, selected } => {
                (*selected).and_then(|i| options.get(i)).map(String::as_str)
            }
        }
    }
}

/// Controls addressed by selector, in page order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    controls: IndexMap<String, Control>,
}

/// Selectors may be written jQuery-style with a leading `#`.
fn normalize(selector: &str) -> &str {
    selector.strip_prefix('#').unwrap_or(selector)
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str, control: Control) -> Self {
        self.controls.insert(normalize(selector).to_string(), control);
        self
    }

    pub fn control(&self, selector: &str) -> Option<&Control> {
        self.controls.get(normalize(selector))
    }

    pub fn controls(&self) -> impl Iterator<Item = (&str, &Control)> {
        self.controls.iter().map(|(s, c)| (s.as_str(), c))
    }

    /// Apply a value to the control under `selector`. Returns `None` when no
    /// such control exists. Checking a radio unchecks the rest of its group.
    pub async fn apply<F: Fetcher>(
        &mut self,
        selector: &str,
        value: &str,
        fetcher: &F,
        fetch_timeout: Duration,
    ) -> Option<Result<Applied, AppError>> {
        let key = normalize(selector);
        let control = self.controls.get_mut(key)?;
        let result = control.apply_value(value, fetcher, fetch_timeout).await;

        let checked_group = match (&result, &*control) {
            (Ok(Applied::Changed), Control::Radio { group, .. }) => Some(group.clone()),
            _ => None,
        };
        if let Some(group) = checked_group {
            for (other_key, other) in self.controls.iter_mut() {
                if let Control::Radio { group: g, checked, .. } = other {
                    if *g == group && other_key.as_str() != key {
                        *checked = false;
                    }
                }
            }
        }
        Some(result)
    }

    /// Submitted value of a text control or select, by selector.
    pub fn value(&self, selector: &str) -> Option<&str> {
        self.control(selector).and_then(Control::submitted_value)
    }

    /// Value of the checked radio in `group`.
    pub fn checked(&self, group: &str) -> Option<&str> {
        self.controls.values().find_map(|c| match c {
            Control::Radio { group: g, value, checked: true } if g == group => Some(value.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoFetch;

    impl Fetcher for NoFetch {
        async fn fetch_text(&self, url: &str) -> Result<String, AppError> {
            Err(AppError::Fetch(format!("unexpected fetch of {url}")))
        }
    }

    const LIMIT: Duration = Duration::from_secs(1);

    fn options(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn select_picks_first_option_starting_with_value() {
        let mut select = Control::select(options(&["Czech-ud", "Czech-ud-2.3", "English-ud"]));
        let applied = select.apply_value("Czech-ud-2.3", &NoFetch, LIMIT).await.unwrap();
        assert_eq!(applied, Applied::Changed);
        assert_eq!(select.submitted_value(), Some("Czech-ud-2.3"));
        assert!(matches!(select, Control::Select { selected: Some(1), .. }));
    }

    #[tokio::test]
    async fn select_prefix_match_is_first_in_document_order() {
        let mut select = Control::select(options(&["English-ud", "Czech-ud", "Czech-ud-2.3"]));
        select.apply_value("Czech", &NoFetch, LIMIT).await.unwrap();
        assert!(matches!(select, Control::Select { selected: Some(1), .. }));
    }

    #[tokio::test]
    async fn select_without_match_is_unchanged() {
        let mut select = Control::select(options(&["Czech-ud", "English-ud"]));
        let applied = select.apply_value("czech", &NoFetch, LIMIT).await.unwrap();
        assert_eq!(applied, Applied::NoMatchingOption);
        assert!(matches!(select, Control::Select { selected: Some(0), .. }));
    }

    #[tokio::test]
    async fn input_takes_value() {
        let mut input = Control::input("");
        input.apply_value("tokenizer=ranges", &NoFetch, LIMIT).await.unwrap();
        assert_eq!(input.submitted_value(), Some("tokenizer=ranges"));
    }

    #[tokio::test]
    async fn text_area_keeps_non_url_text_verbatim() {
        let mut area = Control::text_area("");
        area.apply_value("see http://example.com", &NoFetch, LIMIT).await.unwrap();
        assert_eq!(area.submitted_value(), Some("see http://example.com"));
    }

    #[tokio::test]
    async fn text_area_fetch_failure_leaves_text() {
        let mut area = Control::text_area("original");
        let result = area.apply_value("http://example.com/in.txt", &NoFetch, LIMIT).await;
        assert!(matches!(result, Err(AppError::Fetch(_))));
        assert_eq!(area.submitted_value(), Some("original"));
    }

    #[tokio::test]
    async fn radio_check_unchecks_group_siblings() {
        let mut form = Form::new()
            .with("option_output_conllu", Control::radio("output", "conllu", true))
            .with("option_output_vertical", Control::radio("output", "vertical", false))
            .with("option_input_conllu", Control::radio("input", "conllu", true));

        let applied = form.apply("#option_output_vertical", "ignored", &NoFetch, LIMIT).await;
        assert!(matches!(applied, Some(Ok(Applied::Changed))));
        assert_eq!(form.checked("output"), Some("vertical"));
        assert_eq!(form.checked("input"), Some("conllu"));
        assert_eq!(form.control("option_output_conllu"), Some(&Control::radio("output", "conllu", false)));
    }

    #[tokio::test]
    async fn unknown_selector_is_none() {
        let mut form = Form::new().with("data", Control::text_area(""));
        assert!(form.apply("missing", "x", &NoFetch, LIMIT).await.is_none());
    }
}
