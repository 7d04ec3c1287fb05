//! Run page form: its controls, the query-parameter bindings that pre-fill
//! it, and the conversions to a `process` request and to the template.
use actix_multipart::form::{MultipartForm, bytes::Bytes, text::Text};

use crate::conllu;
use crate::errors::AppError;
use crate::form::{Control, Form};
use crate::populate::{Binding, PopulateReport, Transform};
use crate::service::{ProcessRequest, ProcessResponse};
use crate::templates_structs::{OptionView, RadioView, ResultView, RunTemplate, SentenceView};

pub const MODELS_UNAVAILABLE: &str = "Cannot obtain the list of models from the service.";

pub const INPUT_GROUP: &str = "input_format";
pub const OUTPUT_GROUP: &str = "output_format";

/// (value, label); the first entry is checked initially.
pub const INPUT_FORMATS: &[(&str, &str)] = &[
    ("tokenizer", "Tokenize plain text"),
    ("conllu", "CoNLL-U"),
    ("horizontal", "Horizontal"),
    ("vertical", "Vertical"),
];

pub const OUTPUT_FORMATS: &[(&str, &str)] = &[
    ("conllu", "CoNLL-U"),
    ("horizontal", "Horizontal"),
    ("vertical", "Vertical"),
];

/// Submitted run form (`POST /run`).
#[derive(serde::Deserialize)]
pub struct RunSubmission {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub data: String,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    #[serde(default)]
    pub tokenizer: String,
    #[serde(default)]
    pub tagger: String,
    #[serde(default)]
    pub parser: String,
}

/// The run form sent as `multipart/form-data`, which may carry an input
/// file in place of the text area.
#[derive(MultipartForm)]
pub struct RunUpload {
    pub model: Option<Text<String>>,
    pub data: Option<Text<String>>,
    pub input_format: Option<Text<String>>,
    pub output_format: Option<Text<String>>,
    pub tokenizer: Option<Text<String>>,
    pub tagger: Option<Text<String>>,
    pub parser: Option<Text<String>>,
    #[multipart(limit = "2MiB")]
    pub input_file: Option<Bytes>,
}

impl RunUpload {
    /// A non-empty uploaded file replaces the text area contents. Browsers
    /// send an empty part when no file was chosen.
    pub fn into_submission(self) -> Result<RunSubmission, AppError> {
        let text = |field: Option<Text<String>>| field.map(Text::into_inner).unwrap_or_default();
        let data = match self.input_file.filter(|file| !file.data.is_empty()) {
            Some(file) => String::from_utf8(file.data.to_vec())?,
            None => text(self.data),
        };
        Ok(RunSubmission {
            model: text(self.model),
            data,
            input_format: self.input_format.map(Text::into_inner),
            output_format: self.output_format.map(Text::into_inner),
            tokenizer: text(self.tokenizer),
            tagger: text(self.tagger),
            parser: text(self.parser),
        })
    }
}

fn radio_selector(prefix: &str, value: &str) -> String {
    format!("{prefix}_{value}")
}

/// Empty run form offering `models` in service order.
pub fn run_form(models: Vec<String>) -> Form {
    let mut form = Form::new().with("model", Control::select(models));
    for (i, (value, _)) in INPUT_FORMATS.iter().enumerate() {
        form = form.with(&radio_selector("option_input", value), Control::radio(INPUT_GROUP, value, i == 0));
    }
    for (i, (value, _)) in OUTPUT_FORMATS.iter().enumerate() {
        form = form.with(&radio_selector("option_output", value), Control::radio(OUTPUT_GROUP, value, i == 0));
    }
    form.with("tokenizer", Control::input(""))
        .with("tagger", Control::input(""))
        .with("parser", Control::input(""))
        .with("input", Control::text_area(""))
}

/// The model comes first so the remaining parameters are read against a
/// chosen model; the input text comes last since it may need a fetch.
pub fn run_bindings(catalog_url: &str) -> Vec<Binding> {
    vec![
        Binding::new("#model", "model").with_transform(Transform::ModelAlias {
            catalog_url: catalog_url.to_string(),
        }),
        Binding::new("#option_input_{value}", "input"),
        Binding::new("#option_output_{value}", "output"),
        Binding::new("#tokenizer", "tokenizer"),
        Binding::new("#tagger", "tagger"),
        Binding::new("#parser", "parser"),
        Binding::new("#input", "data"),
    ]
}

/// Completion step of a `GET /run` population: a link that carried input
/// data is submitted straight away.
pub fn auto_submit(form: &mut Form, report: &PopulateReport) -> Option<ProcessRequest> {
    if !report.is_applied("data") {
        return None;
    }
    process_request(form)
}

/// `None` while no model is selected or there is no input text.
pub fn process_request(form: &Form) -> Option<ProcessRequest> {
    let model = form.value("model")?.to_string();
    let data = form.value("input").filter(|d| !d.trim().is_empty())?.to_string();
    let options = |selector: &str| Some(form.value(selector).unwrap_or_default().to_string());

    let (tokenizer, input) = match form.checked(INPUT_GROUP) {
        Some("tokenizer") | None => (options("tokenizer"), None),
        Some(format) => (None, Some(format.to_string())),
    };

    Some(ProcessRequest {
        model,
        data,
        tokenizer,
        tagger: options("tagger"),
        parser: options("parser"),
        input,
        output: form.checked(OUTPUT_GROUP).map(str::to_string),
    })
}

/// Run form holding the values of a submission. A model missing from the
/// list (e.g. the list could not be fetched) is added as an option.
pub fn submitted_form(mut models: Vec<String>, submission: &RunSubmission) -> Form {
    if !submission.model.is_empty() && !models.contains(&submission.model) {
        models.push(submission.model.clone());
    }
    let selected = models.iter().position(|m| *m == submission.model);
    let input_format = submission.input_format.as_deref().unwrap_or(INPUT_FORMATS[0].0);
    let output_format = submission.output_format.as_deref().unwrap_or(OUTPUT_FORMATS[0].0);

    let mut form = run_form(Vec::new()).with("model", Control::Select { options: models, selected });
    for (value, _) in INPUT_FORMATS {
        let radio = Control::radio(INPUT_GROUP, value, *value == input_format);
        form = form.with(&radio_selector("option_input", value), radio);
    }
    for (value, _) in OUTPUT_FORMATS {
        let radio = Control::radio(OUTPUT_GROUP, value, *value == output_format);
        form = form.with(&radio_selector("option_output", value), radio);
    }
    form.with("tokenizer", Control::input(&submission.tokenizer))
        .with("tagger", Control::input(&submission.tagger))
        .with("parser", Control::input(&submission.parser))
        .with("input", Control::text_area(&submission.data))
}

fn radio_views(form: &Form, prefix: &str, group: &str, formats: &[(&str, &str)]) -> Vec<RadioView> {
    let checked = form.checked(group);
    formats
        .iter()
        .map(|(value, label)| RadioView {
            id: radio_selector(prefix, value),
            name: group.to_string(),
            value: value.to_string(),
            label: label.to_string(),
            checked: checked == Some(*value),
        })
        .collect()
}

fn result_view(response: ProcessResponse) -> ResultView {
    let sentences = conllu::parse(&response.result)
        .into_iter()
        .map(|sentence| SentenceView {
            text: sentence.text(),
            tree: sentence.tree_rows(),
            tokens: sentence.tokens,
        })
        .collect();
    ResultView {
        model: response.model,
        acknowledgements: response.acknowledgements,
        download_href: format!("data:text/x-conllu;charset=utf-8,{}", urlencoding::encode(&response.result)),
        text: response.result,
        sentences,
    }
}

pub fn template(form: &Form, error: Option<String>, response: Option<ProcessResponse>) -> RunTemplate {
    let models = match form.control("model") {
        Some(Control::Select { options, selected }) => options
            .iter()
            .enumerate()
            .map(|(i, text)| OptionView {
                text: text.clone(),
                selected: *selected == Some(i),
            })
            .collect(),
        _ => Vec::new(),
    };
    let text = |selector: &str| form.value(selector).unwrap_or_default().to_string();

    RunTemplate {
        error,
        models,
        input_formats: radio_views(form, "option_input", INPUT_GROUP, INPUT_FORMATS),
        output_formats: radio_views(form, "option_output", OUTPUT_GROUP, OUTPUT_FORMATS),
        tokenizer: text("tokenizer"),
        tagger: text("tagger"),
        parser: text("parser"),
        data: text("input"),
        result: response.map(result_view),
    }
}
