use askama::Template;

use crate::conllu::{Token, TreeRow};

#[derive(Template)]
#[template(path = "run.html")]
pub struct RunTemplate {
    pub error: Option<String>,
    pub models: Vec<OptionView>,
    pub input_formats: Vec<RadioView>,
    pub output_formats: Vec<RadioView>,
    pub tokenizer: String,
    pub tagger: String,
    pub parser: String,
    pub data: String,
    pub result: Option<ResultView>,
}

pub struct OptionView {
    pub text: String,
    pub selected: bool,
}

pub struct RadioView {
    pub id: String,
    pub name: String,
    pub value: String,
    pub label: String,
    pub checked: bool,
}

/// Output of a `process` call, with the CoNLL-U split up for the token
/// tables and tree listings.
pub struct ResultView {
    pub model: String,
    pub acknowledgements: Vec<String>,
    pub text: String,
    /// `data:` URL of `text`, for saving the output as a file.
    pub download_href: String,
    pub sentences: Vec<SentenceView>,
}

pub struct SentenceView {
    pub text: String,
    pub tokens: Vec<Token>,
    pub tree: Vec<TreeRow>,
}
