pub mod catalog;
pub mod config;
pub mod conllu;
pub mod errors;
pub mod fetch;
pub mod form;
pub mod handlers;
pub mod params;
pub mod populate;
pub mod service;
pub mod templates_structs;
