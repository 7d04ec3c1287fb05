//! Askama contexts for the run page and the views it lists.

pub mod run;

pub use run::*;
