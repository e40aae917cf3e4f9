use std::io;
use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("core error")]
    Core(#[from] burnstats_core::Error),

    #[error("csv writer error")]
    CsvWriter(#[from] csv::Error),

    #[error("handlebars encountered an error while rendering")]
    HandlebarsRender(#[from] handlebars::RenderError),

    #[error("io error")]
    Io(#[from] io::Error),

    #[error("rendered report is not valid utf-8")]
    Utf8(#[from] FromUtf8Error),

    #[error("serde_json error")]
    SerdeJson(#[from] serde_json::Error),
}
