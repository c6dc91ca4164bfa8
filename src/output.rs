use std::io::{self, Write};

use serde::Serialize;

use crate::app::{
    AnnotationResult, CleanResult, ClearResult, FetchResult, SampleIndexResult, SeriesSummary,
};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_series(result: &SeriesSummary) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_annotation(result: &AnnotationResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_samples(result: &SampleIndexResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_clean(result: &CleanResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_clear(result: &ClearResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
