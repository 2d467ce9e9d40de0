//! bugkit annotate command implementation

use std::io::Read;
use std::path::PathBuf;

use serde::Serialize;

use crate::annotate::{annotate, TitleIndex};
use crate::error::Result;
use crate::milestone::ItemId;
use crate::output::{emit_success, OutputOptions};

/// Options for the annotate command
pub struct AnnotateOptions {
    pub titles: PathBuf,
    pub input: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct AnnotateReport {
    text: String,
    references: Vec<ItemId>,
}

pub fn run(options: AnnotateOptions) -> Result<()> {
    let titles = TitleIndex::load(&options.titles)?;
    let text = match &options.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let annotated = annotate(&text, &titles);

    if options.json {
        return emit_success(
            OutputOptions {
                json: true,
                quiet: options.quiet,
            },
            "annotate",
            &AnnotateReport {
                text: annotated.text,
                references: annotated.references,
            },
            None,
        );
    }

    // Printed even with --quiet.
    print!("{}", annotated.text);
    Ok(())
}
