//! `impact evaluate`: alignment, quality report and analysis in one run.

use anyhow::Result;
use clap::Args;
use sentiment_impact_engine::evaluate;

use super::inputs::{InputArgs, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let format = args.inputs.format()?;
    let loaded = args.inputs.load()?;

    let evaluation = evaluate(
        &loaded.events,
        &loaded.labels,
        &loaded.series_by_symbol,
        &loaded.config,
    )?;

    let content = match format {
        OutputFormat::Json => evaluation.to_json()?,
        OutputFormat::Text => format!(
            "{}\n{}",
            evaluation.quality_report.to_text(),
            evaluation.analysis.to_text()
        ),
    };
    args.inputs.emit(&content)
}
