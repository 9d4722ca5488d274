//! `impact validate`: the data-quality report only.

use anyhow::Result;
use clap::Args;
use sentiment_impact_data::Aligner;
use sentiment_impact_validation::validate;

use super::inputs::{InputArgs, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Exit with an error when the status is CRITICAL_FAILURE
    #[arg(long)]
    pub strict: bool,
}

pub fn run_validate(args: ValidateArgs) -> Result<()> {
    let format = args.inputs.format()?;
    let loaded = args.inputs.load()?;
    let config = &loaded.config;

    sentiment_impact_core::validate_inputs(&loaded.events, &loaded.labels, &loaded.series_by_symbol)?;
    let records = Aligner::from_config(config).align(&loaded.events, &config.symbols, &loaded.series_by_symbol);
    let report = validate(&loaded.events, &loaded.labels, &records, config)?;

    let content = match format {
        OutputFormat::Json => report.to_json()?,
        OutputFormat::Text => report.to_text(),
    };
    args.inputs.emit(&content)?;

    if args.strict && report.status == sentiment_impact_validation::QualityStatus::CriticalFailure {
        anyhow::bail!("quality status is CRITICAL_FAILURE ({:.1}/100)", report.overall_score);
    }
    Ok(())
}
