//! `impact align`: impact records only.

use anyhow::{anyhow, Result};
use clap::Args;
use sentiment_impact_core::{validate_inputs, HorizonStatus};
use sentiment_impact_data::Aligner;

use super::inputs::{InputArgs, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct AlignArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

pub fn run_align(args: AlignArgs) -> Result<()> {
    let format = args.inputs.format()?;
    let loaded = args.inputs.load()?;
    let config = &loaded.config;

    config.validate()?;
    validate_inputs(&loaded.events, &loaded.labels, &loaded.series_by_symbol)?;
    let records = Aligner::from_config(config).align(&loaded.events, &config.symbols, &loaded.series_by_symbol);

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&records)?,
        OutputFormat::Text => {
            let mut out = String::from("event_id,symbol,baseline,horizon_hours,status,pct_change\n");
            for record in &records {
                for (hours, result) in &record.horizon_results {
                    let value = match result.status {
                        HorizonStatus::Missing => String::new(),
                        _ => result
                            .effective_change()
                            .map(|v| v.to_string())
                            .ok_or_else(|| anyhow!("resolved horizon without a value for {}", record.event_id))?,
                    };
                    out.push_str(&format!(
                        "{},{},{},{},{:?},{}\n",
                        record.event_id,
                        record.symbol,
                        record.baseline_price.map(|p| p.to_string()).unwrap_or_default(),
                        hours,
                        result.status,
                        value
                    ));
                }
            }
            out
        }
    };
    args.inputs.emit(&content)
}
