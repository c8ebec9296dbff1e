//! Prediction command

use anyhow::{Context, Result};
use predictor_lib::{predict_cancer_type, CancerPredictor};
use std::io::Read;
use tabled::Tabled;

use crate::output::{
    color_confidence, format_probability, print_info, print_json, print_success, print_table,
    OutputFormat,
};

/// Row for the class probability table
#[derive(Tabled)]
struct ProbabilityRow {
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

/// Read a JSON array of expression values from a file, or stdin for `-`
pub fn read_expression(input: &str) -> Result<Vec<f64>> {
    let content = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read expression values from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read expression file {}", input))?
    };

    serde_json::from_str(&content).context("Expression input must be a JSON array of numbers")
}

/// Classify one expression profile and print the result
pub fn run_prediction(predictor: &CancerPredictor, input: &str, format: OutputFormat) -> Result<()> {
    let values = read_expression(input)?;
    let result = predict_cancer_type(predictor, &values).context("Prediction failed")?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Prediction: {} (confidence {})",
                result.prediction,
                color_confidence(result.confidence)
            ));

            let rows: Vec<ProbabilityRow> = result
                .probabilities
                .iter()
                .map(|(class, probability)| ProbabilityRow {
                    class: class.clone(),
                    probability: format_probability(*probability),
                })
                .collect();
            print_table(&rows);

            print_info(&format!(
                "Model: {} (test accuracy {}, {} genes)",
                result.model_info.name,
                format_probability(result.model_info.accuracy),
                result.model_info.n_features
            ));
        }
    }

    Ok(())
}
