//! Model information command

use anyhow::Result;
use predictor_lib::{get_model_info, CancerPredictor};
use tabled::Tabled;

use crate::output::{format_probability, print_info, print_json, print_table, OutputFormat};

/// Row for the model summary table
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Row for the selected genes table
#[derive(Tabled)]
struct GeneRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Gene")]
    gene: String,
}

/// Show static information about the loaded model
pub fn show_model_info(predictor: &CancerPredictor, format: OutputFormat) -> Result<()> {
    let info = get_model_info(predictor);

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            let fields = vec![
                FieldRow {
                    field: "Model",
                    value: info.model_name.clone(),
                },
                FieldRow {
                    field: "Test accuracy",
                    value: format_probability(info.test_accuracy),
                },
                FieldRow {
                    field: "CV accuracy",
                    value: format_probability(info.cv_accuracy),
                },
                FieldRow {
                    field: "Selected genes",
                    value: info.n_features.to_string(),
                },
                FieldRow {
                    field: "Genes required",
                    value: info.total_genes_required.to_string(),
                },
            ];
            print_table(&fields);

            let genes: Vec<GeneRow> = info
                .top_genes
                .iter()
                .enumerate()
                .map(|(i, gene)| GeneRow {
                    rank: i + 1,
                    gene: gene.clone(),
                })
                .collect();
            println!();
            print_info(&format!("Top {} genes", genes.len()));
            print_table(&genes);
        }
    }

    Ok(())
}
