use clap::{Parser, Subcommand};
use peds_core::config::{
    age_category_from_env_value, resolve_formulary_path, variant_from_env_value,
};
use peds_core::{
    calculate_dose, estimate_gfr, parse_form_number, AgeCategory, DoseKind, DoseResult, DoseSpec,
    DosingService, DrugAssessment, EngineConfig, GfrResult, PatientRenalParameters,
    ResolvedAdjustment, SchwartzVariant,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "peds")]
#[command(about = "Paediatric dosing and renal function calculator")]
struct Cli {
    /// Formulary YAML file (overrides PEDS_FORMULARY_PATH)
    #[arg(long, global = true)]
    formulary: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate eGFR from height and serum creatinine
    Gfr {
        /// Height in cm
        #[arg(long)]
        height: String,
        /// Serum creatinine in µmol/L
        #[arg(long)]
        creatinine: String,
        /// revised or original
        #[arg(long)]
        variant: Option<SchwartzVariant>,
        /// Age category for the original equation
        #[arg(long)]
        age_category: Option<AgeCategory>,
    },
    /// Calculate a single weight-based dose
    Dose {
        /// Weight in kg
        #[arg(long)]
        weight: String,
        /// Dose coefficient, e.g. "15" or "10-15"
        #[arg(long)]
        value: String,
        /// Unit text, e.g. "mg/kg/dose q8h"
        #[arg(long)]
        unit: String,
        /// Absolute ceiling in mg
        #[arg(long)]
        max_dose: Option<f64>,
        /// Informational floor in mg
        #[arg(long)]
        min_dose: Option<f64>,
        /// Treat the value as an absolute dose
        #[arg(long, conflicts_with = "rate")]
        fixed: bool,
        /// Treat the value as an infusion rate
        #[arg(long)]
        rate: bool,
    },
    /// List all drugs in the formulary
    List,
    /// Show doses and renal adjustment for one drug
    Drug {
        /// Drug id, e.g. acyclovir
        id: String,
        /// Weight in kg
        #[arg(long)]
        weight: String,
        /// Height in cm
        #[arg(long, default_value = "")]
        height: String,
        /// Serum creatinine in µmol/L
        #[arg(long, default_value = "")]
        creatinine: String,
        #[arg(long)]
        variant: Option<SchwartzVariant>,
        #[arg(long)]
        age_category: Option<AgeCategory>,
        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Formula defaults read from the environment.
struct Defaults {
    variant: SchwartzVariant,
    age_category: AgeCategory,
}

impl Defaults {
    fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            variant: variant_from_env_value(std::env::var("PEDS_SCHWARTZ_VARIANT").ok())?,
            age_category: age_category_from_env_value(std::env::var("PEDS_AGE_CATEGORY").ok())?,
        })
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("peds=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let defaults = Defaults::from_env()?;

    match cli.command {
        Some(Commands::Gfr {
            height,
            creatinine,
            variant,
            age_category,
        }) => {
            let params = PatientRenalParameters::from_form(
                "",
                &height,
                &creatinine,
                variant.unwrap_or(defaults.variant),
                age_category.unwrap_or(defaults.age_category),
            );
            println!("{}", describe_gfr(&estimate_gfr(&params)));
        }
        Some(Commands::Dose {
            weight,
            value,
            unit,
            max_dose,
            min_dose,
            fixed,
            rate,
        }) => {
            let mut spec = DoseSpec::weight_scaled("", value, unit)
                .with_kind(DoseKind::from_flags(fixed, rate)?);
            if let Some(max_dose) = max_dose {
                spec = spec.with_max_dose(max_dose);
            }
            if let Some(min_dose) = min_dose {
                spec = spec.with_min_dose(min_dose);
            }

            let weight_kg = parse_form_number(&weight).unwrap_or(0.0);
            match calculate_dose(weight_kg, &spec) {
                Some(result) => println!("{}", describe_dose(&result, &spec.unit)),
                None => println!("no data"),
            }
        }
        Some(Commands::List) => {
            let service = load_service(cli.formulary, &defaults)?;
            let formulary = service.formulary();
            if formulary.is_empty() {
                println!("No drugs found.");
            } else {
                for drug in formulary.iter() {
                    match drug.category.as_deref() {
                        Some(category) => println!("{}: {} ({})", drug.id, drug.name, category),
                        None => println!("{}: {}", drug.id, drug.name),
                    }
                }
            }
        }
        Some(Commands::Drug {
            id,
            weight,
            height,
            creatinine,
            variant,
            age_category,
            json,
        }) => {
            let service = load_service(cli.formulary, &defaults)?;
            let mut params = service.patient_from_form(&weight, &height, &creatinine);
            if let Some(variant) = variant {
                params.formula_variant = variant;
            }
            if let Some(age_category) = age_category {
                params.age_category = age_category;
            }

            let assessment = service.assess(&params, &id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
            } else {
                print_assessment(&assessment);
            }
        }
        None => {
            println!("Use 'peds --help' for commands");
        }
    }

    Ok(())
}

fn load_service(
    formulary: Option<PathBuf>,
    defaults: &Defaults,
) -> anyhow::Result<DosingService> {
    let override_path =
        formulary.or_else(|| std::env::var_os("PEDS_FORMULARY_PATH").map(PathBuf::from));
    let path = resolve_formulary_path(override_path)?;
    let config = EngineConfig::new(path, defaults.variant, defaults.age_category)?;
    Ok(DosingService::from_config(config)?)
}

fn describe_gfr(gfr: &GfrResult) -> String {
    match (gfr.value, gfr.band, gfr.stage()) {
        (Some(value), Some(band), Some(stage)) => format!(
            "eGFR {value} mL/min/1.73m² ({band} renal function, {})",
            stage.label()
        ),
        _ => "eGFR: no data".to_owned(),
    }
}

/// Amounts are only labelled mg when the rule's unit is milligram-based.
fn unit_suffix(unit: &str) -> &'static str {
    if unit.contains("mg") {
        "mg"
    } else {
        ""
    }
}

fn describe_dose(result: &DoseResult, unit: &str) -> String {
    let suffix = unit_suffix(unit);
    let mut line = format!("{}{suffix}", result.dose_mg);
    if result.capped {
        line.push_str(" (max dose reached)");
    }
    if result.below_min_dose() {
        if let Some(min) = result.min_dose {
            line.push_str(&format!(" (below minimum {min}{suffix})"));
        }
    }
    line
}

fn print_assessment(assessment: &DrugAssessment) {
    println!("{} ({})", assessment.drug_name, assessment.drug_id);
    println!("{}", describe_gfr(&assessment.gfr));
    println!();

    println!("Doses:");
    for dose in &assessment.doses {
        let calculated = match (dose.kind, dose.result) {
            (DoseKind::Fixed, _) => "fixed dose".to_owned(),
            (DoseKind::Rate, _) => "infusion rate".to_owned(),
            (DoseKind::WeightScaled, Some(result)) => {
                let mut text = describe_dose(&result, &dose.unit);
                if let (Some(per_dose), Some(frequency)) = (dose.per_dose, dose.schedule.frequency)
                {
                    let suffix = unit_suffix(&dose.unit);
                    text.push_str(&format!(" = {per_dose}{suffix} {frequency}"));
                }
                text
            }
            (DoseKind::WeightScaled, None) => "no data".to_owned(),
        };
        println!("  {} [{}]: {}", dose.label, dose.unit, calculated);
    }
    println!();

    println!("Renal adjustment:");
    match &assessment.renal {
        ResolvedAdjustment::Banded { instructions } => {
            for row in instructions {
                let marker = if row.is_active { "*" } else { " " };
                println!("{marker} {}: {}", row.label, row.text);
            }
        }
        other => println!("  {}", other.text().unwrap_or_default()),
    }
}
