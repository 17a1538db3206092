use anyhow::Context;
use clap::{Parser, Subcommand};
use intake_core::{
    config::analysis_delay_from_env_value, reference_diagnoses, render_text, AnalysisTicket,
    CoreConfig, FileSelection, IntakeSession, IntakeUpdate, PatientField, ResultView,
    StatusBanner, SymptomChange, SymptomCollector, SymptomSeverity, VitalField, VitalSigns,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Clinic intake form runner")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the quick-add symptoms
    CommonSymptoms,
    /// Print the diagnosis records every completed analysis returns
    Diagnoses,
    /// Run an analysis over an intake file
    Analyse {
        /// JSON file with `patient`, `symptoms` and `vitals`
        intake: PathBuf,
        /// Image to attach (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        /// Analysis delay in milliseconds (overrides INTAKE_ANALYSIS_DELAY_MS)
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Print the result view as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Patient section of an intake file. Every value is passed through as typed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PatientInput {
    name: String,
    age: String,
    gender: String,
    phone: String,
    village: String,
    medical_history: String,
    current_medications: String,
    allergies: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymptomInput {
    name: String,
    #[serde(default)]
    severity: SymptomSeverity,
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IntakeFile {
    patient: PatientInput,
    symptoms: Vec<SymptomInput>,
    vitals: VitalSigns,
}

struct AnalysisOutcome {
    ticket: AnalysisTicket,
    results: ResultView,
    banner: StatusBanner,
}

fn load_intake(path: &Path) -> anyhow::Result<IntakeFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read intake file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse intake file {}", path.display()))
}

/// Replays an intake file through a fresh session as field-level updates.
fn fill_session(session: &mut IntakeSession, intake: IntakeFile) -> anyhow::Result<()> {
    let p = intake.patient;
    for (field, value) in [
        (PatientField::Name, p.name),
        (PatientField::Age, p.age),
        (PatientField::Gender, p.gender),
        (PatientField::Phone, p.phone),
        (PatientField::Village, p.village),
        (PatientField::MedicalHistory, p.medical_history),
        (PatientField::CurrentMedications, p.current_medications),
        (PatientField::Allergies, p.allergies),
    ] {
        session.apply(IntakeUpdate::Patient { field, value })?;
    }

    let v = intake.vitals;
    for (field, value) in [
        (VitalField::Temperature, v.temperature),
        (VitalField::BloodPressure, v.blood_pressure),
        (VitalField::HeartRate, v.heart_rate),
        (VitalField::RespiratoryRate, v.respiratory_rate),
        (VitalField::OxygenSaturation, v.oxygen_saturation),
    ] {
        session.apply(IntakeUpdate::Vital { field, value })?;
    }

    for symptom in intake.symptoms {
        let name = symptom.name.trim().to_string();
        session.apply(IntakeUpdate::AddSymptom(name.clone()))?;
        let id = session
            .view()
            .symptoms
            .symptoms
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.id)
            .with_context(|| format!("symptom '{}' was not recorded", name))?;

        session.apply(IntakeUpdate::UpdateSymptom {
            id,
            change: SymptomChange::Severity(symptom.severity),
        })?;
        session.apply(IntakeUpdate::UpdateSymptom {
            id,
            change: SymptomChange::Duration(symptom.duration),
        })?;
    }

    Ok(())
}

async fn analyse(
    cfg: &CoreConfig,
    intake: IntakeFile,
    images: &[PathBuf],
) -> anyhow::Result<AnalysisOutcome> {
    let mut session = IntakeSession::new(cfg);
    fill_session(&mut session, intake)?;

    let mut batch = Vec::with_capacity(images.len());
    for path in images {
        let selection = FileSelection::from_path(path)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        batch.push(selection);
    }
    let attached = session.add_images(batch).await;
    tracing::info!("{} image(s) attached", attached.images.len());

    let ticket = session.trigger_analysis()?;
    session.wait_for_analysis().await;

    Ok(AnalysisOutcome {
        ticket,
        results: session.results(),
        banner: session.status_banner(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intake=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::CommonSymptoms) => {
            for symptom in SymptomCollector::new().common_symptoms() {
                println!("{}", symptom.name);
            }
        }
        Some(Commands::Diagnoses) => {
            println!("{}", serde_json::to_string_pretty(&reference_diagnoses())?);
        }
        Some(Commands::Analyse {
            intake,
            images,
            delay_ms,
            json,
        }) => {
            let delay = match delay_ms {
                Some(ms) => Duration::from_millis(ms),
                None => {
                    analysis_delay_from_env_value(std::env::var("INTAKE_ANALYSIS_DELAY_MS").ok())?
                }
            };
            let cfg = CoreConfig::new(delay)?;
            let outcome = analyse(&cfg, load_intake(&intake)?, &images).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.results)?);
            } else {
                if outcome.ticket.emergency {
                    println!(
                        "!! Emergency alerts: {} (severe symptom or temperature above 104°F)\n",
                        outcome.banner.emergency_alerts
                    );
                }
                print!("{}", render_text(&outcome.results));
                println!();
                println!("{}", outcome.banner.product_line);
                println!("{}", outcome.banner.support_line);
            }
        }
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}
