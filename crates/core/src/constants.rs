//! Constants used throughout the intake core crate.
//!
//! Static copy shown to clinicians lives here so the REST API and the CLI present identical
//! text.

/// Delay applied to every analysis run when nothing else is configured.
pub const DEFAULT_ANALYSIS_DELAY_MS: u64 = 3_000;

/// Upper bound accepted for a configured analysis delay.
pub const MAX_ANALYSIS_DELAY_MS: u64 = 60_000;

/// Temperature (°F) above which an emergency alert is raised.
pub const FEVER_ALERT_THRESHOLD_F: f64 = 104.0;

/// Value the emergency alert counter is set to when the emergency rule fires.
pub const EMERGENCY_ALERT_COUNT: u32 = 1;

/// Quick-add symptom list offered by the intake form.
pub const COMMON_SYMPTOMS: [&str; 15] = [
    "Fever",
    "Headache",
    "Cough",
    "Sore throat",
    "Nausea",
    "Vomiting",
    "Diarrhea",
    "Abdominal pain",
    "Chest pain",
    "Shortness of breath",
    "Dizziness",
    "Fatigue",
    "Joint pain",
    "Rash",
    "Loss of appetite",
];

/// Shown in place of results before any analysis has completed.
pub const EMPTY_RESULTS_PROMPT: &str =
    "Enter patient information and symptoms to generate diagnostic suggestions";

/// Heading shown while an analysis run is in progress.
pub const ANALYZING_TITLE: &str = "AI Analysis in Progress";

/// Shown under [`ANALYZING_TITLE`].
pub const ANALYZING_MESSAGE: &str =
    "Processing medical data and generating diagnostic suggestions...";

/// Heading of the alert block listing critical diagnoses.
pub const CRITICAL_ALERT_HEADING: &str = "Critical Alert - Immediate Action Required";

/// Guidance shown under the critical diagnoses.
pub const CRITICAL_ALERT_GUIDANCE: &str =
    "Contact emergency services or refer to nearest hospital immediately.";

/// Outcome line for a diagnosis that needs referral.
pub const REFERRAL_RECOMMENDED: &str = "Specialist Referral Recommended";

/// Outcome line for a diagnosis that does not need referral.
pub const LOCAL_MANAGEMENT: &str = "Can be managed locally";

/// Hint shown next to the disabled analysis control.
pub const REQUIRED_DATA_HINT: &str =
    "Complete patient information and symptoms to enable analysis";

/// Appended to every populated result view.
pub const CLINICAL_DISCLAIMER: &str = "These AI-generated suggestions are for clinical decision \
support only and should not replace professional medical judgment. Always consider patient's \
complete clinical picture and local medical protocols before making treatment decisions.";

/// Product and compliance line shown in the footer.
pub const PRODUCT_LINE: &str = "MedAssist AI v2.1 | Compliant with Indian Medical Council \
Guidelines | Data processed locally with end-to-end encryption";

/// Support and emergency contacts shown in the footer.
pub const SUPPORT_LINE: &str = "For technical support: 1800-XXX-XXXX | Emergency: 108";
