//! Result presentation.
//!
//! A pure decision over the orchestrator status and whether the session still holds the data
//! an analysis needs. Nothing here mutates state.

use crate::analysis::AnalysisStatus;
use crate::constants::{
    ANALYZING_MESSAGE, ANALYZING_TITLE, CLINICAL_DISCLAIMER, CRITICAL_ALERT_GUIDANCE,
    CRITICAL_ALERT_HEADING, EMPTY_RESULTS_PROMPT, LOCAL_MANAGEMENT, REFERRAL_RECOMMENDED,
};
use crate::diagnosis::DiagnosisRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Qualitative band for a diagnosis probability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Likelihood {
    /// 80 and above
    VeryLikely,
    /// 60 to 79
    Likely,
    /// 40 to 59
    Possible,
    Unlikely,
}

impl Likelihood {
    pub fn from_probability(probability: u8) -> Self {
        match probability {
            80.. => Likelihood::VeryLikely,
            60..=79 => Likelihood::Likely,
            40..=59 => Likelihood::Possible,
            _ => Likelihood::Unlikely,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedDiagnosis {
    /// 1-based position in the result list
    pub rank: usize,
    pub severity_label: String,
    pub likelihood: Likelihood,
    /// Referral or local-management line
    pub referral_label: String,
    #[serde(flatten)]
    pub diagnosis: DiagnosisRecord,
}

/// Alert block shown above the results when any diagnosis is critical.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriticalAlert {
    pub heading: String,
    pub guidance: String,
    pub diagnoses: Vec<RankedDiagnosis>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum ResultView {
    Analyzing {
        title: String,
        message: String,
    },
    Empty {
        #[serde(rename = "callToAction")]
        call_to_action: String,
    },
    Populated {
        #[serde(rename = "generatedAt")]
        generated_at: DateTime<Utc>,
        #[serde(skip_serializing_if = "Option::is_none")]
        critical: Option<CriticalAlert>,
        diagnoses: Vec<RankedDiagnosis>,
        disclaimer: String,
    },
}

/// Decides what the results panel shows.
///
/// Results from a completed run are only shown while the session still has the required
/// patient identity and symptoms.
pub fn present(status: &AnalysisStatus, has_required_data: bool) -> ResultView {
    match status {
        AnalysisStatus::Running { .. } => ResultView::Analyzing {
            title: ANALYZING_TITLE.to_string(),
            message: ANALYZING_MESSAGE.to_string(),
        },
        AnalysisStatus::Complete {
            completed_at,
            diagnoses,
            ..
        } if has_required_data && !diagnoses.is_empty() => populated(*completed_at, diagnoses),
        _ => ResultView::Empty {
            call_to_action: EMPTY_RESULTS_PROMPT.to_string(),
        },
    }
}

fn populated(generated_at: DateTime<Utc>, diagnoses: &[DiagnosisRecord]) -> ResultView {
    let ranked: Vec<RankedDiagnosis> = diagnoses
        .iter()
        .enumerate()
        .map(|(i, d)| RankedDiagnosis {
            rank: i + 1,
            severity_label: d.severity.label().to_string(),
            likelihood: Likelihood::from_probability(d.probability),
            referral_label: if d.referral_needed {
                REFERRAL_RECOMMENDED
            } else {
                LOCAL_MANAGEMENT
            }
            .to_string(),
            diagnosis: d.clone(),
        })
        .collect();

    let critical: Vec<RankedDiagnosis> = ranked
        .iter()
        .filter(|r| r.diagnosis.is_critical())
        .cloned()
        .collect();
    let critical = (!critical.is_empty()).then(|| CriticalAlert {
        heading: CRITICAL_ALERT_HEADING.to_string(),
        guidance: CRITICAL_ALERT_GUIDANCE.to_string(),
        diagnoses: critical,
    });

    ResultView::Populated {
        generated_at,
        critical,
        diagnoses: ranked,
        disclaimer: CLINICAL_DISCLAIMER.to_string(),
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultView::Analyzing { title, message } => writeln!(f, "{}\n{}", title, message),
            ResultView::Empty { call_to_action } => writeln!(f, "{}", call_to_action),
            ResultView::Populated {
                generated_at,
                critical,
                diagnoses,
                disclaimer,
            } => {
                if let Some(alert) = critical {
                    writeln!(f, "!! {}", alert.heading)?;
                    for c in &alert.diagnoses {
                        writeln!(f, "!!  - {}", c.diagnosis.condition)?;
                    }
                    writeln!(f, "!! {}\n", alert.guidance)?;
                }

                writeln!(
                    f,
                    "Diagnostic suggestions (generated at {})",
                    generated_at.format("%H:%M:%S UTC")
                )?;
                for r in diagnoses {
                    let d = &r.diagnosis;
                    writeln!(
                        f,
                        "\n#{} {} [{}%] {}",
                        r.rank, d.condition, d.probability, r.severity_label
                    )?;
                    writeln!(f, "   {}", d.reasoning)?;
                    writeln!(f, "   Recommended tests:")?;
                    for test in &d.recommended_tests {
                        writeln!(f, "     - {}", test)?;
                    }
                    writeln!(f, "   Treatment options:")?;
                    for option in &d.treatment_options {
                        writeln!(f, "     - {}", option)?;
                    }
                    writeln!(f, "   {}", r.referral_label)?;
                }

                writeln!(f, "\n{}", disclaimer)
            }
        }
    }
}

/// Plain-text rendering used by the command-line runner.
pub fn render_text(view: &ResultView) -> String {
    view.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::{reference_diagnoses, DiagnosisSeverity};
    use intake_uuid::EntryId;

    fn complete(diagnoses: Vec<DiagnosisRecord>) -> AnalysisStatus {
        AnalysisStatus::Complete {
            run_id: EntryId::new(),
            completed_at: Utc::now(),
            diagnoses,
        }
    }

    #[test]
    fn running_shows_progress() {
        let status = AnalysisStatus::Running {
            run_id: EntryId::new(),
            started_at: Utc::now(),
        };
        assert_eq!(
            present(&status, true),
            ResultView::Analyzing {
                title: "AI Analysis in Progress".into(),
                message: "Processing medical data and generating diagnostic suggestions...".into(),
            }
        );
    }

    #[test]
    fn idle_or_missing_data_shows_call_to_action() {
        let expected = ResultView::Empty {
            call_to_action: EMPTY_RESULTS_PROMPT.to_string(),
        };
        assert_eq!(present(&AnalysisStatus::Idle, true), expected);
        assert_eq!(present(&complete(reference_diagnoses()), false), expected);
    }

    #[test]
    fn populated_ranks_and_appends_disclaimer() {
        let view = present(&complete(reference_diagnoses()), true);
        let ResultView::Populated {
            critical,
            diagnoses,
            disclaimer,
            ..
        } = view
        else {
            panic!("expected populated view");
        };

        assert_eq!(critical, None);
        assert_eq!(diagnoses.len(), 3);
        assert_eq!(diagnoses[0].rank, 1);
        assert_eq!(diagnoses[0].likelihood, Likelihood::VeryLikely);
        assert_eq!(diagnoses[1].likelihood, Likelihood::Likely);
        assert_eq!(diagnoses[2].likelihood, Likelihood::Possible);
        assert_eq!(diagnoses[2].severity_label, "High Priority");
        assert_eq!(diagnoses[0].referral_label, "Can be managed locally");
        assert_eq!(diagnoses[2].referral_label, "Specialist Referral Recommended");
        assert_eq!(disclaimer, CLINICAL_DISCLAIMER);
    }

    #[test]
    fn critical_diagnoses_are_pulled_out() {
        let mut diagnoses = reference_diagnoses();
        diagnoses[1].severity = DiagnosisSeverity::Critical;

        let ResultView::Populated {
            critical,
            diagnoses,
            ..
        } = present(&complete(diagnoses), true)
        else {
            panic!("expected populated view");
        };

        let alert = critical.expect("critical alert block");
        assert_eq!(alert.heading, "Critical Alert - Immediate Action Required");
        assert_eq!(
            alert.guidance,
            "Contact emergency services or refer to nearest hospital immediately."
        );
        assert_eq!(alert.diagnoses.len(), 1);
        assert_eq!(alert.diagnoses[0].rank, 2);
        assert_eq!(diagnoses.len(), 3);
    }

    #[test]
    fn likelihood_bands() {
        assert_eq!(Likelihood::from_probability(100), Likelihood::VeryLikely);
        assert_eq!(Likelihood::from_probability(80), Likelihood::VeryLikely);
        assert_eq!(Likelihood::from_probability(79), Likelihood::Likely);
        assert_eq!(Likelihood::from_probability(40), Likelihood::Possible);
        assert_eq!(Likelihood::from_probability(39), Likelihood::Unlikely);
    }

    #[test]
    fn text_rendering_lists_every_diagnosis() {
        let mut diagnoses = reference_diagnoses();
        diagnoses[2].severity = DiagnosisSeverity::Critical;
        let text = render_text(&present(&complete(diagnoses), true));

        assert!(text.starts_with("!! Critical Alert - Immediate Action Required\n!!  - Pneumonia\n"));
        assert!(text.contains(CRITICAL_ALERT_GUIDANCE));
        assert!(text.contains("#1 Acute Respiratory Infection [85%] Medium Priority"));
        assert!(text.contains("#3 Pneumonia [45%] Critical Priority"));
        assert!(text.contains("   Specialist Referral Recommended"));
        assert!(text.contains("   Can be managed locally"));
        assert!(text.trim_end().ends_with(CLINICAL_DISCLAIMER));
    }

    #[test]
    fn analyzing_text_has_title_and_message() {
        let view = ResultView::Analyzing {
            title: ANALYZING_TITLE.into(),
            message: ANALYZING_MESSAGE.into(),
        };
        assert_eq!(
            render_text(&view),
            format!("{}\n{}\n", ANALYZING_TITLE, ANALYZING_MESSAGE)
        );
    }

    #[test]
    fn view_serialises_with_tag() {
        let json = serde_json::to_value(present(&AnalysisStatus::Idle, false)).unwrap();
        assert_eq!(json["view"], "empty");
        assert_eq!(json["callToAction"], EMPTY_RESULTS_PROMPT);
    }
}
