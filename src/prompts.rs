//! Prompt composer: the seven quick-action templates and the system prompt.
//!
//! Each action kind maps to a fixed natural-language template whose blanks
//! are filled verbatim; the numbered sections, the instruction to cite
//! source URLs, and the instruction to answer in the configured language are
//! part of the contract with the model, not decoration. Pure builder: no
//! state is touched and no engine call is made here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::renal::CrClEstimate;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// A fully filled-in request. The seven action kinds are the five
/// disease-centric quick actions plus drug dosing and differential
/// diagnosis.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRequest<'a> {
    /// The five disease-centric quick actions.
    Disease { kind: DiseaseAction, name: &'a str },
    /// Clinical medication review with renal context.
    DrugDosing {
        drug: &'a str,
        indication: &'a str,
        serum_creatinine: f64,
        renal: Option<CrClEstimate>,
    },
    /// Differential diagnosis from symptoms and (optional) lab findings.
    DifferentialDiagnosis {
        symptoms: &'a str,
        lab_findings: &'a str,
    },
}

/// The disease-centric subset of [`QueryKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiseaseAction {
    DiagnosticCriteria,
    LabWorkup,
    TreatmentGoals,
    RedFlags,
    PhysicalExam,
}

impl DiseaseAction {
    pub fn all() -> &'static [DiseaseAction] {
        &[
            Self::DiagnosticCriteria,
            Self::LabWorkup,
            Self::TreatmentGoals,
            Self::RedFlags,
            Self::PhysicalExam,
        ]
    }
}

/// What the composer hands to the reconciler: a short sidebar label and the
/// full query text sent to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedQuery {
    pub label: String,
    pub query: String,
}

/// Validation failures, checked before any state mutation or engine call.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Enter a disease or symptom name first")]
    MissingDisease,

    #[error("Enter a drug name first")]
    MissingDrug,

    #[error("Enter an indication first")]
    MissingIndication,

    #[error("Enter the presenting symptoms first")]
    MissingSymptoms,
}

// ═══════════════════════════════════════════════════════════
// System prompt
// ═══════════════════════════════════════════════════════════

/// Standing orders for the answer agent, with the configured answer language
/// substituted in.
pub fn system_prompt(language: &str) -> String {
    format!(
        "You are Rounds, a physician's clinical assistant.\n\
         Mission: search for the latest medical guidance.\n\
         Standing orders:\n\
         1. **Identity check**: the first sentence of every answer must name the \
         disease or drug being discussed.\n\
         2. **Spelling**: if the user misspelled a medical term, correct it to the \
         proper terminology before searching.\n\
         3. **Search language**: search in English regardless of the input \
         language; answer in {language}.\n\
         4. **Terminology**: give medical terms as the English name or \
         abbreviation, with a short explanation in {language}.\n\
         5. **Sources**: every answer must end with the source URLs.\n\
         6. **Language**: {language}."
    )
}

// ═══════════════════════════════════════════════════════════
// Composition
// ═══════════════════════════════════════════════════════════

/// Build the `(label, query)` pair for a request.
///
/// Refuses with a [`ComposeError`] when the required free-text field for the
/// action kind is empty (after trimming).
pub fn compose(request: &QueryRequest<'_>, language: &str) -> Result<ComposedQuery, ComposeError> {
    match request {
        QueryRequest::Disease { kind, name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(ComposeError::MissingDisease);
            }
            Ok(compose_disease(*kind, name, language))
        }
        QueryRequest::DrugDosing {
            drug,
            indication,
            serum_creatinine,
            renal,
        } => {
            let drug = drug.trim();
            let indication = indication.trim();
            if drug.is_empty() {
                return Err(ComposeError::MissingDrug);
            }
            if indication.is_empty() {
                return Err(ComposeError::MissingIndication);
            }
            Ok(compose_dosing(
                drug,
                indication,
                *serum_creatinine,
                renal.as_ref(),
                language,
            ))
        }
        QueryRequest::DifferentialDiagnosis {
            symptoms,
            lab_findings,
        } => {
            let symptoms = symptoms.trim();
            if symptoms.is_empty() {
                return Err(ComposeError::MissingSymptoms);
            }
            Ok(compose_differential(symptoms, lab_findings.trim(), language))
        }
    }
}

fn compose_disease(kind: DiseaseAction, disease: &str, language: &str) -> ComposedQuery {
    let (label, query) = match kind {
        DiseaseAction::DiagnosticCriteria => (
            format!("Diagnostic criteria for [{disease}]"),
            format!(
                "Search the latest diagnostic guidelines for [{disease}].\n\
                 Organize the answer as:\n\
                 1. **Scoring systems**: a table, with MDCalc links.\n\
                 2. **Confirmatory criteria**.\n\
                 3. **Sources**: list the URLs.\n\
                 Answer language: {language}."
            ),
        ),
        DiseaseAction::LabWorkup => (
            format!("Suggested workup for [{disease}]"),
            format!(
                "For a patient with suspected [{disease}], list the recommended \
                 workup.\n\
                 Organize the answer as:\n\
                 1. **Blood / biochemistry tests**.\n\
                 2. **Imaging / ECG** (with Radiopaedia or LITFL links).\n\
                 3. **Sources**: list the URLs.\n\
                 Answer language: {language}."
            ),
        ),
        DiseaseAction::TreatmentGoals => (
            format!("Treatment and goals for [{disease}]"),
            format!(
                "Search the latest treatment guidelines for [{disease}].\n\
                 Organize the answer as:\n\
                 1. **Medication list**: English generic names, exact doses, \
                 frequencies.\n\
                 2. **Acute-phase treatment goals**: target values and time windows.\n\
                 3. **Sources**: list the URLs.\n\
                 Answer language: {language}."
            ),
        ),
        DiseaseAction::RedFlags => (
            format!("Red flags for [{disease}]"),
            format!(
                "List the red flags of [{disease}].\n\
                 End the answer with the reference URLs.\n\
                 Answer language: {language}."
            ),
        ),
        DiseaseAction::PhysicalExam => (
            format!("Physical examination for [{disease}]"),
            format!(
                "For a patient with suspected [{disease}], list the key physical \
                 examination steps.\n\
                 Organize the answer as:\n\
                 1. **Inspection**.\n\
                 2. **Auscultation / palpation**.\n\
                 3. **Special maneuvers** (e.g. Murphy's sign, McBurney's point), \
                 with sensitivity and specificity.\n\
                 4. **Sources**: list the URLs.\n\
                 Answer language: {language}."
            ),
        ),
    };
    ComposedQuery { label, query }
}

fn compose_dosing(
    drug: &str,
    indication: &str,
    serum_creatinine: f64,
    renal: Option<&CrClEstimate>,
    language: &str,
) -> ComposedQuery {
    let crcl_label = match renal {
        Some(est) => format!("CrCl {}", est.ml_per_min),
        None => "CrCl not computed".to_string(),
    };
    let crcl_text = match renal {
        Some(est) => format!("CrCl {} ml/min", est.ml_per_min),
        None => "CrCl not computed".to_string(),
    };

    ComposedQuery {
        label: format!("Dosing for [{drug}] ({crcl_label})"),
        query: format!(
            "Perform a clinical medication review with dosing advice.\n\
             Drug: **{drug}**.\n\
             Indication: **{indication}**.\n\
             Patient parameters: **Cr {serum_creatinine} mg/dL, {crcl_text}**.\n\n\
             1. **Indication check**: if the drug does not fit the indication, \
             list suggested alternatives.\n\
             2. **Dose calculation**: if adjustment is needed, show the standard \
             vs adjusted dose, and flag contraindications in bold.\n\
             3. Output a table and include the reference URLs.\n\
             Answer language: {language}."
        ),
    }
}

fn compose_differential(symptoms: &str, lab_findings: &str, language: &str) -> ComposedQuery {
    let labs = if lab_findings.is_empty() {
        "none provided"
    } else {
        lab_findings
    };

    ComposedQuery {
        label: format!("Differential diagnosis for [{symptoms}]"),
        query: format!(
            "Build a differential diagnosis.\n\
             Presenting symptoms: **{symptoms}**.\n\
             Lab findings: **{labs}**.\n\
             Organize the answer as:\n\
             1. **Ranked differentials**: most likely first, with the features \
             that distinguish each.\n\
             2. **Next steps**: the tests that best discriminate between them.\n\
             3. **Sources**: list the URLs.\n\
             Answer language: {language}."
        ),
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renal::{estimate_crcl, PatientParams, Sex};

    const LANG: &str = "English";

    fn disease(kind: DiseaseAction, name: &str) -> Result<ComposedQuery, ComposeError> {
        compose(&QueryRequest::Disease { kind, name }, LANG)
    }

    // ── Validation ───────────────────────────────────────

    #[test]
    fn empty_disease_refused_for_every_quick_action() {
        for kind in DiseaseAction::all() {
            assert_eq!(disease(*kind, "").unwrap_err(), ComposeError::MissingDisease);
            assert_eq!(
                disease(*kind, "   ").unwrap_err(),
                ComposeError::MissingDisease
            );
        }
    }

    #[test]
    fn dosing_requires_drug_and_indication() {
        let missing_drug = compose(
            &QueryRequest::DrugDosing {
                drug: "",
                indication: "HAP",
                serum_creatinine: 1.0,
                renal: None,
            },
            LANG,
        );
        assert_eq!(missing_drug.unwrap_err(), ComposeError::MissingDrug);

        let missing_indication = compose(
            &QueryRequest::DrugDosing {
                drug: "Meropenem",
                indication: " ",
                serum_creatinine: 1.0,
                renal: None,
            },
            LANG,
        );
        assert_eq!(
            missing_indication.unwrap_err(),
            ComposeError::MissingIndication
        );
    }

    #[test]
    fn differential_requires_symptoms() {
        let result = compose(
            &QueryRequest::DifferentialDiagnosis {
                symptoms: "",
                lab_findings: "WBC 15k",
            },
            LANG,
        );
        assert_eq!(result.unwrap_err(), ComposeError::MissingSymptoms);
    }

    // ── Disease templates ────────────────────────────────

    #[test]
    fn diagnostic_criteria_template() {
        let q = disease(DiseaseAction::DiagnosticCriteria, "Sepsis").unwrap();
        assert_eq!(q.label, "Diagnostic criteria for [Sepsis]");
        assert!(q.query.contains("diagnostic guidelines for [Sepsis]"));
        assert!(q.query.contains("MDCalc"));
        assert!(q.query.contains("**Sources**: list the URLs."));
        assert!(q.query.contains("Answer language: English."));
    }

    #[test]
    fn lab_workup_names_reference_sites() {
        let q = disease(DiseaseAction::LabWorkup, "Pancreatitis").unwrap();
        assert!(q.query.contains("Radiopaedia"));
        assert!(q.query.contains("LITFL"));
        assert!(q.query.contains("[Pancreatitis]"));
    }

    #[test]
    fn treatment_goals_asks_for_generic_names() {
        let q = disease(DiseaseAction::TreatmentGoals, "DKA").unwrap();
        assert!(q.query.contains("English generic names"));
        assert!(q.query.contains("Acute-phase treatment goals"));
    }

    #[test]
    fn physical_exam_names_special_maneuvers() {
        let q = disease(DiseaseAction::PhysicalExam, "Appendicitis").unwrap();
        assert!(q.query.contains("Murphy's sign"));
        assert!(q.query.contains("sensitivity and specificity"));
    }

    #[test]
    fn every_disease_template_cites_urls_and_language() {
        for kind in DiseaseAction::all() {
            let q = disease(*kind, "Sepsis").unwrap();
            assert!(q.query.contains("URL"), "{kind:?} missing URL instruction");
            assert!(
                q.query.contains("Answer language: English."),
                "{kind:?} missing language instruction"
            );
            assert!(q.label.contains("Sepsis"), "{kind:?} label missing disease");
        }
    }

    // ── Dosing ───────────────────────────────────────────

    #[test]
    fn dosing_embeds_renal_context() {
        let renal = estimate_crcl(&PatientParams {
            age_years: 65,
            sex: Sex::Female,
            weight_kg: 60.0,
            serum_creatinine: 1.0,
        });
        let q = compose(
            &QueryRequest::DrugDosing {
                drug: "Meropenem",
                indication: "HAP",
                serum_creatinine: 1.0,
                renal,
            },
            LANG,
        )
        .unwrap();

        assert_eq!(q.label, "Dosing for [Meropenem] (CrCl 53.1)");
        assert!(q.query.contains("Drug: **Meropenem**."));
        assert!(q.query.contains("Indication: **HAP**."));
        assert!(q.query.contains("Cr 1 mg/dL"));
        assert!(q.query.contains("CrCl 53.1 ml/min"));
        assert!(q.query.contains("Indication check"));
    }

    #[test]
    fn dosing_without_renal_estimate() {
        let q = compose(
            &QueryRequest::DrugDosing {
                drug: "Vancomycin",
                indication: "MRSA bacteremia",
                serum_creatinine: 0.0,
                renal: None,
            },
            LANG,
        )
        .unwrap();
        assert!(q.label.contains("CrCl not computed"));
        assert!(q.query.contains("CrCl not computed"));
    }

    // ── Differential ─────────────────────────────────────

    #[test]
    fn differential_embeds_symptoms_and_labs() {
        let q = compose(
            &QueryRequest::DifferentialDiagnosis {
                symptoms: "fever and RUQ pain",
                lab_findings: "ALT 250, WBC 14k",
            },
            LANG,
        )
        .unwrap();
        assert!(q.label.contains("fever and RUQ pain"));
        assert!(q.query.contains("**fever and RUQ pain**"));
        assert!(q.query.contains("**ALT 250, WBC 14k**"));
        assert!(q.query.contains("Ranked differentials"));
    }

    #[test]
    fn differential_without_labs() {
        let q = compose(
            &QueryRequest::DifferentialDiagnosis {
                symptoms: "syncope",
                lab_findings: "",
            },
            LANG,
        )
        .unwrap();
        assert!(q.query.contains("**none provided**"));
    }

    // ── Idempotence / language ───────────────────────────

    #[test]
    fn compose_is_idempotent() {
        let request = QueryRequest::Disease {
            kind: DiseaseAction::RedFlags,
            name: "Sepsis",
        };
        assert_eq!(compose(&request, LANG).unwrap(), compose(&request, LANG).unwrap());
    }

    #[test]
    fn language_is_threaded_through() {
        let q = disease(DiseaseAction::RedFlags, "Sepsis")
            .map(|q| q.query)
            .unwrap();
        assert!(q.contains("Answer language: English."));

        let zh = compose(
            &QueryRequest::Disease {
                kind: DiseaseAction::RedFlags,
                name: "Sepsis",
            },
            "Traditional Chinese",
        )
        .unwrap();
        assert!(zh.query.contains("Answer language: Traditional Chinese."));
    }

    // ── System prompt ────────────────────────────────────

    #[test]
    fn system_prompt_states_standing_orders() {
        let sp = system_prompt("English");
        assert!(sp.contains("Rounds"));
        assert!(sp.contains("Identity check"));
        assert!(sp.contains("search in English"));
        assert!(sp.contains("source URLs"));
        assert!(sp.contains("answer in English"));
    }

    #[test]
    fn system_prompt_substitutes_language() {
        let sp = system_prompt("Spanish");
        assert!(sp.contains("answer in Spanish"));
        assert!(sp.contains("explanation in Spanish"));
    }

    // ── Kind catalog ─────────────────────────────────────

    #[test]
    fn five_disease_actions() {
        assert_eq!(DiseaseAction::all().len(), 5);
    }
}
