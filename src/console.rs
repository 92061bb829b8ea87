//! Interactive console: the presentation layer.
//!
//! Translates input lines into triggers, renders the transcript, and
//! interprets scroll cues. No reconciliation logic lives here: one line
//! becomes at most one trigger, reduced once against the store.

use std::thread;

use owo_colors::OwoColorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use thiserror::Error;

use crate::config::Settings;
use crate::engine::{AnswerEngine, ChatClient, SearchAgent, SearchClient};
use crate::models::{ChatMessage, MessageRole};
use crate::prompts::{compose, DiseaseAction, QueryRequest};
use crate::renal::{estimate_crcl, PatientParams, RenalBand, Sex};
use crate::session::{reconcile, ConversationStore, Resolution, Trigger};

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("console input error: {0}")]
    Readline(#[from] ReadlineError),
}

/// Build the engine from settings and drive the input loop until quit/EOF.
pub fn run(settings: Settings) -> Result<(), ConsoleError> {
    let llm = ChatClient::new(
        &settings.base_url,
        &settings.llm_api_key,
        &settings.model,
        settings.timeout_secs,
    );
    let search = SearchClient::new(&settings.search_api_key, settings.timeout_secs);
    let agent = SearchAgent::new(llm, search, &settings.answer_language);

    let mut console = Console::new(&agent, &settings.answer_language);
    console.render_new_messages();
    println!("{}", "Type `help` for commands.".dimmed());

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("rounds> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                if console.handle_line(&line) == LineOutcome::Quit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(ConsoleError::Readline(e)),
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum LineOutcome {
    Continue,
    Quit,
}

/// One console session: the store, the engine seam, and the free-text
/// fields the quick actions draw from.
struct Console<'a> {
    store: ConversationStore,
    engine: &'a dyn AnswerEngine,
    language: String,
    target_disease: String,
    patient: Option<PatientParams>,
    /// Messages already printed; everything past this is pending output.
    rendered: usize,
}

impl<'a> Console<'a> {
    fn new(engine: &'a dyn AnswerEngine, language: &str) -> Self {
        Self {
            store: ConversationStore::new(),
            engine,
            language: language.to_string(),
            target_disease: String::new(),
            patient: None,
            rendered: 0,
        }
    }

    /// Dispatch one input line. Commands first; anything else is a
    /// free-form search.
    fn handle_line(&mut self, line: &str) -> LineOutcome {
        let line = line.trim();
        if line.is_empty() {
            return LineOutcome::Continue;
        }

        let (command, args) = match line.split_once(char::is_whitespace) {
            Some((head, tail)) => (head.to_lowercase(), tail.trim()),
            None => (line.to_lowercase(), ""),
        };

        match command.as_str() {
            "quit" | "exit" => return LineOutcome::Quit,
            "help" => print_help(),
            "use" => self.set_target(args),
            "dx" => self.quick_action(DiseaseAction::DiagnosticCriteria),
            "labs" => self.quick_action(DiseaseAction::LabWorkup),
            "tx" => self.quick_action(DiseaseAction::TreatmentGoals),
            "flags" => self.quick_action(DiseaseAction::RedFlags),
            "pe" => self.quick_action(DiseaseAction::PhysicalExam),
            "renal" => self.set_patient(args),
            "dose" => self.dose(args),
            "ddx" => self.differential(args),
            "history" => self.list_history(),
            "open" => self.open_history(args),
            "clear" => self.clear(),
            _ => self.free_search(line),
        }
        LineOutcome::Continue
    }

    // ── Commands ─────────────────────────────────────────

    fn set_target(&mut self, name: &str) {
        if name.is_empty() {
            warn("Usage: use <disease or symptom>");
            return;
        }
        self.target_disease = name.to_string();
        println!("Target set to {}", name.bold());
    }

    fn quick_action(&mut self, kind: DiseaseAction) {
        let request = QueryRequest::Disease {
            kind,
            name: &self.target_disease,
        };
        match compose(&request, &self.language) {
            Ok(composed) => self.fire(Trigger::NewSearch {
                label: composed.label,
                query: composed.query,
            }),
            Err(e) => warn(&e.to_string()),
        }
    }

    fn set_patient(&mut self, args: &str) {
        match parse_renal_args(args) {
            Ok(params) => {
                self.patient = Some(params);
                match estimate_crcl(&params) {
                    Some(est) => {
                        let text = format!("CrCl: {est}");
                        match est.band {
                            RenalBand::Severe => println!("{}", text.red()),
                            RenalBand::Moderate => println!("{}", text.yellow()),
                            RenalBand::Normal => println!("{}", text.green()),
                        }
                    }
                    None => warn("CrCl not computed; check the parameters"),
                }
            }
            Err(e) => warn(&e),
        }
    }

    fn dose(&mut self, args: &str) {
        let (drug, indication) = split_slash(args);
        let request = QueryRequest::DrugDosing {
            drug,
            indication,
            serum_creatinine: self.patient.map_or(0.0, |p| p.serum_creatinine),
            renal: self.patient.and_then(|p| estimate_crcl(&p)),
        };
        match compose(&request, &self.language) {
            Ok(composed) => self.fire(Trigger::NewSearch {
                label: composed.label,
                query: composed.query,
            }),
            Err(e) => warn(&e.to_string()),
        }
    }

    fn differential(&mut self, args: &str) {
        let (symptoms, lab_findings) = split_slash(args);
        let request = QueryRequest::DifferentialDiagnosis {
            symptoms,
            lab_findings,
        };
        match compose(&request, &self.language) {
            Ok(composed) => self.fire(Trigger::NewSearch {
                label: composed.label,
                query: composed.query,
            }),
            Err(e) => warn(&e.to_string()),
        }
    }

    fn free_search(&mut self, line: &str) {
        self.fire(Trigger::NewSearch {
            label: line.to_string(),
            query: line.to_string(),
        });
    }

    fn list_history(&self) {
        if self.store.history().is_empty() {
            println!("{}", "No history yet.".dimmed());
            return;
        }
        for (i, entry) in self.store.history().iter().rev().enumerate() {
            let pending = if entry.has_response() { "" } else { " (pending)" };
            println!("{:>3}. {}{}", i + 1, entry.label, pending.dimmed());
        }
    }

    fn open_history(&mut self, args: &str) {
        let Some(id) = args
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .and_then(|n| {
                // History is listed reverse-chronologically: 1 is newest.
                let entries = self.store.history();
                entries.len().checked_sub(n).map(|i| entries[i].id.clone())
            })
        else {
            warn("Usage: open <number from `history`>");
            return;
        };
        self.fire(Trigger::HistoryClick { id });
    }

    fn clear(&mut self) {
        self.store.reset();
        self.rendered = 0;
        self.render_new_messages();
    }

    // ── Reconciliation + rendering ───────────────────────

    fn fire(&mut self, trigger: Trigger) {
        let resolution = reconcile(&mut self.store, trigger, self.engine);
        self.render_new_messages();

        match resolution {
            Resolution::Failed { error, .. } => {
                println!("{} {}", "error:".red().bold(), error.red());
            }
            Resolution::Scroll(cue) => {
                // Fresh re-materialized turns were just printed above; only
                // an already-visible target needs the jump back.
                if let Some(message) = self.store.find_message_by_id(&cue.target_id) {
                    let already_visible = cue.settle == crate::session::trigger::SETTLE_EXISTING;
                    if already_visible {
                        thread::sleep(cue.settle);
                        println!("{}", format!("── {} ──", cue.target_id).dimmed());
                        print_message(message);
                    }
                }
            }
            Resolution::Answered { .. } | Resolution::Ignored => {}
        }
    }

    /// Print every message appended since the last render.
    fn render_new_messages(&mut self) {
        for message in &self.store.messages()[self.rendered..] {
            print_message(message);
        }
        self.rendered = self.store.messages().len();
    }
}

// ── Helpers ──────────────────────────────────────────────

fn print_message(message: &ChatMessage) {
    let tag = match message.role {
        MessageRole::User => "you".cyan().bold().to_string(),
        MessageRole::Assistant => "rounds".green().bold().to_string(),
    };
    let annotation = if message.from_cache {
        format!(" {}", "(cached)".dimmed())
    } else {
        String::new()
    };
    println!("{tag}>{annotation} {}", message.content);
}

fn warn(text: &str) {
    println!("{} {}", "!".yellow().bold(), text.yellow());
}

fn print_help() {
    println!(
        "\
use <disease>              set the target disease/symptom
dx | labs | tx | flags | pe   quick actions on the target
renal <age> <m|f> <kg> <cr>   set patient parameters, show CrCl
dose <drug> / <indication>    dosing review with renal context
ddx <symptoms> [/ <labs>]     differential diagnosis
history                    list past queries (newest first)
open <n>                   jump to / replay a history entry
clear                      reset the session
quit                       leave"
    );
}

/// `"a / b"` → `("a", "b")`; no slash → `(whole, "")`.
fn split_slash(args: &str) -> (&str, &str) {
    match args.split_once('/') {
        Some((head, tail)) => (head.trim(), tail.trim()),
        None => (args.trim(), ""),
    }
}

/// `<age> <m|f> <weight-kg> <creatinine>` in that order.
fn parse_renal_args(args: &str) -> Result<PatientParams, String> {
    const USAGE: &str = "Usage: renal <age> <m|f> <weight-kg> <creatinine>";

    let parts: Vec<&str> = args.split_whitespace().collect();
    let [age, sex, weight, creatinine] = parts.as_slice() else {
        return Err(USAGE.to_string());
    };

    let age_years: u32 = age.parse().map_err(|_| format!("bad age `{age}`. {USAGE}"))?;
    let sex = match sex.to_lowercase().as_str() {
        "m" | "male" => Sex::Male,
        "f" | "female" => Sex::Female,
        other => return Err(format!("bad sex `{other}`. {USAGE}")),
    };
    let weight_kg: f64 = weight
        .parse()
        .map_err(|_| format!("bad weight `{weight}`. {USAGE}"))?;
    let serum_creatinine: f64 = creatinine
        .parse()
        .map_err(|_| format!("bad creatinine `{creatinine}`. {USAGE}"))?;

    Ok(PatientParams {
        age_years,
        sex,
        weight_kg,
        serum_creatinine,
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
