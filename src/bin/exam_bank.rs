use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::Context;
use chrono::{Local, TimeZone};
use examgen::config::parse_export_config;
use examgen::export::write_variants;
use examgen::model::{ExamExportConfig, SavedExam};
use examgen::simulation::{format_time, score, time_limit};
use examgen::store::{export_json, import_json, ExamBank};
use examgen::GenerationClient;
use log::warn;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const USAGE: &str = "Usage:
  exam_bank list
  exam_bank show <id>
  exam_bank delete <id>
  exam_bank import <file.json>
  exam_bank export-json <id> [dir]
  exam_bank export-doc <id> <variants> [dir] [--theory] [--config=export.yaml]
  exam_bank simulate <id> <answers.yaml> [elapsed_seconds]";

#[derive(Debug)]
enum Command {
    List,
    Show(String),
    Delete(String),
    Import(PathBuf),
    ExportJson { id: String, dir: String },
    ExportDoc {
        id: String,
        variants: u32,
        config: Option<PathBuf>,
        dir: String,
        theory: bool,
    },
    Simulate { id: String, answers: PathBuf, elapsed: Option<u64> },
}

fn required(args: &mut impl Iterator<Item = String>, what: &str) -> anyhow::Result<String> {
    args.next().context(format!("{} is required", what))
}

fn parse_command(args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let (flags, positional): (Vec<String>, Vec<String>) = args.partition(|a| a.starts_with("--"));
    let theory = flags.iter().any(|f| f == "--theory");
    let config = flags
        .iter()
        .find_map(|f| f.strip_prefix("--config="))
        .map(PathBuf::from);
    let mut args = positional.into_iter();

    let command = required(&mut args, "a command")?;
    let command = match command.as_str() {
        "list" => Command::List,
        "show" => Command::Show(required(&mut args, "exam id")?),
        "delete" => Command::Delete(required(&mut args, "exam id")?),
        "import" => Command::Import(required(&mut args, "file path")?.into()),
        "export-json" => Command::ExportJson {
            id: required(&mut args, "exam id")?,
            dir: args.next().unwrap_or(String::from(".")),
        },
        "export-doc" => Command::ExportDoc {
            id: required(&mut args, "exam id")?,
            variants: required(&mut args, "number of variants")?
                .parse()
                .context("number of variants must be a positive number")?,
            config,
            dir: args.next().unwrap_or(String::from(".")),
            theory,
        },
        "simulate" => Command::Simulate {
            id: required(&mut args, "exam id")?,
            answers: required(&mut args, "answers file")?.into(),
            elapsed: args
                .next()
                .map(|s| s.parse::<u64>())
                .transpose()
                .context("elapsed seconds must be a number")?,
        },
        other => anyhow::bail!("unknown command '{}'", other),
    };
    Ok(command)
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let command = match parse_command(env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", USAGE);
            return Err(e);
        }
    };

    let bank = ExamBank::from_env();
    match command {
        Command::List => list(&bank),
        Command::Show(id) => {
            let exam = find(&bank, &id)?;
            println!("{}", serde_json::to_string_pretty(&exam)?);
        }
        Command::Delete(id) => {
            if bank.delete(&id).context("failed to delete exam")? {
                println!("deleted exam {BOLD}{}{RESET}", id);
            } else {
                println!("no exam with id {}", id);
            }
        }
        Command::Import(path) => {
            let exam = import_json(&path).context(format!("failed to import {}", path.display()))?;
            bank.save(&exam).context("failed to save imported exam")?;
            println!("imported {BOLD}{}{RESET} ({} questions)", exam.title, exam.questions.len());
        }
        Command::ExportJson { id, dir } => {
            let exam = find(&bank, &id)?;
            let path = export_json(&exam, Path::new(&dir)).context("failed to export exam")?;
            println!("{}", path.display());
        }
        Command::ExportDoc {
            id,
            variants,
            config,
            dir,
            theory,
        } => export_doc(&bank, &id, variants, config.as_deref(), &dir, theory)?,
        Command::Simulate {
            id,
            answers,
            elapsed,
        } => simulate(&bank, &id, &answers, elapsed)?,
    }

    Ok(())
}

fn find(bank: &ExamBank, id: &str) -> anyhow::Result<SavedExam> {
    bank.get(id)
        .context(format!("no exam with id {} in {}", id, bank.path().display()))
}

fn list(bank: &ExamBank) {
    let exams = bank.load();
    if exams.is_empty() {
        println!("exam bank {} is empty", bank.path().display());
        return;
    }
    for exam in exams {
        let created = Local
            .timestamp_millis_opt(exam.timestamp)
            .single()
            .map(|t| t.format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{BOLD}{}{RESET}  {}  ({} questions, {})",
            exam.id,
            exam.title,
            exam.questions.len(),
            created
        );
    }
}

fn export_doc(
    bank: &ExamBank,
    id: &str,
    variants: u32,
    config_path: Option<&Path>,
    dir: &str,
    with_theory: bool,
) -> anyhow::Result<()> {
    let mut exam = find(bank, id)?;
    let mut config = match config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .context(format!("failed to read export config {}", path.display()))?;
            parse_export_config(&raw).context("invalid export config")?
        }
        None => exam.export_config.clone().unwrap_or_else(|| ExamExportConfig {
            exam_title: exam.title.clone(),
            ..ExamExportConfig::default()
        }),
    };
    config.number_of_variants = variants;

    let theory = if with_theory {
        let client = GenerationClient::from_env();
        match client.theory_summary(&exam.config.grade, &exam.config.lesson) {
            Ok(theory) => Some(theory),
            Err(e) => {
                warn!("exporting without theory summary: {}", e);
                None
            }
        }
    } else {
        None
    };

    fs::create_dir_all(dir).context("failed to create output directory")?;
    let paths = write_variants(
        &exam.questions,
        &config,
        theory.as_deref(),
        Path::new(dir),
        &mut rand::thread_rng(),
    )
    .context("failed to export exam")?;
    for path in &paths {
        println!("{}", path.display());
    }

    exam.export_config = Some(config);
    if let Err(e) = bank.save(&exam) {
        eprintln!("Could not update the exam bank: {}", e);
    }
    Ok(())
}

fn simulate(
    bank: &ExamBank,
    id: &str,
    answers_path: &Path,
    elapsed: Option<u64>,
) -> anyhow::Result<()> {
    let exam = find(bank, id)?;
    let raw = fs::read_to_string(answers_path)
        .context(format!("failed to read answers {}", answers_path.display()))?;
    let answers: HashMap<String, String> =
        serde_yaml_ng::from_str(&raw).context("answers must map question ids to answers")?;

    let limit = time_limit(exam.questions.len());
    let elapsed = elapsed.unwrap_or(limit).min(limit);
    let report = score(&exam.questions, &answers, elapsed);

    println!(
        "score {BOLD}{}/{}{RESET} ({:.0}%) in {} of {}",
        report.score,
        report.total,
        report.percentage(),
        format_time(report.elapsed_seconds),
        format_time(limit)
    );
    for (difficulty, stats) in &report.stats {
        println!("  {:<20} {}/{}", difficulty, stats.correct, stats.total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> impl Iterator<Item = String> + '_ {
        line.split_whitespace().map(String::from)
    }

    #[test]
    fn export_doc_takes_a_variant_count() {
        let command = parse_command(args("export-doc 17 3 out --theory")).unwrap();
        let Command::ExportDoc { id, variants, config, dir, theory } = command else {
            panic!("expected export-doc, got {:?}", command);
        };
        assert_eq!(id, "17");
        assert_eq!(variants, 3);
        assert_eq!(config, None);
        assert_eq!(dir, "out");
        assert!(theory);
    }

    #[test]
    fn export_doc_reads_layout_from_config_flag() {
        let command = parse_command(args("export-doc 17 2 --config=de_thi.yaml")).unwrap();
        let Command::ExportDoc { variants, config, dir, theory, .. } = command else {
            panic!("expected export-doc, got {:?}", command);
        };
        assert_eq!(variants, 2);
        assert_eq!(config, Some(PathBuf::from("de_thi.yaml")));
        assert_eq!(dir, ".");
        assert!(!theory);
    }

    #[test]
    fn export_doc_rejects_a_missing_or_bad_count() {
        assert!(parse_command(args("export-doc 17")).is_err());
        assert!(parse_command(args("export-doc 17 many")).is_err());
    }
}
