use anyhow::Context;
use examgen::config::load_app_config;
use examgen::gemini::{CallState, ImageInput};
use examgen::model::{AppConfig, Question, SavedExam};
use examgen::preview::preview_html;
use examgen::render::MathMlRenderer;
use examgen::store::{export_json, ExamBank};
use examgen::GenerationClient;
use std::path::{Path, PathBuf};
use std::{env, fs};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const DEFAULT_OUTPUT_DIR: &str = "output";
const USAGE: &str = "Usage:
  examgen generate <config.yaml> [output_dir]
  examgen image <image.jpg> <quantity> [output_dir]
  examgen topics <grade> <lesson>
  examgen theory <grade> <lesson>";

enum Command {
    Generate { config: PathBuf, output_dir: String },
    Image { image: PathBuf, quantity: u32, output_dir: String },
    Topics { grade: String, lesson: String },
    Theory { grade: String, lesson: String },
}

fn parse_command(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let command = args.next().context("a command is required")?;
    let command = match command.as_str() {
        "generate" => Command::Generate {
            config: args.next().context("config file is required")?.into(),
            output_dir: args.next().unwrap_or(DEFAULT_OUTPUT_DIR.to_string()),
        },
        "image" => Command::Image {
            image: args.next().context("image path is required")?.into(),
            quantity: args
                .next()
                .context("quantity is required")?
                .parse()
                .context("quantity must be a positive number")?,
            output_dir: args.next().unwrap_or(DEFAULT_OUTPUT_DIR.to_string()),
        },
        "topics" | "theory" => {
            let grade = args.next().context("grade is required")?;
            let lesson = args.next().context("lesson is required")?;
            if command == "topics" {
                Command::Topics { grade, lesson }
            } else {
                Command::Theory { grade, lesson }
            }
        }
        other => anyhow::bail!("unknown command '{}'", other),
    };
    Ok(command)
}

fn report_state(state: &CallState) {
    if let CallState::Retrying { attempt, delay } = state {
        eprintln!(
            "Gemini is busy, retry {} in {}s...",
            attempt,
            delay.as_secs()
        );
    }
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

    let client = GenerationClient::from_env().on_state(report_state);

    match command {
        Command::Generate { config, output_dir } => {
            let mut config = load_app_config(&config)?;
            if config.topics.is_empty() {
                config.topics = client
                    .lesson_topics(&config.grade, &config.lesson)
                    .context("failed to analyse lesson topics")?;
                println!("Topics: {}", config.topics.join(", "));
            }
            let questions = client
                .generate_questions(&config)
                .context("failed to generate questions")?;
            save_generated(questions, config, false, &output_dir)?;
        }
        Command::Image {
            image,
            quantity,
            output_dir,
        } => {
            let input = ImageInput::from_path(&image)?;
            let questions = client
                .generate_questions_from_image(&input, quantity)
                .context(format!("failed to generate questions from {}", image.display()))?;
            let config = AppConfig {
                quantity,
                ..AppConfig::default()
            };
            save_generated(questions, config, true, &output_dir)?;
        }
        Command::Topics { grade, lesson } => {
            for topic in client.lesson_topics(&grade, &lesson)? {
                println!("- {}", topic);
            }
        }
        Command::Theory { grade, lesson } => {
            let theory = client
                .theory_summary(&grade, &lesson)
                .context("failed to generate theory summary")?;
            println!("{}", theory);
        }
    }

    Ok(())
}

fn save_generated(
    questions: Vec<Question>,
    config: AppConfig,
    from_image: bool,
    output_dir: &str,
) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir).context("failed to create output directory")?;
    let output_dir = Path::new(output_dir);

    let exam = SavedExam::new(questions, config, from_image);
    let json_path = export_json(&exam, output_dir).context("failed to write exam json")?;

    let preview_path = output_dir.join(format!("preview_{}.html", exam.id));
    fs::write(
        &preview_path,
        preview_html(&exam.title, &exam.questions, &MathMlRenderer),
    )
    .context("failed to write preview")?;

    let bank = ExamBank::from_env();
    if let Err(e) = bank.save(&exam) {
        // the generated files are still on disk
        eprintln!("Could not save to the exam bank {}: {}", bank.path().display(), e);
    }

    println!(
        "generated {BOLD}{}{RESET} questions, exam id {BOLD}{}{RESET}",
        exam.questions.len(),
        exam.id
    );
    println!("  {}", json_path.display());
    println!("  {}", preview_path.display());
    Ok(())
}
