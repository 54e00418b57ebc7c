//! Elicit interactive CLI
//!
//! A standalone terminal front-end for running one elicitation session
//! over a JSON knowledge base.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use elicit::{
    Answer, AnswerSource, ConfigError, ElicitResult, InputError, KnowledgeBase, Question,
    QuestionId, QuestionKind, Session,
};

/// CLI configuration
struct Config {
    /// Path to the knowledge base JSON file
    knowledge: PathBuf,
    /// How many malformed answers to tolerate per question
    max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            knowledge: PathBuf::from("demos/keyboards.json"),
            max_retries: 5,
        }
    }
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--knowledge" | "-k" => {
                if i + 1 < args.len() {
                    config.knowledge = PathBuf::from(&args[i + 1]);
                    i += 2;
                } else {
                    eprintln!("error: --knowledge requires a value");
                    std::process::exit(1);
                }
            }
            "--max-retries" | "-r" => {
                if i + 1 < args.len() {
                    let retries: u32 = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("error: invalid retry count: {}", args[i + 1]);
                        std::process::exit(1);
                    });
                    config.max_retries = retries;
                    i += 2;
                } else {
                    eprintln!("error: --max-retries requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("elicit-cli - interactive recommendation session");
                println!();
                println!("USAGE:");
                println!("    elicit-cli [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -k, --knowledge <FILE>    Knowledge base JSON [default: demos/keyboards.json]");
                println!("    -r, --max-retries <N>     Malformed answers tolerated per question [default: 5]");
                println!("    -h, --help                Print help information");
                std::process::exit(0);
            }
            other => {
                eprintln!("error: unknown argument: {other}");
                std::process::exit(1);
            }
        }
    }

    config
}

/// Prompts on stdin/stdout with a bounded retry budget per question.
///
/// Every answer is fully validated here (parse shape, option range,
/// arity), so the engine only ever sees well-typed answers.
struct StdinPrompt {
    max_retries: u32,
}

impl StdinPrompt {
    fn read_line(&self) -> ElicitResult<String> {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(ConfigError::from)?;
        Ok(line.trim().to_string())
    }

    fn prompt(&self, text: &str) -> ElicitResult<String> {
        print!("{text}");
        std::io::stdout().flush().map_err(ConfigError::from)?;
        self.read_line()
    }

    fn selection(&self, question: &Question, multiple: bool) -> ElicitResult<Answer> {
        for (i, option) in question.options.iter().enumerate() {
            println!("{}: {}", i + 1, option.value);
        }
        let label = if multiple {
            "Enter option numbers separated by commas (0 for none): "
        } else {
            "Enter an option number: "
        };
        let mut attempts = 0;
        loop {
            let line = self.prompt(label)?;
            match parse_selection(&line, question.options.len(), multiple) {
                Some(indices) => return Ok(Answer::Selection(indices)),
                None => {
                    attempts += 1;
                    if attempts >= self.max_retries {
                        return Err(InputError::RetriesExhausted { attempts }.into());
                    }
                    println!("Malformed answer, please try again.");
                }
            }
        }
    }

    fn yes_no(&self) -> ElicitResult<Answer> {
        println!("1: Yes\n2: No");
        let mut attempts = 0;
        loop {
            let line = self.prompt("Enter an option number: ")?;
            match line.to_ascii_lowercase().as_str() {
                "1" | "y" | "yes" => return Ok(Answer::YesNo(true)),
                "2" | "n" | "no" => return Ok(Answer::YesNo(false)),
                _ => {
                    attempts += 1;
                    if attempts >= self.max_retries {
                        return Err(InputError::RetriesExhausted { attempts }.into());
                    }
                    println!("Malformed answer, please try again.");
                }
            }
        }
    }

    fn number(&self) -> ElicitResult<Answer> {
        let mut attempts = 0;
        loop {
            let line = self.prompt("Enter a number (0 to skip): ")?;
            match line.parse::<f64>() {
                Ok(value) => return Ok(Answer::Number(value)),
                Err(_) => {
                    attempts += 1;
                    if attempts >= self.max_retries {
                        return Err(InputError::RetriesExhausted { attempts }.into());
                    }
                    println!("Malformed answer, please try again.");
                }
            }
        }
    }
}

/// Parses a 1-based selection list into 0-based indices.
fn parse_selection(line: &str, available: usize, multiple: bool) -> Option<Vec<usize>> {
    if multiple && (line.is_empty() || line == "0") {
        return Some(Vec::new());
    }
    let picks: Vec<usize> = line
        .split(',')
        .map(|part| part.trim().parse::<usize>().ok())
        .collect::<Option<Vec<usize>>>()?;
    if !multiple && picks.len() != 1 {
        return None;
    }
    if picks.iter().any(|&p| p == 0 || p > available) {
        return None;
    }
    Some(picks.iter().map(|&p| p - 1).collect())
}

impl AnswerSource for StdinPrompt {
    fn answer(&mut self, id: QuestionId, question: &Question) -> ElicitResult<Answer> {
        println!();
        println!("{id}: {}", question.prompt);
        match question.kind {
            QuestionKind::SingleChoice => self.selection(question, false),
            QuestionKind::MultiChoice | QuestionKind::AttributeToggle => {
                self.selection(question, true)
            }
            QuestionKind::YesNo => self.yes_no(),
            QuestionKind::NumericEntry { .. } => self.number(),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = parse_args();

    let kb = match KnowledgeBase::from_path(&config.knowledge) {
        Ok(kb) => kb,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let session = match Session::new(kb) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut prompt = StdinPrompt {
        max_retries: config.max_retries,
    };
    match session.run(&mut prompt) {
        Ok(report) => {
            println!();
            if report.matched.is_empty() {
                println!("No items match your answers.");
            } else {
                println!("The following items match your answers:");
                for name in &report.matched {
                    println!("  {name}");
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
