//! Line-oriented front-ends for the tutor and knowledge-base conversations.
//!
//! Each loop is an error boundary: a failing command is reported and the
//! prompt comes back.

use std::fmt::Display;
use std::io::Write;

use services::{AppServices, KnowledgeReply, SubmitOutcome, TutorReply};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tutor_core::model::ExperienceLevel;

use crate::DocsAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Reset,
    Help,
    Exercise,
    Modules,
    Module(&'a str),
    Level(&'a str),
    Unknown(&'a str),
    Message(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return Input::Message(line);
        };
        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(n, r)| (n, r.trim()));
        match name {
            "quit" | "exit" => Input::Quit,
            "reset" => Input::Reset,
            "help" => Input::Help,
            "exercise" => Input::Exercise,
            "modules" => Input::Modules,
            "module" => Input::Module(rest),
            "level" => Input::Level(rest),
            _ => Input::Unknown(trimmed),
        }
    }
}

fn report(err: impl Display) {
    println!("Something went wrong: {err}");
}

fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

async fn read_line(
    lines: &mut Lines<BufReader<Stdin>>,
    prompt: &str,
) -> std::io::Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    lines.next_line().await
}

/// Interactive exercise practice with the tutor agent.
pub async fn tutor_loop(services: &AppServices) -> std::io::Result<()> {
    let tutor = services.tutor();
    let settings = services.settings();
    let catalog = services.catalog();
    let mut lines = stdin_lines();

    print_tutor_help();
    println!("Module: {}", module_label(services, tutor.selected_module().as_str()));

    while let Some(line) = read_line(&mut lines, "tutor> ").await? {
        match Input::parse(&line) {
            Input::Quit => break,
            Input::Help => print_tutor_help(),
            Input::Reset => {
                tutor.conversation().clear();
                println!("Conversation cleared.");
            }
            Input::Modules => {
                for module in catalog.iter() {
                    println!("  {:<24} {}", module.id().as_str(), module.name());
                }
            }
            Input::Module(id) => match tutor.select_module(id) {
                Ok(()) => println!("Module: {}", module_label(services, id)),
                Err(err) => report(err),
            },
            Input::Level(raw) if raw.is_empty() => {
                println!("Experience level: {}", settings.load_level().await);
            }
            Input::Level(raw) => match raw.parse::<ExperienceLevel>() {
                Ok(level) => match settings.save_level(level).await {
                    Ok(()) => println!("Experience level: {level}"),
                    Err(err) => report(err),
                },
                Err(err) => report(err),
            },
            Input::Exercise => {
                let level = settings.load_level().await;
                let outcome = tutor.start_exercise(level).await;
                print_tutor_outcome(&outcome);
            }
            Input::Unknown(command) => println!("Unknown command: {command} (try /help)"),
            Input::Message(text) => {
                let outcome = tutor.submit(text).await;
                print_tutor_outcome(&outcome);
                let scored = matches!(
                    &outcome,
                    SubmitOutcome::Answered { reply, .. } if reply.score.is_some()
                );
                if scored {
                    let id = tutor.selected_module();
                    let count = services.progress().exercise_count(&id).await;
                    let streak = services.progress().displayed_streak().await;
                    println!("Recorded. {count} exercise(s) in this module, {streak}-day streak.");
                }
            }
        }
    }
    Ok(())
}

fn module_label(services: &AppServices, id: &str) -> String {
    services
        .catalog()
        .get(id)
        .map_or_else(|| id.to_owned(), |m| m.name().to_owned())
}

fn print_tutor_help() {
    println!("Commands: /exercise, /module <id>, /modules, /level [name], /reset, /quit");
    println!("Anything else is sent to the tutor.");
}

fn print_tutor_outcome(outcome: &SubmitOutcome<TutorReply>) {
    match outcome {
        SubmitOutcome::Ignored(_) => {}
        SubmitOutcome::Failed(message) => println!("! {message}"),
        SubmitOutcome::Answered { content, reply } => {
            println!();
            println!("{content}");
            if let Some(score) = &reply.score {
                println!();
                println!("Score: {score}/10");
                if let Some(summary) = &reply.feedback_summary {
                    println!("Feedback: {summary}");
                }
            }
            if let Some(level) = &reply.difficulty_level {
                println!("Difficulty: {level}");
            }
            println!();
        }
    }
}

/// Interactive questions to the knowledge-base agent.
pub async fn knowledge_loop(services: &AppServices) -> std::io::Result<()> {
    let knowledge = services.knowledge();
    let mut lines = stdin_lines();

    println!("Ask about PM frameworks. Commands: /reset, /quit. Try one of:");
    print_suggestions(knowledge.suggestions());

    while let Some(line) = read_line(&mut lines, "ask> ").await? {
        let question = match Input::parse(&line) {
            Input::Quit => break,
            Input::Reset => {
                knowledge.conversation().clear();
                println!("Conversation cleared.");
                print_suggestions(knowledge.suggestions());
                continue;
            }
            Input::Message(text) => suggestion(text, knowledge.suggestions()).unwrap_or(text),
            Input::Help => {
                print_suggestions(knowledge.suggestions());
                continue;
            }
            _ => {
                println!("Commands: /reset, /quit");
                continue;
            }
        };
        let outcome = knowledge.ask(question).await;
        print_knowledge_outcome(&outcome);
    }
    Ok(())
}

fn print_suggestions(suggestions: &[&str]) {
    for (n, question) in suggestions.iter().enumerate() {
        println!("  {:>2}. {question}", n + 1);
    }
}

/// A bare number picks a suggested question.
fn suggestion<'a>(text: &str, suggestions: &[&'a str]) -> Option<&'a str> {
    let n: usize = text.trim().parse().ok()?;
    suggestions.get(n.checked_sub(1)?).copied()
}

fn print_knowledge_outcome(outcome: &SubmitOutcome<KnowledgeReply>) {
    match outcome {
        SubmitOutcome::Ignored(_) => {}
        SubmitOutcome::Failed(message) => println!("! {message}"),
        SubmitOutcome::Answered { content, reply } => {
            println!();
            if let Some(name) = &reply.framework_name {
                println!("[{name}]");
            }
            println!("{content}");
            if !reply.key_points.is_empty() {
                println!();
                println!("Key points:");
                for point in &reply.key_points {
                    println!("  - {point}");
                }
            }
            if let Some(tip) = &reply.interview_tip {
                println!();
                println!("Interview tip: {tip}");
            }
            if !reply.related_topics.is_empty() {
                println!("Related: {}", reply.related_topics.join(", "));
            }
            println!();
        }
    }
}

/// One-shot knowledge-base document command.
pub async fn documents(services: &AppServices, action: DocsAction) {
    let documents = services.documents();
    match action {
        DocsAction::List => {
            let listed = documents.refresh().await;
            if listed.is_empty() {
                println!("No documents in the knowledge base.");
            }
            for doc in listed {
                println!(
                    "  {:<40} {:<8} {}",
                    doc.file_name,
                    doc.file_type.as_deref().unwrap_or("-"),
                    doc.status.as_deref().unwrap_or("-"),
                );
            }
        }
        DocsAction::Upload(path) => {
            let status = documents.upload_path(&path).await;
            println!("{}", status.message());
        }
        DocsAction::Delete(name) => {
            if documents.delete(&name).await {
                println!("Deleted {name}.");
            } else {
                report(format!("could not delete {name}"));
            }
        }
    }
}
