//! A terminal front-end for the trade assistant widget.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;
use trade_assistant::sinks::WebhookLeadSink;
use trade_assistant::{HostConfig, submit_lead, widget_builder};
use trade_assistant_core::notify::LeadSink;
use trade_assistant_core::{Message, Role, SubmitOutcome, Visibility, Widget};

enum WidgetEvent {
    Message(Message),
    Loading(bool),
    Visibility(Visibility),
}

enum Command<'a> {
    Submit(&'a str),
    Toggle(Visibility),
    Lead {
        email: &'a str,
        phone: Option<&'a str>,
    },
    Transcript,
    Quit,
    Unknown(&'a str),
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match HostConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };

    let page_text = match &config.page_file {
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(text) => Some(text),
            Err(err) => {
                eprintln!("failed to read {}: {err}", path.display());
                return;
            }
        },
        None => None,
    };
    let lead_sink = config.lead_webhook.as_ref().map(|url| {
        Arc::new(WebhookLeadSink::new(url.as_str())) as Arc<dyn LeadSink>
    });

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let widget = widget_builder(&config, page_text)
        .on_message({
            let event_tx = event_tx.clone();
            move |msg| {
                event_tx.send(WidgetEvent::Message(msg.clone())).ok();
            }
        })
        .on_loading({
            let event_tx = event_tx.clone();
            move |loading| {
                event_tx.send(WidgetEvent::Loading(loading)).ok();
            }
        })
        .on_visibility(move |visibility| {
            event_tx.send(WidgetEvent::Visibility(visibility)).ok();
        })
        .build();

    let Ok(snapshot) = widget.snapshot().await else {
        return;
    };
    for msg in snapshot.transcript.messages() {
        print_message(msg);
    }
    println!(
        "{}",
        "Commands: /open, /close, /lead <email> [phone], /transcript, /quit"
            .dimmed()
    );

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    // Lines buffered past the current one must survive between reads.
    let mut input = io::BufReader::new(io::stdin()).lines();

    loop {
        // Things may have happened while the visitor was typing.
        while let Ok(event) = event_rx.try_recv() {
            print_event(&event);
        }

        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut input).await else {
            break;
        };

        match parse_command(line.trim()) {
            Command::Submit(text) => match widget.submit(text).await {
                Ok(SubmitOutcome::Accepted) => {}
                Ok(SubmitOutcome::Ignored) => continue,
                Ok(SubmitOutcome::Busy) => {
                    println!("{}", "Still thinking, hang on.".dimmed());
                    continue;
                }
                Err(err) => {
                    error!("widget stopped: {err}");
                    break;
                }
            },
            Command::Toggle(target) => {
                let Ok(snapshot) = widget.snapshot().await else {
                    break;
                };
                if snapshot.visibility != target
                    && widget.toggle_visibility().await.is_err()
                {
                    break;
                }
                continue;
            }
            Command::Lead { email, phone } => {
                submit_lead(lead_sink.clone(), email, phone);
                println!(
                    "{}✅ Thanks! We'll be in touch at {}.",
                    BAR_CHAR.bright_green(),
                    email.bold()
                );
                continue;
            }
            Command::Transcript => {
                let Ok(snapshot) = widget.snapshot().await else {
                    break;
                };
                match serde_json::to_string_pretty(&snapshot.transcript) {
                    Ok(json) => println!("{json}"),
                    Err(err) => error!("failed to export the transcript: {err}"),
                }
                continue;
            }
            Command::Quit => break,
            Command::Unknown(command) => {
                println!("{}", format!("Unknown command: {command}").dimmed());
                continue;
            }
        }

        if !wait_for_reply(&widget, &mut event_rx, &progress_style).await {
            break;
        }
    }
}

/// Shows a spinner until the pending turn resolves. Returns `false` if the
/// widget has stopped.
async fn wait_for_reply(
    widget: &Widget,
    event_rx: &mut mpsc::UnboundedReceiver<WidgetEvent>,
    progress_style: &ProgressStyle,
) -> bool {
    let mut progress_bar = None;

    loop {
        // Create a new progress bar if it has been finished.
        progress_bar
            .get_or_insert_with(|| {
                let progress_bar = ProgressBar::new_spinner();
                progress_bar.set_style(progress_style.clone());
                progress_bar.set_message("🤔 Thinking...");
                progress_bar
            })
            .inc(1);

        let sleep = sleep(Duration::from_millis(100));
        let event = select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    return false;
                };
                event
            },
            _ = sleep => {
                // Turns without a provider resolve without loading events.
                match widget.snapshot().await {
                    Ok(snapshot) if snapshot.loading => continue,
                    Ok(_) => break,
                    Err(_) => return false,
                }
            }
        };

        // Finish the progress bar before printing anything else.
        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }

        print_event(&event);
        if let WidgetEvent::Loading(false) = event {
            break;
        }
    }

    if let Some(progress_bar) = progress_bar {
        progress_bar.finish_and_clear();
    }
    true
}

fn print_event(event: &WidgetEvent) {
    match event {
        WidgetEvent::Message(msg) if msg.role() == Role::Assistant => {
            print_message(msg);
        }
        WidgetEvent::Visibility(Visibility::Open) => {
            println!("{}", "💬 Chat opened".dimmed());
        }
        WidgetEvent::Visibility(Visibility::Closed) => {
            println!("{}", "💬 Chat closed".dimmed());
        }
        WidgetEvent::Message(_) | WidgetEvent::Loading(_) => {}
    }
}

fn print_message(msg: &Message) {
    if msg.role() != Role::Assistant {
        return;
    }
    if !msg.content().is_empty() {
        println!(
            "{}🤖 {}",
            BAR_CHAR.bright_cyan(),
            msg.content().bright_white()
        );
    }
    if msg.show_booking() {
        println!(
            "{}📅 {} Leave your email with {}",
            BAR_CHAR.bright_yellow(),
            "Book a Missed Job Review ($89).".bold(),
            "/lead <email> [phone]".bright_white()
        );
    }
}

fn parse_command(line: &str) -> Command<'_> {
    let Some(command) = line.strip_prefix('/') else {
        return Command::Submit(line);
    };
    let mut args = command.split_whitespace();
    match args.next() {
        Some("open") => Command::Toggle(Visibility::Open),
        Some("close") => Command::Toggle(Visibility::Closed),
        Some("lead") => match args.next() {
            Some(email) => Command::Lead {
                email,
                phone: args.next(),
            },
            None => Command::Unknown(line),
        },
        Some("transcript") => Command::Transcript,
        Some("quit" | "exit") => Command::Quit,
        _ => Command::Unknown(line),
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(
    input: &mut Lines<R>,
) -> Option<String> {
    match input.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_line_keeps_buffered_lines() {
        let mut input = "hello\n/transcript\n/quit\n".as_bytes().lines();

        let mut seen = vec![];
        while let Some(line) = read_line(&mut input).await {
            seen.push(line);
        }
        assert_eq!(seen, ["hello", "/transcript", "/quit"]);
        assert!(matches!(parse_command(&seen[1]), Command::Transcript));
        assert!(matches!(parse_command(&seen[2]), Command::Quit));
    }
}
