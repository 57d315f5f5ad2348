use std::io::{BufRead, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use farsight_core::domain::message::{ChatMessage, Sender};
use farsight_core::domain::recommendation::{Recommendation, StructuredRecommendation};

mod proxy;
mod session;

use proxy::ProxyClient;
use session::{transition, Effect, Event, SessionState};

const DEFAULT_API_BASE: &str = "http://localhost:3001";
const GREETING: &str =
    "Hello — attach a snapshot with /attach and add your question (or just type a question), then press enter to send.";

#[derive(Debug, Parser)]
#[command(name = "farsight_chat", about = "Terminal client for the farsight proxy")]
struct Args {
    /// Base URL of the proxy. Falls back to API_BASE, then the default.
    #[arg(long)]
    api_base: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let api_base = args
        .api_base
        .or_else(|| std::env::var("API_BASE").ok())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    let client = ProxyClient::new(&api_base)?;

    match client.health().await {
        Some(report) if report.gateway_reachable => {
            let names: Vec<&str> = report.models.iter().map(|m| m.name.as_str()).collect();
            tracing::info!(models = ?names, "model gateway reachable");
        }
        Some(_) => tracing::warn!("proxy is up but the model gateway is unreachable"),
        None => tracing::warn!(%api_base, "proxy health check failed"),
    }

    let mut state = SessionState::with_greeting(GREETING);
    let mut rendered = render_new(&state, 0);

    let stdin = std::io::stdin();
    loop {
        prompt_line(&state)?;
        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line?;
        let input = line.trim();

        if input == "/quit" || input == "/exit" {
            break;
        }

        let Some(event) = event_for(&state, input) else {
            continue;
        };

        let mut effect = transition(&mut state, event);
        rendered = render_new(&state, rendered);

        while let Some(next) = effect {
            effect = match execute(&client, next).await {
                Some(event) => transition(&mut state, event),
                None => None,
            };
            rendered = render_new(&state, rendered);
        }
    }

    Ok(())
}

/// Map one line of input to a session event. With the attachment menu open,
/// the line is a file path (empty cancels).
fn event_for(state: &SessionState, input: &str) -> Option<Event> {
    if state.menu_open {
        if input.is_empty() {
            return Some(Event::MenuDismissed);
        }
        return match std::fs::read(input) {
            Ok(file) => Some(Event::FileChosen { file }),
            Err(err) => {
                // Leave the menu open so the path can be corrected.
                eprintln!("could not read {input}: {err}");
                None
            }
        };
    }

    match input {
        "/attach" => Some(Event::MenuToggled),
        _ => Some(Event::Submitted {
            text: input.to_string(),
        }),
    }
}

async fn execute(client: &ProxyClient, effect: Effect) -> Option<Event> {
    match effect {
        Effect::DecodePreview { file } => Some(Event::PreviewDecoded {
            data_url: preview_data_url(&file),
        }),
        Effect::SendChat { message } => match client.chat(&message).await {
            Ok(raw) => Some(Event::ChatReplyReceived { raw }),
            Err(message) => Some(Event::SendFailed { message }),
        },
        Effect::SendImage { image, message } => {
            match client.image(image, message.as_deref()).await {
                Ok(reply) => Some(Event::ImageReplyReceived { reply }),
                Err(message) => Some(Event::SendFailed { message }),
            }
        }
    }
}

fn preview_data_url(file: &[u8]) -> String {
    format!("data:{};base64,{}", image_mime(file), BASE64.encode(file))
}

fn image_mime(file: &[u8]) -> &'static str {
    if file.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if file.starts_with(&[0xFF, 0xD8]) {
        "image/jpeg"
    } else if file.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}

fn prompt_line(state: &SessionState) -> anyhow::Result<()> {
    let mut out = std::io::stdout();
    if state.menu_open {
        write!(out, "attach (file path, empty line cancels)> ")?;
    } else if let Some(pending) = &state.pending {
        let size_kb = pending.file.len() / 1024;
        let preview = if pending.preview_data_url.is_some() {
            "preview ready"
        } else {
            "decoding preview"
        };
        write!(out, "[{size_kb} KB attached, {preview}]> ")?;
    } else {
        write!(out, "> ")?;
    }
    out.flush()?;
    Ok(())
}

fn render_new(state: &SessionState, rendered: usize) -> usize {
    for message in &state.messages[rendered..] {
        render_message(message);
    }
    state.messages.len()
}

fn render_message(message: &ChatMessage) {
    match message.sender {
        Sender::User => {
            let text = if message.text.is_empty() && message.has_attachment {
                "(Image + no text)"
            } else {
                message.text.as_str()
            };
            let tag = if message.has_attachment { " [image]" } else { "" };
            println!("{}{} {}", style("you:").bold(), tag, text);
        }
        Sender::Assistant => {
            println!("{} {}", style("assistant:").cyan().bold(), message.text);
            if let Some(structured) = &message.structured {
                render_structured(structured);
            }
        }
    }
}

fn render_structured(s: &StructuredRecommendation) {
    let pill = match s.recommendation {
        Recommendation::Buy => style(s.recommendation.as_str()).green().bold(),
        Recommendation::Sell => style(s.recommendation.as_str()).red().bold(),
        Recommendation::Hold => style(s.recommendation.as_str()).yellow().bold(),
        Recommendation::NoAction => style(s.recommendation.as_str()).dim().bold(),
    };
    println!(
        "  {} {}  confidence {:.0}%  risk {}/100",
        style("recommendation:").bold(),
        pill,
        s.confidence * 100.0,
        s.risk_score
    );
    println!("  rationale: {}", s.rationale);
    for (i, step) in s.steps.iter().enumerate() {
        println!("    {}. {step}", i + 1);
    }
    if let Some(note) = &s.note {
        println!("  note: {note}");
    }
}
