//! DemiDoc — terminal client for the DemiDoc document-analysis backend
//!
//! Upload a PDF, then ask questions about it; answers stream back
//! incrementally as the backend generates them.

mod chat;
mod client;
mod render;
mod runtime;
mod session;
mod stream;
mod view;

use client::HttpBackend;
use runtime::ChatRuntime;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use view::TerminalView;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("DEMIDOC_LOG")
                .unwrap_or_else(|_| "demidoc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let server =
        std::env::var("DEMIDOC_SERVER").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
    tracing::info!(%server, "starting client");

    let backend = Arc::new(HttpBackend::new(&server));
    let mut runtime = ChatRuntime::new(backend, TerminalView::new());

    // Ctrl-C while an answer is streaming abandons the stream and resets
    // the session; at the prompt it does nothing.
    let reset = runtime.reset_handle();
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            reset.abort();
        }
    });

    println!("DemiDoc — ask questions about your document.");
    println!("Commands: /open <file.pdf>   /history   /reset   /quit");

    if let Some(path) = std::env::args().nth(1) {
        runtime.open_document(Path::new(&path)).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(&runtime);
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "/quit" || line == "/q" {
            break;
        }
        if line == "/reset" {
            runtime.reset();
        } else if line == "/history" {
            runtime.show_history();
        } else if line == "/open" {
            println!("Usage: /open <file.pdf>");
        } else if let Some(path) = line.strip_prefix("/open ") {
            runtime.open_document(Path::new(path.trim())).await;
        } else if line.starts_with('/') {
            println!("Unknown command: {line}");
        } else if !line.is_empty() {
            runtime.submit_query(line).await;
        }
        prompt(&runtime);
    }

    Ok(())
}

fn prompt(runtime: &ChatRuntime<TerminalView>) {
    use std::io::Write;
    if runtime.phase().accepts_query() {
        print!("> ");
    } else {
        print!("(/open <file.pdf> to begin) > ");
    }
    let _ = std::io::stdout().flush();
}
