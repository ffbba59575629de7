//! Interactive voice-to-image demo against a running sketch-gateway.
//!
//! Run the gateway first (`cargo run -p sketch-gateway`), then:
//! `cargo run -p sketch-workflow --example sketch_demo`
//!
//! Commands: record, stop, prompt <text>, image, quit.

use sketch_workflow::{HttpSketchApi, MicRecorder, Workflow, WorkflowState};
use std::io::{BufRead, Write};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[sketch_demo] .env not loaded: {} (using system environment)", e);
    }
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let gateway_url =
        std::env::var("SKETCH_GATEWAY_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".into());
    println!("Gateway: {}", gateway_url);
    println!("Commands: record | stop | prompt <text> | image | quit");

    let mut workflow = Workflow::new(MicRecorder::default(), HttpSketchApi::new(&gateway_url)?);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        match line {
            "record" => {
                workflow.start_recording();
                println!("Recording... type 'stop' to transcribe.");
            }
            "stop" => {
                println!("Processing audio...");
                workflow.stop_and_process().await;
                match workflow.state() {
                    WorkflowState::Error(msg) => println!("Error: {}", msg),
                    _ => println!("Prompt: {}", workflow.prompt()),
                }
            }
            "image" => {
                println!("Generating image...");
                workflow.generate_image().await;
                match workflow.state() {
                    WorkflowState::Error(msg) => println!("Error: {}", msg),
                    _ => println!("Image: {}", workflow.image_url().unwrap_or("<none>")),
                }
            }
            "quit" | "exit" => break,
            other => {
                if let Some(text) = other.strip_prefix("prompt ") {
                    workflow.set_prompt(text);
                    println!("Prompt set.");
                } else if !other.is_empty() {
                    println!("Unknown command: {}", other);
                }
            }
        }
    }

    Ok(())
}
