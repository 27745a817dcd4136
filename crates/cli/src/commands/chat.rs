//! `switchyard chat` — Interactive or single-message chat mode.

use std::sync::Arc;
use switchyard_config::AppConfig;
use switchyard_runtime::Runtime;
use switchyard_telemetry::LogEvent;
use tokio::io::AsyncBufReadExt;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for an API key early — give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    SWITCHYARD_API_KEY=sk-...   (generic)");
        eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let runtime = Arc::new(Runtime::connect(&config).await?);

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Routing...");
        let result = runtime.handle(&msg).await;
        eprint!("\r           \r");
        match result {
            Ok(reply) => println!("{reply}"),
            Err(e) => {
                runtime.shutdown().await;
                return Err(failure_message(&e).into());
            }
        }
        runtime.shutdown().await;
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Switchyard — Interactive Mode");
    println!();
    println!("  Model:   {}", config.engine.model);
    println!("  Agents:  {}", agent_summary(&runtime));
    println!();
    println!("  Type a message and press Enter.");
    println!("  Commands: /logs, /reset, exit");
    println!();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    print_prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            "exit" | "quit" => break,
            "/logs" => print_logs(&runtime.tail(50)),
            "/reset" => {
                runtime.reset();
                println!("  Timeline cleared.");
            }
            _ => match runtime.handle(line).await {
                Ok(reply) => {
                    println!();
                    for reply_line in reply.lines() {
                        println!("  > {reply_line}");
                    }
                    println!();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Request handling failed");
                    println!("  {}", failure_message(&e));
                }
            },
        }
        print_prompt();
    }

    runtime.shutdown().await;
    Ok(())
}

fn print_prompt() {
    use std::io::Write;
    print!("  You > ");
    let _ = std::io::stdout().flush();
}

fn agent_summary(runtime: &Runtime) -> String {
    if runtime.agents().is_empty() {
        return "none configured".into();
    }
    runtime
        .agents()
        .iter()
        .map(|a| format!("{} ({} tools)", a.name(), a.tool_count()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_logs(events: &[LogEvent]) {
    if events.is_empty() {
        println!("  Timeline is empty.");
        return;
    }
    for event in events {
        println!(
            "  [{}] {:<14} {:<7} {}",
            event.timestamp.format("%H:%M:%S%.3f"),
            event.agent,
            event.stage,
            event.message
        );
    }
}

fn failure_message(e: &switchyard_core::Error) -> String {
    format!("Something went wrong handling that request ({e}). Try /reset, or restart switchyard.")
}
