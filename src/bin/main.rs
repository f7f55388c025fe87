use bank_prompt_chain::{session::GREETING, AppConfig, ChainDriver, Session};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they do not interleave with the conversation
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    dotenv::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Set GEMINI_API_KEY in the environment or a .env file.");
            std::process::exit(1);
        }
    };

    let driver = ChainDriver::from_config(&config)?;
    info!(strategy = %config.category_strategy, "Bank AI Assistant starting");

    let mut session = Session::new();

    println!("Bank AI Assistant  (/reset for a new conversation, /transcript to review, /quit to exit)\n");
    println!("Assistant: {}\n", GREETING);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "/quit" | "/exit" => break,
            "/reset" => {
                session = Session::new();
                println!("\nAssistant: {}\n", GREETING);
                continue;
            }
            "/transcript" => {
                println!("\n{}", session.formatted_transcript());
                continue;
            }
            _ => {}
        }

        let reply = driver.respond(&mut session, &line).await;
        println!("\nAssistant: {}\n", reply.text);
    }

    info!(turns = session.transcript().len(), "Conversation ended");
    Ok(())
}
