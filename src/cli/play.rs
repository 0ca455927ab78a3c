//! Interactive play.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use arcanum::bench::OpenRouterAgentFactory;
use arcanum::config::{Config, MemoryStrategy};

use super::common::apply_memory_overrides;

pub(crate) async fn cmd_play(
    mut config: Config,
    model: Option<String>,
    strategy: Option<MemoryStrategy>,
    window_size: Option<usize>,
    deterministic: bool,
) -> Result<()> {
    apply_memory_overrides(&mut config, strategy, window_size);
    config.validate()?;

    let model = model.unwrap_or_else(|| config.provider.default_model.clone());
    let factory = OpenRouterAgentFactory::from_config(&config)?.with_deterministic(deterministic);
    let mut agent = factory
        .agent_for(&model, config.memory.strategy, config.memory.effective_window())
        .with_context(|| "Failed to create narrator")?;

    println!("Welcome to Arcanum! Type 'quit' or 'exit' to leave the game.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("\n> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
                    println!("Goodbye!");
                    break;
                }
                match agent.step(input).await {
                    Ok(response) => println!("\n{}", response),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }

    Ok(())
}
