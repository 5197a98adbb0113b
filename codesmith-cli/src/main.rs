//! # Codesmith CLI
//!
//! Interactive code generation backed by the Gemini API.
//!
//! Usage:
//!   codesmith
//!   codesmith --model gemini-2.5-pro
//!   codesmith --exec-timeout 30 --no-stream
//!
//! Requires the GEMINI_API_KEY environment variable. Describe the code you
//! want at the prompt; once something is generated you can run it, ask for
//! improvements, start over, or quit.

use clap::Parser;
use codesmith_agent::{CodeGenerator, GeneratorConfig};
use codesmith_core::{
    extract_code_block, CodeBlock, ExecOutcome, Executor, GeminiProvider, LlmProvider,
    ProviderConfig,
};
use std::io::{self, Write};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "codesmith")]
#[command(author, version, about = "Codesmith - interactive code generation with Gemini")]
struct Cli {
    /// Model to use (defaults to the provider default)
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Wall-clock limit for running generated code, in seconds
    #[arg(short = 't', long, default_value = "10")]
    exec_timeout: u64,

    /// Print responses only once they are complete instead of streaming
    #[arg(long)]
    no_stream: bool,

    /// Quiet mode - suppress banners and progress text
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Run,
    Improve,
    StartOver,
    Quit,
}

fn parse_menu(input: &str) -> Option<MenuAction> {
    match input.trim().to_lowercase().as_str() {
        "1" | "r" | "run" => Some(MenuAction::Run),
        "2" | "i" | "improve" => Some(MenuAction::Improve),
        "3" | "n" | "new" => Some(MenuAction::StartOver),
        "4" | "q" | "quit" | "exit" => Some(MenuAction::Quit),
        _ => None,
    }
}

fn is_exit(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "exit" | "quit")
}

/// Prompt and read one line; `None` on end of input
fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Pick the code buffer from a model response: the first fenced block, or the
/// whole response when no block was found
fn select_code(response: &str, quiet: bool) -> CodeBlock {
    match extract_code_block(response) {
        Some(block) => {
            if !quiet {
                println!("\nExtracted code:\n{}", block.source);
            }
            block
        }
        None => {
            if !quiet {
                println!("\nNo fenced code block found; treating the whole response as code.");
            }
            CodeBlock {
                language: None,
                source: response.trim().to_string(),
            }
        }
    }
}

async fn repl(cli: &Cli, generator: &mut CodeGenerator<GeminiProvider>) -> io::Result<()> {
    // The current code buffer; replaced wholesale after each generation or
    // improvement, cleared by "start over"
    let mut buffer: Option<CodeBlock> = None;

    loop {
        let Some(block) = buffer.clone() else {
            let Some(request) = read_line("\nDescribe the code you want: ")? else {
                break;
            };
            if request.is_empty() {
                continue;
            }
            if is_exit(&request) {
                break;
            }

            if !cli.quiet {
                println!("\nGenerating code...\n");
            }
            match generator.generate(&request).await {
                Ok(response) => {
                    if cli.no_stream {
                        println!("{}", response);
                    }
                    buffer = Some(select_code(&response, cli.quiet));
                }
                Err(e) => eprintln!("Code generation failed: {}", e),
            }
            continue;
        };

        println!("\n1. Run the code");
        println!("2. Improve the code");
        println!("3. Start over");
        println!("4. Quit");
        let Some(choice) = read_line("Select: ")? else {
            break;
        };

        match parse_menu(&choice) {
            Some(MenuAction::Run) => {
                run_code(cli, generator, &block, &mut buffer).await?;
            }
            Some(MenuAction::Improve) => {
                let Some(feedback) = read_line("How should the code be improved? ")? else {
                    break;
                };
                if feedback.is_empty() {
                    continue;
                }
                improve_code(cli, generator, &block.source, &feedback, &mut buffer).await;
            }
            Some(MenuAction::StartOver) => {
                buffer = None;
            }
            Some(MenuAction::Quit) => break,
            None => println!("Invalid choice, try again."),
        }
    }

    Ok(())
}

/// Run the current buffer and report the outcome. A failed run offers an
/// improvement round seeded with the captured stderr.
async fn run_code(
    cli: &Cli,
    generator: &mut CodeGenerator<GeminiProvider>,
    block: &CodeBlock,
    buffer: &mut Option<CodeBlock>,
) -> io::Result<()> {
    let executor = Executor::for_language(block.language.as_deref())
        .with_timeout(Duration::from_secs(cli.exec_timeout));

    if !cli.quiet {
        println!("\nRunning with {}...\n", executor.interpreter());
    }

    match executor.run(&block.source).await {
        Ok(ExecOutcome::Success { stdout }) => {
            println!("Execution succeeded:\n{}", stdout);
        }
        Ok(ExecOutcome::NonZeroExit { code, stderr }) => {
            match code {
                Some(code) => println!("Execution failed (exit {}):\n{}", code, stderr),
                None => println!("Execution was killed by a signal:\n{}", stderr),
            }

            let answer = read_line("Improve the code using this error? (y/n): ")?;
            if answer.as_deref().is_some_and(|a| a.eq_ignore_ascii_case("y")) {
                let Some(feedback) = read_line("Describe the change you want: ")? else {
                    return Ok(());
                };
                let combined = format!(
                    "Running the code produced this error:\n{}\n{}",
                    stderr.trim(),
                    feedback
                );
                improve_code(cli, generator, &block.source, &combined, buffer).await;
            }
        }
        Ok(ExecOutcome::TimedOut { limit }) => {
            println!("Execution timed out after {} seconds.", limit.as_secs());
        }
        Err(e) => {
            eprintln!("Could not run the code: {}", e);
        }
    }

    Ok(())
}

/// One improvement round: dispatch, print, re-extract, replace the buffer
async fn improve_code(
    cli: &Cli,
    generator: &mut CodeGenerator<GeminiProvider>,
    code: &str,
    feedback: &str,
    buffer: &mut Option<CodeBlock>,
) {
    if !cli.quiet {
        println!("\nImproving code...\n");
    }
    match generator.improve(code, feedback).await {
        Ok(response) => {
            if cli.no_stream {
                println!("{}", response);
            }
            *buffer = Some(select_code(&response, cli.quiet));
        }
        Err(e) => eprintln!("Code improvement failed: {}", e),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let api_key = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            eprintln!("Error: GEMINI_API_KEY is not set.");
            eprintln!("Export a Gemini API key before running codesmith:");
            eprintln!("  export GEMINI_API_KEY=your-key-here");
            std::process::exit(1);
        }
    };

    let mut provider_config = ProviderConfig::gemini(api_key);
    if let Some(model) = &cli.model {
        provider_config = provider_config.with_model(model);
    }
    let provider = GeminiProvider::new(provider_config);

    if !cli.quiet {
        println!("{}", "=".repeat(50));
        println!("Codesmith - code generation with {}", provider.name());
        println!("{}", "=".repeat(50));
        println!("Type 'exit' or 'quit' at the request prompt to leave.");
    }

    let generator_config = GeneratorConfig {
        model: cli.model.clone(),
        temperature: cli.temperature,
        max_tokens: None,
        stream_output: !cli.no_stream,
    };
    let mut generator = CodeGenerator::with_config(provider, generator_config);

    if let Err(e) = repl(&cli, &mut generator).await {
        eprintln!("Input error: {}", e);
        std::process::exit(1);
    }

    if !cli.quiet {
        let usage = generator.usage();
        if usage.total_calls > 0 {
            println!(
                "\n{} calls, {} tokens ({} prompt / {} completion)",
                usage.total_calls,
                usage.total_tokens(),
                usage.total_prompt_tokens,
                usage.total_completion_tokens
            );
        }
        println!("Goodbye.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu() {
        assert_eq!(parse_menu("1"), Some(MenuAction::Run));
        assert_eq!(parse_menu(" run "), Some(MenuAction::Run));
        assert_eq!(parse_menu("2"), Some(MenuAction::Improve));
        assert_eq!(parse_menu("improve"), Some(MenuAction::Improve));
        assert_eq!(parse_menu("3"), Some(MenuAction::StartOver));
        assert_eq!(parse_menu("4"), Some(MenuAction::Quit));
        assert_eq!(parse_menu("quit"), Some(MenuAction::Quit));
        assert_eq!(parse_menu("5"), None);
        assert_eq!(parse_menu(""), None);
    }

    #[test]
    fn test_is_exit() {
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(is_exit(" exit "));
        assert!(!is_exit("exits"));
        assert!(!is_exit("continue"));
    }

    #[test]
    fn test_select_code_prefers_fenced_block() {
        let response = "Sure:\n```python\nprint('hi')\n```\nDone.";
        let block = select_code(response, true);
        assert_eq!(block.language.as_deref(), Some("python"));
        assert_eq!(block.source, "print('hi')");
    }

    #[test]
    fn test_select_code_falls_back_to_whole_response() {
        let response = "print('no fence here')";
        let block = select_code(response, true);
        assert_eq!(block.language, None);
        assert_eq!(block.source, response);
    }
}
