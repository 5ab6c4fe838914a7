//! vqlsh - interactive VQL console
//!
//! Reads statements at the `VQL > ` prompt, completes keywords, plugins,
//! functions and variables with Tab, answers `HELP <name>` and runs `SELECT`
//! and `LET` statements against the builtin evaluator.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode
//! vqlsh
//!
//! # With a config file and an extra scope variable
//! vqlsh --config ./vqlsh.toml --env Hostname=web1 console --format text
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use nu_ansi_term::Color;
use tracing::{Level, info};

use vqlsh::builtin::{BuiltinEvaluator, BuiltinScope};
use vqlsh::catalog::{MemoryArtifacts, SuggestionSource};
use vqlsh::cli::{
    CliInterface, CommandHandler, CommandRegistry, CompletionCommand, ConfigCommand,
    VersionCommand,
};
use vqlsh::error::Result;
use vqlsh::executor::{CancellationController, DispatchOutcome, HelpResolver, StatementRouter};
use vqlsh::formatter::Formatter;
use vqlsh::repl::{CompletionEngine, ConsoleEngine, ConsoleState, VqlCompleter};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Run the selected subcommand, the console by default
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;
    initialize_logging(&cli);

    let registry = CommandRegistry::new()
        .with(Box::new(ConsoleCommand))
        .with(Box::new(VersionCommand))
        .with(Box::new(CompletionCommand))
        .with(Box::new(ConfigCommand));

    registry.run(cli.command_name(), &cli).await
}

/// `vqlsh console`
struct ConsoleCommand;

#[async_trait]
impl CommandHandler for ConsoleCommand {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn run(&self, cli: &CliInterface) -> Result<()> {
        run_console(cli).await
    }
}

/// Wire the collaborators together and run the console until end of input
async fn run_console(cli: &CliInterface) -> Result<()> {
    let settings = cli.settings();

    let scope = Arc::new(BuiltinScope::from_config(cli.config(), &settings.dump_dir)?);
    let artifacts = Arc::new(MemoryArtifacts::from_definitions(&cli.config().artifacts));
    let source = SuggestionSource::new(scope.clone(), Some(artifacts));

    let router = StatementRouter::new(
        Arc::new(BuiltinEvaluator::new(scope)),
        HelpResolver::new(source.clone()),
        CancellationController::ctrl_c(),
    );

    let mut state = ConsoleState::load(&settings.history_file);
    let completer = VqlCompleter::new(CompletionEngine::new(source), settings.max_suggestions);
    let mut console = ConsoleEngine::new(completer, &state)?;
    let printer = OutcomePrinter {
        formatter: Formatter::from_settings(settings),
        use_colors: settings.color_output,
    };

    cli.print_banner();
    info!("Console started with {} history entries", state.len());

    let result = run_console_loop(&mut console, &router, &printer, &mut state).await;

    state.save(&settings.history_file);
    info!("Console finished with {} history entries", state.len());
    result
}

/// Main console loop
async fn run_console_loop(
    console: &mut ConsoleEngine,
    router: &StatementRouter,
    printer: &OutcomePrinter,
    state: &mut ConsoleState,
) -> Result<()> {
    while let Some(line) = console.read_line()? {
        let outcome = router.dispatch(state, &line).await;
        printer.show(outcome);
    }
    Ok(())
}

/// Prints dispatch outcomes
struct OutcomePrinter {
    formatter: Formatter,
    use_colors: bool,
}

impl OutcomePrinter {
    fn show(&self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Ignored => {}
            DispatchOutcome::Executed(Ok(output)) => {
                // LET binds without producing a result set
                if output.columns.is_empty() && output.is_empty() {
                    return;
                }
                match self.formatter.format(&output) {
                    Ok(text) => println!("{}", text),
                    Err(e) => self.error(&format!("Format error: {}", e)),
                }
            }
            DispatchOutcome::Executed(Err(e)) if e.is_cancelled() => {
                eprintln!("{}", self.paint(Color::Yellow, "Query cancelled."));
            }
            DispatchOutcome::Executed(Err(e)) => self.error(&e.to_string()),
            DispatchOutcome::Help(Ok(topic)) => print!("{}", topic),
            DispatchOutcome::Help(Err(e)) => println!("{}", e),
        }
    }

    fn error(&self, message: &str) {
        eprintln!("{}", self.paint(Color::Red, message));
    }

    fn paint(&self, color: Color, text: &str) -> String {
        if self.use_colors {
            color.paint(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with merged logging settings
fn initialize_logging(cli: &CliInterface) {
    let level: Level = cli.config().logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
