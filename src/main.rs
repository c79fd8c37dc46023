use clap::Parser;
use netslice::cli::slice::{run_apply, run_check, run_delete, run_render, CommandReport};
use netslice::cli::{handle_completions, handle_config_init, Cli, Commands, ConfigCommands};

fn finish(result: Result<CommandReport, Box<dyn std::error::Error>>) -> Result<(), Box<dyn std::error::Error>> {
    let report = result?;
    println!("{}", report.output);
    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply(args) => finish(run_apply(&args).await),
        Commands::Check(args) => finish(run_check(&args).await),
        Commands::Delete(args) => finish(run_delete(&args).await),
        Commands::Render(args) => run_render(&args).map(|output| println!("{}", output)),
        Commands::Watch(args) => netslice::cli::watch::run_watch(args).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
