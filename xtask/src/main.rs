use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for tickframe")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and doc in sequence
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates, warnings denied
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Run the batching bench in release mode
    Bench,
    /// Smoke-run the CLI demo scene on the recording backend
    Smoke {
        /// Frames to simulate
        #[arg(short = 'n', long, default_value = "120")]
        frames: u32,
    },
}

/// One cargo invocation and the label printed before it.
struct Step {
    label: &'static str,
    args: Vec<String>,
}

impl Step {
    fn new(label: &'static str, args: &[&str]) -> Self {
        Self {
            label,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn run(&self) -> Result<()> {
        println!("==> {}: cargo {}", self.label, self.args.join(" "));
        let status = Command::new("cargo").args(&self.args).status()?;
        if !status.success() {
            anyhow::bail!("{} failed ({status})", self.label);
        }
        Ok(())
    }
}

fn fmt() -> Step {
    Step::new("fmt", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Step {
    Step::new(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test() -> Step {
    Step::new("test", &["test", "--workspace"])
}

fn doc() -> Step {
    Step::new("doc", &["doc", "--workspace", "--no-deps"])
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let steps = match cli.command {
        Commands::Check => vec![fmt(), clippy(), test(), doc()],
        Commands::Fmt => vec![fmt()],
        Commands::Clippy => vec![clippy()],
        Commands::Test => vec![test()],
        Commands::Doc => vec![doc()],
        Commands::Bench => vec![Step::new(
            "bench",
            &[
                "bench",
                "-p",
                "tickframe-render",
                "--bench",
                "bench_batching",
            ],
        )],
        Commands::Smoke { frames } => {
            let frames = frames.to_string();
            vec![Step::new(
                "smoke",
                &[
                    "run",
                    "-p",
                    "tickframe-cli",
                    "--",
                    "simulate",
                    "--frames",
                    &frames,
                    "--backend",
                    "recording",
                ],
            )]
        }
    };

    for step in &steps {
        step.run()?;
    }
    Ok(())
}
