use anyhow::Result;
use callscout::harvest::languages;
use callscout::UsageSearch;
use clap::{ArgGroup, Parser};
use tracing_subscriber::{self, EnvFilter};

/// Find real-world call-site examples of a function or class on github.com
#[derive(Parser)]
#[command(name = "callscout", version)]
#[command(group(ArgGroup::new("target").required(true).args(["class_name", "function"])))]
struct Args {
    /// Name of the programming language
    language: String,

    /// Name of the module
    module: String,

    /// Name of the class to be searched
    #[arg(short = 'c', long)]
    class_name: Option<String>,

    /// Name of the function to be searched
    #[arg(short = 'f', long)]
    function: Option<String>,

    /// Lines around each found occurrence
    #[arg(short = 'l', long, default_value_t = 5)]
    lines_around: usize,

    /// The amount of snippets to collect
    #[arg(short = 'e', long, default_value_t = 10)]
    examples: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let first_extension = languages::extensions_for(&args.language)
        .and_then(|extensions| extensions.first())
        .ok_or_else(|| anyhow::anyhow!("unknown language '{}'", args.language))?;
    let report_file = format!("result{first_extension}");

    // Drop any report left over from a previous run
    let _ = std::fs::remove_file(&report_file);

    let target = match (&args.class_name, &args.function) {
        (None, Some(function)) => format!("function '{function}'"),
        (Some(class), _) => format!("class '{class}'"),
        (None, None) => unreachable!("clap enforces exactly one target"),
    };
    println!(
        "{decor} Searching {examples} snippets of size {size} containing {target} from module '{module}' {decor}",
        decor = "=".repeat(20),
        examples = args.examples,
        size = 2 * args.lines_around,
        module = args.module,
    );

    let mut search = UsageSearch::new(&args.language, &args.module)
        .context_lines(args.lines_around)
        .limit(args.examples)
        .report_to(&report_file);

    if let Some(class) = &args.class_name {
        search = search.class(class);
    }
    if let Some(function) = &args.function {
        search = search.function(function);
    }

    let outcome = search.run().await?;
    println!(
        "Found {} occurrences, report written to {}",
        outcome.total_found, report_file
    );

    Ok(())
}
