use clap::{Parser, Subcommand};
use schoolmed_core::{classify, extract, normalize_for_scheme, resolve_for_scheme, DeeplinkConfig};

#[derive(Parser)]
#[command(name = "schoolmed")]
#[command(about = "SchoolMed deep-link diagnostics")]
struct Cli {
    /// Custom URL scheme of the app (defaults to SCHOOLMED_APP_SCHEME or "schoolmedical")
    #[arg(long, global = true)]
    scheme: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print the resolution
    Resolve {
        /// Deep link URL
        url: String,
    },
    /// Print the intent a link is classified as
    Classify {
        /// Deep link URL
        url: String,
    },
    /// Print the parameters recovered from a link
    Params {
        /// Deep link URL
        url: String,
    },
    /// Print the normalised form of a link
    Normalize {
        /// Deep link URL
        url: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = DeeplinkConfig::from_env_values(
        cli.scheme.or_else(|| std::env::var("SCHOOLMED_APP_SCHEME").ok()),
        None,
    )?;
    let scheme = config.app_scheme();

    match cli.command {
        Some(Commands::Resolve { url }) => {
            let resolution = resolve_for_scheme(&url, scheme);
            println!("{}", serde_json::to_string_pretty(&resolution)?);
            match &resolution.route {
                Some(route) => eprintln!("Would navigate to: {}", route.href()),
                None => eprintln!("No screen handles this link."),
            }
        }
        Some(Commands::Classify { url }) => {
            let intent = classify(&normalize_for_scheme(&url, scheme));
            println!("{}", intent);
        }
        Some(Commands::Params { url }) => {
            let params = extract(&normalize_for_scheme(&url, scheme));
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
        Some(Commands::Normalize { url }) => {
            let link = normalize_for_scheme(&url, scheme);
            println!("{}", serde_json::to_string_pretty(&link)?);
        }
        None => {
            println!("Use 'schoolmed --help' for commands");
        }
    }

    Ok(())
}
