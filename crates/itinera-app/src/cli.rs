use clap::Parser;

/// Itinera — a conversational travel-itinerary planner.
#[derive(Parser, Debug)]
#[command(name = "itinera", version, about)]
pub struct Args {
    /// Gemini model override (default: gemini-2.0-flash).
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
