use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use farescout::api::AppState;
use farescout::{web, BestValueRanker, FarescoutConfig, TequilaClient};

const USAGE: &str =
    "Usage: farescout --from <place> --to <place>... | farescout serve [--port <port>]";

enum Command {
    /// One-shot best-value search printed to stdout
    Search { from: String, to: Vec<String> },
    /// Run the HTTP API
    Serve { port: Option<u16> },
}

fn parse_args(args: &[String]) -> std::result::Result<Command, String> {
    if args.first().map(String::as_str) == Some("serve") {
        let mut port = None;
        let mut iter = args[1..].iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--port" => {
                    let value = iter.next().ok_or("--port requires a value")?;
                    port = Some(
                        value
                            .parse::<u16>()
                            .map_err(|_| format!("Invalid port: {value}"))?,
                    );
                }
                other => return Err(format!("Unknown argument: {other}")),
            }
        }
        return Ok(Command::Serve { port });
    }

    let mut from = None;
    let mut to = Vec::new();
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--from" => {
                from = Some(iter.next().ok_or("--from requires a value")?.clone());
            }
            "--to" => {
                while iter.peek().is_some_and(|next| !next.starts_with("--")) {
                    if let Some(value) = iter.next() {
                        to.push(value.clone());
                    }
                }
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
    }

    let from = from.ok_or("--from is required")?;
    if to.is_empty() {
        return Err("--to requires at least one destination".to_string());
    }
    Ok(Command::Search { from, to })
}

async fn run(command: Command) -> Result<()> {
    let config = FarescoutConfig::load()?;
    let client = TequilaClient::new(&config)?;

    match command {
        Command::Search { from, to } => {
            let ranker = BestValueRanker::new(&client, config.search.currency.as_str());
            match ranker.rank(&from, &to).await? {
                Some(best) => {
                    println!("{}", best.destination);
                    println!("${}/km", best.price_per_km);
                }
                None => println!("No flights found in the next 24 hours."),
            }
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let state = Arc::new(AppState {
                api: Box::new(client),
                config,
            });
            web::run(state, port).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("farescout=info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_search_args() {
        let command = parse_args(&args(&["--from", "Madrid", "--to", "Paris", "Rome"])).unwrap();
        match command {
            Command::Search { from, to } => {
                assert_eq!(from, "Madrid");
                assert_eq!(to, vec!["Paris".to_string(), "Rome".to_string()]);
            }
            Command::Serve { .. } => panic!("expected a search command"),
        }
    }

    #[test]
    fn test_parse_flags_in_either_order() {
        let command = parse_args(&args(&["--to", "Paris", "--from", "Madrid"])).unwrap();
        assert!(matches!(command, Command::Search { .. }));
    }

    #[test]
    fn test_parse_search_requires_from_and_to() {
        assert!(parse_args(&args(&["--to", "Paris"])).is_err());
        assert!(parse_args(&args(&["--from", "Madrid"])).is_err());
        assert!(parse_args(&args(&["--from", "Madrid", "--to"])).is_err());
    }

    #[test]
    fn test_parse_serve_args() {
        match parse_args(&args(&["serve"])).unwrap() {
            Command::Serve { port } => assert!(port.is_none()),
            Command::Search { .. } => panic!("expected a serve command"),
        }

        match parse_args(&args(&["serve", "--port", "9000"])).unwrap() {
            Command::Serve { port } => assert_eq!(port, Some(9000)),
            Command::Search { .. } => panic!("expected a serve command"),
        }
    }

    #[test]
    fn test_parse_serve_rejects_bad_port() {
        assert!(parse_args(&args(&["serve", "--port", "nope"])).is_err());
        assert!(parse_args(&args(&["serve", "--port"])).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_flags() {
        assert!(parse_args(&args(&["--fro", "Madrid"])).is_err());
    }
}
