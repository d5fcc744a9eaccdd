use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use worknear::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "worknear",
    about = "Run the work-near-me marketplace API or walk through a hiring demo",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Post, fill, finish, and rate a job against an in-memory store
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_default_and_accepts_overrides() {
        let cli = Cli::try_parse_from(["worknear"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["worknear", "serve", "--host", "0.0.0.0", "--port", "8080"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(args.port, Some(8080));
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn demo_accepts_search_origin() {
        let cli = Cli::try_parse_from(["worknear", "demo", "--latitude", "41.0", "--json"])
            .expect("parses");
        match cli.command {
            Some(Command::Demo(args)) => {
                assert_eq!(args.latitude, 41.0);
                assert!(args.json);
            }
            other => panic!("expected demo, got {other:?}"),
        }
    }

    #[test]
    fn demo_rejects_non_positive_max_radius() {
        for raw in ["0", "-2", "inf", "wide"] {
            let parsed = Cli::try_parse_from(["worknear", "demo", "--max-radius", raw]);
            assert!(parsed.is_err(), "--max-radius {raw} should be refused");
        }

        let cli = Cli::try_parse_from(["worknear", "demo", "--max-radius", "12.5"])
            .expect("parses");
        match cli.command {
            Some(Command::Demo(args)) => assert_eq!(args.max_radius, 12.5),
            other => panic!("expected demo, got {other:?}"),
        }
    }
}
