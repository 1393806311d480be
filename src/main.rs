//! taskrelay binary: connect, authenticate, relay until terminated.
//!
//! Exit status:
//! - `0` — help requested, or graceful shutdown on a termination signal
//! - `1` — missing required arguments, connection error, authentication
//!   rejection, or an unrecoverable runtime error

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::error::ErrorKind;

use taskrelay::{Config, LogWriter, Relay, RelayError, Subscribe, TcpStore};

#[derive(Parser, Debug)]
#[command(name = "taskrelay", about = "Delayed-task relay over a key-value store")]
struct Args {
    /// Store server IP address.
    #[arg(short = 'i', long)]
    ip: String,

    /// Store server listen port.
    #[arg(short = 'p', long)]
    port: u16,

    /// Store auth password.
    #[arg(short = 'a', long)]
    auth: String,
}

/// Parses arguments with the exit-status contract the relay documents:
/// help exits 0, anything malformed or missing exits 1.
fn parse_args() -> Result<Args, ExitCode> {
    match Args::try_parse() {
        Ok(args) => Ok(args),
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            let _ = err.print();
            Err(ExitCode::SUCCESS)
        }
        Err(err) => {
            let _ = err.print();
            Err(ExitCode::FAILURE)
        }
    }
}

async fn run(args: Args) -> Result<(), RelayError> {
    let addr = format!("{}:{}", args.ip, args.port);
    let store = TcpStore::connect(&addr).await?;
    store.authenticate(&args.auth).await?;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let relay = Relay::new(Config::default(), Arc::new(store), subs);
    relay.run().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(code) => return code,
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("taskrelay: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_connection_arguments_parse() {
        let args =
            Args::try_parse_from(["taskrelay", "-i", "192.168.2.171", "-p", "6379", "-a", "123456"])
                .unwrap();
        assert_eq!(args.ip, "192.168.2.171");
        assert_eq!(args.port, 6379);
        assert_eq!(args.auth, "123456");
    }

    #[test]
    fn test_long_flags_parse() {
        let args = Args::try_parse_from([
            "taskrelay",
            "--ip",
            "10.0.0.1",
            "--port",
            "7000",
            "--auth",
            "pw",
        ])
        .unwrap();
        assert_eq!(args.port, 7000);
    }

    #[test]
    fn test_missing_required_argument_is_an_error() {
        let err = Args::try_parse_from(["taskrelay", "-i", "10.0.0.1", "-p", "6379"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_help_is_distinguishable_from_errors() {
        let err = Args::try_parse_from(["taskrelay", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
