use clap::Parser;
use sift_cli::{CliArgs, SiftCli, init_logging};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(args.verbose, args.quiet);

    let result = match SiftCli::from_args(&args) {
        Ok(cli) => cli.run(args).await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "command failed");
        std::process::exit(1);
    }
}
