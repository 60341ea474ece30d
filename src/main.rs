use std::process::ExitCode;

use clap::Parser;
use vision_lens::config::{Cli, Settings};
use vision_lens::error::AppError;
use vision_lens::output::OutputPaths;
use vision_lens::overlay::OverlayStyle;
use vision_lens::session::Session;
use vision_lens::vision::VisionClient;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let settings = Settings::load(&cli)?;
    let client = VisionClient::new(&settings)?;

    let font = settings.label_font()?;

    let session = Session::new(
        &client,
        OverlayStyle::with_font(font),
        OutputPaths::in_dir(&settings.output_dir),
        settings.thumbnail,
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    session.run(stdin, &mut stdout).await
}
