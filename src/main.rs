use clap::Parser;
use picture_verifier_lib::commands;
use picture_verifier_lib::config::AppConfig;
use picture_verifier_lib::models::intake_types::{Notice, NoticeLevel};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "picture-verifier", about = "Upload up to four images and ask about them")]
struct Args {
    /// Image files or folders of images
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Question to ask about every accepted image
    #[arg(short = 'q', long = "ask")]
    question: Option<String>,
}

fn show_notice(notice: &Notice) {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    eprintln!("[{}] {}: {}", tag, notice.title, notice.message);
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let state = match picture_verifier_lib::setup(AppConfig::from_env()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = commands::images::add_images(&state.intake, &args.inputs);
    for notice in outcome.notices() {
        show_notice(&notice);
    }

    state.intake.wait_for_uploads().await;
    if let Some(notice) = state.credentials.take_notice() {
        show_notice(&notice);
    }

    for image in commands::images::list_images(&state.intake) {
        let status = &image.status;
        println!(
            "{} {} {} ({}x{}) {:?} {:.0}%{}",
            status.icon(),
            image.id,
            image.name,
            image.width,
            image.height,
            status.phase,
            status.progress_percent,
            status
                .remote_url
                .as_deref()
                .map(|url| format!(" {}", url))
                .unwrap_or_default()
        );
    }

    if let Some(question) = args.question {
        match commands::chat::ask(&state.intake, &question) {
            Ok(exchanges) => {
                for exchange in exchanges {
                    println!("\n[{}]\n{}", exchange.image_id, exchange.response);
                }
            }
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
