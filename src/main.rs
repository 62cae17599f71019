use clap::Parser;
use rtsp_viewer_lib::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rtsp_viewer_lib::run(Cli::parse()).await
}
