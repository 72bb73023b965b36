//! voxcache CLI binary entry point.

use voxcache::cli::Cli;

#[tokio::main]
async fn main() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "voxcache=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match voxcache::cli::run(Cli::parse_args()).await {
        Ok(file_name) => println!("{file_name}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
