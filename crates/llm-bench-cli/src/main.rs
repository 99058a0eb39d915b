mod cli;
mod logging;
mod signal;

#[tokio::main]
async fn main() {
    let code = cli::cli().await;
    std::process::exit(code);
}
