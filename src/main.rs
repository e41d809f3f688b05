#[tokio::main]
async fn main() {
    if let Err(e) = skiff::run().await {
        eprintln!("skiff: {}", e);
        std::process::exit(1);
    }
}
