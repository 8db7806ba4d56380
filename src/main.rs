#[tokio::main]
async fn main() {
    if let Err(e) = lab_backend::run().await {
        eprintln!("lab-backend failed to start: {}", e);
        std::process::exit(1);
    }
}
