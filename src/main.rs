#[tokio::main]
async fn main() {
    peli::start_server().await;
}
