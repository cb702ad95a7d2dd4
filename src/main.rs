#[tokio::main]
async fn main() {
    catering::start_server().await;
}
