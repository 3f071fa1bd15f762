use dotenv::dotenv;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if let Err(err) = silencer::run().await {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
