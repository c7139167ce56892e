#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dx_core::log();
    dx_server::run().await
}
