use aws_data_mcp::app;
use aws_data_mcp::service::Service;

#[tokio::main]
async fn main() {
    app::init_logging();

    if let Err(e) = app::run(Service::Glue).await {
        tracing::error!("Server error: {:#}", e);
        std::process::exit(1);
    }
}
