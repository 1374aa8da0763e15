mod cli;
mod infra;
mod routes;
mod server;

use guidance::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
