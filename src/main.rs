use moneylog::config::AppConfig;
use moneylog::error::AppError;

#[rocket::main]
async fn main() -> Result<(), AppError> {
    moneylog::init_tracing();
    let config = AppConfig::load();
    moneylog::build(config)?
        .launch()
        .await
        .map_err(|err| AppError::Launch(err.to_string()))?;
    Ok(())
}
