use refinery::{Error, Migration, Runner};
use tokio_postgres::Client;

mod types;
mod versions;

pub async fn run(client: &mut Client) -> Result<(), Error> {
    let migrations = versions::build()
        .iter()
        .enumerate()
        .map(|(idx, version)| Migration::unapplied(&version.file_name(idx + 1), &version.sql()))
        .collect::<Result<Vec<_>, _>>()?;
    let report = Runner::new(&migrations).run_async(client).await?;
    if report.applied_migrations().is_empty() {
        log::info!("Schema is up to date");
    }
    for migration in report.applied_migrations() {
        log::info!("Applied migration {}", migration);
    }
    Ok(())
}
