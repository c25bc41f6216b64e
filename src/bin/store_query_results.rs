//! Run a query against Redshift and store the results as a CSV file
//!
//! Run with: cargo run --bin store_query_results -- --query "select 1" --host ...

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use redshift_transfer::cli::{init_tracing, parse_bool, ConnectionArgs};
use redshift_transfer::ingestion::DEFAULT_BATCH_SIZE;
use redshift_transfer::{paths, store_query_results, ExportOptions, RedshiftWarehouse};
use tracing::error;

#[derive(Parser)]
#[command(name = "store_query_results")]
#[command(about = "Store the results of a Redshift query as a CSV file")]
#[command(version)]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// SQL query to run
    #[arg(long)]
    query: String,

    #[arg(long, default_value = "output.csv")]
    destination_file_name: String,

    #[arg(long, default_value = "")]
    destination_folder_name: String,

    /// Write a header row ("True"/"true"/"TRUE" enable it)
    #[arg(long, default_value = "True")]
    file_header: String,

    /// Rows fetched and written per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let descriptor = match args.connection.resolve_from_env() {
        Ok(descriptor) => descriptor,
        Err(e) => Args::command()
            .error(ErrorKind::MissingRequiredArgument, e.to_string())
            .exit(),
    };

    let destination = paths::combine(&args.destination_folder_name, &args.destination_file_name);
    let options = ExportOptions {
        batch_size: args.batch_size,
        write_header: parse_bool(&args.file_header),
    };

    let mut warehouse = RedshiftWarehouse::connect(&descriptor).await.map_err(|e| {
        error!("Failed to connect to database {}", descriptor.database());
        e
    })?;

    let summary = store_query_results(&mut warehouse, &args.query, &destination, &options)
        .await
        .map_err(|e| {
            error!("Failed to store results of query on database {}", descriptor.database());
            e
        })?;

    warehouse.close().await?;
    println!("Successfully stored results as {}.", summary.destination.display());
    Ok(())
}
