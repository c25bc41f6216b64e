//! Upload one or more CSV files into a Redshift table
//!
//! Run with: cargo run --bin upload_file -- --source-file-name data.csv --table-name sales ...

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use redshift_transfer::cli::{init_tracing, ConnectionArgs};
use redshift_transfer::db::connection::DEFAULT_ROWS_PER_STATEMENT;
use redshift_transfer::ingestion::DEFAULT_BATCH_SIZE;
use redshift_transfer::paths::{self, MatchType};
use redshift_transfer::{
    upload_files, ConflictPolicy, RedshiftWarehouse, TransferTarget, UploadOptions,
};
use tracing::error;

#[derive(Parser)]
#[command(name = "upload_file")]
#[command(about = "Upload CSV files into a Redshift table")]
#[command(version)]
struct Args {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[arg(long, value_enum, default_value_t = MatchType::ExactMatch)]
    source_file_name_match_type: MatchType,

    /// File name, or a regular expression in regex_match mode
    #[arg(long, default_value = "output.csv")]
    source_file_name: String,

    #[arg(long, default_value = "")]
    source_folder_name: String,

    #[arg(long)]
    table_name: String,

    #[arg(long, value_enum, default_value_t = ConflictPolicy::Append)]
    insert_method: ConflictPolicy,

    /// Destination schema; rows are staged in the default schema first
    #[arg(long, default_value = "")]
    schema: String,

    /// Rows read from the CSV per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Rows per INSERT statement
    #[arg(long, default_value_t = DEFAULT_ROWS_PER_STATEMENT)]
    rows_per_statement: usize,
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

    let sources = paths::resolve_sources(
        &args.source_folder_name,
        &args.source_file_name,
        args.source_file_name_match_type,
    )?;
    if args.source_file_name_match_type == MatchType::RegexMatch {
        println!("{} files found. Preparing to upload...", sources.len());
    }

    let target = TransferTarget::new(&args.table_name, Some(&args.schema), args.insert_method);
    let options = UploadOptions {
        batch_size: args.batch_size,
    };

    let mut warehouse = RedshiftWarehouse::connect(&descriptor)
        .await
        .map_err(|e| {
            error!("Failed to connect to database {}", descriptor.database());
            e
        })?
        .with_rows_per_statement(args.rows_per_statement);

    let summaries = upload_files(&mut warehouse, &sources, &target, &options)
        .await
        .map_err(|e| {
            error!(
                "Failed to upload to {} on database {}",
                target.final_table(),
                descriptor.database()
            );
            e
        })?;

    warehouse.close().await?;
    for summary in &summaries {
        println!(
            "{} successfully uploaded to {}.",
            summary.source.display(),
            summary.table
        );
    }
    Ok(())
}
