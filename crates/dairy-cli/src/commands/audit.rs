//! `dairy audit` - Read a JSON Lines audit log offline.

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand, ValueEnum};
use dairy_audit::{
    AuditFilter, AuditLogger, AuditPage, AuditSort, FileStorage, Pagination, parse_action,
    parse_entity,
};
use dairy_core::AuditConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// List records with optional filters, one page at a time.
    List {
        /// Path to the audit log.
        #[arg(long)]
        file: PathBuf,

        #[command(flatten)]
        args: ListArgs,

        #[arg(long, value_enum, default_value_t = OutputFormat::Lines)]
        format: OutputFormat,
    },

    /// Print a single record as JSON.
    Show {
        /// Path to the audit log.
        #[arg(long)]
        file: PathBuf,

        /// Record id.
        id: Uuid,
    },
}

/// Filters, paging and sorting for `dairy audit list`.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Entity type, e.g. BMC.
    #[arg(long)]
    pub entity: Option<String>,

    #[arg(long)]
    pub entity_id: Option<String>,

    /// Action type, e.g. UPDATE.
    #[arg(long)]
    pub action: Option<String>,

    /// Principal id.
    #[arg(long)]
    pub performed_by: Option<String>,

    /// Inclusive RFC 3339 lower bound on creation time.
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// Inclusive RFC 3339 upper bound on creation time.
    #[arg(long)]
    pub until: Option<DateTime<Utc>>,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, default_value_t = dairy_audit::query::DEFAULT_LIMIT)]
    pub limit: usize,

    /// Sort field: createdAt, updatedAt, action, entity, entityId, performedBy or status.
    #[arg(long)]
    pub sort: Option<String>,

    /// asc or desc.
    #[arg(long)]
    pub order: Option<String>,
}

impl ListArgs {
    fn filter(&self) -> anyhow::Result<AuditFilter> {
        Ok(AuditFilter {
            entity: self.entity.as_deref().map(parse_entity).transpose()?,
            entity_id: self.entity_id.clone(),
            action: self.action.as_deref().map(parse_action).transpose()?,
            performed_by: self.performed_by.clone(),
            start_date: self.since,
            end_date: self.until,
        })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One human-readable line per record.
    Lines,
    /// The page as pretty JSON.
    Json,
}

pub async fn run(cmd: AuditCommand) -> anyhow::Result<()> {
    match cmd {
        AuditCommand::List { file, args, format } => {
            let page = list(&file, &args).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
                OutputFormat::Lines => {
                    for record in page.records {
                        let record = record.map_performer(|p| p.id().to_string());
                        println!("{}", record.to_log_line());
                    }
                    let info = page.page_info;
                    println!(
                        "-- page {}/{} ({} records)",
                        info.page, info.page_count, info.total
                    );
                }
            }
        }

        AuditCommand::Show { file, id } => {
            let logger = open(&file)?;
            let Some(record) = logger.get(id).await? else {
                bail!("no audit record with id {id}");
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }
    Ok(())
}

/// Run a listing against the log at `path`.
pub async fn list(path: &Path, args: &ListArgs) -> anyhow::Result<AuditPage> {
    let logger = open(path)?;
    let sort = AuditSort::parse(args.sort.as_deref(), args.order.as_deref())?;
    let page = logger
        .list(args.filter()?, Pagination::new(args.page, args.limit), sort)
        .await?;
    Ok(page)
}

fn open(path: &Path) -> anyhow::Result<AuditLogger> {
    if !path.exists() {
        bail!("audit log {} does not exist", path.display());
    }
    let storage = FileStorage::open(path)
        .with_context(|| format!("failed to open audit log {}", path.display()))?;
    Ok(AuditLogger::with_storage(
        AuditConfig::default(),
        Arc::new(storage),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dairy_audit::{ActionType, AuditRequest, EntityType};

    async fn seeded_log(dir: &Path) -> PathBuf {
        let path = dir.join("audit.jsonl");
        let logger = AuditLogger::with_storage(
            AuditConfig::default(),
            Arc::new(FileStorage::open(&path).unwrap()),
        );
        for i in 0..3 {
            logger
                .record(
                    AuditRequest::builder(ActionType::Create, EntityType::Bmc)
                        .entity_id(format!("bmc-{i}"))
                        .performed_by("admin-1")
                        .build(),
                )
                .await
                .unwrap();
        }
        logger
            .record(AuditRequest::builder(ActionType::Retrieve, EntityType::Mpc).build())
            .await
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_list_filters_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded_log(dir.path()).await;

        let args = ListArgs {
            entity: Some("BMC".to_string()),
            page: 1,
            limit: 2,
            ..Default::default()
        };
        let page = list(&path, &args).await.unwrap();
        assert_eq!(page.page_info.total, 3);
        assert_eq!(page.page_info.page_count, 2);
        assert_eq!(page.records.len(), 2);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = seeded_log(dir.path()).await;

        let args = ListArgs {
            action: Some("FOO".to_string()),
            page: 1,
            limit: 10,
            ..Default::default()
        };
        assert!(list(&path, &args).await.is_err());

        let args = ListArgs {
            page: 1,
            limit: 0,
            ..Default::default()
        };
        assert!(list(&path, &args).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_log_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list(&dir.path().join("none.jsonl"), &ListArgs::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
