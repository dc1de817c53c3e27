//! Run coordination: fetch, write, ledger, watermark, history, push.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use metarepo_api::{resolve_collections, Fetcher, MetadataClient};
use metarepo_core::{build_commit_groups, ChangeLedger, ChangeRecord, Watermark, WorkingTree};
use metarepo_git::{GitError, Identity, MirrorRepo, SshCredentials};

use crate::config::UserConfig;

/// Outcome of one mirror run.
pub struct RunSummary {
    pub run_id: Uuid,
    pub collections: usize,
    pub records: usize,
    pub commits: usize,
    pub pushed: bool,
}

/// Drive a full mirror run. The temporary working tree is removed on every
/// exit path unless the configuration asks to keep it.
pub async fn run(config: UserConfig) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    info!(%run_id, "Starting mirror run");

    let remote_url = config
        .repo
        .url
        .clone()
        .ok_or(GitError::MissingRemoteRepository)?;

    let temp = tempfile::TempDir::new().context("Unable to create working directory")?;
    debug!(path = %temp.path().display(), "Working dir");

    let result = run_in_tree(&config, &remote_url, run_id, &temp).await;

    if config.keep_working_dir() {
        let path = temp.keep();
        info!(path = %path.display(), "Keeping working directory");
    }

    result
}

async fn run_in_tree(
    config: &UserConfig,
    remote_url: &str,
    run_id: Uuid,
    temp: &tempfile::TempDir,
) -> Result<RunSummary> {
    let started = Utc::now();
    let committer = Identity::new(&config.repo.committer.name, &config.repo.committer.email);
    let ssh = SshCredentials {
        public_key: config.repo.ssh.public_key.clone(),
        private_key: config.repo.ssh.private_key.clone(),
        passphrase: config.repo.ssh.passphrase.clone(),
    };

    let mirror = MirrorRepo::clone_or_init(
        remote_url,
        &config.repo.branch,
        temp.path(),
        ssh,
        &committer,
    )
    .context("Unable to prepare the mirror repository")?;

    let tree = WorkingTree::new(temp.path());
    let watermark = Watermark::read(&tree, &config.repo.status_file_name);
    match watermark.last_updated {
        Some(since) => info!(%since, "Resuming from watermark"),
        None => info!("No previous watermark, fetching full history"),
    }

    let client = MetadataClient::new(
        &config.api.base_url,
        &config.api.username,
        &config.api.password,
    )
    .context("Unable to build the API client")?;
    let fetcher = Fetcher::new(client.clone());

    let collections = resolve_collections(
        &client,
        config.metadata.inclusions.as_deref(),
        &config.metadata.exclusions,
    )
    .await
    .context("Unable to resolve remote collections")?;
    info!(collections = collections.len(), "Resolved collections");

    let mut ledger = ChangeLedger::new();
    let mut records_written = 0usize;

    for collection in &collections {
        let special = config.metadata.special.contains(collection);
        let mut page = 1u32;
        let mut page_count = 1u32;

        while page <= page_count {
            if page_count > 1 {
                debug!(%collection, page, page_count, "Fetching page");
            } else {
                debug!(%collection, "Fetching collection");
            }

            let fetched = fetcher
                .fetch_page(collection, page, watermark.last_updated, special)
                .await
                .with_context(|| format!("Fetching collection {collection}"))?;
            page = fetched.pager.page + 1;
            page_count = fetched.pager.page_count;

            for raw in &fetched.records {
                let Some(record) = ChangeRecord::from_value(collection, raw) else {
                    debug!(%collection, "Skipping record without id");
                    continue;
                };

                tree.write_record(&record, raw)
                    .with_context(|| format!("Writing record {}", record.id))?;
                records_written += 1;

                if !config.repo.ignore_history && !special {
                    ledger.append(record);
                }
            }
        }
    }

    Watermark::write(&tree, &config.repo.status_file_name, started)
        .context("Updating watermark")?;

    let groups = build_commit_groups(&ledger);
    info!(
        groups = groups.len(),
        records = ledger.len(),
        "Reconstructing history"
    );
    for group in &groups {
        mirror
            .commit_group(group, &committer, config.repo.hide_author)
            .with_context(|| format!("Committing changes for {}", group.key.day_label()))?;
    }

    mirror
        .commit_all("Update metadata mirror", &committer)
        .context("Creating sweep commit")?;

    let pushed = if config.repo.push_to_remote {
        mirror.push().context("Pushing to remote")?;
        true
    } else {
        debug!("Push disabled, leaving commits local");
        false
    };

    Ok(RunSummary {
        run_id,
        collections: collections.len(),
        records: records_written,
        commits: groups.len() + 1,
        pushed,
    })
}
