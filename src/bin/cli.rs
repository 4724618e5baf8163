// src/bin/cli.rs
//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Command-line front end for s3tools.
//!
//! Examples:
//! ```bash
//! s3tools-cli list-buckets --filter 'logs-*'
//! s3tools-cli ls        s3://bucket/prefix --filter '*.json'
//! s3tools-cli cat       s3://bucket/key.txt
//! s3tools-cli upload    ./data s3://bucket/prefix --search '*.csv' -j 16
//! s3tools-cli download  s3://bucket/prefix ./out -j 16
//! s3tools-cli cp        s3://src/raw s3://dst --change-prefix raw clean
//! s3tools-cli mv        s3://src/tmp s3://src/archive
//! s3tools-cli rm        s3://bucket/prefix            # dry run
//! s3tools-cli rm        s3://bucket/prefix --execute
//! s3tools-cli presign   s3://bucket/key --method put_object --expires 600
//! ```

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use s3tools::constants::{DEFAULT_CONCURRENCY, DEFAULT_MAX_KEYS, DEFAULT_PRESIGN_EXPIRATION, DEFAULT_UPLOAD_SEARCH};
use s3tools::{
    count_failures, BatchItem, BatchOptions, ClientMethod, ConsoleProgress, CopyPrefixOptions,
    DeleteOptions, DeleteReport, DownloadPrefixOptions, ListOptions, ObjectKey, PresignRequest,
    S3Config, S3Tools,
};

/// Macro to safely print with broken pipe handling
macro_rules! safe_println {
    ($($arg:tt)*) => {
        match writeln!(io::stdout(), $($arg)*) {
            Ok(_) => {},
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                // Gracefully exit on broken pipe (e.g., when piped to head/tail)
                std::process::exit(0);
            }
            Err(e) => return Err(e.into())
        }
    };
}

/// `s3://bucket/key` split into its parts.
#[derive(Clone, Debug)]
struct S3Path {
    bucket: String,
    key: String,
}

impl FromStr for S3Path {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("s3://")
            .context("URI must start with s3://")?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            bail!("URI {s:?} has no bucket");
        }
        Ok(S3Path {
            bucket: bucket.to_string(),
            key: ObjectKey::new(key).into_string(),
        })
    }
}

fn bucket_name(raw: &str) -> &str {
    raw.strip_prefix("s3://").unwrap_or(raw).trim_end_matches('/')
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short = 'v',
        long,
        action = ArgAction::Count,
        help = "Increase log verbosity: -v = Info, -vv = Debug",
    )]
    verbose: u8,

    /// Show a progress bar for batch commands.
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List buckets in the account.
    ListBuckets {
        /// Glob over bucket names.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Create a bucket.
    CreateBucket {
        bucket_name: String,
        /// Location constraint (region) for the new bucket.
        #[arg(long)]
        region: Option<String>,
    },

    /// Delete an (empty) bucket.
    DeleteBucket { bucket_name: String },

    /// List keys under a prefix.
    Ls {
        s3_path: S3Path,
        /// Glob over full keys (`*` matches `/`).
        #[arg(short, long)]
        filter: Option<String>,
        /// Page size used while listing.
        #[arg(long, default_value_t = DEFAULT_MAX_KEYS)]
        max_keys: i32,
    },

    /// Print an object to stdout.
    Cat { s3_path: S3Path },

    /// Upload a file, or every matching file under a folder.
    Upload {
        source: PathBuf,
        dest: S3Path,
        /// Glob for files in the folder (searched recursively).
        #[arg(long, default_value = DEFAULT_UPLOAD_SEARCH)]
        search: String,
        #[arg(short = 'j', long = "jobs", default_value_t = DEFAULT_CONCURRENCY)]
        jobs: usize,
    },

    /// Download every key under a prefix into a folder.
    Download {
        source: S3Path,
        dest: PathBuf,
        #[arg(short, long)]
        filter: Option<String>,
        /// Keep the listed prefix in local paths.
        #[arg(long)]
        keep_prefix: bool,
        #[arg(short = 'j', long = "jobs", default_value_t = DEFAULT_CONCURRENCY)]
        jobs: usize,
    },

    /// Copy every key under a prefix (server side).
    Cp(TransferArgs),

    /// Move every key under a prefix (copy, then delete the source).
    Mv(TransferArgs),

    /// Delete every key under a prefix. Dry run unless --execute is given.
    Rm {
        s3_path: S3Path,
        #[arg(long)]
        execute: bool,
        #[arg(short = 'j', long = "jobs", default_value_t = DEFAULT_CONCURRENCY)]
        jobs: usize,
    },

    /// Print a presigned URL.
    Presign {
        s3_path: S3Path,
        /// get_object, put_object, delete_object or head_object.
        #[arg(long, default_value = "get_object")]
        method: String,
        /// Lifetime in seconds.
        #[arg(long, default_value_t = DEFAULT_PRESIGN_EXPIRATION.as_secs())]
        expires: u64,
    },
}

#[derive(clap::Args)]
struct TransferArgs {
    source: S3Path,
    /// Destination bucket. A key part replaces the source prefix in
    /// destination keys unless --change-prefix is given.
    dest: S3Path,
    #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
    change_prefix: Option<Vec<String>>,
    #[arg(short, long)]
    filter: Option<String>,
    #[arg(short = 'j', long = "jobs", default_value_t = DEFAULT_CONCURRENCY)]
    jobs: usize,
}

impl TransferArgs {
    fn prefix_options(&self) -> CopyPrefixOptions {
        let mut opts = CopyPrefixOptions {
            change_prefix: None,
            filter: self.filter.clone(),
        };
        match &self.change_prefix {
            Some(pair) if pair.len() == 2 => {
                opts = opts.with_change_prefix(pair[0].as_str(), pair[1].as_str());
            }
            _ if !self.dest.key.is_empty() => {
                opts = opts.with_change_prefix(self.source.key.as_str(), self.dest.key.as_str());
            }
            _ => {}
        }
        opts
    }
}

fn batch_options(jobs: usize, progress: bool, label: &str) -> BatchOptions {
    let opts = BatchOptions::default().with_concurrency(jobs);
    if progress {
        opts.with_progress(Arc::new(ConsoleProgress::new(label)))
    } else {
        opts
    }
}

/// A dry run never reaches the batch runner, so it gets no progress bar.
fn delete_options(execute: bool, jobs: usize, progress: bool) -> DeleteOptions {
    DeleteOptions {
        dry_run: !execute,
        batch: batch_options(jobs, progress && execute, "Deleting"),
    }
}

/// Print failed units and turn any failure into a non-zero exit.
fn report<I: std::fmt::Debug, T>(verb: &str, items: &[BatchItem<I, T>]) -> Result<()> {
    let failed = count_failures(items);
    for item in items {
        if let Some(msg) = item.outcome.failure() {
            eprintln!("FAILED {:?}: {}", item.identity, msg);
        }
    }
    if failed > 0 {
        bail!("{} of {} {} failed", failed, items.len(), verb);
    }
    safe_println!("{} {} object(s)", verb, items.len());
    Ok(())
}

/// Main CLI function
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = S3Config::from_env().context("invalid S3 configuration")?;
    info!("connecting with {:?}", config);
    let tools = S3Tools::connect(&config).await.context("failed to build S3 client")?;

    match cli.cmd {
        Command::ListBuckets { filter } => {
            for name in tools.list_buckets(filter.as_deref()).await? {
                safe_println!("{}", name);
            }
        }

        Command::CreateBucket { bucket_name: raw, region } => {
            let name = bucket_name(&raw);
            let cfg = region.map(|r| s3tools::BucketConfig {
                location_constraint: Some(r),
                acl: None,
            });
            tools
                .create_bucket(name, cfg)
                .await
                .with_context(|| format!("creating bucket {name}"))?;
            safe_println!("Created bucket '{}'.", name);
        }

        Command::DeleteBucket { bucket_name: raw } => {
            let name = bucket_name(&raw);
            if tools.delete_bucket(name).await? {
                safe_println!("Deleted bucket '{}'.", name);
            } else {
                bail!("bucket '{}' does not exist", name);
            }
        }

        Command::Ls { s3_path, filter, max_keys } => {
            let mut opts = ListOptions::default().with_max_keys(max_keys);
            opts.filter = filter;
            let keys = tools.list_objects(&s3_path.bucket, s3_path.key.as_str(), &opts).await?;
            for key in &keys {
                safe_println!("{}", key);
            }
            info!("{} key(s) listed", keys.len());
        }

        Command::Cat { s3_path } => {
            let body = tools
                .read_object_to_bytes(&s3_path.bucket, s3_path.key.as_str())
                .await?;
            let mut out = io::stdout().lock();
            match out.write_all(&body) {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => return Ok(()),
                other => other?,
            }
        }

        Command::Upload { source, dest, search, jobs } => {
            if source.is_file() {
                let name = source
                    .file_name()
                    .context("source file has no name")?
                    .to_string_lossy()
                    .to_string();
                let key = ObjectKey::new(&dest.key).join(name.as_str());
                let url = tools.upload_file_to_key(&dest.bucket, key, &source).await?;
                safe_println!("{}", url);
            } else {
                let opts = batch_options(jobs, cli.progress, "Uploading");
                let items = tools
                    .upload_folder_to_prefix(&dest.bucket, dest.key.as_str(), &source, &search, &opts)
                    .await?;
                report("uploaded", &items)?;
            }
        }

        Command::Download { source, dest, filter, keep_prefix, jobs } => {
            let mut prefix_opts = DownloadPrefixOptions::default();
            prefix_opts.filter = filter;
            prefix_opts.remove_prefix = !keep_prefix;
            let opts = batch_options(jobs, cli.progress, "Downloading");
            let items = tools
                .download_prefix_to_folder(&source.bucket, source.key.as_str(), &dest, &prefix_opts, &opts)
                .await?;
            report("downloaded", &items)?;
        }

        Command::Cp(args) => {
            let opts = batch_options(args.jobs, cli.progress, "Copying");
            let items = tools
                .copy_prefix(
                    &args.source.bucket,
                    args.source.key.as_str(),
                    &args.dest.bucket,
                    &args.prefix_options(),
                    &opts,
                )
                .await?;
            report("copied", &items)?;
        }

        Command::Mv(args) => {
            let opts = batch_options(args.jobs, cli.progress, "Moving");
            let items = tools
                .move_prefix(
                    &args.source.bucket,
                    args.source.key.as_str(),
                    &args.dest.bucket,
                    &args.prefix_options(),
                    &opts,
                )
                .await?;
            report("moved", &items)?;
        }

        Command::Rm { s3_path, execute, jobs } => {
            let opts = delete_options(execute, jobs, cli.progress);
            match tools.delete_prefix(&s3_path.bucket, s3_path.key.as_str(), &opts).await? {
                DeleteReport::DryRun(keys) => {
                    for key in &keys {
                        safe_println!("would delete s3://{}/{}", s3_path.bucket, key);
                    }
                    safe_println!("{} key(s) would be deleted; re-run with --execute", keys.len());
                }
                DeleteReport::Deleted(items) => report("deleted", &items)?,
            }
        }

        Command::Presign { s3_path, method, expires } => {
            let method: ClientMethod = method.parse()?;
            let request = PresignRequest::new(method, s3_path.bucket, s3_path.key)
                .with_expiration(Duration::from_secs(expires));
            let url = tools.get_presigned_url(request).await?;
            safe_println!("{}", url);
        }
    }

    Ok(())
}
