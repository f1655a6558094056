use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "podsync")]
#[command(about = "Keep an MP3 player in step with a podcast app's downloads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy new MP3s to the destination and propagate deletions both ways
    Sync(SyncArgs),
    /// Copy MP3s whose content is not already anywhere in the destination
    #[command(name = "uniq_copier", alias = "uniq-copier")]
    UniqCopier(UniqCopierArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Destination directory, e.g. the mounted MP3 player
    #[arg(long)]
    pub dest: PathBuf,
    /// Source directory; the app's directory is searched for when omitted
    #[arg(long)]
    pub src: Option<PathBuf>,
    /// Run state file, overriding the configured location
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// Log the planned copies and deletions without performing them
    #[arg(long)]
    pub dry_run: bool,
    /// Exit with status 2 if any file could not be copied or deleted
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct UniqCopierArgs {
    #[arg(long)]
    pub dest: PathBuf,
    #[arg(long)]
    pub src: PathBuf,
    /// Log a fingerprint for every file already in the destination
    #[arg(long = "print_dest_files", alias = "print-dest-files")]
    pub print_dest_files: bool,
    /// Log each source file skipped as a duplicate
    #[arg(long = "print_dupe_notifications", alias = "print-dupe-notifications")]
    pub print_dupe_notifications: bool,
    /// Don't log the files that get copied
    #[arg(
        long = "do_not_print_new_files_in_src_dir",
        alias = "do-not-print-new-files-in-src-dir"
    )]
    pub do_not_print_new_files_in_src_dir: bool,
    /// Log the planned copies without performing them
    #[arg(long)]
    pub dry_run: bool,
    /// Exit with status 2 if any file could not be hashed or copied
    #[arg(long)]
    pub strict: bool,
}
