//! WAL archive cleanup
//!
//! After retention has run, the oldest surviving backup history file marks
//! the oldest base backup that can still be restored. Every WAL segment older
//! than that file is dead weight; pg_archivecleanup removes them.

use std::path::Path;

use tracing::{debug, info};

use super::retention::{oldest_entry, EntryKind};
use crate::error::KeeperResult;
use crate::runner::{ToolCommand, ToolRunner};

/// Run the archive cleanup tool against the oldest surviving history file
///
/// The archive root is listed again rather than reusing the pruning result,
/// so history files archived while the cycle ran are honoured.
///
/// Returns the file name passed to the tool, or `None` when the archive holds
/// no history file and the tool was not run.
pub fn clean_archive<R: ToolRunner>(
    runner: &R,
    tool: &Path,
    archive_root: &Path,
) -> KeeperResult<Option<String>> {
    let Some(oldest) = oldest_entry(archive_root, EntryKind::ArchiveFile)? else {
        debug!(
            "No backup history file in {}, skipping archive cleanup",
            archive_root.display()
        );
        return Ok(None);
    };

    let boundary = match oldest.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return Ok(None),
    };

    info!(
        "Running {} to clean the archives created before {}",
        tool.display(),
        boundary
    );

    let command = ToolCommand::new(tool).arg(archive_root).arg(&boundary);
    runner.run(&command)?;

    Ok(Some(boundary))
}
