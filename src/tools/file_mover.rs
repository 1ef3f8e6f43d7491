use anyhow::{Context, Result, bail};
use log::debug;
use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Moves `source` to `target`: rename first, copy + fsync + delete when the rename
/// fails (typically across filesystems). An existing target is never overwritten.
pub fn move_file(source: &Path, target: &Path) -> Result<()> {
    if target.exists() {
        bail!("target already exists: {}", target.display());
    }

    match fs::rename(source, target) {
        Ok(()) => {
            debug!("Renamed {} -> {}", source.display(), target.display());
            Ok(())
        }
        Err(rename_err) => {
            debug!(
                "Rename failed for {} ({rename_err}), falling back to copy",
                source.display()
            );
            copy_and_delete(source, target)
                .with_context(|| format!("rename failed first: {rename_err}"))
        }
    }
}

fn copy_and_delete(source: &Path, target: &Path) -> Result<()> {
    if let Err(e) = copy_synced(source, target) {
        // the source stays where it was, so drop the half-written copy
        let _ = fs::remove_file(target);
        return Err(e);
    }

    fs::remove_file(source)
        .with_context(|| format!("failed to delete source {}", source.display()))?;

    Ok(())
}

fn copy_synced(source: &Path, target: &Path) -> Result<()> {
    let mut reader =
        File::open(source).with_context(|| format!("cannot open {}", source.display()))?;
    let mut writer =
        File::create(target).with_context(|| format!("cannot create {}", target.display()))?;

    io::copy(&mut reader, &mut writer).with_context(|| {
        format!("failed to copy {} -> {}", source.display(), target.display())
    })?;
    writer
        .sync_all()
        .with_context(|| format!("failed to flush {}", target.display()))?;

    Ok(())
}
