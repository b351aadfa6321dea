use std::path::Path;

use crate::config::SEAL_KEY_FILE;

pub fn check(data_dir: &Path) -> anyhow::Result<()> {
    let mut errors: Vec<String> = Vec::new();

    // Check 1: data dir writable
    let probe = data_dir.join(".write-probe");
    match std::fs::write(&probe, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
        }
        Err(e) => errors.push(format!(
            "cannot write to {}: {e}\n  \
             → pass --data-dir pointing at a writable directory",
            data_dir.display()
        )),
    }

    // Check 2: seal key, if present, is well-formed
    let seal_path = data_dir.join(SEAL_KEY_FILE);
    if seal_path.exists() {
        match std::fs::metadata(&seal_path) {
            Ok(meta) if meta.len() == 32 => {}
            Ok(meta) => errors.push(format!(
                "{} is {} bytes, expected 32\n  \
                 → restore it from backup; stored entries cannot be read without it",
                seal_path.display(),
                meta.len()
            )),
            Err(e) => errors.push(format!("cannot read {}: {e}", seal_path.display())),
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    for err in &errors {
        eprintln!("ERROR: {err}");
    }
    anyhow::bail!("{} preflight check(s) failed", errors.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_dir_passes() {
        let dir = tempfile::tempdir().unwrap();
        check(dir.path()).unwrap();
    }

    #[test]
    fn test_truncated_seal_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SEAL_KEY_FILE), [0u8; 5]).unwrap();
        assert!(check(dir.path()).is_err());
    }
}
