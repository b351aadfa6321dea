use std::sync::Arc;

use secretbind::storage::{DiskStorage, Storage, StorageError, disk};
use secretbind::system::StaticSystemView;
use secretbind::{IssuanceService, IssueRequest};

#[test]
fn test_disk_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let key = [0xabu8; 32];

    {
        let storage = DiskStorage::new(key, dir.path().to_path_buf()).unwrap();
        storage.put("bindings/abc", b"payload".to_vec()).unwrap();
    }

    // Reopen from disk
    let storage = DiskStorage::new(key, dir.path().to_path_buf()).unwrap();
    assert_eq!(
        storage.get("bindings/abc").unwrap().as_deref(),
        Some(&b"payload"[..])
    );
    assert!(storage.get("bindings/missing").unwrap().is_none());

    // Overwrite replaces
    storage.put("bindings/abc", b"second".to_vec()).unwrap();
    assert_eq!(
        storage.get("bindings/abc").unwrap().as_deref(),
        Some(&b"second"[..])
    );
}

#[test]
fn test_disk_file_is_encrypted() {
    let dir = tempfile::tempdir().unwrap();
    let storage = DiskStorage::new([0x01u8; 32], dir.path().to_path_buf()).unwrap();
    storage
        .put("selector/sel", b"binding-name-plaintext".to_vec())
        .unwrap();

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_str().unwrap();
    assert_eq!(name, format!("{}.bin", hex::encode("selector/sel")));

    let raw = std::fs::read(&files[0]).unwrap();
    assert!(!raw.windows(22).any(|w| w == b"binding-name-plaintext"));
}

#[test]
fn test_disk_delete() {
    let dir = tempfile::tempdir().unwrap();
    let storage = DiskStorage::new([0xefu8; 32], dir.path().to_path_buf()).unwrap();

    storage.put("k", b"v".to_vec()).unwrap();
    storage.delete("k").unwrap();
    assert!(storage.get("k").unwrap().is_none());

    // Deleting again is fine
    storage.delete("k").unwrap();
}

#[test]
fn test_disk_wrong_key_fails() {
    // Write with key A, read with key B: the AES-GCM tag check must fail.
    let dir = tempfile::tempdir().unwrap();
    let storage_a = DiskStorage::new([0x11u8; 32], dir.path().to_path_buf()).unwrap();
    storage_a.put("k", b"v".to_vec()).unwrap();

    let storage_b = DiskStorage::new([0x22u8; 32], dir.path().to_path_buf()).unwrap();
    assert!(matches!(storage_b.get("k"), Err(StorageError::Encryption(_))));
}

#[test]
fn test_disk_truncated_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let storage = DiskStorage::new([0xaau8; 32], dir.path().to_path_buf()).unwrap();

    let path = dir.path().join(format!("{}.bin", hex::encode("k")));
    std::fs::write(&path, b"short").unwrap();
    assert!(matches!(storage.get("k"), Err(StorageError::Corrupt(_))));
}

#[test]
fn test_wipe_removes_only_entries() {
    let dir = tempfile::tempdir().unwrap();
    let storage = DiskStorage::new([0xbbu8; 32], dir.path().to_path_buf()).unwrap();
    storage.put("a", b"1".to_vec()).unwrap();
    storage.put("b", b"2".to_vec()).unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

    assert_eq!(disk::wipe(dir.path()).unwrap(), 2);
    assert!(storage.get("a").unwrap().is_none());
    assert!(dir.path().join("notes.txt").exists());
    assert_eq!(disk::wipe(&dir.path().join("missing")).unwrap(), 0);
}

#[tokio::test]
async fn test_issue_survives_reopen_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let key = [0xccu8; 32];
    let req = IssueRequest {
        groups: "g1,g2".into(),
        secret_id_num_uses: 2,
        ..IssueRequest::default()
    };

    let resp = {
        let storage = Arc::new(DiskStorage::new(key, dir.path().to_path_buf()).unwrap());
        let service =
            IssuanceService::open(storage, Arc::new(StaticSystemView::default())).unwrap();
        service.issue_generated(&req).await.unwrap()
    };

    let storage = Arc::new(DiskStorage::new(key, dir.path().to_path_buf()).unwrap());
    let service = IssuanceService::open(storage, Arc::new(StaticSystemView::default())).unwrap();
    let summary = service.lookup(&resp.selector_id).await.unwrap().unwrap();
    assert_eq!(summary.groups.len(), 2);
    service
        .consume(&resp.selector_id, &resp.secret_id)
        .await
        .unwrap();
}
