use std::io::{Read, Seek, Write};

use crate::{FileMapping, MappingAccess};

fn temp_file_with(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(contents).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

#[test]
fn test_read_only_view() {
    let file = temp_file_with(b"hello, mapping");
    let mapping = FileMapping::open(file.path(), MappingAccess::ReadOnly).unwrap();
    assert_eq!(mapping.len(), 14);
    assert!(!mapping.is_writable());

    let mut view = mapping.map_view(false).unwrap();
    assert_eq!(view.as_bytes(), b"hello, mapping");
    assert_eq!(&view[..5], b"hello");
    assert!(view.as_bytes_mut().is_none());
    view.flush().unwrap();
}

#[test]
fn test_writable_view_requires_writable_mapping() {
    let file = temp_file_with(b"abc");
    let mapping = FileMapping::open(file.path(), MappingAccess::ReadOnly).unwrap();
    let err = mapping.map_view(true).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied);
}

#[test]
fn test_write_through_view_reaches_file() {
    let file = temp_file_with(&[0u8; 8192]);
    let mapping = FileMapping::open(file.path(), MappingAccess::ReadWrite).unwrap();
    let mut view = mapping.map_view(true).unwrap();
    view.as_bytes_mut().unwrap()[4096..4100].copy_from_slice(b"DATA");
    view.flush().unwrap();
    view.unmap().unwrap();
    mapping.close().unwrap();

    let mut contents = Vec::new();
    let mut reopened = file.reopen().unwrap();
    reopened.rewind().unwrap();
    reopened.read_to_end(&mut contents).unwrap();
    assert_eq!(contents.len(), 8192);
    assert_eq!(&contents[4096..4100], b"DATA");
}

#[test]
fn test_view_outlives_mapping() {
    let file = temp_file_with(b"persistent");
    let mapping = FileMapping::open(file.path(), MappingAccess::ReadOnly).unwrap();
    let view = mapping.map_view(false).unwrap();
    drop(mapping);
    assert_eq!(view.as_bytes(), b"persistent");
}

#[test]
fn test_empty_file() {
    let file = temp_file_with(&[]);
    let mapping = FileMapping::open(file.path(), MappingAccess::ReadWrite).unwrap();
    assert!(mapping.is_empty());
    let mut view = mapping.map_view(true).unwrap();
    assert!(view.is_empty());
    assert_eq!(view.as_bytes_mut().unwrap().len(), 0);
    view.flush().unwrap();
}

#[test]
fn test_from_file() {
    let file = temp_file_with(b"xyz");
    let mapping = FileMapping::from_file(file.reopen().unwrap(), MappingAccess::ReadOnly).unwrap();
    assert_eq!(mapping.access(), MappingAccess::ReadOnly);
    assert_eq!(mapping.map_view(false).unwrap().as_bytes(), b"xyz");
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err =
        FileMapping::open(dir.path().join("missing.bin"), MappingAccess::ReadOnly).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
