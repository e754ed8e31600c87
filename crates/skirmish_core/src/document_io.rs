use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub fn read_document(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("not valid UTF-8 at byte {}", err.utf8_error().valid_up_to()),
        )
    })
}

/// Replaces `path` in one step by writing a sibling temporary file first.
pub fn write_document(path: &Path, text: &str) -> io::Result<()> {
    let tmp_path = temp_sibling(path);
    let written = fs::write(&tmp_path, text).and_then(|()| fs::rename(&tmp_path, path));
    if written.is_err() && tmp_path.is_file() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("document"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_replaces_contents_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Units.xml");
        fs::write(&path, "<old/>").unwrap();

        write_document(&path, "<new/>").unwrap();

        assert_eq!(read_document(&path).unwrap(), "<new/>");
        assert!(!dir.path().join("Units.xml.tmp").exists());
    }

    #[test]
    fn failed_rename_removes_the_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Units.xml");
        fs::create_dir_all(path.join("Space")).unwrap();

        assert!(write_document(&path, "<new/>").is_err());
        assert!(path.join("Space").is_dir());
        assert!(!dir.path().join("Units.xml.tmp").exists());
    }

    #[test]
    fn failed_temp_write_leaves_the_target_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Units.xml");
        fs::write(&path, "<old/>").unwrap();
        fs::create_dir(dir.path().join("Units.xml.tmp")).unwrap();

        assert!(write_document(&path, "<new/>").is_err());
        assert_eq!(read_document(&path).unwrap(), "<old/>");
        assert!(dir.path().join("Units.xml.tmp").is_dir());
    }

    #[test]
    fn invalid_utf8_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Broken.xml");
        fs::write(&path, [b'<', 0xff, b'>']).unwrap();

        let err = read_document(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
