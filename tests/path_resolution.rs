use std::path::{Path, PathBuf};

use utrun::exec::paths::to_absolute;

#[test]
fn empty_path_stays_empty() {
    assert_eq!(to_absolute("", Some(Path::new("/base"))), PathBuf::new());
    assert_eq!(to_absolute("", None), PathBuf::new());
}

#[cfg(unix)]
#[test]
fn absolute_path_unchanged_regardless_of_base() {
    assert_eq!(
        to_absolute("/ops/agm", Some(Path::new("/elsewhere"))),
        PathBuf::from("/ops/agm")
    );
    assert_eq!(to_absolute("/ops/agm", None), PathBuf::from("/ops/agm"));
}

#[cfg(unix)]
#[test]
fn relative_path_joins_base() {
    assert_eq!(
        to_absolute("ops/agm", Some(Path::new("/work"))),
        PathBuf::from("/work/ops/agm")
    );
}

#[test]
fn relative_path_without_base_resolves_against_cwd() {
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(to_absolute("somewhere", None), cwd.join("somewhere"));
}
