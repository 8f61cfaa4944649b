use std::collections::BTreeSet;
use std::io::Read;

use prodash::progress::Discard;
use tempfile::TempDir;

use super::*;
use crate::partition;

fn version_tree() -> Result<TempDir, anyhow::Error> {
    let dir = TempDir::new()?;
    for (file, content) in [
        ("sky130A/SOURCES", "open_pdks abc123"),
        ("sky130A/libs.ref/sky130_fd_sc_hd/lef/hd.lef", "MACRO hd"),
        ("sky130A/libs.ref/sky130_fd_io/gds/io.gds", "GDS"),
        ("sky130A/libs.tech/magic/sky130A.tech", "tech"),
    ] {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(path, content)?;
    }
    Ok(dir)
}

fn entries<R: Read>(reader: R) -> Result<Vec<(String, String)>, anyhow::Error> {
    let mut archive = tar::Archive::new(reader);
    let mut found = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.display().to_string();
        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        found.push((name, content));
    }
    Ok(found)
}

#[test]
fn compression_names() -> Result<(), anyhow::Error> {
    assert_eq!("zstd".parse::<Compression>()?, Compression::Zstd);
    assert_eq!("gz".parse::<Compression>()?, Compression::Gzip);
    assert_eq!(Compression::Zstd.file_name("common"), "common.tar.zst");
    assert_eq!(Compression::Gzip.file_name("sky130_fd_io"), "sky130_fd_io.tar.gz");
    assert_eq!(Compression::default().to_string(), "zstd");
    assert!(matches!(
        "xz".parse::<Compression>(),
        Err(Error::UnknownCompression(c)) if c == "xz"
    ));
    Ok(())
}

#[test]
fn zstd_archive_holds_relative_paths() -> Result<(), anyhow::Error> {
    let version = version_tree()?;
    let out = TempDir::new()?;
    let allowed = BTreeSet::from(["sky130_fd_sc_hd".to_owned()]);
    let collections = partition::partition(version.path(), &allowed)?;

    let paths = build_all(
        &collections,
        version.path(),
        out.path(),
        Compression::Zstd,
        &mut Discard,
    )?;
    assert_eq!(
        paths,
        [
            out.path().join("common.tar.zst"),
            out.path().join("sky130_fd_sc_hd.tar.zst"),
        ]
    );

    let common = zstd::stream::read::Decoder::new(File::open(&paths[0])?)?;
    assert_eq!(
        entries(common)?,
        [
            ("sky130A/SOURCES".to_owned(), "open_pdks abc123".to_owned()),
            (
                "sky130A/libs.ref/sky130_fd_io/gds/io.gds".to_owned(),
                "GDS".to_owned()
            ),
            (
                "sky130A/libs.tech/magic/sky130A.tech".to_owned(),
                "tech".to_owned()
            ),
        ]
    );

    let library = zstd::stream::read::Decoder::new(File::open(&paths[1])?)?;
    assert_eq!(
        entries(library)?,
        [(
            "sky130A/libs.ref/sky130_fd_sc_hd/lef/hd.lef".to_owned(),
            "MACRO hd".to_owned()
        )]
    );
    Ok(())
}

#[test]
fn gzip_archive_round_trips() -> Result<(), anyhow::Error> {
    let version = version_tree()?;
    let out = TempDir::new()?;
    let collections = partition::partition(version.path(), &BTreeSet::new())?;

    let path = build_archive(
        collections.common(),
        version.path(),
        out.path(),
        Compression::Gzip,
        &mut Discard,
    )?;
    let found = entries(flate2::read::GzDecoder::new(File::open(path)?))?;
    assert_eq!(found.len(), 4);
    Ok(())
}

#[test]
fn empty_collection_yields_valid_archive() -> Result<(), anyhow::Error> {
    let version = TempDir::new()?;
    let out = TempDir::new()?;
    let collections = partition::partition(version.path(), &BTreeSet::new())?;

    let path = build_archive(
        collections.common(),
        version.path(),
        out.path(),
        Compression::Zstd,
        &mut Discard,
    )?;
    let found = entries(zstd::stream::read::Decoder::new(File::open(path)?)?)?;
    assert!(found.is_empty());
    Ok(())
}

#[test]
fn archives_are_reproducible() -> Result<(), anyhow::Error> {
    let version = version_tree()?;
    let collections = partition::partition(version.path(), &BTreeSet::new())?;

    let mut bytes = Vec::new();
    for _ in 0..2 {
        let out = TempDir::new()?;
        let path = build_archive(
            collections.common(),
            version.path(),
            out.path(),
            Compression::Zstd,
            &mut Discard,
        )?;
        bytes.push(fs::read(path)?);
    }
    assert_eq!(bytes[0], bytes[1]);
    Ok(())
}

#[test]
fn refuses_output_inside_version() -> Result<(), anyhow::Error> {
    let version = version_tree()?;
    let collections = partition::partition(version.path(), &BTreeSet::new())?;
    let inside = version.path().join("sky130A");

    assert!(matches!(
        build_all(
            &collections,
            version.path(),
            &inside,
            Compression::Zstd,
            &mut Discard
        ),
        Err(Error::OutputInsideVersion(_))
    ));
    Ok(())
}

#[test]
fn scratch_dirs_are_unique() -> Result<(), anyhow::Error> {
    let base = TempDir::new()?;
    let a = scratch_dir(base.path(), "abc123")?;
    let b = scratch_dir(base.path(), "abc123")?;

    assert_ne!(a, b);
    assert!(a.is_dir() && b.is_dir());
    assert!(a.starts_with(base.path()) && a.ends_with("abc123"));
    Ok(())
}

#[test]
fn unreadable_file_fails_and_leaves_the_partial_archive() -> Result<(), anyhow::Error> {
    let version = version_tree()?;
    let out = TempDir::new()?;
    let collections = partition::partition(version.path(), &BTreeSet::new())?;
    let missing = version.path().join("sky130A/libs.tech/magic/sky130A.tech");
    fs::remove_file(&missing)?;

    let err = build_archive(
        collections.common(),
        version.path(),
        out.path(),
        Compression::Zstd,
        &mut Discard,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io { ref path, .. } if *path == missing), "{err}");
    assert!(out.path().join("common.tar.zst").is_file());
    Ok(())
}
