use tempfile::TempDir;

use super::*;

fn write(root: &Path, files: &[&str]) -> Result<(), anyhow::Error> {
    for file in files {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, file)?;
    }
    Ok(())
}

/// A local stand-in for the IHP repository, holding a finished variant tree.
fn ihp_repo() -> Result<TempDir, anyhow::Error> {
    let repo = TempDir::new()?;
    write(
        repo.path(),
        &[
            "README.md",
            ".git/HEAD",
            "ihp-sg13g2/libs.tech/klayout/tech.lyp",
            "ihp-sg13g2/libs.ref/sg13g2_stdcell/lef/sg13g2_stdcell.lef",
            "ihp-sg13g2/libs.ref/sg13g2_io/lef/sg13g2_io.lef",
            "ihp-sg13g2/libs.ref/sg13g2_sram/lef/RM_IHPSG13_1P_1024x64_c2_bm_bist.lef",
            "ihp-sg13g2/libs.ref/sg13g2_pr/spice/pr.lib",
        ],
    )?;
    Ok(repo)
}

fn ihp_options(root: &Path, repo: &Path) -> BuildOptions {
    let mut options = BuildOptions::new(root, "abc123");
    options
        .using_repos
        .insert("IHP-Open-PDK".into(), repo.to_path_buf());
    options
}

#[test]
fn repo_overrides_become_absolute() -> Result<(), anyhow::Error> {
    let overrides = parse_repo_overrides(["open_pdks=../open_pdks", "magic=/opt/magic"])?;
    let cwd = std::env::current_dir()?;

    assert_eq!(overrides["open_pdks"], cwd.join("../open_pdks"));
    assert_eq!(overrides["magic"], Path::new("/opt/magic"));
    assert!(overrides.values().all(|p| p.is_absolute()));
    Ok(())
}

#[test]
fn malformed_repo_overrides() {
    for entry in ["open_pdks", "=path", "open_pdks="] {
        assert!(
            matches!(parse_repo_overrides([entry]), Err(Error::MalformedOverride(e)) if e == entry),
            "{entry} should be rejected"
        );
    }
}

#[test]
fn repo_names() -> Result<(), anyhow::Error> {
    assert_eq!(repo_name(Family::lookup("sky130")?), "open_pdks");
    assert_eq!(repo_name(Family::lookup("ihp-sg13g2")?), "IHP-Open-PDK");
    Ok(())
}

#[test]
fn unknown_family_fails_before_building() {
    let root = Path::new("/does/not/exist");
    assert!(matches!(
        build("tsmc5", &BuildOptions::new(root, "abc")),
        Err(Error::Family(family::Error::Unsupported(name))) if name == "tsmc5"
    ));
}

#[test]
fn configure_arguments() -> Result<(), anyhow::Error> {
    let args = open_pdks::configure_args(Family::lookup("gf180mcu")?, Path::new("/work/install"));
    insta::assert_debug_snapshot!(args, @r###"
    [
        "--enable-gf180mcu-pdk",
        "--with-gf180mcu-variants=all",
        "--prefix=/work/install",
    ]
    "###);
    Ok(())
}

#[test]
fn prune_keeps_requested_libraries() -> Result<(), anyhow::Error> {
    let dir = TempDir::new()?;
    write(
        dir.path(),
        &[
            "sky130A/libs.ref/sky130_fd_sc_hd/lef/hd.lef",
            "sky130A/libs.ref/sky130_fd_sc_hs/lef/hs.lef",
            "sky130B/libs.ref/sky130_fd_sc_hs/lef/hs.lef",
            "sky130B/libs.tech/magic/sky130B.tech",
        ],
    )?;
    let keep = BTreeSet::from(["sky130_fd_sc_hd".to_owned()]);

    let removed = prune_libraries(dir.path(), Family::lookup("sky130")?, &keep)?;
    assert_eq!(removed.into_iter().collect::<Vec<_>>(), ["sky130_fd_sc_hs"]);
    assert!(dir.path().join("sky130A/libs.ref/sky130_fd_sc_hd").is_dir());
    assert!(!dir.path().join("sky130B/libs.ref/sky130_fd_sc_hs").exists());
    assert!(dir.path().join("sky130B/libs.tech/magic/sky130B.tech").is_file());
    Ok(())
}

#[test]
fn copy_build_from_local_repository() -> Result<(), anyhow::Error> {
    let root = TempDir::new()?;
    let repo = ihp_repo()?;
    let mut options = ihp_options(root.path(), repo.path());
    options.include_libraries = vec!["sg13g2_stdcell".into(), "sg13g2_pr".into()];

    let dir = build("ihp-sg13g2", &options)?;
    assert_eq!(dir, root.path().join("ciel/ihp-sg13g2/versions/abc123"));

    let libs = dir.join("ihp-sg13g2/libs.ref");
    assert!(libs.join("sg13g2_stdcell/lef/sg13g2_stdcell.lef").is_file());
    assert!(libs.join("sg13g2_pr/spice/pr.lib").is_file());
    assert!(!libs.join("sg13g2_io").exists());
    assert!(!libs.join("sg13g2_sram").exists());
    assert!(dir.join("ihp-sg13g2/libs.tech/klayout/tech.lyp").is_file());

    // only variants are copied, and the build directory is cleared
    assert!(!dir.join("README.md").exists());
    assert!(!dir.join(".git").exists());
    assert!(!root.path().join("ciel/ihp-sg13g2/build/abc123").exists());
    Ok(())
}

#[test]
fn keep_build_artifacts() -> Result<(), anyhow::Error> {
    let root = TempDir::new()?;
    let repo = ihp_repo()?;
    let mut options = ihp_options(root.path(), repo.path());
    options.clear_build_artifacts = false;

    let dir = build("ihp-sg13g2", &options)?;
    assert!(root.path().join("ciel/ihp-sg13g2/build/abc123").is_dir());
    // every default library survives
    assert!(dir.join("ihp-sg13g2/libs.ref/sg13g2_sram").is_dir());
    Ok(())
}

#[test]
fn rebuilding_replaces_the_version() -> Result<(), anyhow::Error> {
    let root = TempDir::new()?;
    let repo = ihp_repo()?;
    let options = ihp_options(root.path(), repo.path());

    let dir = build("ihp-sg13g2", &options)?;
    fs::write(dir.join("stale"), "left over")?;
    build("ihp-sg13g2", &options)?;
    assert!(!dir.join("stale").exists());
    Ok(())
}

#[test]
fn missing_variant_is_reported() -> Result<(), anyhow::Error> {
    let root = TempDir::new()?;
    let repo = TempDir::new()?;
    write(repo.path(), &["README.md"])?;

    let err = build("ihp-sg13g2", &ihp_options(root.path(), repo.path())).unwrap_err();
    assert!(matches!(err, Error::MissingVariant { variant, .. } if variant == "ihp-sg13g2"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn copy_preserves_symlinks() -> Result<(), anyhow::Error> {
    let src = TempDir::new()?;
    let dst = TempDir::new()?;
    write(src.path(), &["real/file"])?;
    std::os::unix::fs::symlink("real/file", src.path().join("link"))?;

    copy_tree(src.path(), &dst.path().join("copy"))?;
    let link = dst.path().join("copy/link");
    assert!(fs::symlink_metadata(&link)?.file_type().is_symlink());
    assert_eq!(fs::read_link(&link)?, Path::new("real/file"));
    Ok(())
}
