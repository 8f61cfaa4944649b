use std::fs;

use tempfile::TempDir;

use super::*;

#[tokio::test(flavor = "multi_thread")]
async fn packaging_runs_inside_the_runtime() -> Result<(), anyhow::Error> {
    let root = TempDir::new()?;
    let scratch = TempDir::new()?;
    let lef = root
        .path()
        .join("ciel/sky130/versions/abc123/sky130A/libs.ref/sky130_fd_sc_hd/lef/hd.lef");
    fs::create_dir_all(lef.parent().unwrap())?;
    fs::write(&lef, "MACRO hd")?;

    let push = Push::new(root.path(), "sky130", "abc123", github::Credential::new("token"))?;
    let package = package(&push, &Packaging::new(scratch.path()), true)?;

    assert_eq!(
        package.collections().names().collect::<Vec<_>>(),
        ["common", "sky130_fd_sc_hd"]
    );
    assert!(package.archives().iter().all(|a| a.is_file()));
    Ok(())
}
