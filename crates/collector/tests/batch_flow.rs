//! Batch coordination: many projects, one shared artifact, finalized only
//! after every session has completed.

mod common;

use anyhow::Result;
use apiscan_collector::{BatchScanCoordinator, ReportFormat, ScanSessionConfig, SceneProvider};
use common::{make_project, make_sdk, scene_for, FixtureProvider, ORIGINAL_DECLS};
use std::path::Path;
use std::sync::Arc;

fn batch_template(dir: &Path) -> ScanSessionConfig {
    let mut template = ScanSessionConfig::new(dir.join("placeholder"), dir.join("sdk"));
    template.output_root = dir.join("out");
    template.format = ReportFormat::Csv;
    template
}

#[tokio::test]
async fn batch_aggregates_all_projects_into_one_artifact() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let decls = make_sdk(&dir.path().join("sdk"));
    let apps = dir.path().join("apps");

    let app_a = make_project(&apps, "app_a");
    let app_b = make_project(&apps, "app_b");
    let app_c = make_project(&apps, "app_c");

    let provider = Arc::new(
        FixtureProvider::new()
            .with_scene(
                &app_a,
                scene_for(&app_a, &[("Audio", "play", 1), ("Audio", "stop", 2)]),
            )
            .with_scene(&app_b, scene_for(&app_b, &[]))
            .with_scene(
                &app_c,
                scene_for(
                    &app_c,
                    &[
                        ("Window", "open", 1),
                        ("Window", "close", 2),
                        ("Window", "resize", 3),
                        ("Display", "rotate", 4),
                        ("Display", "dim", 5),
                    ],
                ),
            ),
    );

    let coordinator = BatchScanCoordinator::new(
        &apps,
        batch_template(dir.path()),
        provider as Arc<dyn SceneProvider>,
    );
    let artifact = coordinator.run().await?.expect("artifact produced");

    let content = std::fs::read_to_string(&artifact)?;
    // 2 + 0 + 5 findings plus the header row.
    assert_eq!(content.lines().count(), 8);

    // The shared declaration file survived three sessions untouched.
    assert_eq!(std::fs::read_to_string(&decls)?, ORIGINAL_DECLS);
    Ok(())
}

#[tokio::test]
async fn one_failing_project_does_not_block_the_batch() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let decls = make_sdk(&dir.path().join("sdk"));
    let apps = dir.path().join("apps");

    let app_good = make_project(&apps, "app_good");
    // app_sick exists on disk but the provider has no scene for it, so its
    // session fails during scene construction.
    make_project(&apps, "app_sick");

    let provider = Arc::new(
        FixtureProvider::new().with_scene(&app_good, scene_for(&app_good, &[("Audio", "play", 1)])),
    );

    let coordinator = BatchScanCoordinator::new(
        &apps,
        batch_template(dir.path()),
        provider as Arc<dyn SceneProvider>,
    );
    let artifact = coordinator.run().await?.expect("artifact produced");

    let content = std::fs::read_to_string(&artifact)?;
    assert_eq!(content.lines().count(), 2); // header + app_good's finding
    assert!(content.contains("play(): void"));

    assert_eq!(std::fs::read_to_string(&decls)?, ORIGINAL_DECLS);
    Ok(())
}

#[tokio::test]
async fn empty_parent_produces_no_artifact() -> Result<()> {
    let dir = tempfile::tempdir()?;
    make_sdk(&dir.path().join("sdk"));
    let apps = dir.path().join("apps");
    std::fs::create_dir_all(&apps)?;

    let coordinator = BatchScanCoordinator::new(
        &apps,
        batch_template(dir.path()),
        Arc::new(FixtureProvider::new()) as Arc<dyn SceneProvider>,
    );

    assert!(coordinator.run().await?.is_none());
    assert!(!dir.path().join("out").join("collected_api.csv").exists());
    Ok(())
}

#[tokio::test]
async fn shared_suppression_spans_projects() -> Result<()> {
    let dir = tempfile::tempdir()?;
    make_sdk(&dir.path().join("sdk"));
    let apps = dir.path().join("apps");

    let app_a = make_project(&apps, "app_a");
    let app_b = make_project(&apps, "app_b");

    // Same identity tuple from both projects: same declaring type, raw
    // text, source path, and position.
    let mut scene_a = scene_for(&app_a, &[("Audio", "play", 1)]);
    let mut scene_b = scene_for(&app_b, &[("Audio", "play", 1)]);
    let shared_path = "/shared/library/player.ets".to_string();
    scene_a.files[0].path = shared_path.clone();
    scene_b.files[0].path = shared_path;

    let provider = Arc::new(
        FixtureProvider::new()
            .with_scene(&app_a, scene_a)
            .with_scene(&app_b, scene_b),
    );

    let mut template = batch_template(dir.path());
    template.suppress_duplicates = true;
    let coordinator =
        BatchScanCoordinator::new(&apps, template, provider as Arc<dyn SceneProvider>);
    let artifact = coordinator.run().await?.expect("artifact produced");

    let content = std::fs::read_to_string(&artifact)?;
    assert_eq!(content.lines().count(), 2); // header + exactly one row
    Ok(())
}
