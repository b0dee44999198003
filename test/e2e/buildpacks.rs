//! Admin buildpack lifecycle against a live platform.
//!
//! Each scenario registers a fixture buildpack that only detects its own
//! app, then checks which buildpack version ends up serving the app after
//! the buildpack is updated, deleted or never matched.
//!
//! ## Running
//!
//! ```bash
//! PAT_API=https://api.example.test PAT_APPS_DOMAIN=apps.example.test \
//!   PAT_ADMIN_PASSWORD=... cargo test -p pat-e2e --test buildpacks -- --ignored
//! ```

mod support;

use anyhow::Result;
use pat_cf::Scenario;
use pat_id::{AppName, BuildpackName};
use pat_testing::{FixtureDescriptor, ReleaseVariant, TimeoutTier};
use support::{app_push, assert_staged, greeting, install_fixture, Live, NO_ROUTE};

/// Pushes the app on 1.0, swaps the buildpack bits for 2.0 and returns once
/// the app still serves 1.0.
async fn running_on_updated_buildpack(live: &Live, s: &Scenario, instances: u32) -> Result<()> {
    install_fixture(s, "1.0").await?;
    let push = live.push(&app_push(s).instances(instances)).await?;
    assert_staged(&push, "1.0");
    live.await_page(s.app().as_str(), &greeting("1.0")).await?;

    s.platform().reinstall_fixture(&s.descriptor("2.0")).await?;
    live.await_page(s.app().as_str(), &greeting("1.0")).await?;
    Ok(())
}

/// Pushes the app with a second, higher-priority buildpack of a random
/// version installed, then deletes that buildpack. Returns its version.
async fn running_on_deleted_buildpack(live: &Live, s: &Scenario) -> Result<String> {
    install_fixture(s, "1.0").await?;
    let newer =
        FixtureDescriptor::for_app(BuildpackName::random(), s.app(), pat_id::random_version());
    s.install(&newer).await?;

    let push = live.push(&app_push(s)).await?;
    assert_staged(&push, &newer.version);
    live.await_page(s.app().as_str(), &greeting(&newer.version)).await?;

    s.platform().delete_buildpack(&newer.name).await?;
    Ok(newer.version)
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn fixture_buildpack_stages_and_serves_its_app() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            install_fixture(&s, "1.0").await?;
            let push = live.push(&app_push(&s)).await?;
            assert_staged(&push, "1.0");
            live.await_page(s.app().as_str(), &greeting("1.0")).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn updated_buildpack_leaves_running_app_alone() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move { running_on_updated_buildpack(live, &s, 1).await })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn updated_buildpack_survives_stop_and_start() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            running_on_updated_buildpack(live, &s, 1).await?;
            live.ok(["stop", s.app().as_str()], TimeoutTier::Long).await?;
            live.ok(["start", s.app().as_str()], TimeoutTier::Long).await?;
            live.await_page(s.app().as_str(), &greeting("1.0")).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn updated_buildpack_survives_restart() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            running_on_updated_buildpack(live, &s, 1).await?;
            live.ok(["restart", s.app().as_str()], TimeoutTier::Long).await?;
            live.await_page(s.app().as_str(), &greeting("1.0")).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn updated_buildpack_survives_instance_restart() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            running_on_updated_buildpack(live, &s, 2).await?;
            live.ok(["restart-app-instance", s.app().as_str(), "0"], TimeoutTier::Long)
                .await?;
            live.await_page(s.app().as_str(), &greeting("1.0")).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn no_start_push_then_start_picks_up_update() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            running_on_updated_buildpack(live, &s, 1).await?;
            live.push(&app_push(&s).no_start()).await?.assert_exit(0);
            live.ok(["start", s.app().as_str()], TimeoutTier::Long).await?;
            live.await_page(s.app().as_str(), &greeting("2.0")).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn push_again_picks_up_update() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            running_on_updated_buildpack(live, &s, 1).await?;
            let push = live.push(&app_push(&s)).await?;
            assert_staged(&push, "2.0");
            live.await_page(s.app().as_str(), &greeting("2.0")).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn restage_picks_up_update() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            running_on_updated_buildpack(live, &s, 1).await?;
            live.ok(["restage", s.app().as_str()], TimeoutTier::Long).await?;
            live.await_page(s.app().as_str(), &greeting("2.0")).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn deleted_buildpack_leaves_running_app_alone() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            let version = running_on_deleted_buildpack(live, &s).await?;
            live.ok(["restart", s.app().as_str()], TimeoutTier::Long).await?;
            live.await_page(s.app().as_str(), &greeting(&version)).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn restage_after_delete_falls_back_to_remaining_buildpack() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            running_on_deleted_buildpack(live, &s).await?;
            live.ok(["restage", s.app().as_str()], TimeoutTier::Long).await?;
            live.await_page(s.app().as_str(), &greeting("1.0")).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn push_after_delete_falls_back_to_remaining_buildpack() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            running_on_deleted_buildpack(live, &s).await?;
            let push = live.push(&app_push(&s)).await?;
            assert_staged(&push, "1.0");
            live.await_page(s.app().as_str(), &greeting("1.0")).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn crashed_app_restages_on_updated_buildpack() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            let descriptor = s.descriptor("1.0").with_release(ReleaseVariant::CrashAfter(30));
            s.install(&descriptor).await?;
            let push = live.push(&app_push(&s)).await?;
            assert_staged(&push, "1.0");
            live.await_page(s.app().as_str(), support::GREETING).await?;

            live.apps
                .await_body(s.app().as_str(), NO_ROUTE, live.eventually(TimeoutTier::Long))
                .await?;

            let update = s.descriptor("2.0").with_release(ReleaseVariant::CrashAfter(30));
            s.platform().reinstall_fixture(&update).await?;
            let push = live.push(&app_push(&s)).await?;
            assert_staged(&push, "2.0");
            live.await_page(s.app().as_str(), support::GREETING).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn app_without_a_matching_buildpack_fails_to_stage() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            // Registered, but it detects some other app's marker.
            let stranger =
                FixtureDescriptor::for_app(s.buildpack().clone(), &AppName::random(), "1.0");
            s.platform().install_fixture(&stranger).await?;
            s.dir().add_file(pat_testing::app::FILLER_FILE, 0)?;

            live.push(&app_push(&s))
                .await?
                .assert_says(&[
                    "FAILED",
                    "An app was not successfully detected by any available buildpack",
                ]);
            anyhow::Ok(())
        })
        .await
}
