//! Day-two operations on running apps: instance restarts, environment and
//! service changes, and a blue-green route swap.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p pat-e2e --test operator -- --ignored
//! ```

mod support;

use std::convert::Infallible;

use anyhow::Result;
use pat_cf::PushArgs;
use pat_id::{AppName, BuildpackName, ServiceName};
use pat_testing::{AppDirectory, FixtureDescriptor, TimeoutTier};
use regex::Regex;
use support::{app_push, assert_staged, greeting, install_fixture, NO_ROUTE};

#[tokio::test]
#[ignore = "needs a live platform"]
async fn restarting_one_instance_keeps_the_others_serving() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            install_fixture(&s, "1.0").await?;
            assert_staged(&live.push(&app_push(&s).instances(3)).await?, "1.0");
            live.await_page(s.app().as_str(), &greeting("1.0")).await?;

            live.ok(["restart-app-instance", s.app().as_str(), "0"], TimeoutTier::Push)
                .await?;
            let app = live.ok(["app", s.app().as_str()], TimeoutTier::Default).await?;
            for pattern in [r"#0\s+(down|starting)", r"#1\s+running", r"#2\s+running"] {
                app.assert_matches(&Regex::new(pattern)?);
            }
            live.await_page(s.app().as_str(), &greeting("1.0")).await?;
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn set_env_shows_in_app_env_after_restart() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            install_fixture(&s, "1.0").await?;
            assert_staged(&live.push(&app_push(&s)).await?, "1.0");
            live.ok(["env", s.app().as_str()], TimeoutTier::Default)
                .await?
                .assert_not_says("APP_ENV_1");

            live.ok(["set-env", s.app().as_str(), "APP_ENV_1", "app env 1"], TimeoutTier::Default)
                .await?;
            live.ok(["restart", s.app().as_str()], TimeoutTier::Push).await?;
            live.ok(["env", s.app().as_str()], TimeoutTier::Default)
                .await?
                .assert_says(&["APP_ENV_1: app env 1"]);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn bound_service_shows_in_app_env() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            install_fixture(&s, "1.0").await?;
            assert_staged(&live.push(&app_push(&s)).await?, "1.0");
            live.ok(["env", s.app().as_str()], TimeoutTier::Default)
                .await?
                .assert_not_says("VCAP_SERVICES");

            let service = ServiceName::random();
            s.track_service(service.clone());
            live.ok(["cups", service.as_str()], TimeoutTier::Default).await?;
            live.ok(["bind-service", s.app().as_str(), service.as_str()], TimeoutTier::Default)
                .await?;
            live.ok(["restart", s.app().as_str()], TimeoutTier::Push).await?;
            live.ok(["env", s.app().as_str()], TimeoutTier::Default)
                .await?
                .assert_says(&["VCAP_SERVICES"]);

            live.ok(["unbind-service", s.app().as_str(), service.as_str()], TimeoutTier::Default)
                .await?;
            live.ok(["restart", s.app().as_str()], TimeoutTier::Push).await?;
            live.ok(["env", s.app().as_str()], TimeoutTier::Default)
                .await?
                .assert_not_says("VCAP_SERVICES");
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn blue_green_swap_moves_traffic_without_downtime() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            let blue = s.app().clone();
            install_fixture(&s, "1.0").await?;
            assert_staged(&live.push(&app_push(&s)).await?, "1.0");
            live.await_page(blue.as_str(), &greeting("1.0")).await?;

            let green = AppName::random();
            s.track_app(green.clone());
            let green_fixture = FixtureDescriptor::for_app(BuildpackName::random(), &green, "2.0");
            s.platform().install_fixture(&green_fixture).await?;
            s.track_buildpack(green_fixture.name.clone());
            let green_dir = AppDirectory::for_fixture(&green_fixture)?;
            let push = PushArgs::app(&green).path(green_dir.path()).memory("128M");
            assert_staged(&live.push(&push).await?, "2.0");
            live.await_page(green.as_str(), &greeting("2.0")).await?;

            let domain = live.apps_domain()?;
            live.ok(
                ["map-route", green.as_str(), domain, "-n", blue.as_str()],
                TimeoutTier::Push,
            )
            .await?;
            live.await_page(blue.as_str(), &greeting("2.0")).await?;
            live.await_page(blue.as_str(), &greeting("1.0")).await?;

            live.ok(
                ["unmap-route", blue.as_str(), domain, "-n", blue.as_str()],
                TimeoutTier::Push,
            )
            .await?;
            let (old, host) = (greeting("1.0"), blue.as_str());
            live.eventually(TimeoutTier::Default)
                .until(
                    move || async move { Ok::<_, Infallible>(live.apps.curl_root(host).await) },
                    |body: &String| !body.is_empty() && !body.contains(&old),
                )
                .await?;
            live.await_page(blue.as_str(), &greeting("2.0")).await?;

            live.ok(
                ["unmap-route", green.as_str(), domain, "-n", green.as_str()],
                TimeoutTier::Push,
            )
            .await?;
            live.await_page(green.as_str(), NO_ROUTE).await?;
            live.await_page(blue.as_str(), &greeting("2.0")).await?;

            green_dir.close()?;
            anyhow::Ok(())
        })
        .await
}
