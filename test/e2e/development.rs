//! What a running app sees of its environment: platform variables, user
//! variables from `set-env` and bound user-provided services.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p pat-e2e --test development -- --ignored
//! ```

mod support;

use anyhow::Result;
use pat_cf::PushArgs;
use pat_id::ServiceName;
use pat_testing::app::FILLER_FILE;
use pat_testing::{ReleaseVariant, TimeoutTier};
use regex::Regex;
use support::{greeting, Live};

const USER_VAR: &str = "MY_ENV";
const USER_VALUE: &str = "this is a user-provided variable";
const CREDENTIALS: &str = r#"{"username":"admin","password":"pa55woRD"}"#;

/// Installs an env-dumping fixture and pushes the app without starting it.
async fn push_env_dump(live: &Live, s: &pat_cf::Scenario) -> Result<()> {
    let descriptor = s
        .descriptor("1.0")
        .with_release(ReleaseVariant::standard_env_with([USER_VAR]));
    s.install(&descriptor).await?;
    s.dir().add_file(FILLER_FILE, 0)?;

    let push = PushArgs::app(s.app())
        .path(s.dir().path())
        .memory("512M")
        .no_start();
    live.push(&push).await?.assert_exit(0);
    Ok(())
}

/// Creates a user-provided service and binds it to the scenario's app.
async fn bind_user_service(live: &Live, s: &pat_cf::Scenario) -> Result<ServiceName> {
    let service = ServiceName::random();
    s.track_service(service.clone());
    live.ok(["cups", service.as_str(), "-p", CREDENTIALS], TimeoutTier::Default)
        .await?;
    live.ok(["bind-service", s.app().as_str(), service.as_str()], TimeoutTier::Default)
        .await?;
    Ok(service)
}

fn assert_matches(body: &str, pattern: &str) -> Result<()> {
    let re = Regex::new(pattern)?;
    assert!(re.is_match(body), "{pattern:?} not found in:\n{body}");
    Ok(())
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn app_sees_the_platform_environment() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            push_env_dump(live, &s).await?;
            bind_user_service(live, &s).await?;
            live.ok(["start", s.app().as_str()], TimeoutTier::Push).await?;

            let body = live.await_page(s.app().as_str(), support::GREETING).await?;
            for needle in [
                "HOME:/home/vcap/app",
                "MEMORY_LIMIT:512m",
                "PWD:/home/vcap/app",
                "TMPDIR:/home/vcap/tmp",
                "USER:vcap",
                "VCAP_APP_HOST:0.0.0.0",
            ] {
                assert!(body.contains(needle), "{needle:?} not found in:\n{body}");
            }
            for pattern in [
                r"PORT:[0-9]+",
                r"VCAP_APPLICATION:\{.+\}",
                r"VCAP_APP_PORT:[0-9]+",
                r"VCAP_SERVICES:\{.+\}",
            ] {
                assert_matches(&body, pattern)?;
            }
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn set_env_reaches_the_app_after_restart() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            push_env_dump(live, &s).await?;
            live.ok(["start", s.app().as_str()], TimeoutTier::Push).await?;
            live.await_page(s.app().as_str(), &greeting("1.0")).await?;

            live.ok(["set-env", s.app().as_str(), USER_VAR, USER_VALUE], TimeoutTier::Push)
                .await?;
            live.ok(["restart", s.app().as_str()], TimeoutTier::Push).await?;

            let needle = format!("{USER_VAR}:{USER_VALUE}");
            live.await_page(s.app().as_str(), &needle).await?;
            live.ok(["env", s.app().as_str()], TimeoutTier::Default)
                .await?
                .assert_says(&[&format!("{USER_VAR}: {USER_VALUE}")]);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn binding_and_unbinding_updates_vcap_services() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    live.scenario()?
        .run(|s| async move {
            push_env_dump(live, &s).await?;
            let service = bind_user_service(live, &s).await?;
            live.ok(["start", s.app().as_str()], TimeoutTier::Push).await?;

            let body = live.await_page(s.app().as_str(), &greeting("1.0")).await?;
            assert_matches(&body, r"VCAP_SERVICES:\{.+pa55woRD.+\}")?;
            assert_matches(&body, r"VCAP_SERVICES:\{.+admin.+\}")?;

            live.ok(["unbind-service", s.app().as_str(), service.as_str()], TimeoutTier::Default)
                .await?;
            live.ok(["restart", s.app().as_str()], TimeoutTier::Push).await?;
            live.await_page(s.app().as_str(), "VCAP_SERVICES:{}").await?;
            live.ok(["env", s.app().as_str()], TimeoutTier::Default)
                .await?
                .assert_not_says(service.as_str());
            anyhow::Ok(())
        })
        .await
}
