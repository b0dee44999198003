//! Space creation under an org the scenario owns.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p pat-e2e --test space -- --ignored
//! ```

mod support;

use std::future::Future;

use anyhow::Result;
use pat_id::{OrgName, QuotaName, SpaceName};
use pat_testing::TimeoutTier;
use support::Live;

/// Runs `body` against a fresh org, deleted with the scenario.
async fn with_org<F, Fut>(live: &Live, body: F) -> Result<()>
where
    F: FnOnce(OrgName) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    live.scenario()?
        .run(|s| async move {
            let org = OrgName::random();
            s.track_org(org.clone());
            live.ok(["create-org", org.as_str()], TimeoutTier::Default)
                .await?;
            body(org).await
        })
        .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn create_space_in_targeted_org() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    with_org(live, |org| async move {
        live.ok(["target", "-o", org.as_str()], TimeoutTier::Default).await?;
        live.ok(["create-space", SpaceName::random().as_str()], TimeoutTier::Default)
            .await?;
        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn create_space_whose_name_has_spaces() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    with_org(live, |org| async move {
        live.ok(["target", "-o", org.as_str()], TimeoutTier::Default).await?;
        live.ok(["create-space", "name with space"], TimeoutTier::Default)
            .await?;
        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn create_space_in_named_org() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    with_org(live, |org| async move {
        live.platform()
            .create_space(&SpaceName::random(), &org)
            .await?
            .assert_exit(0);
        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn duplicate_space_is_rejected() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    with_org(live, |org| async move {
        let space = SpaceName::random();
        let platform = live.platform();
        platform.create_space(&space, &org).await?.assert_exit(0);
        platform
            .create_space(&space, &org)
            .await?
            .assert_says(&["already exists"]);
        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn create_space_with_quota_before_org() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    with_org(live, |org| async move {
        let quota = QuotaName::random();
        let space = SpaceName::random();
        live.ok(["target", "-o", org.as_str()], TimeoutTier::Default).await?;
        live.ok(["create-space-quota", quota.as_str()], TimeoutTier::Default)
            .await?;
        live.ok(
            ["create-space", space.as_str(), "-q", quota.as_str(), "-o", org.as_str()],
            TimeoutTier::Default,
        )
        .await?;
        Ok(())
    })
    .await
}

#[tokio::test]
#[ignore = "needs a live platform"]
async fn create_space_with_org_before_quota() -> Result<()> {
    let Some(live) = support::live().await? else {
        return Ok(());
    };
    let live = &live;

    with_org(live, |org| async move {
        let quota = QuotaName::random();
        let space = SpaceName::random();
        live.ok(["target", "-o", org.as_str()], TimeoutTier::Default).await?;
        live.ok(["create-space-quota", quota.as_str()], TimeoutTier::Default)
            .await?;
        live.ok(
            ["create-space", space.as_str(), "-o", org.as_str(), "-q", quota.as_str()],
            TimeoutTier::Default,
        )
        .await?;
        Ok(())
    })
    .await
}
