//! Join-row visibility across every liveness combination
//!
//! A membership row joins an organization and a user; it must be visible
//! exactly when all three rows are live. This suite walks the full 2^3
//! matrix for organization memberships, and spot-checks project
//! memberships through their transitive organization ancestor.
//!
//! Requires `DATABASE_URL`; skips itself otherwise.

mod common;

use common::TestContext;

use taskdeck_store::models::organization_member::{OrganizationMember, OrganizationRole};
use taskdeck_store::models::project_member::{CreateProjectMember, ProjectMember, ProjectRole};

#[tokio::test]
async fn test_membership_visible_only_when_all_three_live() {
    let Some(ctx) = TestContext::new().await else { return };

    for case in 0u8..8 {
        let delete_member = case & 0b001 != 0;
        let delete_org = case & 0b010 != 0;
        let delete_user = case & 0b100 != 0;

        let owner = ctx.create_user("matrix-owner").await;
        let org = ctx.create_organization(&owner).await;
        let user = ctx.create_user("matrix-member").await;
        let member = ctx
            .create_membership(&org, &user, OrganizationRole::Member)
            .await;

        if delete_member {
            ctx.store.delete(member.clone()).await.expect("Soft delete failed");
        }
        if delete_org {
            ctx.store.delete(org.clone()).await.expect("Soft delete failed");
        }
        if delete_user {
            ctx.store.delete(user.clone()).await.expect("Soft delete failed");
        }

        let found = OrganizationMember::find_pair(&ctx.store, org.id, user.id)
            .await
            .expect("Query failed");

        let expect_visible = !delete_member && !delete_org && !delete_user;
        assert_eq!(
            found.is_some(),
            expect_visible,
            "case {case:#05b}: member_deleted={delete_member} org_deleted={delete_org} user_deleted={delete_user}"
        );
    }
}

#[tokio::test]
async fn test_project_membership_follows_transitive_organization() {
    let Some(ctx) = TestContext::new().await else { return };

    let owner = ctx.create_user("pm-owner").await;
    let org = ctx.create_organization(&owner).await;
    let project = ctx.create_project(&org, &owner).await;
    let user = ctx.create_user("pm-member").await;

    let member = ProjectMember::new(CreateProjectMember {
        project_id: project.id,
        user_id: user.id,
        role: ProjectRole::Member,
    });
    ctx.store.insert(member).await.expect("Insert failed");

    assert!(ProjectMember::find_pair(&ctx.store, project.id, user.id)
        .await
        .expect("Query failed")
        .is_some());

    // Neither the membership, the project nor the user is deleted, but
    // the organization two levels up is, and that is enough.
    ctx.store.delete(org).await.expect("Soft delete failed");

    assert!(ProjectMember::find_pair(&ctx.store, project.id, user.id)
        .await
        .expect("Query failed")
        .is_none());
}
