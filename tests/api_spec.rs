use axum::http::StatusCode;
use axum_test::TestServer;
use ::feature_policies::api::create_router;
use ::feature_policies::db::Database;
use ::feature_policies::models::*;
use uuid::Uuid;

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_test_project(server: &TestServer) -> Project {
    server
        .post("/rest/v1/projects")
        .json(&CreateProjectInput {
            name: "Test Project".to_string(),
            description: None,
        })
        .await
        .json::<Project>()
}

async fn create_test_feature(server: &TestServer, project_id: Uuid) -> Feature {
    server
        .post(&format!("/rest/v1/projects/{}/features", project_id))
        .json(&CreateFeatureInput {
            title: "Checkout".to_string(),
        })
        .await
        .json::<Feature>()
}

async fn create_test_policy(server: &TestServer, project_id: Uuid, contents: &str) -> Policy {
    server
        .post("/rest/v1/policies")
        .json(&CreatePolicyInput {
            project_id,
            contents: contents.to_string(),
            author_id: Uuid::new_v4(),
        })
        .await
        .json::<Policy>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();

        let response = server.get("/rest/v1/health").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

mod policies {
    use super::*;

    #[tokio::test]
    async fn create_returns_created_row() {
        let server = setup();
        let project = create_test_project(&server).await;

        let response = server
            .post("/rest/v1/policies")
            .json(&CreatePolicyInput {
                project_id: project.id,
                contents: "Refunds over 100 need approval".to_string(),
                author_id: Uuid::new_v4(),
            })
            .await;

        response.assert_status(StatusCode::CREATED);
        let policy: Policy = response.json();
        assert_eq!(policy.project_id, project.id);
        assert_eq!(policy.contents, "Refunds over 100 need approval");
    }

    #[tokio::test]
    async fn create_for_unknown_project_is_bad_request() {
        let server = setup();

        let response = server
            .post("/rest/v1/policies")
            .json(&CreatePolicyInput {
                project_id: Uuid::new_v4(),
                contents: "x".to_string(),
                author_id: Uuid::new_v4(),
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_by_eq_filter_succeeds_whether_or_not_a_row_matched() {
        let server = setup();
        let project = create_test_project(&server).await;
        let policy = create_test_policy(&server, project.id, "x").await;

        for _ in 0..2 {
            server
                .delete("/rest/v1/policies")
                .add_query_param("id", format!("eq.{}", policy.id))
                .await
                .assert_status(StatusCode::NO_CONTENT);
        }

        let policies: Vec<Policy> = server
            .get(&format!("/rest/v1/projects/{}/policies", project.id))
            .await
            .json();
        assert!(policies.is_empty());
    }

    #[tokio::test]
    async fn delete_returns_deleted_rows_when_asked() {
        let server = setup();
        let project = create_test_project(&server).await;
        let policy = create_test_policy(&server, project.id, "x").await;

        let response = server
            .delete("/rest/v1/policies")
            .add_query_param("id", format!("eq.{}", policy.id))
            .add_header("Prefer", "return=representation")
            .await;
        response.assert_status_ok();
        let deleted: Vec<Policy> = response.json();
        assert_eq!(deleted, vec![policy.clone()]);

        let again: Vec<Policy> = server
            .delete("/rest/v1/policies")
            .add_query_param("id", format!("eq.{}", policy.id))
            .add_header("Prefer", "return=representation")
            .await
            .json();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn delete_rejects_unsupported_filter() {
        let server = setup();

        let response = server
            .delete("/rest/v1/policies")
            .add_query_param("id", "gt.5")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod feature_policies {
    use super::*;

    #[tokio::test]
    async fn linked_policies_are_listed_for_the_feature() {
        let server = setup();
        let project = create_test_project(&server).await;
        let feature = create_test_feature(&server, project.id).await;
        let policy = create_test_policy(&server, project.id, "Audit refunds").await;

        let response = server
            .post("/rest/v1/feature_policies")
            .json(&CreateFeaturePolicyInput {
                feature_id: feature.id,
                policy_id: policy.id,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let link: FeaturePolicy = response.json();
        assert_eq!(link.policy_id, policy.id);

        let listed: Vec<Policy> = server
            .get(&format!("/rest/v1/features/{}/policies", feature.id))
            .await
            .json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].contents, "Audit refunds");
    }

    #[tokio::test]
    async fn link_to_unknown_feature_is_bad_request() {
        let server = setup();
        let project = create_test_project(&server).await;
        let policy = create_test_policy(&server, project.id, "x").await;

        let response = server
            .post("/rest/v1/feature_policies")
            .json(&CreateFeaturePolicyInput {
                feature_id: Uuid::new_v4(),
                policy_id: policy.id,
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn listing_unknown_feature_is_not_found() {
        let server = setup();

        let response = server
            .get(&format!("/rest/v1/features/{}/policies", Uuid::new_v4()))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn attach_creates_policy_and_link_together() {
        let server = setup();
        let project = create_test_project(&server).await;
        let feature = create_test_feature(&server, project.id).await;

        let response = server
            .post(&format!("/rest/v1/features/{}/policies", feature.id))
            .json(&serde_json::json!({
                "project_id": project.id,
                "contents": "Notify the merchant",
                "author_id": Uuid::new_v4(),
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let added: AddedPolicy = response.json();
        assert_eq!(added.link.feature_id, feature.id);
        assert_eq!(added.link.policy_id, added.policy.id);
    }

    #[tokio::test]
    async fn failed_attach_leaves_no_policy_behind() {
        let server = setup();
        let project = create_test_project(&server).await;

        let response = server
            .post(&format!("/rest/v1/features/{}/policies", Uuid::new_v4()))
            .json(&serde_json::json!({
                "project_id": project.id,
                "contents": "x",
                "author_id": Uuid::new_v4(),
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let policies: Vec<Policy> = server
            .get(&format!("/rest/v1/projects/{}/policies", project.id))
            .await
            .json();
        assert!(policies.is_empty());
    }
}

mod organizations_and_actors {
    use super::*;

    #[tokio::test]
    async fn creates_organization() {
        let server = setup();
        let owner = Uuid::new_v4();

        let response = server
            .post("/rest/v1/organizations")
            .json(&CreateOrganizationInput {
                name: "Acme".to_string(),
                owner_id: owner,
            })
            .await;

        response.assert_status(StatusCode::CREATED);
        let organization: Organization = response.json();
        assert_eq!(organization.owner_id, owner);
    }

    #[tokio::test]
    async fn creates_and_lists_actors() {
        let server = setup();
        let project = create_test_project(&server).await;

        server
            .post("/rest/v1/actors")
            .json(&CreateActorInput {
                project_id: project.id,
                name: "Merchant".to_string(),
            })
            .await
            .assert_status(StatusCode::CREATED);

        let actors: Vec<Actor> = server
            .get(&format!("/rest/v1/projects/{}/actors", project.id))
            .await
            .json();
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].name, "Merchant");
    }
}

// ============================================================
// Security - API Key Authentication
// ============================================================

mod security_auth {
    use super::*;
    use ::feature_policies::api::{create_router_with_config, SecurityConfig};

    fn setup_with_auth(api_key: &str) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        let config = SecurityConfig::with_api_key(api_key);
        let app = create_router_with_config(db, config);
        TestServer::new(app).expect("Failed to create test server")
    }

    fn project_input() -> CreateProjectInput {
        CreateProjectInput {
            name: "Test".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn health_endpoint_is_accessible_without_auth() {
        let server = setup_with_auth("test-secret-key");

        let response = server.get("/rest/v1/health").await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn post_endpoint_requires_auth() {
        let server = setup_with_auth("test-secret-key");

        let response = server.post("/rest/v1/projects").json(&project_input()).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn post_endpoint_works_with_valid_bearer_token() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .post("/rest/v1/projects")
            .add_header("Authorization", "Bearer test-secret-key")
            .json(&project_input())
            .await;

        response.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn post_endpoint_works_with_apikey_header() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .post("/rest/v1/projects")
            .add_header("apikey", "test-secret-key")
            .json(&project_input())
            .await;

        response.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn rejects_invalid_bearer_token() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .post("/rest/v1/projects")
            .add_header("Authorization", "Bearer wrong-key")
            .json(&project_input())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_malformed_auth_header() {
        let server = setup_with_auth("test-secret-key");

        let response = server
            .post("/rest/v1/projects")
            .add_header("Authorization", "Basic dXNlcjpwYXNz")
            .json(&project_input())
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
