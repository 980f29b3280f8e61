//! Functional tests for the Supabase storage and PostgREST adapters

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prompt_gallery::config::SupabaseConfig;
use prompt_gallery::repository::{
    ImageRepository, NewImage, PostgrestRepository, UserRecord, UserRepository,
};
use prompt_gallery::storage::{ObjectKey, ObjectStore, SupabaseStorage};
use prompt_gallery::supabase::SupabaseClient;
use prompt_gallery::AppError;

fn client_for(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(&SupabaseConfig {
        url: format!("{}/", server.uri()),
        service_key: "service-key".to_string(),
    })
    .unwrap()
}

fn repository_for(server: &MockServer) -> PostgrestRepository {
    PostgrestRepository::new(client_for(server), "generated_images", "users")
}

#[tokio::test]
async fn test_storage_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/generated-images/user_1/1700000000000-abc.jpg"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .and(header("content-type", "image/jpeg"))
        .and(header("x-upsert", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Key": "generated-images/user_1/1700000000000-abc.jpg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = SupabaseStorage::new(client_for(&server), "generated-images");
    let key = ObjectKey::new("user_1", "1700000000000-abc.jpg").unwrap();
    storage
        .upload(&key, vec![0xFF, 0xD8, 0xFF], "image/jpeg")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, vec![0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn test_storage_public_url_is_pure() {
    let server = MockServer::start().await;
    let storage = SupabaseStorage::new(client_for(&server), "generated-images");
    let key = ObjectKey::new("user_1", "1-abc.jpg").unwrap();

    assert_eq!(
        storage.public_url(&key),
        format!(
            "{}/storage/v1/object/public/generated-images/user_1/1-abc.jpg",
            server.uri()
        )
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_storage_escapes_reserved_characters_in_user_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/generated-images/user%231/1-abc.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let storage = SupabaseStorage::new(client_for(&server), "generated-images");
    let key = ObjectKey::new("user#1", "1-abc.jpg").unwrap();
    storage.upload(&key, vec![0xFF], "image/jpeg").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests[0].url.path(),
        "/storage/v1/object/generated-images/user%231/1-abc.jpg"
    );
    assert_eq!(
        storage.public_url(&key),
        format!(
            "{}/storage/v1/object/public/generated-images/user%231/1-abc.jpg",
            server.uri()
        )
    );
}

#[tokio::test]
async fn test_storage_upload_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(413).set_body_string("Payload too large"))
        .mount(&server)
        .await;

    let storage = SupabaseStorage::new(client_for(&server), "generated-images");
    let key = ObjectKey::new("user_1", "1-abc.jpg").unwrap();
    let err = storage.upload(&key, vec![0; 16], "image/jpeg").await.unwrap_err();

    assert!(matches!(err, AppError::Storage(ref message) if message.contains("413")));
}

#[tokio::test]
async fn test_insert_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/generated_images"))
        .and(header("prefer", "return=minimal"))
        .and(body_json(json!([{
            "user_id": "user_1",
            "image_url": "https://cdn.example.com/user_1/1-abc.jpg",
            "prompt": "a red bicycle"
        }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    repository_for(&server)
        .insert(NewImage {
            user_id: "user_1".to_string(),
            image_url: "https://cdn.example.com/user_1/1-abc.jpg".to_string(),
            prompt: "a red bicycle".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_query_filtered_by_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/generated_images"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("user_id", "eq.user_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "6b1f9a3e-2f53-4c7e-9a55-0e4e0b9d2a10",
                "user_id": "user_1",
                "image_url": "https://cdn.example.com/user_1/2.jpg",
                "prompt": "a blue boat",
                "created_at": "2024-09-02T10:00:00+00:00"
            },
            {
                "id": "0c6d2b7e-5b0a-4f7e-8a2a-3d1c9e6f4b21",
                "user_id": "user_1",
                "image_url": "https://cdn.example.com/user_1/1.jpg",
                "prompt": "a red bicycle",
                "created_at": "2024-09-01T10:00:00+00:00"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let images = repository_for(&server).query(Some("user_1")).await.unwrap();

    assert_eq!(images.len(), 2);
    assert_eq!(images[0].prompt, "a blue boat");
    assert!(images[0].created_at > images[1].created_at);
}

#[tokio::test]
async fn test_query_all_has_no_user_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/generated_images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let images = repository_for(&server).query(None).await.unwrap();
    assert!(images.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query_pairs().all(|(key, _)| key != "user_id"));
}

#[tokio::test]
async fn test_query_failure_is_not_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("relation does not exist"))
        .mount(&server)
        .await;

    let err = repository_for(&server).query(None).await.unwrap_err();

    assert!(matches!(err, AppError::Persistence(_)));
}

#[tokio::test]
async fn test_upsert_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(query_param("on_conflict", "id"))
        .and(header_exists("prefer"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    repository_for(&server)
        .upsert_user(UserRecord {
            id: "user_1".to_string(),
            email: "a@example.com".to_string(),
            last_sign_in: Utc::now(),
        })
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body[0]["id"], "user_1");
    assert_eq!(body[0]["email"], "a@example.com");
}
