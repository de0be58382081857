use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use approval_service::services::{StampClock, StatusService, SyncService};
use approval_service::store::{MemorySheetStore, StoreAdapter};
use chrono::{TimeZone, Utc};
use content_model::{ContentItem, Platform, Status};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const APPROVER: &str = "Hamza";

struct Harness {
    memory: Arc<MemorySheetStore>,
    store: Arc<StoreAdapter>,
    clock: Arc<StampClock>,
}

impl Harness {
    async fn new() -> Self {
        let created = Utc.with_ymd_and_hms(2024, 6, 3, 8, 30, 0).unwrap();
        let memory = Arc::new(MemorySheetStore::seeded(&[
            ContentItem::draft("41", Platform::Twitter, "Launch thread", created).with_topic("Launch"),
            ContentItem::draft("42", Platform::LinkedIn, "Hiring post", created),
        ]));
        let store = Arc::new(StoreAdapter::new(memory.clone(), Duration::from_secs(2)));
        store.initialize_schema().await.expect("schema");

        Self {
            memory,
            store,
            clock: Arc::new(StampClock::new()),
        }
    }

    fn app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(approval_service::json_config())
            .app_data(web::Data::from(self.store.clone()))
            .app_data(web::Data::new(StatusService::new(
                self.store.clone(),
                self.clock.clone(),
                APPROVER,
            )))
            .app_data(web::Data::new(SyncService::new(self.store.clone(), self.clock.clone())))
            .configure(approval_service::configure_routes)
    }
}

fn find<'a>(items: &'a [Value], id: &str) -> &'a Value {
    items
        .iter()
        .find(|item| item["id"] == id)
        .unwrap_or_else(|| panic!("item {id} missing"))
}

#[actix_web::test]
async fn health_reports_healthy() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"status": "healthy"}));

    let ready = test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[actix_web::test]
async fn list_returns_items_with_null_optionals() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/content").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let items: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(items.len(), 2);
    let launch = find(&items, "41");
    assert_eq!(launch["platform"], "Twitter");
    assert_eq!(launch["topic"], "Launch");
    assert_eq!(launch["status"], "Draft");
    assert_eq!(launch["createdAt"], "2024-06-03T08:30:00.000Z");
    assert!(launch["lastFeedback"].is_null());
    assert!(launch["dateApproved"].is_null());
    assert!(find(&items, "42")["topic"].is_null());
}

#[actix_web::test]
async fn approving_an_existing_item_stamps_approval() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/content/status")
            .set_json(json!({"id": "42", "status": "Approved"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Status updated successfully");
    assert_eq!(body["item"]["status"], "Approved");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/content").to_request()).await;
    let items: Vec<Value> = test::read_body_json(resp).await;
    let approved = find(&items, "42");
    assert_eq!(approved["status"], "Approved");
    assert!(approved["dateApproved"].is_string());
    assert_eq!(approved["approvedBy"], APPROVER);
    assert_eq!(approved["lastSync"], approved["dateApproved"]);
}

#[actix_web::test]
async fn request_changes_records_feedback() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/content/status")
            .set_json(json!({"id": "41", "status": "Changes Requested", "feedback": "Lead with the demo"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let row = harness.memory.row(2);
    assert_eq!(row[4], "Changes Requested");
    assert_eq!(row[5], "Lead with the demo");
    assert_eq!(row[6], row[14]);
    assert!(row[8].is_empty(), "approval stamp must not be written");
}

#[actix_web::test]
async fn unknown_id_is_404_and_store_unchanged() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;
    let before = harness.store.fetch_all().await.unwrap();
    let writes_before = harness.memory.write_requests();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/content/status")
            .set_json(json!({"id": "999", "status": "Approved"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Content not found");

    assert_eq!(harness.memory.write_requests(), writes_before);
    assert_eq!(harness.store.fetch_all().await.unwrap(), before);
}

#[actix_web::test]
async fn missing_fields_are_rejected() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;

    for body in [json!({"status": "Approved"}), json!({"id": "42"}), json!({"id": "", "status": "Draft"})] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/content/status")
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing required fields");
    }
}

#[actix_web::test]
async fn unknown_status_value_is_rejected() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/content/status")
            .set_json(json!({"id": "42", "status": "Archived"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.memory.row(3)[4], "Draft");
}

#[actix_web::test]
async fn malformed_json_uses_error_shape() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/content/status")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

#[actix_web::test]
async fn sync_rejects_non_array_items() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;
    let writes_before = harness.memory.write_requests();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/content/sync")
            .set_json(json!({"items": "not-an-array"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid items format");
    assert_eq!(harness.memory.write_requests(), writes_before);
}

#[actix_web::test]
async fn sync_overwrites_rows_and_round_trips() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;

    let payload = json!({
        "items": [{
            "id": "42",
            "platform": "LinkedIn",
            "topic": "Hiring",
            "content": "We're hiring a reviewer",
            "status": "In Review",
            "lastFeedback": null,
            "lastFeedbackDate": null,
            "createdAt": "2024-06-03T08:30:00.000Z",
            "dateApproved": null,
            "approvedBy": null,
            "finalApprovalDate": null,
            "postScheduledDate": "2024-06-10T09:00:00.000Z",
            "postedBy": null,
            "postLink": null,
            "lastSync": null,
            "rowIndex": 3
        }]
    });

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/content/sync")
            .set_json(&payload)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Content synced successfully");
    assert_eq!(body["count"], 1);

    let items = harness.store.fetch_all().await.unwrap();
    let synced = items.iter().find(|item| item.id == "42").unwrap();
    assert_eq!(synced.status, Status::InReview);
    assert_eq!(synced.topic.as_deref(), Some("Hiring"));
    assert_eq!(synced.content, "We're hiring a reviewer");
    assert!(synced.post_scheduled_date.is_some());
    assert!(synced.last_sync.is_some());
}

#[actix_web::test]
async fn empty_sync_succeeds_without_writes() {
    let harness = Harness::new().await;
    let app = test::init_service(harness.app()).await;
    let writes_before = harness.memory.write_requests();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/content/sync")
            .set_json(json!({"items": []}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(harness.memory.write_requests(), writes_before);
}
