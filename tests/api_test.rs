mod common;

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{StandardUsers, test_service};
use divvy::api;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_app() -> Result<(Router, StandardUsers, TempDir)> {
    let (service, temp) = test_service().await?;
    let users = StandardUsers::create(&service).await?;
    Ok((api::router(Arc::new(service)), users, temp))
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Vec<u8>)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes().to_vec();
    Ok((status, body))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    let (status, body) = send(app, request).await?;
    Ok((status, serde_json::from_slice(&body)?))
}

async fn get_json(app: &Router, uri: &str) -> Result<(StatusCode, Value)> {
    let request = Request::builder().uri(uri).body(Body::empty())?;
    let (status, body) = send(app, request).await?;
    Ok((status, serde_json::from_slice(&body)?))
}

#[tokio::test]
async fn test_add_expense_returns_id() -> Result<()> {
    let (app, users, _temp) = test_app().await?;

    let (status, body) = post_json(
        &app,
        "/expenses/add",
        json!({
            "user_id": users.ada,
            "expenseAmount": "100",
            "title": "Dinner",
            "expense_date_time": "2024-06-01T19:30:00",
            "split_method": "equal",
            "participants": [
                {"participant_id": users.ada},
                {"participant_id": users.bob},
                {"participant_id": users.cy}
            ]
        }),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ExpenseID"], json!(1));

    let (status, body) = get_json(&app, &format!("/user/{}/expenses", users.ada)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "Dinner");
    assert_eq!(body[0]["amount_owed"], "33.334");
    assert_eq!(body[0]["total_amount"], "100.000");
    assert_eq!(body[0]["expense_date"], "2024-06-01T19:30:00");

    Ok(())
}

#[tokio::test]
async fn test_add_expense_validation_errors() -> Result<()> {
    let (app, users, _temp) = test_app().await?;

    let (status, body) = post_json(
        &app,
        "/expenses/add",
        json!({
            "user_id": users.ada,
            "expenseAmount": "100",
            "title": "Dinner",
            "split_method": "percentage",
            "participants": [
                {"participant_id": users.ada, "split_value": "50"},
                {"participant_id": users.bob, "split_value": "49"}
            ]
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("100%"));

    let (status, body) = post_json(&app, "/expenses/add", json!({ "title": "Dinner" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Required fields are missing");

    let request = Request::builder()
        .method("POST")
        .uri("/expenses/add")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, _) = send(&app, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was recorded
    let (_, body) = get_json(&app, "/expenses/overall").await?;
    assert_eq!(body["overall_summary"]["total_expenses"], json!(0));

    Ok(())
}

#[tokio::test]
async fn test_store_failure_is_opaque_500() -> Result<()> {
    let (app, users, _temp) = test_app().await?;

    let (status, body) = post_json(
        &app,
        "/expenses/add",
        json!({
            "user_id": users.ada,
            "expenseAmount": "10",
            "title": "Ghost",
            "split_method": "equal",
            "participants": [{"participant_id": users.ada}, {"participant_id": 404}]
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal Server Error");

    Ok(())
}

#[tokio::test]
async fn test_user_endpoints() -> Result<()> {
    let (app, _users, _temp) = test_app().await?;

    let (status, body) = post_json(
        &app,
        "/createUser",
        json!({
            "email": "grace@navy.mil",
            "first_name": "Grace",
            "last_name": "Hopper",
            "mobile_number": "9123456789"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, body) = get_json(&app, &format!("/user/info?id={}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "grace@navy.mil");
    assert_eq!(body["middle_name"], Value::Null);

    let (status, _) = post_json(
        &app,
        "/createUser",
        json!({
            "email": "grace@navy.mil",
            "first_name": "Grace",
            "last_name": "Hopper",
            "mobile_number": "9123456789"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = post_json(
        &app,
        "/createUser",
        json!({
            "email": "ada@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "mobile_number": "1234567890"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Incorrect Mobile Number");

    let (status, body) = post_json(
        &app,
        "/createUser",
        json!({
            "email": "ada@example",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "mobile_number": "9876501234"
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Incorrect Email");

    let (status, body) = get_json(&app, "/user/info?id=abc").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid ID format");

    let (status, _) = get_json(&app, "/user/info?email=nobody@example.com").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(&app, "/user/info").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_overall_and_date_filter() -> Result<()> {
    let (app, users, _temp) = test_app().await?;

    for (title, date) in [
        ("Lunch", "2024-06-02T12:00:00"),
        ("Dinner", "2024-06-03T20:00:00"),
    ] {
        let (status, _) = post_json(
            &app,
            "/expenses/add",
            json!({
                "user_id": users.bob,
                "expenseAmount": 12,
                "title": title,
                "expense_date_time": date,
                "split_method": "equal",
                "participants": [{"participant_id": users.ada}, {"participant_id": users.bob}]
            }),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = get_json(&app, "/expenses/overall?date=2024-06-03").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_summary"]["total_expenses"], json!(1));
    assert_eq!(body["overall_summary"]["total_amount_spent"], "12.000");
    assert_eq!(body["expenses"][0]["title"], "Dinner");
    assert_eq!(body["user_summary"][0]["total_amount_owed"], "6.000");
    assert_eq!(body["user_summary"][2]["total_amount_owed"], "0.000");

    let (status, body) = get_json(&app, "/expenses/overall?date=03-06-2024").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("YYYY-MM-DD"));

    let (status, body) = get_json(&app, "/expenses/overall?date=2999-01-01").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Future Date is not allowed!");

    let (status, body) = get_json(&app, "/user/abc/expenses").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid ID format");

    Ok(())
}

#[tokio::test]
async fn test_balance_sheet_download() -> Result<()> {
    let (app, users, _temp) = test_app().await?;

    post_json(
        &app,
        "/expenses/add",
        json!({
            "user_id": users.ada,
            "expenseAmount": "20",
            "title": "Pizza",
            "expense_date_time": "2024-06-04T21:00:00",
            "split_method": "equal",
            "participants": [{"participant_id": users.ada}, {"participant_id": users.cy}]
        }),
    )
    .await?;

    let request = Request::builder()
        .uri("/expenses/balance-sheet?date=2024-06-04&sheet=overall")
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=balance-sheet-for-2024-06-04-overall.csv"
    );
    let body = response.into_body().collect().await?.to_bytes();
    let csv = String::from_utf8(body.to_vec())?;
    assert!(csv.starts_with("Expense ID,Title,Description,Expense Date,Total Amount,Split Method\n"));
    assert!(csv.contains("1,Pizza,,2024-06-04T21:00:00,20.000,equal"));

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/expenses/balance-sheet")
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body)?.lines().count(), 3);

    let (status, _) = get_json(&app, "/expenses/balance-sheet?sheet=pivot").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (app, _users, _temp) = test_app().await?;
    let (status, body) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
    Ok(())
}
