use std::net::SocketAddr;

use axum::routing::post;
use axum::{Json, Router};
use migration::MigratorTrait;
use models::types::Role;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use server::{build_router, AppState};

const JWT_SECRET: &str = "test-secret";
const ENCRYPT_SECRET: &str = "0123456789abcdef0123456789abcdef";

struct TestApp {
    base_url: String,
    state: AppState,
}

async fn start_server() -> anyhow::Result<TestApp> {
    // DATABASE_URL comes from the environment; skip gracefully when absent.
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL missing; skipping e2e tests.");
            return Err(anyhow::anyhow!("missing DATABASE_URL"));
        }
    };

    let cfg = configs::AppConfig {
        server: configs::ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: configs::DatabaseConfig {
            url,
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 5,
            sqlx_logging: false,
        },
        auth: configs::AuthConfig {
            jwt_secret: JWT_SECRET.into(),
            encrypt_secret: ENCRYPT_SECRET.into(),
            token_ttl_secs: 3600,
        },
        dispatch: configs::DispatchConfig { timeout_secs: 5 },
    };

    let db = models::db::connect_with(&cfg.database).await?;
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("migrations notice: {e}");
    }

    let state = AppState::new(db, &cfg)?;
    let app = build_router(state.clone());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {e}");
        }
    });

    Ok(TestApp { base_url, state })
}

/// Stand-in NLP backend that answers every prediction positively.
async fn start_backend() -> anyhow::Result<String> {
    async fn predict(Json(_body): Json<Value>) -> Json<Value> {
        Json(json!({"prediction": "POSITIVE", "confidence": 0.93}))
    }
    let app = Router::new().route("/predict", post(predict));
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("backend error: {e}");
        }
    });
    Ok(format!("http://{}:{}", addr.ip(), addr.port()))
}

/// Backend that sends its response body in two chunks with a pause in
/// between, so the headers arrive well before the body completes.
async fn start_slow_backend(delay: std::time::Duration) -> anyhow::Result<String> {
    use axum::body::{Body, Bytes};
    use futures::stream::{self, StreamExt};

    let handler = move || async move {
        let head = stream::once(async {
            Ok::<_, std::io::Error>(Bytes::from_static(b"{\"prediction\":"))
        });
        let tail = stream::once(async move {
            tokio::time::sleep(delay).await;
            Ok(Bytes::from_static(b"\"POSITIVE\"}"))
        });
        axum::response::Response::builder()
            .header("content-type", "application/json")
            .body(Body::from_stream(head.chain(tail)))
            .expect("response")
    };
    let app = Router::new().route("/predict", post(handler));
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("backend error: {e}");
        }
    });
    Ok(format!("http://{}:{}", addr.ip(), addr.port()))
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Register a user through the public route and return (token, username).
async fn register_and_login(app: &TestApp) -> anyhow::Result<(String, String)> {
    let c = client();
    let username = format!("user_{}", Uuid::new_v4().simple());
    let body = json!({
        "username": username,
        "name": "Tester",
        "email": format!("{username}@example.com"),
        "password": "S3curePass!",
        "department": "research",
    });
    let res = c
        .post(format!("{}/auth/register", app.base_url))
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c
        .post(format!("{}/auth/login", app.base_url))
        .json(&json!({"username": username, "password": "S3curePass!"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    let token = body["accessToken"]
        .as_str()
        .expect("accessToken in login response")
        .to_owned();
    Ok((token, username))
}

/// Admin token minted directly; the guard checks the token, not a row.
fn admin_token(app: &TestApp) -> String {
    app.state
        .tokens
        .issue(Uuid::new_v4(), Role::Admin)
        .expect("issue admin token")
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Register a fresh service for the stub backend; returns its version.
async fn register_service(app: &TestApp, admin: &str, backend: &str) -> anyhow::Result<String> {
    let res = client()
        .post(format!("{}/services", app.base_url))
        .header("Authorization", bearer(admin))
        .json(&json!({
            "name": "sentiment-backend",
            "description": "sentiment classifier",
            "address": backend,
            "type": "SUD",
            "endpoints": [{
                "endpointPath": "/predict",
                "method": "POST",
                "task": "sentiment",
                "textBased": true,
                "options": {"message": "string"},
            }],
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    let version = body["service"]["version"]
        .as_str()
        .expect("version in response")
        .to_owned();
    Ok(version)
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_guarded_route_without_token_is_unauthorized() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let res = client().get(format!("{}/services", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["statusCode"], 401);
    Ok(())
}

#[tokio::test]
async fn e2e_user_cannot_register_service() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let (user, _) = register_and_login(&app).await?;
    let res = client()
        .post(format!("{}/services", app.base_url))
        .header("Authorization", bearer(&user))
        .json(&json!({
            "name": "n", "description": "d", "address": "http://127.0.0.1:1",
            "type": "SUD", "endpoints": [],
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn e2e_service_registration_versioning_and_conflicts() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let admin = admin_token(&app);
    let backend_a = start_backend().await?;
    let backend_b = start_backend().await?;

    let first = register_service(&app, &admin, &backend_a).await?;
    let second = register_service(&app, &admin, &backend_b).await?;

    // Versions are consecutive whole numbers.
    let parse = |v: &str| v.trim_start_matches('v').parse::<u32>().unwrap();
    assert_eq!(parse(&second), parse(&first) + 1);

    // Same base address again -> conflict with a stable message.
    let res = client()
        .post(format!("{}/services", app.base_url))
        .header("Authorization", bearer(&admin))
        .json(&json!({
            "name": "dup", "description": "d", "address": backend_a,
            "type": "SUD",
            "endpoints": [{
                "endpointPath": "/predict", "method": "POST",
                "task": "sentiment", "options": {"message": "string"},
            }],
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CONFLICT);
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["message"],
        "Service with the same base address already registered"
    );

    // Base address is only visible to admins.
    let (user, _) = register_and_login(&app).await?;
    let res = client()
        .get(format!("{}/services/SUD/{first}", app.base_url))
        .header("Authorization", bearer(&user))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert!(body["service"]["baseAddress"].is_null());

    let res = client()
        .get(format!("{}/services/SUD/{first}", app.base_url))
        .header("Authorization", bearer(&admin))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["service"]["baseAddress"], backend_a.as_str());
    Ok(())
}

#[tokio::test]
async fn e2e_endpoint_conflicts() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let admin = admin_token(&app);
    let backend = start_backend().await?;
    let version = register_service(&app, &admin, &backend).await?;
    let c = client();
    let url = format!("{}/services/SUD/{version}/endpoints", app.base_url);

    // Same task again.
    let res = c
        .post(&url)
        .header("Authorization", bearer(&admin))
        .json(&json!({
            "endpointPath": "/other", "method": "GET",
            "task": "sentiment", "options": {"q": "string"},
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CONFLICT);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Task already exist for the service");

    // Same (path, method) under a new task.
    let res = c
        .post(&url)
        .header("Authorization", bearer(&admin))
        .json(&json!({
            "endpointPath": "/predict", "method": "POST",
            "task": "classify", "options": {"q": "string"},
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CONFLICT);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Endpoint of the given method already registered");

    // Same path under a different method is fine.
    let res = c
        .post(&url)
        .header("Authorization", bearer(&admin))
        .json(&json!({
            "endpointPath": "/predict", "method": "GET",
            "task": "classify", "options": {"q": "string"},
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_expired_subscription_blocks_users_not_admins() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let admin = admin_token(&app);
    let backend = start_backend().await?;
    let version = register_service(&app, &admin, &backend).await?;
    let (user, username) = register_and_login(&app).await?;
    let c = client();

    // Push the subscription into the past directly.
    let account = models::user::find_by_username(&app.state.db, &username)
        .await?
        .expect("registered user");
    models::user::extend_subscription(&app.state.db, account, -60).await?;

    let res = c
        .post(format!("{}/query/SUD/{version}/sentiment", app.base_url))
        .header("Authorization", bearer(&user))
        .json(&json!({"options": {"message": "hi"}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert!(body["message"]
        .as_str()
        .expect("message")
        .starts_with("Subscription expired"));

    // Admins dispatch regardless of any subscription.
    let res = c
        .post(format!("{}/query/SUD/{version}/sentiment", app.base_url))
        .header("Authorization", bearer(&admin))
        .json(&json!({"options": {"message": "hi"}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_execution_time_filter_is_inclusive_upper_bound() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let (user, username) = register_and_login(&app).await?;
    let account = models::user::find_by_username(&app.state.db, &username)
        .await?
        .expect("registered user");

    for time in [0.1, 5.0, 10.0] {
        models::usage::insert(
            &app.state.db,
            models::usage::NewUsage {
                user_id: account.id,
                service_type: "SUD",
                service_version: "v1",
                service_id: Uuid::new_v4(),
                endpoint_id: Uuid::new_v4(),
                output: "{}".into(),
                execution_time: time,
                options: None,
                is_admin_query: false,
            },
        )
        .await?;
    }

    let c = client();
    // The service ids are synthetic, so ask for deleted-service records too.
    let count = |max: &str| {
        let c = c.clone();
        let url = format!(
            "{}/usages?executionTime={max}&returnDelService=true&returnDelUser=true",
            app.base_url
        );
        let user = user.clone();
        async move {
            let res = c
                .get(url)
                .header("Authorization", bearer(&user))
                .send()
                .await?;
            let body = res.json::<Value>().await?;
            anyhow::Ok(body["usages"].as_array().map(Vec::len).unwrap_or(0))
        }
    };

    assert_eq!(count("0").await?, 0);
    assert_eq!(count("0.101").await?, 1);
    assert_eq!(count("9.99").await?, 2);
    assert_eq!(count("10.0001").await?, 3);
    Ok(())
}

#[tokio::test]
async fn e2e_execution_time_spans_body_download() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let admin = admin_token(&app);
    let backend = start_slow_backend(std::time::Duration::from_millis(400)).await?;
    let version = register_service(&app, &admin, &backend).await?;
    let (user, _) = register_and_login(&app).await?;

    let res = client()
        .post(format!("{}/query/SUD/{version}/sentiment", app.base_url))
        .header("Authorization", bearer(&user))
        .json(&json!({"options": {"message": "hi"}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    // The headers arrive immediately; the body takes another 400ms.
    let time = body["executionTime"].as_f64().expect("executionTime");
    assert!(time >= 0.35, "executionTime {time} excludes body download");
    assert_eq!(body["output"]["prediction"], "POSITIVE");
    Ok(())
}

#[tokio::test]
async fn e2e_deleted_service_records_honor_return_flag() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let admin = admin_token(&app);
    let backend = start_backend().await?;
    let version = register_service(&app, &admin, &backend).await?;
    let (user, _) = register_and_login(&app).await?;
    let c = client();

    let res = c
        .post(format!("{}/query/SUD/{version}/sentiment", app.base_url))
        .header("Authorization", bearer(&user))
        .json(&json!({"options": {"message": "hi"}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let uuid = res.json::<Value>().await?["uuid"]
        .as_str()
        .expect("uuid")
        .to_owned();

    let res = c
        .delete(format!("{}/services/SUD/{version}", app.base_url))
        .header("Authorization", bearer(&admin))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c
        .get(format!("{}/usages", app.base_url))
        .header("Authorization", bearer(&user))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    let usages = body["usages"].as_array().expect("usages array");
    assert!(usages.iter().all(|u| u["uuid"] != uuid.as_str()));

    let res = c
        .get(format!("{}/usages?returnDelService=true", app.base_url))
        .header("Authorization", bearer(&user))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    let usages = body["usages"].as_array().expect("usages array");
    let record = usages
        .iter()
        .find(|u| u["uuid"] == uuid.as_str())
        .expect("record listed with flag");
    assert_eq!(record["serviceDeleted"], true);
    Ok(())
}

#[tokio::test]
async fn e2e_dispatch_and_ledger_round_trip() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let admin = admin_token(&app);
    let backend = start_backend().await?;
    let version = register_service(&app, &admin, &backend).await?;
    let (user, _) = register_and_login(&app).await?;
    let c = client();

    // Mismatched options are rejected with the declared schema echoed back.
    let res = c
        .post(format!("{}/query/SUD/{version}/sentiment", app.base_url))
        .header("Authorization", bearer(&user))
        .json(&json!({"options": {"msg": "hello"}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["expectedOptions"], json!({"message": "string"}));

    // A valid query reaches the backend and lands in the ledger.
    let res = c
        .post(format!("{}/query/SUD/{version}/sentiment", app.base_url))
        .header("Authorization", bearer(&user))
        .json(&json!({"options": {"message": "the weather is lovely"}}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    let uuid = body["uuid"].as_str().expect("uuid in response").to_owned();
    assert!(body["executionTime"].as_f64().expect("executionTime") > 0.0);
    assert_eq!(body["output"]["prediction"], "POSITIVE");

    // The owner can read the record back.
    let res = c
        .get(format!("{}/usages/{uuid}", app.base_url))
        .header("Authorization", bearer(&user))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["usage"]["uuid"], uuid.as_str());

    // A stranger cannot.
    let (stranger, _) = register_and_login(&app).await?;
    let res = c
        .get(format!("{}/usages/{uuid}", app.base_url))
        .header("Authorization", bearer(&stranger))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::FORBIDDEN);

    // An unknown record is NotFound even for admins.
    let res = c
        .get(format!("{}/usages/{}", app.base_url, Uuid::new_v4()))
        .header("Authorization", bearer(&admin))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);

    // Execution-time filter is an upper bound.
    let res = c
        .get(format!("{}/usages?executionTime=10", app.base_url))
        .header("Authorization", bearer(&user))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    let usages = body["usages"].as_array().expect("usages array");
    assert!(usages.iter().any(|u| u["uuid"] == uuid.as_str()));

    let res = c
        .get(format!("{}/usages?executionTime=0", app.base_url))
        .header("Authorization", bearer(&user))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    let usages = body["usages"].as_array().expect("usages array");
    assert!(usages.iter().all(|u| u["uuid"] != uuid.as_str()));

    // Admins may delete any record.
    let res = c
        .delete(format!("{}/usages/{uuid}", app.base_url))
        .header("Authorization", bearer(&admin))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c
        .get(format!("{}/usages/{uuid}", app.base_url))
        .header("Authorization", bearer(&user))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}
