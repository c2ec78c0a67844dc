//! End-to-end checks against a real PostgreSQL database.
//!
//! They are ignored by default. Run them with a database:
//!
//! ```text
//! TEST_DATABASE_URL=postgres://... cargo test --test api -- --ignored
//! ```
//!
//! Names and emails carry a per-run suffix so the suite can run repeatedly
//! against the same database.

use actix_web::cookie::time::Duration;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

use tortugas::config::AppConfig;
use tortugas::db::Store;
use tortugas::handlers::configure;
use tortugas::{json_config, path_config};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn unique(prefix: &str) -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}-{}-{}", prefix, nanos, COUNTER.fetch_add(1, Ordering::SeqCst))
}

async fn setup() -> (Store, AppConfig) {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must point at a test database");
    let config = AppConfig::for_database(&url);
    let store = Store::connect(&config).expect("test database must be reachable");
    store.init_schema().await.expect("schema must initialize");
    (store, config)
}

macro_rules! app {
    ($store:expr, $config:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($store.clone()))
                .app_data(web::Data::new($config.clone()))
                .app_data(json_config())
                .app_data(path_config())
                .service(web::scope("/api").configure(configure)),
        )
        .await
    };
}

macro_rules! post_json {
    ($app:expr, $uri:expr, $body:expr) => {
        test::call_service(&$app, test::TestRequest::post().uri($uri).set_json($body).to_request()).await
    };
    ($app:expr, $uri:expr, $body:expr, $cookie:expr) => {
        test::call_service(
            &$app,
            test::TestRequest::post()
                .uri($uri)
                .cookie($cookie.clone())
                .set_json($body)
                .to_request(),
        )
        .await
    };
}

/// Registers a fresh staff member and returns (email, password, session cookie).
macro_rules! signed_in {
    ($app:expr) => {{
        let email = format!("{}@tortugas.test", unique("staff"));
        let password = "carey-2024".to_string();
        let resp = post_json!(
            $app,
            "/api/auth/registro",
            json!({
                "nombre": "Ana",
                "apellido": "Quesada",
                "email": email,
                "password": password,
                "cargo": "bióloga"
            })
        );
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = post_json!($app, "/api/auth/login", json!({ "email": email, "password": password }));
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == "user_id")
            .map(|c| c.into_owned())
            .expect("login sets the session cookie");
        (email, password, cookie)
    }};
}

#[actix_web::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn register_then_login_round_trip() {
    let (store, config) = setup().await;
    let app = app!(store, config);

    let email = format!("{}@tortugas.test", unique("reg"));
    let resp = post_json!(
        app,
        "/api/auth/registro",
        json!({
            "nombre": "Luis",
            "apellido": "Mora",
            "email": email,
            "password": "golfina",
            "cargo": "voluntario"
        })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["nombre"], "Luis Mora");
    assert_eq!(body["user"]["cargo"], "voluntario");
    assert!(body["user"].get("password_hash").is_none());

    let resp = post_json!(app, "/api/auth/login", json!({ "email": email, "password": "golfina" }));
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "user_id")
        .map(|c| c.into_owned())
        .unwrap();
    assert_eq!(cookie.max_age(), Some(Duration::hours(24)));
    assert_eq!(cookie.http_only(), Some(true));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(cookie.value(), body["user"]["id"].to_string());

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/auth/me").cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = post_json!(
        app,
        "/api/auth/registro",
        json!({
            "nombre": "Otro",
            "apellido": "Nombre",
            "email": email,
            "password": "distinta",
            "cargo": "voluntario"
        })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "El email ya está registrado");
}

#[actix_web::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn login_failures_are_indistinguishable() {
    let (store, config) = setup().await;
    let app = app!(store, config);
    let (email, _password, cookie) = signed_in!(app);

    let wrong_password = post_json!(app, "/api/auth/login", json!({ "email": email, "password": "nope" }));
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password: Value = test::read_body_json(wrong_password).await;

    let unknown = post_json!(
        app,
        "/api/auth/login",
        json!({ "email": "nadie@tortugas.test", "password": "nope" })
    );
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown: Value = test::read_body_json(unknown).await;
    assert_eq!(wrong_password, unknown);

    // Deactivate the account, then the right password fails the same way.
    let id: i32 = cookie.value().parse().unwrap();
    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/personal/{}", id))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let staff: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/personal").to_request(),
    )
    .await;
    let staff = staff["data"].as_array().unwrap();
    assert!(staff.iter().all(|p| p["email"] != email.as_str()));

    let inactive = post_json!(app, "/api/auth/login", json!({ "email": email, "password": "carey-2024" }));
    assert_eq!(inactive.status(), StatusCode::UNAUTHORIZED);
    let inactive: Value = test::read_body_json(inactive).await;
    assert_eq!(inactive, unknown);

    // The old cookie no longer authorizes writes.
    let resp = post_json!(app, "/api/campamentos", json!({ "nombre": unique("camp") }), cookie);
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn camp_names_are_unique() {
    let (store, config) = setup().await;
    let app = app!(store, config);
    let (_, _, cookie) = signed_in!(app);

    let name = unique("Playa Ostional");
    let resp = post_json!(app, "/api/campamentos", json!({ "nombre": name }), cookie);
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["nombre"], name.as_str());
    assert!(body["data"]["id"].as_i64().unwrap() > 0);

    let resp = post_json!(app, "/api/campamentos", json!({ "nombre": name }), cookie);
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Ya existe un registro con ese valor");
}

#[actix_web::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn listing_is_stable() {
    let (store, config) = setup().await;
    let app = app!(store, config);
    let (_, _, cookie) = signed_in!(app);
    let _ = post_json!(app, "/api/campamentos", json!({ "nombre": unique("Camp A") }), cookie);
    let _ = post_json!(app, "/api/campamentos", json!({ "nombre": unique("Camp B") }), cookie);

    let first: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/campamentos").to_request(),
    )
    .await;
    let second: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/campamentos").to_request(),
    )
    .await;
    assert_eq!(first, second);

    let ids: Vec<i64> = first["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert!(ids.len() >= 2);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    // Species answer with a bare array.
    let species: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/especies").to_request(),
    )
    .await;
    assert!(species.is_array());
}

#[actix_web::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn referenced_rows_cannot_be_deleted() {
    let (store, config) = setup().await;
    let app = app!(store, config);
    let (_, _, cookie) = signed_in!(app);

    let camp: Value = test::read_body_json(post_json!(
        app,
        "/api/campamentos",
        json!({ "nombre": unique("Playa Grande") }),
        cookie
    ))
    .await;
    let camp_id = camp["data"]["id"].as_i64().unwrap();

    let resp = post_json!(
        app,
        "/api/especies",
        json!({
            "nombre_cientifico": unique("Chelonia mydas"),
            "nombre_comun": "Tortuga verde",
            "estado_conservacion": "En peligro"
        }),
        cookie
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let species: Value = test::read_body_json(resp).await;
    let species_id = species["id"].as_i64().unwrap();

    let resp = post_json!(
        app,
        "/api/nidos",
        json!({
            "codigo": unique("N"),
            "campamento_id": camp_id,
            "especie_id": species_id,
            "fecha_puesta": "2024-10-03",
            "cantidad_huevos": 88
        }),
        cookie
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let nest: Value = test::read_body_json(resp).await;
    let nest_id = nest["data"]["id"].as_i64().unwrap();
    assert_eq!(nest["data"]["estado"], "incubando");

    let delete = |uri: String| {
        test::TestRequest::delete()
            .uri(&uri)
            .cookie(cookie.clone())
            .to_request()
    };

    let resp = test::call_service(&app, delete(format!("/api/campamentos/{}", camp_id))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"],
        "El registro está relacionado con otros datos o hace referencia a un registro inexistente"
    );

    let resp = test::call_service(&app, delete(format!("/api/nidos/{}", nest_id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = test::call_service(&app, delete(format!("/api/campamentos/{}", camp_id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = test::call_service(&app, delete(format!("/api/campamentos/{}", camp_id))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn update_returns_the_new_row() {
    let (store, config) = setup().await;
    let app = app!(store, config);
    let (_, _, cookie) = signed_in!(app);

    let created: Value = test::read_body_json(post_json!(
        app,
        "/api/campamentos",
        json!({ "nombre": unique("Camp viejo") }),
        cookie
    ))
    .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let renamed = unique("Camp nuevo");
    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/campamentos/{}", id))
            .cookie(cookie.clone())
            .set_json(json!({ "nombre": renamed }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["id"].as_i64(), Some(id));
    assert_eq!(body["data"]["nombre"], renamed.as_str());

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/campamentos/2147483647")
            .cookie(cookie.clone())
            .set_json(json!({ "nombre": unique("fantasma") }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let observation = post_json!(
        app,
        "/api/observaciones",
        json!({ "nido_id": 2147483647, "nota": "rastro fresco" }),
        cookie
    );
    assert_eq!(observation.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn editing_an_event_keeps_author_and_timestamp() {
    let (store, config) = setup().await;
    let app = app!(store, config);
    let (_, _, author) = signed_in!(app);
    let (_, _, editor) = signed_in!(app);

    let camp: Value = test::read_body_json(post_json!(
        app,
        "/api/campamentos",
        json!({ "nombre": unique("Playa Camaronal") }),
        author
    ))
    .await;
    let camp_id = camp["data"]["id"].as_i64().unwrap();

    let resp = post_json!(
        app,
        "/api/eventos",
        json!({
            "tipo": "arribada",
            "campamento_id": camp_id,
            "fecha": "2024-10-03T05:00:00",
            "descripcion": "primera noche"
        }),
        author
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let event = &created["data"];
    assert_eq!(event["personal_id"].to_string(), author.value());

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/eventos/{}", event["id"]))
            .cookie(editor.clone())
            .set_json(json!({
                "tipo": "arribada",
                "campamento_id": camp_id,
                "descripcion": "primera noche, 40 hembras"
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["data"]["descripcion"], "primera noche, 40 hembras");
    assert_eq!(updated["data"]["fecha"], event["fecha"]);
    assert_eq!(updated["data"]["personal_id"], event["personal_id"]);
}
