use actix_web::{App, HttpResponse, HttpServer, web};
use std::time::Duration;

const PAGE: &str = "<html><head><title>Test</title></head><body><h1>Hello</h1></body></html>";

#[allow(dead_code)]
pub const SLOW_RESPONSE: Duration = Duration::from_secs(5);
#[allow(dead_code)]
pub const LARGE_BODY_CHARS: usize = 200_000;

#[allow(dead_code)]
pub const ROBOTS_ALLOW: &str = "User-agent: *\nAllow: /\n";
#[allow(dead_code)]
pub const ROBOTS_BLOCK_ALL: &str = "User-agent: *\nDisallow: /\n";

/// Starts a local site covering every check. `robots` is served at
/// `/robots.txt`; `None` leaves it unrouted so the server answers 404.
pub async fn start_test_server(robots: Option<&'static str>) -> String {
    let http_server = HttpServer::new(move || {
        let mut app = App::new()
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("text/html")
                        .insert_header(("Strict-Transport-Security", "max-age=31536000"))
                        .insert_header(("Content-Security-Policy", "default-src 'self'"))
                        .insert_header(("X-Frame-Options", "DENY"))
                        .insert_header(("X-Content-Type-Options", "nosniff"))
                        .insert_header(("Referrer-Policy", "no-referrer"))
                        .insert_header(("Permissions-Policy", "camera=()"))
                        .body(PAGE)
                }),
            )
            .route(
                "/plain",
                web::get().to(|| async { HttpResponse::Ok().content_type("text/html").body(PAGE) }),
            )
            .route(
                "/cookies",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("text/html")
                        .insert_header(("Set-Cookie", "session=abc; Path=/"))
                        .body(PAGE)
                }),
            )
            .route(
                "/cookies-consent",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("text/html")
                        .insert_header(("Set-Cookie", "session=abc; Path=/"))
                        .body(
                            "<html><body><div id=\"cookie-consent\">We use cookies. Accept?</div></body></html>",
                        )
                }),
            )
            .route(
                "/versioned",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("text/html")
                        .insert_header(("Server", "nginx/1.18.0"))
                        .body(PAGE)
                }),
            )
            .route(
                "/start",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/middle"))
                        .finish()
                }),
            )
            .route(
                "/middle",
                web::get().to(|| async {
                    HttpResponse::MovedPermanently()
                        .append_header(("Location", "/final"))
                        .finish()
                }),
            )
            .route(
                "/final",
                web::get().to(|| async { HttpResponse::Ok().content_type("text/html").body(PAGE) }),
            )
            .route(
                "/loop",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/loop"))
                        .finish()
                }),
            )
            .route(
                "/slow",
                web::get().to(|| async {
                    tokio::time::sleep(SLOW_RESPONSE).await;
                    HttpResponse::Ok().content_type("text/html").body(PAGE)
                }),
            )
            .route(
                "/large",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("text/html")
                        .body("a".repeat(LARGE_BODY_CHARS))
                }),
            )
            .route(
                "/large-multibyte",
                web::get().to(|| async {
                    HttpResponse::Ok()
                        .content_type("text/html; charset=utf-8")
                        .body("é".repeat(LARGE_BODY_CHARS))
                }),
            )
            .route(
                "/server-error",
                web::get().to(|| async { HttpResponse::InternalServerError().body("Error") }),
            );

        if let Some(body) = robots {
            app = app.route(
                "/robots.txt",
                web::get().to(move || async move {
                    HttpResponse::Ok().content_type("text/plain").body(body)
                }),
            );
        }
        app
    })
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind test server");

    let addr = http_server
        .addrs()
        .first()
        .cloned()
        .expect("No address bound");
    let url = format!("http://{}", addr);

    let app_server = http_server.run();

    tokio::spawn(async move {
        if let Err(e) = app_server.await {
            eprintln!("Test server error: {}", e);
        }
    });

    url
}

/// A plain page whose `/robots.txt` answers only after [`SLOW_RESPONSE`].
#[allow(dead_code)]
pub async fn start_slow_robots_server() -> String {
    let http_server = HttpServer::new(|| {
        App::new()
            .route(
                "/",
                web::get().to(|| async { HttpResponse::Ok().content_type("text/html").body(PAGE) }),
            )
            .route(
                "/robots.txt",
                web::get().to(|| async {
                    tokio::time::sleep(SLOW_RESPONSE).await;
                    HttpResponse::Ok()
                        .content_type("text/plain")
                        .body(ROBOTS_BLOCK_ALL)
                }),
            )
    })
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind slow robots test server");

    let addr = http_server
        .addrs()
        .first()
        .cloned()
        .expect("No address bound");
    let url = format!("http://{}", addr);

    let app_server = http_server.run();

    tokio::spawn(async move {
        if let Err(e) = app_server.await {
            eprintln!("Slow robots test server error: {}", e);
        }
    });

    url
}
