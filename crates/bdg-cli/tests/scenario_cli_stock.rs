use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn bodega() -> Command {
    let mut cmd = Command::cargo_bin("bodega").unwrap();
    cmd.env("RUST_LOG", "warn")
        .env_remove("BODEGA_API_URL")
        .arg("--config")
        .arg(fixtures().join("bodega.yaml"));
    cmd
}

fn online(server: &MockServer) -> Command {
    let mut cmd = bodega();
    cmd.env("BODEGA_API_URL", server.url("/api/"))
        .env("BODEGA_ACCESS_TOKEN", "tok-stock");
    cmd
}

/// Serves the fixture snapshot on the four list endpoints.
fn serve_snapshot(server: &MockServer) {
    let snap = fixtures().join("snapshot");
    for (path, file) in [
        ("/api/movimientos/", "movimientos.json"),
        ("/api/articulos/", "articulos.json"),
        ("/api/personal/", "personal.json"),
        ("/api/motivos/", "motivos.json"),
    ] {
        let body = fs::read_to_string(snap.join(file)).unwrap();
        server.mock(|when, then| {
            when.method(GET).path(path);
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        });
    }
}

#[test]
fn stock_history_replays_from_opening_balance() {
    bodega()
        .arg("--snapshot")
        .arg(fixtures().join("snapshot"))
        .args(["stock-history", "--article", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "movement_id=1 fecha=\"2024-03-01 12:00\" articulo_id=10 tipo_movimiento=\"Entrada\" cantidad=6 stock_anterior=0 stock_actual=6",
        ))
        .stdout(predicate::str::contains(
            "movement_id=4 fecha=\"2024-03-04 16:30\" articulo_id=10 tipo_movimiento=\"Regresado\" cantidad=3 stock_anterior=1 stock_actual=4",
        ))
        .stdout(predicate::str::contains(
            "movement_id=7 fecha=\"2024-03-06 09:00\" articulo_id=10 tipo_movimiento=\"Prestamo\" cantidad=1 stock_anterior=4 stock_actual=3",
        ))
        .stdout(predicate::str::contains("history_rows=5 skipped=0"));

    bodega()
        .arg("--snapshot")
        .arg(fixtures().join("snapshot"))
        .arg("stock-history")
        .assert()
        .success()
        .stdout(predicate::str::contains("history_rows=7 skipped=0"));
}

#[test]
fn submit_entrada_posts_comment_and_reports_new_balance() {
    let server = MockServer::start();
    serve_snapshot(&server);
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/api/movimientos/")
            .header("authorization", "Bearer tok-stock")
            .json_body(serde_json::json!({
                "articulo": 12,
                "tipo_movimiento": "Entrada",
                "cantidad": 2,
                "comentario": "Entrada de stock"
            }));
        then.status(201).json_body(serde_json::json!({
            "id": 120,
            "articulo": 12,
            "tipo_movimiento": "Entrada",
            "cantidad": 2,
            "fecha": "2024-03-08T10:00:00Z"
        }));
    });

    online(&server)
        .args(["submit", "entrada", "--article", "12", "--qty", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("movement_id=120"))
        .stdout(predicate::str::contains("stock_anterior=4 stock_actual=6"));
    create.assert();
}

#[test]
fn submit_refusals_happen_before_any_post() {
    let server = MockServer::start();
    serve_snapshot(&server);
    let create = server.mock(|when, then| {
        when.method(POST).path("/api/movimientos/");
        then.status(201);
    });

    online(&server)
        .args(["submit", "salida", "--article", "12", "--qty", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not enough stock (requested 5, available 4)"));

    online(&server)
        .args(["submit", "loan", "--article", "10", "--person", "42", "--qty", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("LOAN_REFUSED"))
        .stderr(predicate::str::contains("person 42 does not exist"));

    online(&server)
        .args(["submit", "cambio-estado-unidad", "--article", "12", "--qty", "1", "--state", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires --motive"));

    create.assert_hits(0);
}
