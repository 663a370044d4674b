//! Shared test data: UTBK-shaped tables, a matching pipeline artifact and a
//! one-shot HTTP responder on loopback.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use serde_json::json;

use crate::data::model::{CellValue, Dataset};
use crate::data::schema::REQUIRED_COLUMNS;

const PROGRAMMES: [&str; 3] = ["TEKNIK INFORMATIKA", "KEDOKTERAN", "MANAJEMEN"];

/// `n` complete rows carrying exactly the thirteen required columns.
pub fn utbk_dataset(n: usize) -> Dataset {
    let rows = (0..n)
        .map(|r| {
            let mut row: Vec<CellValue> = (0..7)
                .map(|t| CellValue::Integer(400 + 10 * r as i64 + 7 * t))
                .collect();
            row.push(CellValue::Float(520.5 + r as f64));
            row.push(CellValue::Float(530.25 + r as f64));
            row.push(CellValue::Float(525.75 + r as f64));
            row.push(CellValue::Integer(r as i64 + 1));
            row.push(CellValue::String(
                if r % 2 == 0 { "SAINTEK" } else { "SOSHUM" }.into(),
            ));
            row.push(CellValue::String(PROGRAMMES[r % PROGRAMMES.len()].into()));
            row
        })
        .collect();
    Dataset::new(REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
        .expect("fixture rows match header")
}

/// Like [`utbk_dataset`] with the named columns removed.
pub fn utbk_dataset_without(n: usize, drop: &[&str]) -> Dataset {
    let full = utbk_dataset(n);
    let keep: Vec<usize> = (0..full.columns().len())
        .filter(|&i| !drop.contains(&full.columns()[i].as_str()))
        .collect();
    Dataset::new(
        keep.iter().map(|&i| full.columns()[i].clone()).collect(),
        full.rows()
            .iter()
            .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
            .collect(),
    )
    .expect("fixture rows match header")
}

/// [`utbk_dataset`] rendered as CSV text.
pub fn utbk_csv(n: usize) -> String {
    let ds = utbk_dataset(n);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ds.columns()).expect("header");
    for row in ds.rows() {
        writer
            .write_record(row.iter().map(|c| c.to_string()))
            .expect("row");
    }
    String::from_utf8(writer.into_inner().expect("flush")).expect("utf-8")
}

/// A pipeline artifact over the required columns producing six scores.
pub fn pipeline_json() -> String {
    let mut steps: Vec<serde_json::Value> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| **c != "RUMPUN" && **c != "JURUSAN/PRODI")
        .map(|c| json!({ "kind": "numeric", "column": c, "mean": 500.0, "scale": 50.0 }))
        .collect();
    steps.push(json!({
        "kind": "one_hot",
        "column": "RUMPUN",
        "categories": ["SAINTEK", "SOSHUM"],
    }));
    steps.push(json!({ "kind": "one_hot", "column": "JURUSAN/PRODI", "categories": PROGRAMMES }));

    let width = 11 + 2 + PROGRAMMES.len();
    let coefficients: Vec<Vec<f64>> = (0..6)
        .map(|k| (0..width).map(|j| ((k + j) % 5) as f64 * 1.5).collect())
        .collect();
    let intercepts: Vec<f64> = (0..6).map(|k| 550.0 + 5.0 * k as f64).collect();

    json!({
        "steps": steps,
        "regressor": { "coefficients": coefficients, "intercepts": intercepts },
    })
    .to_string()
}

/// Answer exactly one HTTP request with `status_line` and `body`; returns the
/// base URL (`http://127.0.0.1:<port>`).
pub fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let head = format!(
            "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&body);
    });
    format!("http://{addr}")
}
