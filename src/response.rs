//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

pub const SUCCESS_CODE: u16 = 0;

/// `{ "code": 0, "msg": "success", "data": ... }`
#[derive(Serialize, Debug)]
pub struct Envelope<T> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
}

#[derive(Serialize, Debug)]
pub struct PageBody<T> {
    pub items: Vec<T>,
    pub total: u64,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::CREATED,
        Json(Envelope {
            code: SUCCESS_CODE,
            msg: "success".into(),
            data: Some(data),
        }),
    )
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            code: SUCCESS_CODE,
            msg: "success".into(),
            data: Some(data),
        }),
    )
}

pub fn success_page<T: Serialize>(items: Vec<T>, total: u64) -> (StatusCode, Json<Envelope<PageBody<T>>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            code: SUCCESS_CODE,
            msg: "success".into(),
            data: Some(PageBody { items, total }),
        }),
    )
}
