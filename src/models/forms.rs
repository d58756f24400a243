use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyUrlRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefillRequest {
    pub username: String,
    pub admin_pw: String,
    pub amount: i64,
}
