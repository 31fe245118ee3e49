pub mod account;
pub mod dashboard;
pub mod index;
pub mod login;
pub mod logout;
pub mod respond;
pub mod results;
pub mod survey;

use actix_web::http::header;
use actix_web::{error, web, HttpRequest, HttpResponse};

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    index::configure(conf);
    account::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    dashboard::configure(conf);
    survey::configure(conf);
    respond::configure(conf);
    results::configure(conf);
}

/// JSON extractor settings: size limit from config, `{"error"}` bodies on rejection.
pub fn json_config() -> web::JsonConfig {
    let limit = crate::app_config::limits().max_json_size_kb as usize * 1024;
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req: &HttpRequest| {
            log::debug!("Rejected JSON body: {}", err);
            let response =
                HttpResponse::BadRequest().json(serde_json::json!({ "error": err.to_string() }));
            error::InternalError::from_response(err, response).into()
        })
}

/// 302 to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location))
        .finish()
}

/// Sends guests to the login page.
pub fn login_redirect() -> HttpResponse {
    redirect("/auth/login")
}
